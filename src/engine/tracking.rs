// ==========================================
// PAC 现金流计划导入系统 - 执行跟踪引擎
// ==========================================
// 职责: 计划 vs 执行 的逐月对比（按类别 + 按科目）
// 口径: 只取指定流向的明细行; 执行率 = 执行 / 计划 × 100,
//       保留一位小数,计划为零时记 0
// 典型组合: 计划 vs 支付、承诺 vs 支付
// ==========================================

use crate::domain::amount::{accumulate, accumulate_months, percentage};
use crate::domain::budget_line::{BudgetLine, MONTH_NAMES};
use crate::domain::types::{Category, FlowType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 执行率（百分比,一位小数）
pub fn execution_pct(executed: Decimal, planned: Decimal) -> Decimal {
    percentage(executed, planned)
}

/// 单月对比
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthComparison {
    pub month: String,
    pub planned: Decimal,
    pub executed: Decimal,
    pub pct: Decimal,
}

/// 科目级对比
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemTracking {
    pub code: String,
    pub label: String,
    pub months: Vec<MonthComparison>,
    pub planned_total: Decimal,
    pub executed_total: Decimal,
    pub pct_total: Decimal,
}

/// 类别级对比
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTracking {
    pub category: Category,
    pub display_name: String,
    pub months: Vec<MonthComparison>,
    pub planned_total: Decimal,
    pub executed_total: Decimal,
    pub pct_total: Decimal,
    pub items: Vec<ItemTracking>,
}

/// 累计金额（12 个月 + 合计）
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    monthly: [Decimal; 12],
    total: Decimal,
}

impl Accumulator {
    fn add(&mut self, line: &BudgetLine) {
        accumulate_months(&mut self.monthly, &line.monthly);
        accumulate(&mut self.total, line.total);
    }
}

fn compare_months(planned: &Accumulator, executed: &Accumulator) -> Vec<MonthComparison> {
    MONTH_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| MonthComparison {
            month: name.to_string(),
            planned: planned.monthly[i],
            executed: executed.monthly[i],
            pct: execution_pct(executed.monthly[i], planned.monthly[i]),
        })
        .collect()
}

// ==========================================
// TrackingEngine - 执行跟踪引擎
// ==========================================
// 红线: 无状态引擎,纯函数
#[derive(Debug, Default)]
pub struct TrackingEngine;

impl TrackingEngine {
    pub fn new() -> Self {
        Self
    }

    /// 计划 vs 执行 对比
    ///
    /// # 参数
    /// - planned: 计划侧数据集的预算行
    /// - executed: 执行侧数据集的预算行
    /// - flow: 收入或支出
    ///
    /// # 返回
    /// 按类别排列的对比结果; 科目按计划侧首次出现顺序排列,
    /// 执行侧按编码匹配
    pub fn compare(
        &self,
        planned: &[BudgetLine],
        executed: &[BudgetLine],
        flow: FlowType,
    ) -> Vec<CategoryTracking> {
        let planned = Self::detail_rows(planned, flow);
        let executed = Self::detail_rows(executed, flow);

        let categories: BTreeSet<Category> = planned
            .iter()
            .chain(executed.iter())
            .filter_map(|l| l.category)
            .collect();

        categories
            .into_iter()
            .map(|category| Self::compare_category(category, &planned, &executed))
            .collect()
    }

    fn detail_rows(lines: &[BudgetLine], flow: FlowType) -> Vec<&BudgetLine> {
        lines
            .iter()
            .filter(|l| l.is_detail() && l.flow_type == flow && l.category.is_some())
            .collect()
    }

    fn compare_category(
        category: Category,
        planned: &[&BudgetLine],
        executed: &[&BudgetLine],
    ) -> CategoryTracking {
        let in_category = |l: &&&BudgetLine| l.category == Some(category);

        let mut planned_acc = Accumulator::default();
        let mut executed_acc = Accumulator::default();

        // 科目: 编码 → (名称, 计划, 执行); item_order 记录首次出现顺序
        let mut item_order: Vec<String> = Vec::new();
        let mut items: BTreeMap<String, (String, Accumulator, Accumulator)> = BTreeMap::new();

        for line in planned.iter().filter(in_category) {
            planned_acc.add(line);
            let entry = items.entry(line.code.clone()).or_insert_with(|| {
                item_order.push(line.code.clone());
                let label = if line.label.is_empty() {
                    line.code.clone()
                } else {
                    line.label.clone()
                };
                (label, Accumulator::default(), Accumulator::default())
            });
            entry.1.add(line);
        }

        for line in executed.iter().filter(in_category) {
            executed_acc.add(line);
            // 计划侧没有的科目只计入类别合计
            if let Some(entry) = items.get_mut(&line.code) {
                entry.2.add(line);
            }
        }

        let items = item_order
            .into_iter()
            .filter_map(|code| {
                items.remove(&code).map(|(label, p, e)| ItemTracking {
                    months: compare_months(&p, &e),
                    planned_total: p.total,
                    executed_total: e.total,
                    pct_total: execution_pct(e.total, p.total),
                    code,
                    label,
                })
            })
            .collect();

        CategoryTracking {
            category,
            display_name: category.display_name().to_string(),
            months: compare_months(&planned_acc, &executed_acc),
            planned_total: planned_acc.total,
            executed_total: executed_acc.total,
            pct_total: execution_pct(executed_acc.total, planned_acc.total),
            items,
        }
    }

    /// 整体执行率: (计划合计, 执行合计, 执行率)
    pub fn overall(&self, categories: &[CategoryTracking]) -> (Decimal, Decimal, Decimal) {
        let mut planned = Decimal::ZERO;
        let mut executed = Decimal::ZERO;
        for category in categories {
            accumulate(&mut planned, category.planned_total);
            accumulate(&mut executed, category.executed_total);
        }
        (planned, executed, execution_pct(executed, planned))
    }
}
