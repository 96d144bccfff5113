// ==========================================
// PAC 现金流计划导入系统 - 数据集汇总引擎
// ==========================================
// 职责: 对已存预算行做收支汇总（总额/月度/分类别）
// 口径:
// - 只统计明细行（is_subtotal = false）
// - 收入剔除 SALDO_INICIAL（上年结余）
// - 支出剔除 RESERVAS / CUENTAS_POR_PAGAR（以前年度承接）
// - 初始拨款取最终拨款,其余数据集取合计
// ==========================================

use crate::domain::amount::{accumulate, accumulate_months};
use crate::domain::budget_line::BudgetLine;
use crate::domain::types::{Category, DatasetKind, FlowType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 类别合计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub flow_type: FlowType,
    pub total: Decimal,
}

/// 数据集汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub dataset: DatasetKind,
    pub fiscal_year: i32,
    pub income_total: Decimal,
    pub expense_total: Decimal,
    pub monthly_income: [Decimal; 12],
    pub monthly_expense: [Decimal; 12],
    pub by_category: Vec<CategoryTotal>, // 含被剔除的类别,便于对账
    pub detail_rows: usize,
}

impl DatasetSummary {
    /// 收支差额（溢出时饱和）
    pub fn balance(&self) -> Decimal {
        self.income_total.saturating_sub(self.expense_total)
    }
}

/// 是否计入收支合计
pub fn counts_toward_totals(flow_type: FlowType, category: Option<Category>) -> bool {
    match flow_type {
        FlowType::Income => category != Some(Category::InitialBalance),
        FlowType::Expense => !matches!(
            category,
            Some(Category::Reserves) | Some(Category::Payables)
        ),
    }
}

// ==========================================
// SummaryEngine - 汇总引擎
// ==========================================
// 红线: 无状态引擎,纯函数
#[derive(Debug, Default)]
pub struct SummaryEngine;

impl SummaryEngine {
    pub fn new() -> Self {
        Self
    }

    /// 单行的计量值
    fn measure(dataset: DatasetKind, line: &BudgetLine) -> Decimal {
        match dataset {
            DatasetKind::InitialAppropriation => line.appropriation.definitive,
            _ => line.total,
        }
    }

    /// 汇总一个数据集
    ///
    /// # 参数
    /// - dataset: 数据集类型（决定计量口径）
    /// - fiscal_year: 财年
    /// - lines: 该数据集的全部预算行
    pub fn summarize(
        &self,
        dataset: DatasetKind,
        fiscal_year: i32,
        lines: &[BudgetLine],
    ) -> DatasetSummary {
        let mut income_total = Decimal::ZERO;
        let mut expense_total = Decimal::ZERO;
        let mut monthly_income = [Decimal::ZERO; 12];
        let mut monthly_expense = [Decimal::ZERO; 12];
        let mut by_category: BTreeMap<(Category, FlowType), Decimal> = BTreeMap::new();
        let mut detail_rows = 0;

        for line in lines.iter().filter(|l| l.is_detail()) {
            detail_rows += 1;
            let value = Self::measure(dataset, line);

            if let Some(category) = line.category {
                accumulate(
                    by_category
                        .entry((category, line.flow_type))
                        .or_insert(Decimal::ZERO),
                    value,
                );
            }

            if !counts_toward_totals(line.flow_type, line.category) {
                continue;
            }

            let (total, monthly) = match line.flow_type {
                FlowType::Income => (&mut income_total, &mut monthly_income),
                FlowType::Expense => (&mut expense_total, &mut monthly_expense),
            };
            accumulate(total, value);
            accumulate_months(monthly, &line.monthly);
        }

        DatasetSummary {
            dataset,
            fiscal_year,
            income_total,
            expense_total,
            monthly_income,
            monthly_expense,
            by_category: by_category
                .into_iter()
                .map(|((category, flow_type), total)| CategoryTotal {
                    category,
                    flow_type,
                    total,
                })
                .collect(),
            detail_rows,
        }
    }
}
