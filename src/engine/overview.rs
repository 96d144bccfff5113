// ==========================================
// PAC 现金流计划导入系统 - 跨数据集执行总览
// ==========================================
// 职责: 四个数据集并列对比
// - 按类别: 初始拨款 / 计划 / 承诺 / 支付 × 收入 / 支出
// - 按月: 计划收入 vs 收款,计划支出 vs 承诺 vs 支付,含逐月累计
// 口径:
// - 只统计明细行
// - 初始拨款取最终拨款,其余数据集取合计
// - 按月部分收入剔除 SALDO_INICIAL,支出剔除 RESERVAS / CUENTAS_POR_PAGAR
// ==========================================

use crate::domain::amount::{accumulate, accumulate_months, percentage};
use crate::domain::budget_line::{BudgetLine, MONTH_NAMES};
use crate::domain::types::{Category, DatasetKind, FlowType};
use crate::engine::summary::counts_toward_totals;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 类别行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOverview {
    pub category: Category,
    pub display_name: String,
    pub initial_income: Decimal,
    pub initial_expense: Decimal,
    pub programmed_income: Decimal,
    pub programmed_expense: Decimal,
    pub committed_income: Decimal,
    pub committed_expense: Decimal,
    pub paid_income: Decimal,
    pub paid_expense: Decimal,
    pub pct_income_paid: Decimal,       // 收款 / 计划收入
    pub pct_expense_committed: Decimal, // 承诺 / 计划支出
    pub pct_expense_paid: Decimal,      // 支付 / 计划支出
}

/// 月度行（含累计）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthOverview {
    pub month: String,
    pub programmed_income: Decimal,
    pub collected_income: Decimal,
    pub cumulative_programmed_income: Decimal,
    pub cumulative_collected_income: Decimal,
    pub pct_income: Decimal,
    pub programmed_expense: Decimal,
    pub committed_expense: Decimal,
    pub paid_expense: Decimal,
    pub cumulative_programmed_expense: Decimal,
    pub cumulative_committed_expense: Decimal,
    pub cumulative_paid_expense: Decimal,
    pub pct_committed: Decimal,
    pub pct_paid: Decimal,
}

/// 执行总览
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOverview {
    pub fiscal_year: i32,
    pub categories: Vec<CategoryOverview>,
    pub months: Vec<MonthOverview>,
}

/// 四个数据集的预算行
pub struct OverviewInputs<'a> {
    pub initial: &'a [BudgetLine],
    pub programmed: &'a [BudgetLine],
    pub committed: &'a [BudgetLine],
    pub paid: &'a [BudgetLine],
}

/// (数据集, 流向) 的 12 个月合计
type MonthlyTotals = [Decimal; 12];

fn monthly_of(lines: &[BudgetLine], flow: FlowType) -> MonthlyTotals {
    let mut months = [Decimal::ZERO; 12];
    for line in lines
        .iter()
        .filter(|l| l.is_detail() && l.flow_type == flow)
        .filter(|l| counts_toward_totals(l.flow_type, l.category))
    {
        accumulate_months(&mut months, &line.monthly);
    }
    months
}

// ==========================================
// OverviewEngine - 执行总览引擎
// ==========================================
// 红线: 无状态引擎,纯函数
#[derive(Debug, Default)]
pub struct OverviewEngine;

impl OverviewEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, fiscal_year: i32, inputs: &OverviewInputs<'_>) -> ExecutionOverview {
        ExecutionOverview {
            fiscal_year,
            categories: Self::by_category(inputs),
            months: Self::by_month(inputs),
        }
    }

    /// 类别 → [数据集][流向] 合计; 类别按枚举顺序
    fn by_category(inputs: &OverviewInputs<'_>) -> Vec<CategoryOverview> {
        // 下标: 0 初始拨款 / 1 计划 / 2 承诺 / 3 支付; 每项 (收入, 支出)
        let mut table: BTreeMap<Category, [(Decimal, Decimal); 4]> = BTreeMap::new();
        let datasets = [
            (DatasetKind::InitialAppropriation, inputs.initial),
            (DatasetKind::Programmed, inputs.programmed),
            (DatasetKind::Committed, inputs.committed),
            (DatasetKind::Paid, inputs.paid),
        ];

        for (idx, (dataset, lines)) in datasets.iter().enumerate() {
            for line in lines.iter().filter(|l| l.is_detail()) {
                let Some(category) = line.category else {
                    continue;
                };
                let value = match dataset {
                    DatasetKind::InitialAppropriation => line.appropriation.definitive,
                    _ => line.total,
                };
                let cell = &mut table.entry(category).or_default()[idx];
                match line.flow_type {
                    FlowType::Income => accumulate(&mut cell.0, value),
                    FlowType::Expense => accumulate(&mut cell.1, value),
                }
            }
        }

        table
            .into_iter()
            .map(|(category, cells)| {
                let [initial, programmed, committed, paid] = cells;
                CategoryOverview {
                    category,
                    display_name: category.display_name().to_string(),
                    initial_income: initial.0,
                    initial_expense: initial.1,
                    programmed_income: programmed.0,
                    programmed_expense: programmed.1,
                    committed_income: committed.0,
                    committed_expense: committed.1,
                    paid_income: paid.0,
                    paid_expense: paid.1,
                    pct_income_paid: percentage(paid.0, programmed.0),
                    pct_expense_committed: percentage(committed.1, programmed.1),
                    pct_expense_paid: percentage(paid.1, programmed.1),
                }
            })
            .collect()
    }

    fn by_month(inputs: &OverviewInputs<'_>) -> Vec<MonthOverview> {
        let prog_income = monthly_of(inputs.programmed, FlowType::Income);
        let collected = monthly_of(inputs.paid, FlowType::Income);
        let prog_expense = monthly_of(inputs.programmed, FlowType::Expense);
        let committed = monthly_of(inputs.committed, FlowType::Expense);
        let paid = monthly_of(inputs.paid, FlowType::Expense);

        let mut cumulative = [Decimal::ZERO; 5];
        MONTH_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let current = [prog_income[i], collected[i], prog_expense[i], committed[i], paid[i]];
                for (acc, amount) in cumulative.iter_mut().zip(current) {
                    accumulate(acc, amount);
                }
                MonthOverview {
                    month: name.to_string(),
                    programmed_income: prog_income[i],
                    collected_income: collected[i],
                    cumulative_programmed_income: cumulative[0],
                    cumulative_collected_income: cumulative[1],
                    pct_income: percentage(collected[i], prog_income[i]),
                    programmed_expense: prog_expense[i],
                    committed_expense: committed[i],
                    paid_expense: paid[i],
                    cumulative_programmed_expense: cumulative[2],
                    cumulative_committed_expense: cumulative[3],
                    cumulative_paid_expense: cumulative[4],
                    pct_committed: percentage(committed[i], prog_expense[i]),
                    pct_paid: percentage(paid[i], prog_expense[i]),
                }
            })
            .collect()
    }
}
