// ==========================================
// PAC 现金流计划导入系统 - 资金来源执行引擎
// ==========================================
// 职责: 按资金来源汇总计划/承诺/支付/收款,对比已分配预算
// 口径:
// - 只统计明细行,按 funding_source 精确匹配来源名称
// - 计划收入/支出: PROGRAMADO 的 INGRESO / GASTO 合计
// - 承诺: EJECUTADO_COMPROMISO 的 GASTO 合计
// - 支付: EJECUTADO_PAGO 的 GASTO 合计; 收款: EJECUTADO_PAGO 的 INGRESO 合计
// - 可用余额 = 已分配预算 - 承诺
// - 执行率 = 承诺 / 已分配预算; 支付率 = 支付 / 承诺（分母为零记 0）
// ==========================================

use crate::domain::amount::{accumulate, accumulate_months, percentage};
use crate::domain::budget_line::{BudgetLine, MONTH_NAMES};
use crate::domain::funding_source::FundingSource;
use crate::domain::types::{DatasetKind, FlowType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 资金来源单月执行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingMonth {
    pub month: String,
    pub programmed_income: Decimal,
    pub programmed_expense: Decimal,
    pub committed: Decimal,
    pub paid_expense: Decimal,
    pub collected: Decimal,
    pub pct_committed: Decimal, // 承诺 / 计划支出
    pub pct_paid: Decimal,      // 支付 / 计划支出
}

/// 资金来源执行报表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingSourceReport {
    pub name: String,
    pub code: String,
    pub description: String,
    pub active: bool,
    /// 数据中出现但未登记的来源为 false,已分配预算记 0
    pub registered: bool,
    pub assigned_budget: Decimal,
    pub programmed_income: Decimal,
    pub programmed_expense: Decimal,
    pub committed: Decimal,
    pub paid_expense: Decimal,
    pub collected: Decimal,
    pub available_balance: Decimal,
    pub execution_pct: Decimal,
    pub payment_pct: Decimal,
    pub months: Vec<FundingMonth>,
}

/// 同一数据集、同一流向的合计
#[derive(Debug, Clone, Copy, Default)]
struct Measure {
    monthly: [Decimal; 12],
    total: Decimal,
}

impl Measure {
    fn add(&mut self, line: &BudgetLine) {
        accumulate_months(&mut self.monthly, &line.monthly);
        accumulate(&mut self.total, line.total);
    }
}

/// 单个来源的五项合计
#[derive(Debug, Clone, Copy, Default)]
struct SourceTotals {
    programmed_income: Measure,
    programmed_expense: Measure,
    committed: Measure,
    paid_expense: Measure,
    collected: Measure,
}

/// 各数据集的预算行
pub struct FundingInputs<'a> {
    pub programmed: &'a [BudgetLine],
    pub committed: &'a [BudgetLine],
    pub paid: &'a [BudgetLine],
}

// ==========================================
// FundingSourceEngine - 资金来源执行引擎
// ==========================================
// 红线: 无状态引擎,纯函数
#[derive(Debug, Default)]
pub struct FundingSourceEngine;

impl FundingSourceEngine {
    pub fn new() -> Self {
        Self
    }

    /// 生成资金来源报表
    ///
    /// # 返回
    /// 先按名称列出已登记来源,再按名称列出数据中出现但未登记的来源
    pub fn report(
        &self,
        sources: &[FundingSource],
        inputs: &FundingInputs<'_>,
    ) -> Vec<FundingSourceReport> {
        let totals = Self::collect(inputs);

        let registered: BTreeSet<&str> = sources.iter().map(|s| s.name.as_str()).collect();
        let mut ordered: Vec<&FundingSource> = sources.iter().collect();
        ordered.sort_by(|a, b| a.name.cmp(&b.name));

        let mut reports: Vec<FundingSourceReport> = ordered
            .into_iter()
            .map(|source| {
                let t = totals.get(source.name.as_str()).copied().unwrap_or_default();
                Self::build(source, true, &t)
            })
            .collect();

        for (name, t) in totals.iter().filter(|(name, _)| !registered.contains(*name)) {
            let placeholder = FundingSource::new(0, *name, Decimal::ZERO);
            reports.push(Self::build(&placeholder, false, t));
        }
        reports
    }

    /// 数据集 + 流向 → 计入的合计项
    fn slot(t: &mut SourceTotals, dataset: DatasetKind, flow: FlowType) -> Option<&mut Measure> {
        match (dataset, flow) {
            (DatasetKind::Programmed, FlowType::Income) => Some(&mut t.programmed_income),
            (DatasetKind::Programmed, FlowType::Expense) => Some(&mut t.programmed_expense),
            (DatasetKind::Committed, FlowType::Expense) => Some(&mut t.committed),
            (DatasetKind::Paid, FlowType::Income) => Some(&mut t.collected),
            (DatasetKind::Paid, FlowType::Expense) => Some(&mut t.paid_expense),
            _ => None,
        }
    }

    /// 来源名称 → 合计
    fn collect<'a>(inputs: &FundingInputs<'a>) -> BTreeMap<&'a str, SourceTotals> {
        let mut totals: BTreeMap<&'a str, SourceTotals> = BTreeMap::new();
        let datasets = [
            (DatasetKind::Programmed, inputs.programmed),
            (DatasetKind::Committed, inputs.committed),
            (DatasetKind::Paid, inputs.paid),
        ];

        for (dataset, lines) in datasets {
            for line in lines
                .iter()
                .filter(|l| l.is_detail() && !l.funding_source.is_empty())
            {
                let entry = totals.entry(line.funding_source.as_str()).or_default();
                if let Some(measure) = Self::slot(entry, dataset, line.flow_type) {
                    measure.add(line);
                }
            }
        }
        totals
    }

    fn build(source: &FundingSource, registered: bool, t: &SourceTotals) -> FundingSourceReport {
        let committed = t.committed.total;
        let months = MONTH_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let planned = t.programmed_expense.monthly[i];
                FundingMonth {
                    month: name.to_string(),
                    programmed_income: t.programmed_income.monthly[i],
                    programmed_expense: planned,
                    committed: t.committed.monthly[i],
                    paid_expense: t.paid_expense.monthly[i],
                    collected: t.collected.monthly[i],
                    pct_committed: percentage(t.committed.monthly[i], planned),
                    pct_paid: percentage(t.paid_expense.monthly[i], planned),
                }
            })
            .collect();

        FundingSourceReport {
            name: source.name.clone(),
            code: source.code.clone(),
            description: source.description.clone(),
            active: source.active,
            registered,
            assigned_budget: source.assigned_budget,
            programmed_income: t.programmed_income.total,
            programmed_expense: t.programmed_expense.total,
            committed,
            paid_expense: t.paid_expense.total,
            collected: t.collected.total,
            available_balance: source.assigned_budget.saturating_sub(committed),
            execution_pct: percentage(committed, source.assigned_budget),
            payment_pct: percentage(t.paid_expense.total, committed),
            months,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::budget_line::AppropriationAmounts;
    use crate::domain::types::Category;
    use chrono::Utc;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(
        dataset: DatasetKind,
        flow_type: FlowType,
        source: &str,
        month: usize,
        amount: &str,
    ) -> BudgetLine {
        let mut monthly = [Decimal::ZERO; 12];
        monthly[month] = dec(amount);
        BudgetLine {
            dataset,
            fiscal_year: 2026,
            flow_type,
            category: Some(match flow_type {
                FlowType::Income => Category::CurrentIncome,
                FlowType::Expense => Category::Operating,
            }),
            code: format!("1003 - 2.1.1 - {}", source),
            label: "Rubro".to_string(),
            funding_source: source.to_string(),
            appropriation: AppropriationAmounts::default(),
            monthly,
            total: Decimal::ZERO,
            is_subtotal: false,
            source_row: 5,
            imported_by: None,
            imported_at: Utc::now(),
        }
        .finalize()
    }

    #[test]
    fn test_report_per_registered_source() {
        let programmed = vec![
            line(DatasetKind::Programmed, FlowType::Income, "20", 0, "1000"),
            line(DatasetKind::Programmed, FlowType::Expense, "20", 0, "400"),
            line(DatasetKind::Programmed, FlowType::Expense, "20", 1, "400"),
            line(DatasetKind::Programmed, FlowType::Expense, "25", 0, "50"),
        ];
        let committed = vec![
            line(DatasetKind::Committed, FlowType::Expense, "20", 0, "300"),
            // 承诺表中的收入行不计入
            line(DatasetKind::Committed, FlowType::Income, "20", 0, "999"),
        ];
        let mut subtotal = line(DatasetKind::Paid, FlowType::Expense, "20", 0, "5000");
        subtotal.is_subtotal = true;
        let paid = vec![
            line(DatasetKind::Paid, FlowType::Expense, "20", 0, "150"),
            line(DatasetKind::Paid, FlowType::Income, "20", 0, "700"),
            subtotal,
        ];

        let mut sgp = FundingSource::new(2026, "20", dec("1200"));
        sgp.code = "SGP".to_string();
        let reports = FundingSourceEngine::new().report(
            &[sgp],
            &FundingInputs {
                programmed: &programmed,
                committed: &committed,
                paid: &paid,
            },
        );

        assert_eq!(reports.len(), 2);
        let r = &reports[0];
        assert_eq!(r.name, "20");
        assert!(r.registered);
        assert_eq!(r.code, "SGP");
        assert_eq!(r.programmed_income, dec("1000"));
        assert_eq!(r.programmed_expense, dec("800"));
        assert_eq!(r.committed, dec("300"));
        assert_eq!(r.paid_expense, dec("150"));
        assert_eq!(r.collected, dec("700"));
        assert_eq!(r.available_balance, dec("900"));
        assert_eq!(r.execution_pct, dec("25.0"));
        assert_eq!(r.payment_pct, dec("50.0"));

        assert_eq!(r.months.len(), 12);
        assert_eq!(r.months[0].month, "Enero");
        assert_eq!(r.months[0].committed, dec("300"));
        assert_eq!(r.months[0].pct_committed, dec("75.0"));
        assert_eq!(r.months[0].pct_paid, dec("37.5"));
        assert_eq!(r.months[1].pct_committed, Decimal::ZERO);

        // 未登记来源附在末尾,预算为 0
        let unregistered = &reports[1];
        assert_eq!(unregistered.name, "25");
        assert!(!unregistered.registered);
        assert_eq!(unregistered.assigned_budget, Decimal::ZERO);
        assert_eq!(unregistered.programmed_expense, dec("50"));
        assert_eq!(unregistered.execution_pct, Decimal::ZERO);
    }

    #[test]
    fn test_registered_source_without_data() {
        let reports = FundingSourceEngine::new().report(
            &[
                FundingSource::new(2026, "SGR", dec("500")),
                FundingSource::new(2026, "10", dec("0")),
            ],
            &FundingInputs {
                programmed: &[],
                committed: &[],
                paid: &[],
            },
        );
        let names: Vec<&str> = reports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["10", "SGR"]);
        assert_eq!(reports[1].available_balance, dec("500"));
        assert_eq!(reports[1].payment_pct, Decimal::ZERO);
    }
}
