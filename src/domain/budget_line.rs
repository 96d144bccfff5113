// ==========================================
// PAC 现金流计划导入系统 - 预算行实体
// ==========================================
// 依据: PAC Excel 列结构 D-I 拨款调整 / J-U 月度 / V 合计
// ==========================================
// 职责: BudgetLine 结构与派生字段不变量
// 红线: 金额一律使用 Decimal,不使用 f64
// ==========================================

use crate::domain::amount::checked_sum;
use crate::domain::types::{Category, DatasetKind, FlowType};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// 月份键（与存储列名一致）
pub const MONTH_KEYS: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio",
    "julio", "agosto", "septiembre", "octubre", "noviembre", "diciembre",
];

/// 月份显示名称
pub const MONTH_NAMES: [&str; 12] = [
    "Enero", "Febrero", "Marzo", "Abril", "Mayo", "Junio",
    "Julio", "Agosto", "Septiembre", "Octubre", "Noviembre", "Diciembre",
];

// ==========================================
// AppropriationAmounts - 拨款调整金额（列 D-I）
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppropriationAmounts {
    pub initial: Decimal,         // 初始拨款
    pub additions: Decimal,       // 追加
    pub reductions: Decimal,      // 削减
    pub credits: Decimal,         // 贷记
    pub counter_credits: Decimal, // 反贷记
    pub definitive: Decimal,      // 最终拨款
}

impl AppropriationAmounts {
    /// 由调整项计算最终拨款（溢出返回 None）
    pub fn computed_definitive(&self) -> Option<Decimal> {
        self.initial
            .checked_add(self.additions)?
            .checked_sub(self.reductions)?
            .checked_add(self.credits)?
            .checked_sub(self.counter_credits)
    }

    pub fn as_array(&self) -> [Decimal; 6] {
        [
            self.initial,
            self.additions,
            self.reductions,
            self.credits,
            self.counter_credits,
            self.definitive,
        ]
    }
}

// ==========================================
// BudgetLine - 预算行（导入输出单元）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLine {
    pub dataset: DatasetKind,
    pub fiscal_year: i32,
    pub flow_type: FlowType,
    pub category: Option<Category>,
    pub code: String,           // 可能带 "(RP:...)" 注记
    pub label: String,
    pub funding_source: String, // 由编码末段派生
    pub appropriation: AppropriationAmounts,
    pub monthly: [Decimal; 12],
    pub total: Decimal,
    pub is_subtotal: bool,
    pub source_row: u32,        // Excel 原始行号（1 起）
    pub imported_by: Option<String>,
    pub imported_at: DateTime<Utc>,
}

impl BudgetLine {
    /// 十二个月金额之和（溢出返回 None）
    pub fn monthly_sum(&self) -> Option<Decimal> {
        checked_sum(self.monthly)
    }

    /// 应用派生不变量:
    /// - total 为零 → 月度之和
    /// - definitive 为零 → initial + additions - reductions + credits - counter_credits
    ///
    /// 派生值溢出时保持为零,单元格原值原样保留
    pub fn finalize(mut self) -> Self {
        if self.total.is_zero() {
            match self.monthly_sum() {
                Some(sum) => self.total = sum,
                None => warn!(
                    row = self.source_row,
                    code = %self.code,
                    "月度金额之和溢出,合计记为 0"
                ),
            }
        }
        if self.appropriation.definitive.is_zero() {
            match self.appropriation.computed_definitive() {
                Some(definitive) => self.appropriation.definitive = definitive,
                None => warn!(
                    row = self.source_row,
                    code = %self.code,
                    "最终拨款推算溢出,记为 0"
                ),
            }
        }
        self
    }

    /// 是否为明细行
    pub fn is_detail(&self) -> bool {
        !self.is_subtotal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn sample_line() -> BudgetLine {
        BudgetLine {
            dataset: DatasetKind::Programmed,
            fiscal_year: 2026,
            flow_type: FlowType::Expense,
            category: Some(Category::Operating),
            code: "1003 - 2.1.1 - 20".to_string(),
            label: "Sueldo basico".to_string(),
            funding_source: "20".to_string(),
            appropriation: AppropriationAmounts::default(),
            monthly: [Decimal::ZERO; 12],
            total: Decimal::ZERO,
            is_subtotal: false,
            source_row: 12,
            imported_by: None,
            imported_at: Utc::now(),
        }
    }

    #[test]
    fn test_finalize_derives_total_from_months() {
        let mut line = sample_line();
        line.monthly = [dec("0.10"); 12];
        let line = line.finalize();
        assert_eq!(line.total, dec("1.20"));
    }

    #[test]
    fn test_finalize_keeps_explicit_total() {
        let mut line = sample_line();
        line.monthly = [dec("1"); 12];
        line.total = dec("99");
        assert_eq!(line.finalize().total, dec("99"));
    }

    #[test]
    fn test_finalize_derives_definitive_appropriation() {
        let mut line = sample_line();
        line.appropriation = AppropriationAmounts {
            initial: dec("1000"),
            additions: dec("200"),
            reductions: dec("50"),
            credits: dec("30"),
            counter_credits: dec("80"),
            definitive: Decimal::ZERO,
        };
        assert_eq!(line.finalize().appropriation.definitive, dec("1100"));
    }

    #[test]
    fn test_finalize_overflow_leaves_derived_fields_zero() {
        let big = dec("50000000000000000000000000000");
        let mut line = sample_line();
        line.monthly[0] = big;
        line.monthly[1] = big;
        line.appropriation.initial = big;
        line.appropriation.additions = big;

        let line = line.finalize();
        assert_eq!(line.total, Decimal::ZERO);
        assert_eq!(line.appropriation.definitive, Decimal::ZERO);
        assert_eq!(line.monthly[0], big);
        assert_eq!(line.appropriation.initial, big);
    }
}
