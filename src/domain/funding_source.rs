// ==========================================
// PAC 现金流计划导入系统 - 资金来源实体
// ==========================================
// 依据: 编码末段第一个词即资金来源名（如 "1003 - 2.1.1 - 20" → "20"）
// 职责: 登记每个财年各资金来源的已分配预算
// ==========================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 已登记的资金来源
///
/// (fiscal_year, name) 唯一; name 与 BudgetLine.funding_source 精确匹配
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingSource {
    pub fiscal_year: i32,
    pub name: String,
    pub code: String,
    pub description: String,
    pub assigned_budget: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl FundingSource {
    pub fn new(fiscal_year: i32, name: impl Into<String>, assigned_budget: Decimal) -> Self {
        Self {
            fiscal_year,
            name: name.into(),
            code: String::new(),
            description: String::new(),
            assigned_budget,
            active: true,
            created_at: Utc::now(),
        }
    }
}
