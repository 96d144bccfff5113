// ==========================================
// PAC 现金流计划导入系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含分类逻辑
// ==========================================

pub mod amount;
pub mod budget_line;
pub mod funding_source;
pub mod import_batch;
pub mod types;

// 重导出核心类型
pub use budget_line::{AppropriationAmounts, BudgetLine, MONTH_KEYS, MONTH_NAMES};
pub use funding_source::FundingSource;
pub use import_batch::{ImportBatch, ImportOutcome, ScanOutcome, ScanStats};
pub use types::{Category, DatasetKind, FlowType, SectionState};
