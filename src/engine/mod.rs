// ==========================================
// PAC 现金流计划导入系统 - 引擎层
// ==========================================
// 职责: 基于已存预算行的下游汇总与执行跟踪
// 红线: Engine 不拼 SQL,只处理内存中的预算行
// ==========================================

pub mod funding;
pub mod overview;
pub mod summary;
pub mod tracking;

// 重导出核心引擎
pub use funding::{FundingInputs, FundingMonth, FundingSourceEngine, FundingSourceReport};
pub use overview::{
    CategoryOverview, ExecutionOverview, MonthOverview, OverviewEngine, OverviewInputs,
};
pub use summary::{counts_toward_totals, CategoryTotal, DatasetSummary, SummaryEngine};
pub use tracking::{
    execution_pct, CategoryTracking, ItemTracking, MonthComparison, TrackingEngine,
};
