// ==========================================
// PAC 现金流计划导入系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化
// ==========================================

pub mod budget_line_repo;
pub mod budget_line_repo_impl;
pub mod error;
pub mod funding_source_repo;
pub mod import_batch_repo;

// 重导出核心仓储
pub use budget_line_repo::BudgetLineRepository;
pub use budget_line_repo_impl::BudgetLineRepositoryImpl;
pub use error::{RepositoryError, RepositoryResult};
pub use funding_source_repo::{FundingSourceRepository, FundingSourceRepositoryImpl};
pub use import_batch_repo::{ImportBatchRepository, ImportBatchRepositoryImpl};
