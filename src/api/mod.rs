// ==========================================
// PAC 现金流计划导入系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行调用
// ==========================================

pub mod error;
pub mod import_api;
pub mod report_api;
pub mod validator;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{DatasetImportResult, ImportApi, ImportApiResponse};
pub use report_api::{ReportApi, TrackingReport};
pub use validator::{
    parse_budget, parse_dataset, parse_flow, validate_actor, validate_fiscal_year,
    validate_source_name,
};
