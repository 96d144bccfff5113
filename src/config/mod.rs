// ==========================================
// PAC 现金流计划导入系统 - 配置层
// ==========================================
// 职责: 系统配置管理,缺省值兜底
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, DEFAULT_FISCAL_YEAR};
pub use import_config_trait::{ConfigResult, ImportConfigReader};
