// ==========================================
// PAC 现金流计划导入系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + calamine
// 系统定位: 年度现金流计划 (PAC) 工作簿的行分类与导入引擎
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 下游汇总
pub mod engine;

// 导入层 - 工作簿读取与行分类
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Category, DatasetKind, FlowType, SectionState};

// 领域实体
pub use domain::{
    AppropriationAmounts, BudgetLine, FundingSource, ImportBatch, ImportOutcome, ScanStats,
};

// 导入
pub use importer::{BudgetImporter, BudgetImporterImpl, SectionStateMachine};

// 引擎
pub use engine::{FundingSourceEngine, OverviewEngine, SummaryEngine, TrackingEngine};

// API
pub use api::{ImportApi, ReportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "PAC 现金流计划导入系统";
