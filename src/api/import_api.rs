// ==========================================
// PAC 现金流计划导入系统 - 导入API
// ==========================================
// 职责: 封装导入/清除/批次查询,校验入参并转换错误
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{validate_actor, validate_fiscal_year};
use crate::config::ConfigManager;
use crate::domain::import_batch::{ImportBatch, ImportOutcome, ScanStats};
use crate::domain::types::DatasetKind;
use crate::importer::{
    BudgetImporter, BudgetImporterImpl, SectionStateMachine, UniversalWorkbookReader,
};
use crate::repository::{
    BudgetLineRepository, BudgetLineRepositoryImpl, ImportBatchRepository,
    ImportBatchRepositoryImpl,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

type DefaultImporter =
    BudgetImporterImpl<BudgetLineRepositoryImpl, ImportBatchRepositoryImpl, ConfigManager>;

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 批次ID
    pub batch_id: String,
    pub dataset: DatasetKind,
    pub fiscal_year: i32,
    /// 实际读取的工作表
    pub sheet_name: Option<String>,
    /// 写入记录数
    pub imported: usize,
    /// 跳过行数（空行/页脚/无内容/分节标题）
    pub skipped: usize,
    /// 扫描统计明细
    pub stats: ScanStats,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

impl From<ImportOutcome> for ImportApiResponse {
    fn from(outcome: ImportOutcome) -> Self {
        Self {
            imported: outcome.record_count(),
            skipped: outcome.stats.skipped_total(),
            elapsed_ms: outcome.elapsed_time.as_millis() as i64,
            stats: outcome.stats,
            batch_id: outcome.batch.batch_id,
            dataset: outcome.batch.dataset,
            fiscal_year: outcome.batch.fiscal_year,
            sheet_name: outcome.batch.sheet_name,
        }
    }
}

/// 多数据集导入中单个数据集的结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetImportResult {
    pub dataset: DatasetKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ImportApiResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 导入API
pub struct ImportApi {
    conn: Arc<Mutex<Connection>>,
}

impl ImportApi {
    /// 基于共享连接创建（所有导入经同一连接串行落库）
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 打开数据库文件并初始化表结构
    pub fn open(db_path: &str) -> ApiResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        crate::db::init_schema(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    fn create_importer(&self) -> ApiResult<DefaultImporter> {
        let config = ConfigManager::from_connection(self.conn.clone())
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        Ok(BudgetImporterImpl::new(
            BudgetLineRepositoryImpl::new(self.conn.clone()),
            ImportBatchRepositoryImpl::new(self.conn.clone()),
            config,
            Box::new(UniversalWorkbookReader),
            Box::new(SectionStateMachine::new()),
        ))
    }

    /// 导入单个数据集
    ///
    /// # 参数
    /// - file_path: 工作簿路径
    /// - dataset: 目标数据集
    /// - fiscal_year: 财年（2000..=2100）
    /// - actor: 操作人（不能为空）
    /// - sheet_hint: 工作表名称提示（None → 使用配置值）
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 导入结果
    /// - Err(ApiError): 工作簿不可读时已存数据保持不变
    pub async fn import_file(
        &self,
        file_path: &str,
        dataset: DatasetKind,
        fiscal_year: i32,
        actor: &str,
        sheet_hint: Option<&str>,
    ) -> ApiResult<ImportApiResponse> {
        validate_fiscal_year(fiscal_year)?;
        validate_actor(actor)?;
        if file_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("文件路径不能为空".to_string()));
        }

        let importer = self.create_importer()?;
        let outcome = importer
            .import_file(Path::new(file_path), fiscal_year, dataset, actor, sheet_hint)
            .await?;
        Ok(outcome.into())
    }

    /// 从同一工作簿导入 计划/承诺/支付 三个数据集
    pub async fn import_all(
        &self,
        file_path: &str,
        fiscal_year: i32,
        actor: &str,
    ) -> ApiResult<Vec<DatasetImportResult>> {
        validate_fiscal_year(fiscal_year)?;
        validate_actor(actor)?;

        let importer = self.create_importer()?;
        let results = importer
            .import_workbook_all(Path::new(file_path), fiscal_year, actor)
            .await;

        Ok(results
            .into_iter()
            .map(|(dataset, result)| match result {
                Ok(outcome) => DatasetImportResult {
                    dataset,
                    result: Some(outcome.into()),
                    error: None,
                },
                Err(message) => {
                    warn!(dataset = %dataset, error = %message, "数据集导入失败");
                    DatasetImportResult {
                        dataset,
                        result: None,
                        error: Some(message),
                    }
                }
            })
            .collect())
    }

    /// 清除 (dataset, fiscal_year) 的全部记录
    pub async fn clear_dataset(
        &self,
        dataset: DatasetKind,
        fiscal_year: i32,
        actor: &str,
    ) -> ApiResult<usize> {
        validate_fiscal_year(fiscal_year)?;
        validate_actor(actor)?;

        let repo = BudgetLineRepositoryImpl::new(self.conn.clone());
        let deleted = repo.delete_dataset(dataset, fiscal_year).await?;
        info!(dataset = %dataset, fiscal_year, deleted, actor = %actor, "数据集已清除");
        Ok(deleted)
    }

    /// 最近的导入批次（limit 限制在 1..=100）
    pub async fn list_batches(&self, limit: usize) -> ApiResult<Vec<ImportBatch>> {
        let repo = ImportBatchRepositoryImpl::new(self.conn.clone());
        Ok(repo.list_recent_batches(limit.clamp(1, 100)).await?)
    }
}
