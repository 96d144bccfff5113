// ==========================================
// PAC 现金流计划导入系统 - 导入器实现
// ==========================================
// 职责: 整合导入流程,从工作簿到数据库
// 流程: 读表 → 逐行扫描分类 → 整体替换落库 → 批次留痕
// 红线: 读表失败时不得触碰任何已存数据
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::import_batch::{ImportBatch, ImportOutcome};
use crate::domain::types::DatasetKind;
use crate::importer::budget_importer_trait::{BudgetImporter, RowClassifier, WorkbookReader};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::row_scanner::{scan_sheet, ScanContext};
use crate::importer::sheet::SheetGrid;
use crate::repository::{BudgetLineRepository, ImportBatchRepository};
use chrono::Utc;
use futures::future::join_all;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 同一工作簿中批量导入的数据集（初始拨款单独成册）
pub const WORKBOOK_DATASETS: [DatasetKind; 3] = [
    DatasetKind::Programmed,
    DatasetKind::Committed,
    DatasetKind::Paid,
];

// ==========================================
// BudgetImporterImpl - 导入器实现
// ==========================================
pub struct BudgetImporterImpl<R, B, C>
where
    R: BudgetLineRepository,
    B: ImportBatchRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    line_repo: R,
    batch_repo: B,

    // 配置读取器
    config: C,

    // 导入组件
    reader: Box<dyn WorkbookReader>,
    classifier: Box<dyn RowClassifier>,
}

impl<R, B, C> BudgetImporterImpl<R, B, C>
where
    R: BudgetLineRepository,
    B: ImportBatchRepository,
    C: ImportConfigReader,
{
    /// 创建导入器
    ///
    /// # 参数
    /// - line_repo: 预算行仓储
    /// - batch_repo: 导入批次仓储
    /// - config: 配置读取器
    /// - reader: 工作簿读取器
    /// - classifier: 行分类器
    pub fn new(
        line_repo: R,
        batch_repo: B,
        config: C,
        reader: Box<dyn WorkbookReader>,
        classifier: Box<dyn RowClassifier>,
    ) -> Self {
        Self {
            line_repo,
            batch_repo,
            config,
            reader,
            classifier,
        }
    }

    fn config_error(key: &str, err: impl std::fmt::Display) -> ImportError {
        ImportError::ConfigReadError {
            key: key.to_string(),
            message: err.to_string(),
        }
    }

    /// 扫描 → 替换 → 留痕
    async fn ingest(
        &self,
        grid: &SheetGrid,
        fiscal_year: i32,
        dataset: DatasetKind,
        actor: &str,
        file_name: Option<String>,
        started: Instant,
    ) -> ImportResult<ImportOutcome> {
        let batch_id = Uuid::new_v4().to_string();
        info!(
            batch_id = %batch_id,
            dataset = %dataset,
            fiscal_year,
            sheet = %grid.name(),
            "开始导入数据集"
        );

        let footer_keywords = self
            .config
            .get_footer_keywords()
            .await
            .map_err(|e| Self::config_error("import/footer_keywords", e))?;

        // === 步骤 1: 逐行扫描分类 ===
        debug!("步骤 1: 逐行扫描分类");
        let actor = actor.trim();
        let ctx = ScanContext {
            fiscal_year,
            dataset,
            actor: (!actor.is_empty()).then_some(actor),
            footer_keywords: &footer_keywords,
        };
        let outcome = scan_sheet(grid, self.classifier.as_ref(), &ctx);
        let stats = outcome.stats;
        debug!(
            rows_scanned = stats.rows_scanned,
            emitted = stats.emitted,
            skipped = stats.skipped_total(),
            "扫描完成"
        );

        // === 步骤 2: 整体替换落库 ===
        debug!("步骤 2: 整体替换 (dataset, fiscal_year)");
        let inserted = self
            .line_repo
            .replace_dataset(dataset, fiscal_year, outcome.lines)
            .await
            .map_err(|e| {
                error!(batch_id = %batch_id, error = %e, "数据落库失败,已回滚");
                e
            })?;

        // === 步骤 3: 批次留痕 ===
        // 数据已提交; 留痕失败只告警,不改变导入结果
        let elapsed = started.elapsed();
        let batch = ImportBatch {
            batch_id: batch_id.clone(),
            dataset,
            fiscal_year,
            file_name,
            sheet_name: Some(grid.name().to_string()),
            record_count: inserted as i32,
            imported_at: Utc::now(),
            imported_by: ctx.actor.map(str::to_string),
            elapsed_ms: Some(elapsed.as_millis() as i64),
            note: Some(format!(
                "rows_scanned={} skipped={}",
                stats.rows_scanned,
                stats.skipped_total()
            )),
        };
        if let Err(e) = self.batch_repo.insert_batch(&batch).await {
            warn!(
                batch_id = %batch_id,
                dataset = %dataset,
                fiscal_year,
                error = %e,
                "批次日志写入失败,数据已替换"
            );
        }

        info!(
            batch_id = %batch_id,
            dataset = %dataset,
            fiscal_year,
            records = inserted,
            skipped = stats.skipped_total(),
            elapsed_ms = elapsed.as_millis() as u64,
            "导入完成"
        );

        Ok(ImportOutcome {
            batch,
            stats,
            elapsed_time: elapsed,
        })
    }
}

#[async_trait::async_trait]
impl<R, B, C> BudgetImporter for BudgetImporterImpl<R, B, C>
where
    R: BudgetLineRepository + Send + Sync,
    B: ImportBatchRepository + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, file_path, actor, sheet_hint))]
    async fn import_file(
        &self,
        file_path: &Path,
        fiscal_year: i32,
        dataset: DatasetKind,
        actor: &str,
        sheet_hint: Option<&str>,
    ) -> ImportResult<ImportOutcome> {
        let started = Instant::now();

        let hint = match sheet_hint {
            Some(h) => Some(h.to_string()),
            None => self
                .config
                .get_sheet_hint(dataset)
                .await
                .map_err(|e| Self::config_error("import/sheet_hint", e))?,
        };

        // 读表在任何写操作之前
        let grid = self
            .reader
            .read_sheet(file_path, hint.as_deref())
            .map_err(|e| {
                error!(file = %file_path.display(), error = %e, "工作簿读取失败");
                e
            })?;

        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string());
        self.ingest(&grid, fiscal_year, dataset, actor, file_name, started)
            .await
    }

    async fn import_grid(
        &self,
        grid: &SheetGrid,
        fiscal_year: i32,
        dataset: DatasetKind,
        actor: &str,
    ) -> ImportResult<ImportOutcome> {
        self.ingest(grid, fiscal_year, dataset, actor, None, Instant::now())
            .await
    }

    async fn import_workbook_all(
        &self,
        file_path: &Path,
        fiscal_year: i32,
        actor: &str,
    ) -> Vec<(DatasetKind, Result<ImportOutcome, String>)> {
        info!(file = %file_path.display(), fiscal_year, "开始批量导入工作簿");

        let tasks = WORKBOOK_DATASETS.iter().map(|&dataset| async move {
            let result = self
                .import_file(file_path, fiscal_year, dataset, actor, None)
                .await
                .map_err(|e| e.to_string());
            (dataset, result)
        });
        let results = join_all(tasks).await;

        let succeeded = results.iter().filter(|(_, r)| r.is_ok()).count();
        info!(
            total = results.len(),
            succeeded,
            failed = results.len() - succeeded,
            "批量导入完成"
        );
        results
    }
}
