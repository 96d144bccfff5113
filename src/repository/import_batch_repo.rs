// ==========================================
// PAC 现金流计划导入系统 - 导入批次数据仓储
// ==========================================
// 对齐: import_batch 表
// 红线: 每次成功导入必须留痕
// ==========================================

use crate::domain::import_batch::ImportBatch;
use crate::domain::types::DatasetKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// ImportBatchRepository Trait
// ==========================================
#[async_trait]
pub trait ImportBatchRepository: Send + Sync {
    /// 写入批次日志
    async fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()>;

    /// 最近的批次（按导入时间倒序）
    async fn list_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>>;
}

fn map_batch(row: &Row) -> RepositoryResult<ImportBatch> {
    let dataset_raw: String = row.get("dataset")?;
    let dataset = DatasetKind::from_db_str(&dataset_raw)
        .ok_or_else(|| RepositoryError::field("dataset", dataset_raw.clone()))?;

    let imported_at_raw: String = row.get("imported_at")?;
    let imported_at = DateTime::parse_from_rfc3339(&imported_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::field("imported_at", e.to_string()))?;

    Ok(ImportBatch {
        batch_id: row.get("batch_id")?,
        dataset,
        fiscal_year: row.get("fiscal_year")?,
        file_name: row.get("file_name")?,
        sheet_name: row.get("sheet_name")?,
        record_count: row.get("record_count")?,
        imported_at,
        imported_by: row.get("imported_by")?,
        elapsed_ms: row.get("elapsed_ms")?,
        note: row.get("note")?,
    })
}

// ==========================================
// ImportBatchRepositoryImpl
// ==========================================
pub struct ImportBatchRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ImportBatchRepositoryImpl {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

#[async_trait]
impl ImportBatchRepository for ImportBatchRepositoryImpl {
    async fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, dataset, fiscal_year, file_name, sheet_name,
                record_count, imported_at, imported_by, elapsed_ms, note
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                batch.batch_id,
                batch.dataset.to_db_str(),
                batch.fiscal_year,
                batch.file_name,
                batch.sheet_name,
                batch.record_count,
                batch.imported_at.to_rfc3339(),
                batch.imported_by,
                batch.elapsed_ms,
                batch.note,
            ],
        )?;
        Ok(())
    }

    async fn list_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, dataset, fiscal_year, file_name, sheet_name,
                   record_count, imported_at, imported_by, elapsed_ms, note
            FROM import_batch
            ORDER BY imported_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )?;
        let mut rows = stmt.query(params![limit as i64])?;

        let mut batches = Vec::new();
        while let Some(row) = rows.next()? {
            batches.push(map_batch(row)?);
        }
        Ok(batches)
    }
}
