// ==========================================
// PAC 现金流计划导入系统 - 预算行 Repository 实现
// ==========================================
// 职责: budget_line 表的读写（使用 rusqlite）
// 存储: 金额一律以十进制 TEXT 存储,读回时精确还原
// 并发: 连接经 Arc<Mutex<Connection>> 共享,替换在 BEGIN IMMEDIATE 事务中执行,
//       同一键的两次导入串行化,最终结果恰为其中一次上传的记录集
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::budget_line::{AppropriationAmounts, BudgetLine, MONTH_KEYS};
use crate::domain::types::{Category, DatasetKind, FlowType};
use crate::repository::budget_line_repo::BudgetLineRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// 拨款调整列（与 AppropriationAmounts::as_array 顺序一致）
const APPROPRIATION_COLUMNS: [&str; 6] = [
    "approp_initial",
    "approp_additions",
    "approp_reductions",
    "approp_credits",
    "approp_counter_credits",
    "approp_definitive",
];

/// budget_line 列清单（不含自增 id）
fn line_columns() -> Vec<&'static str> {
    let mut cols = vec![
        "dataset",
        "fiscal_year",
        "flow_type",
        "category",
        "code",
        "label",
        "funding_source",
    ];
    cols.extend(APPROPRIATION_COLUMNS);
    cols.extend(MONTH_KEYS);
    cols.extend([
        "total",
        "is_subtotal",
        "source_row",
        "imported_by",
        "imported_at",
    ]);
    cols
}

fn decimal_value(d: Decimal) -> Value {
    Value::Text(d.to_string())
}

/// BudgetLine → 参数列表（顺序与 line_columns 一致）
fn line_values(line: &BudgetLine) -> Vec<Value> {
    let mut values = vec![
        Value::Text(line.dataset.to_db_str().to_string()),
        Value::Integer(line.fiscal_year as i64),
        Value::Text(line.flow_type.to_db_str().to_string()),
        line.category
            .map(|c| Value::Text(c.to_db_str().to_string()))
            .unwrap_or(Value::Null),
        Value::Text(line.code.clone()),
        Value::Text(line.label.clone()),
        Value::Text(line.funding_source.clone()),
    ];
    values.extend(line.appropriation.as_array().into_iter().map(decimal_value));
    values.extend(line.monthly.iter().copied().map(decimal_value));
    values.extend([
        decimal_value(line.total),
        Value::Integer(line.is_subtotal as i64),
        Value::Integer(line.source_row as i64),
        line.imported_by
            .clone()
            .map(Value::Text)
            .unwrap_or(Value::Null),
        Value::Text(line.imported_at.to_rfc3339()),
    ]);
    values
}

fn read_decimal(row: &Row, column: &str) -> RepositoryResult<Decimal> {
    let raw: String = row.get(column)?;
    Decimal::from_str(&raw).map_err(|e| RepositoryError::field(column, e.to_string()))
}

/// 数据库行 → BudgetLine
fn map_line(row: &Row) -> RepositoryResult<BudgetLine> {
    let dataset_raw: String = row.get("dataset")?;
    let dataset = DatasetKind::from_db_str(&dataset_raw)
        .ok_or_else(|| RepositoryError::field("dataset", dataset_raw.clone()))?;

    let flow_raw: String = row.get("flow_type")?;
    let flow_type = FlowType::from_db_str(&flow_raw)
        .ok_or_else(|| RepositoryError::field("flow_type", flow_raw.clone()))?;

    let category = match row.get::<_, Option<String>>("category")? {
        Some(raw) => Some(
            Category::from_db_str(&raw).ok_or_else(|| RepositoryError::field("category", raw))?,
        ),
        None => None,
    };

    let appropriation = AppropriationAmounts {
        initial: read_decimal(row, APPROPRIATION_COLUMNS[0])?,
        additions: read_decimal(row, APPROPRIATION_COLUMNS[1])?,
        reductions: read_decimal(row, APPROPRIATION_COLUMNS[2])?,
        credits: read_decimal(row, APPROPRIATION_COLUMNS[3])?,
        counter_credits: read_decimal(row, APPROPRIATION_COLUMNS[4])?,
        definitive: read_decimal(row, APPROPRIATION_COLUMNS[5])?,
    };

    let mut monthly = [Decimal::ZERO; 12];
    for (slot, key) in monthly.iter_mut().zip(MONTH_KEYS) {
        *slot = read_decimal(row, key)?;
    }

    let imported_at_raw: String = row.get("imported_at")?;
    let imported_at = DateTime::parse_from_rfc3339(&imported_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::field("imported_at", e.to_string()))?;

    Ok(BudgetLine {
        dataset,
        fiscal_year: row.get("fiscal_year")?,
        flow_type,
        category,
        code: row.get("code")?,
        label: row.get("label")?,
        funding_source: row.get("funding_source")?,
        appropriation,
        monthly,
        total: read_decimal(row, "total")?,
        is_subtotal: row.get::<_, i64>("is_subtotal")? != 0,
        source_row: row.get("source_row")?,
        imported_by: row.get("imported_by")?,
        imported_at,
    })
}

// ==========================================
// BudgetLineRepositoryImpl
// ==========================================
pub struct BudgetLineRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl BudgetLineRepositoryImpl {
    /// 基于共享连接创建
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 打开数据库文件创建
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在事务中批量插入
    fn insert_lines_tx(tx: &Transaction, lines: &[BudgetLine]) -> RepositoryResult<usize> {
        let columns = line_columns();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO budget_line ({}) VALUES ({})",
            columns.join(", "),
            placeholders
        );
        let mut stmt = tx.prepare(&sql)?;

        let mut count = 0;
        for line in lines {
            stmt.execute(params_from_iter(line_values(line)))?;
            count += 1;
        }
        Ok(count)
    }
}

#[async_trait]
impl BudgetLineRepository for BudgetLineRepositoryImpl {
    async fn replace_dataset(
        &self,
        dataset: DatasetKind,
        fiscal_year: i32,
        lines: Vec<BudgetLine>,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let deleted = tx.execute(
            "DELETE FROM budget_line WHERE dataset = ?1 AND fiscal_year = ?2",
            params![dataset.to_db_str(), fiscal_year],
        )?;
        let inserted = Self::insert_lines_tx(&tx, &lines)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        debug!(
            dataset = %dataset,
            fiscal_year,
            deleted,
            inserted,
            "数据集记录已替换"
        );
        Ok(inserted)
    }

    async fn list_lines(
        &self,
        dataset: DatasetKind,
        fiscal_year: i32,
    ) -> RepositoryResult<Vec<BudgetLine>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM budget_line WHERE dataset = ?1 AND fiscal_year = ?2 \
             ORDER BY source_row, id",
            line_columns().join(", ")
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params![dataset.to_db_str(), fiscal_year])?;

        let mut lines = Vec::new();
        while let Some(row) = rows.next()? {
            lines.push(map_line(row)?);
        }
        Ok(lines)
    }

    async fn count_lines(&self, dataset: DatasetKind, fiscal_year: i32) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM budget_line WHERE dataset = ?1 AND fiscal_year = ?2",
            params![dataset.to_db_str(), fiscal_year],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    async fn delete_dataset(
        &self,
        dataset: DatasetKind,
        fiscal_year: i32,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let deleted = conn.execute(
            "DELETE FROM budget_line WHERE dataset = ?1 AND fiscal_year = ?2",
            params![dataset.to_db_str(), fiscal_year],
        )?;
        Ok(deleted)
    }
}
