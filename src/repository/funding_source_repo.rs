// ==========================================
// PAC 现金流计划导入系统 - 资金来源数据仓储
// ==========================================
// 对齐: funding_source 表,主键 (fiscal_year, name)
// 红线: 已分配预算以 Decimal 文本存储
// ==========================================

use crate::domain::funding_source::FundingSource;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// FundingSourceRepository Trait
// ==========================================
#[async_trait]
pub trait FundingSourceRepository: Send + Sync {
    /// 登记或更新资金来源（保留首次登记时间）
    async fn upsert_source(&self, source: &FundingSource) -> RepositoryResult<()>;

    /// 某财年的资金来源（按名称排序）
    async fn list_sources(&self, fiscal_year: i32) -> RepositoryResult<Vec<FundingSource>>;

    async fn find_source(
        &self,
        fiscal_year: i32,
        name: &str,
    ) -> RepositoryResult<Option<FundingSource>>;

    /// 删除资金来源; 返回是否存在
    async fn delete_source(&self, fiscal_year: i32, name: &str) -> RepositoryResult<bool>;
}

const SELECT_COLUMNS: &str =
    "fiscal_year, name, code, description, assigned_budget, active, created_at";

fn map_source(row: &Row) -> RepositoryResult<FundingSource> {
    let budget_raw: String = row.get("assigned_budget")?;
    let assigned_budget = Decimal::from_str(&budget_raw)
        .map_err(|e| RepositoryError::field("assigned_budget", e.to_string()))?;

    let created_at_raw: String = row.get("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::field("created_at", e.to_string()))?;

    Ok(FundingSource {
        fiscal_year: row.get("fiscal_year")?,
        name: row.get("name")?,
        code: row.get("code")?,
        description: row.get("description")?,
        assigned_budget,
        active: row.get::<_, i64>("active")? != 0,
        created_at,
    })
}

// ==========================================
// FundingSourceRepositoryImpl
// ==========================================
pub struct FundingSourceRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl FundingSourceRepositoryImpl {
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
impl FundingSourceRepository for FundingSourceRepositoryImpl {
    async fn upsert_source(&self, source: &FundingSource) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO funding_source (
                fiscal_year, name, code, description, assigned_budget, active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(fiscal_year, name) DO UPDATE SET
                code = excluded.code,
                description = excluded.description,
                assigned_budget = excluded.assigned_budget,
                active = excluded.active
            "#,
            params![
                source.fiscal_year,
                source.name,
                source.code,
                source.description,
                source.assigned_budget.to_string(),
                source.active as i64,
                source.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn list_sources(&self, fiscal_year: i32) -> RepositoryResult<Vec<FundingSource>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM funding_source WHERE fiscal_year = ?1 ORDER BY name",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params![fiscal_year])?;

        let mut sources = Vec::new();
        while let Some(row) = rows.next()? {
            sources.push(map_source(row)?);
        }
        Ok(sources)
    }

    async fn find_source(
        &self,
        fiscal_year: i32,
        name: &str,
    ) -> RepositoryResult<Option<FundingSource>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM funding_source WHERE fiscal_year = ?1 AND name = ?2",
            SELECT_COLUMNS
        );
        conn.query_row(&sql, params![fiscal_year, name], |row| Ok(map_source(row)))
            .optional()?
            .transpose()
    }

    async fn delete_source(&self, fiscal_year: i32, name: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let deleted = conn.execute(
            "DELETE FROM funding_source WHERE fiscal_year = ?1 AND name = ?2",
            params![fiscal_year, name],
        )?;
        Ok(deleted > 0)
    }
}
