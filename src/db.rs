// ==========================================
// PAC 现金流计划导入系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout,减少并发导入时的偶发 busy 错误
// - 建表（幂等）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前 schema 版本
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "PAC_INGEST_DB_PATH";

/// 默认数据库文件名
pub const DB_FILE_NAME: &str = "pac_ingest.db";

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS budget_line (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    dataset TEXT NOT NULL,
    fiscal_year INTEGER NOT NULL,
    flow_type TEXT NOT NULL,
    category TEXT,
    code TEXT NOT NULL DEFAULT '',
    label TEXT NOT NULL DEFAULT '',
    funding_source TEXT NOT NULL DEFAULT '',
    approp_initial TEXT NOT NULL DEFAULT '0',
    approp_additions TEXT NOT NULL DEFAULT '0',
    approp_reductions TEXT NOT NULL DEFAULT '0',
    approp_credits TEXT NOT NULL DEFAULT '0',
    approp_counter_credits TEXT NOT NULL DEFAULT '0',
    approp_definitive TEXT NOT NULL DEFAULT '0',
    enero TEXT NOT NULL DEFAULT '0',
    febrero TEXT NOT NULL DEFAULT '0',
    marzo TEXT NOT NULL DEFAULT '0',
    abril TEXT NOT NULL DEFAULT '0',
    mayo TEXT NOT NULL DEFAULT '0',
    junio TEXT NOT NULL DEFAULT '0',
    julio TEXT NOT NULL DEFAULT '0',
    agosto TEXT NOT NULL DEFAULT '0',
    septiembre TEXT NOT NULL DEFAULT '0',
    octubre TEXT NOT NULL DEFAULT '0',
    noviembre TEXT NOT NULL DEFAULT '0',
    diciembre TEXT NOT NULL DEFAULT '0',
    total TEXT NOT NULL DEFAULT '0',
    is_subtotal INTEGER NOT NULL DEFAULT 0,
    source_row INTEGER NOT NULL,
    imported_by TEXT,
    imported_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_budget_line_key
    ON budget_line (dataset, fiscal_year, source_row);

CREATE TABLE IF NOT EXISTS import_batch (
    batch_id TEXT PRIMARY KEY,
    dataset TEXT NOT NULL,
    fiscal_year INTEGER NOT NULL,
    file_name TEXT,
    sheet_name TEXT,
    record_count INTEGER NOT NULL DEFAULT 0,
    imported_at TEXT NOT NULL,
    imported_by TEXT,
    elapsed_ms INTEGER,
    note TEXT
);

CREATE TABLE IF NOT EXISTS funding_source (
    fiscal_year INTEGER NOT NULL,
    name TEXT NOT NULL,
    code TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    assigned_budget TEXT NOT NULL DEFAULT '0',
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    PRIMARY KEY (fiscal_year, name)
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表并登记 schema 版本（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    if read_schema_version(conn)?.is_none() {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [CURRENT_SCHEMA_VERSION],
        )?;
    }
    Ok(())
}

/// 读取 schema_version（若表不存在或为空则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 默认数据库路径
///
/// 优先级: 环境变量 PAC_INGEST_DB_PATH > <data_dir>/pac-ingest/pac_ingest.db > ./pac_ingest.db
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    if let Some(data_dir) = dirs::data_dir() {
        let app_dir = data_dir.join("pac-ingest");
        if std::fs::create_dir_all(&app_dir).is_ok() {
            return app_dir.join(DB_FILE_NAME).to_string_lossy().to_string();
        }
    }

    PathBuf::from(DB_FILE_NAME).to_string_lossy().to_string()
}
