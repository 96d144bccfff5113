// ==========================================
// PAC 现金流计划导入系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// 说明: 数据起始行与列位置属于表格版式,不可配置
// ==========================================

use crate::config::import_config_trait::{ConfigResult, ImportConfigReader};
use crate::db::open_sqlite_connection;
use crate::domain::types::DatasetKind;
use crate::importer::row_scanner::DEFAULT_FOOTER_KEYWORDS;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

/// 默认财年
pub const DEFAULT_FISCAL_YEAR: i32 = 2026;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致,会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> ConfigResult<MutexGuard<'_, Connection>> {
        Ok(self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?)
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.get_conn()?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入配置值（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值,带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_sheet_hint(&self, dataset: DatasetKind) -> ConfigResult<Option<String>> {
        let key = config_keys::sheet_hint(dataset);
        match self.get_config_value(&key)? {
            // 显式配置为空 → 不使用提示
            Some(value) => {
                let trimmed = value.trim();
                Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
            }
            None => Ok(dataset.default_sheet_hint().map(str::to_string)),
        }
    }

    async fn get_footer_keywords(&self) -> ConfigResult<Vec<String>> {
        let defaults = || {
            DEFAULT_FOOTER_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
        };

        let value = match self.get_config_value(config_keys::FOOTER_KEYWORDS)? {
            Some(v) => v,
            None => return Ok(defaults()),
        };

        match serde_json::from_str::<Vec<String>>(&value) {
            Ok(keywords) => Ok(keywords
                .into_iter()
                .map(|k| k.trim().to_uppercase())
                .filter(|k| !k.is_empty())
                .collect()),
            Err(_) => {
                tracing::warn!(
                    config_key = config_keys::FOOTER_KEYWORDS,
                    raw_value = %value,
                    "页脚关键字配置格式错误,使用默认值"
                );
                Ok(defaults())
            }
        }
    }

    async fn get_default_fiscal_year(&self) -> ConfigResult<i32> {
        let value = self.get_config_or_default(
            config_keys::DEFAULT_FISCAL_YEAR,
            &DEFAULT_FISCAL_YEAR.to_string(),
        )?;
        Ok(value.trim().parse::<i32>().unwrap_or(DEFAULT_FISCAL_YEAR))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    use crate::domain::types::DatasetKind;

    /// 工作表提示前缀: import/sheet_hint/<DATASET_CODE>
    pub const SHEET_HINT_PREFIX: &str = "import/sheet_hint/";

    /// 页脚关键字 (JSON 字符串数组)
    pub const FOOTER_KEYWORDS: &str = "import/footer_keywords";

    /// 默认财年
    pub const DEFAULT_FISCAL_YEAR: &str = "app/default_fiscal_year";

    pub fn sheet_hint(dataset: DatasetKind) -> String {
        format!("{}{}", SHEET_HINT_PREFIX, dataset.to_db_str())
    }
}
