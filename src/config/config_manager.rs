// ==========================================
// 员工假期追踪系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope, 当前仅 global)
// ==========================================

use crate::config::config_reader::TrackerConfigReader;
use crate::db::{configure_sqlite_connection, initialize_schema, open_sqlite_connection};
use crate::repository::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// 配置键
pub mod config_keys {
    pub const IMPORT_UPDATE_EXISTING: &str = "import.update_existing";
    pub const IMPORT_ERROR_SUMMARY_LIMIT: &str = "import.error_summary_limit";
    pub const APP_LOCALE: &str = "app.locale";
}

pub const DEFAULT_UPDATE_EXISTING: bool = true;
pub const DEFAULT_ERROR_SUMMARY_LIMIT: usize = 10;
pub const DEFAULT_LOCALE: &str = "en";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = %key, value = %value, "配置已更新");
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        serde_json::to_string(&json!(config_map))
            .map_err(|e| RepositoryError::InternalError(e.to_string()))
    }
}

// ==========================================
// TrackerConfigReader Trait 实现
// ==========================================
#[async_trait]
impl TrackerConfigReader for ConfigManager {
    async fn get_update_existing(&self) -> RepositoryResult<bool> {
        let value = self.get_config_or_default(
            config_keys::IMPORT_UPDATE_EXISTING,
            if DEFAULT_UPDATE_EXISTING { "true" } else { "false" },
        )?;
        Ok(match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => {
                tracing::warn!(
                    config_key = config_keys::IMPORT_UPDATE_EXISTING,
                    raw_value = %value,
                    "配置值格式错误，使用默认值"
                );
                DEFAULT_UPDATE_EXISTING
            }
        })
    }

    async fn get_error_summary_limit(&self) -> RepositoryResult<usize> {
        let value = self.get_config_or_default(
            config_keys::IMPORT_ERROR_SUMMARY_LIMIT,
            &DEFAULT_ERROR_SUMMARY_LIMIT.to_string(),
        )?;
        Ok(value.trim().parse::<usize>().unwrap_or(DEFAULT_ERROR_SUMMARY_LIMIT))
    }

    async fn get_locale(&self) -> RepositoryResult<String> {
        self.get_config_or_default(config_keys::APP_LOCALE, DEFAULT_LOCALE)
    }
}
