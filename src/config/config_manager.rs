// ==========================================
// 发票导入系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config::{CommitPolicy, MalformedRowPolicy, SheetScope};
use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

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
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等），并确保 config_kv 表存在。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
            guard.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS config_kv (
                    scope_id TEXT NOT NULL,
                    key TEXT NOT NULL,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                    PRIMARY KEY (scope_id, key)
                );
                "#,
            )?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
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

    /// 写入配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置
    pub fn list_config_values(&self) -> RepositoryResult<HashMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut config_map = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }

    /// 读取并解析枚举型配置；缺失用默认值，无法识别时告警并用默认值
    fn get_enum_or_default<T: Copy + Default>(
        &self,
        key: &str,
        parse: fn(&str) -> Option<T>,
    ) -> RepositoryResult<T> {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(T::default());
        };

        match parse(&raw) {
            Some(value) => Ok(value),
            None => {
                warn!(config_key = key, raw_value = %raw, "配置值无法识别，使用默认值");
                Ok(T::default())
            }
        }
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
impl ImportConfigReader for ConfigManager {
    fn get_commit_policy(&self) -> RepositoryResult<CommitPolicy> {
        self.get_enum_or_default(config_keys::COMMIT_POLICY, CommitPolicy::parse)
    }

    fn get_malformed_row_policy(&self) -> RepositoryResult<MalformedRowPolicy> {
        self.get_enum_or_default(config_keys::MALFORMED_ROW_POLICY, MalformedRowPolicy::parse)
    }

    fn get_sheet_scope(&self) -> RepositoryResult<SheetScope> {
        self.get_enum_or_default(config_keys::SHEET_SCOPE, SheetScope::parse)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const COMMIT_POLICY: &str = "import/commit_policy";
    pub const MALFORMED_ROW_POLICY: &str = "import/malformed_row_policy";
    pub const SHEET_SCOPE: &str = "import/sheet_scope";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportConfig;

    fn in_memory_manager() -> ConfigManager {
        let conn = crate::db::open_in_memory_connection().unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let manager = in_memory_manager();
        assert_eq!(manager.load_import_config().unwrap(), ImportConfig::default());
    }

    #[test]
    fn test_overrides_are_applied() {
        let manager = in_memory_manager();
        manager
            .set_config_value(config_keys::COMMIT_POLICY, "BEST_EFFORT")
            .unwrap();
        manager
            .set_config_value(config_keys::MALFORMED_ROW_POLICY, "skip")
            .unwrap();
        manager.set_config_value(config_keys::SHEET_SCOPE, "FIRST").unwrap();

        let config = manager.load_import_config().unwrap();
        assert_eq!(config.commit_policy, CommitPolicy::BestEffort);
        assert_eq!(config.malformed_row_policy, MalformedRowPolicy::Skip);
        assert_eq!(config.sheet_scope, SheetScope::First);
    }

    #[test]
    fn test_unknown_value_uses_default() {
        let manager = in_memory_manager();
        manager
            .set_config_value(config_keys::COMMIT_POLICY, "whenever")
            .unwrap();
        assert_eq!(manager.get_commit_policy().unwrap(), CommitPolicy::AllOrNothing);
    }

    #[test]
    fn test_set_config_value_upserts() {
        let manager = in_memory_manager();
        manager.set_config_value(config_keys::SHEET_SCOPE, "FIRST").unwrap();
        manager.set_config_value(config_keys::SHEET_SCOPE, "ALL").unwrap();

        let values = manager.list_config_values().unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values.get(config_keys::SHEET_SCOPE).map(String::as_str), Some("ALL"));
    }
}
