// ==========================================
// 发票导入系统 - 配置层
// ==========================================
// 职责: 导入行为配置（事务策略/坏行策略/工作表范围）
// 存储: config_kv 表 (scope_id='global')，缺省值见 ImportConfig::default
// ==========================================

pub mod config_manager;
pub mod import_config;
pub mod import_config_trait;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager};
pub use import_config::{CommitPolicy, ImportConfig, MalformedRowPolicy, SheetScope};
pub use import_config_trait::ImportConfigReader;
