// ==========================================
// 发票导入系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::import_config::{CommitPolicy, ImportConfig, MalformedRowPolicy, SheetScope};
use crate::repository::error::RepositoryResult;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait ImportConfigReader {
    /// 获取事务策略
    ///
    /// # 默认值
    /// - ALL_OR_NOTHING
    fn get_commit_policy(&self) -> RepositoryResult<CommitPolicy>;

    /// 获取坏行策略
    ///
    /// # 默认值
    /// - ABORT
    fn get_malformed_row_policy(&self) -> RepositoryResult<MalformedRowPolicy>;

    /// 获取工作表范围
    ///
    /// # 默认值
    /// - ALL
    fn get_sheet_scope(&self) -> RepositoryResult<SheetScope>;

    /// 汇总为一次导入运行的完整配置
    fn load_import_config(&self) -> RepositoryResult<ImportConfig> {
        Ok(ImportConfig {
            commit_policy: self.get_commit_policy()?,
            malformed_row_policy: self.get_malformed_row_policy()?,
            sheet_scope: self.get_sheet_scope()?,
        })
    }
}
