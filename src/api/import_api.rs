// ==========================================
// 发票导入API
// ==========================================
// 职责: 组装 配置 + 存储 + 导入器，对外提供异步导入入口
// 线程模型: 导入本身是同步阻塞的，经 spawn_blocking 在阻塞线程池执行
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{config_keys, ConfigManager, ImportConfig, ImportConfigReader};
use crate::domain::invoice::ImportSummary;
use crate::importer::InvoiceImporter;
use crate::repository::SqliteInvoiceStore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, instrument};

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 导入的文件路径
    pub file_path: String,
    /// 各实体新建数量
    pub summary: ImportSummary,
    /// 本次运行实际使用的配置
    pub config: ImportConfig,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

/// 导入API
pub struct ImportApi {
    db_path: String,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// 导入发票表格
    ///
    /// # 参数
    /// - file_path: 文件路径（.xlsx/.xlsm/.xlsb/.xls/.ods/.csv）
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 导入结果
    /// - Err(ApiError::ImportFailed): 带错误类别的导入失败
    #[instrument(skip(self), fields(db_path = %self.db_path))]
    pub async fn import_file(&self, file_path: &str) -> ApiResult<ImportApiResponse> {
        if file_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("文件路径不能为空".to_string()));
        }

        let db_path = self.db_path.clone();
        let path = PathBuf::from(file_path);
        let started = Instant::now();

        let (summary, config) = tokio::task::spawn_blocking(move || -> ApiResult<_> {
            let store = SqliteInvoiceStore::open(&db_path)?;
            let config = ConfigManager::from_connection(store.connection())?.load_import_config()?;
            let importer = InvoiceImporter::new(store, config);
            let summary = importer.import_file(&path)?;
            Ok((summary, config))
        })
        .await
        .map_err(|e| ApiError::InternalError(format!("导入任务异常退出: {}", e)))??;

        let elapsed_ms = started.elapsed().as_millis() as i64;
        info!(elapsed_ms, total_created = summary.total_created(), "导入API完成");

        Ok(ImportApiResponse {
            file_path: file_path.to_string(),
            summary,
            config,
            elapsed_ms,
        })
    }

    /// 读取当前导入配置（缺省项取默认值）
    pub fn get_import_config(&self) -> ApiResult<ImportConfig> {
        let manager = ConfigManager::new(&self.db_path)?;
        Ok(manager.load_import_config()?)
    }

    /// 覆写导入配置
    pub fn set_import_config(&self, config: &ImportConfig) -> ApiResult<()> {
        let manager = ConfigManager::new(&self.db_path)?;
        manager.set_config_value(config_keys::COMMIT_POLICY, config.commit_policy.as_str())?;
        manager.set_config_value(
            config_keys::MALFORMED_ROW_POLICY,
            config.malformed_row_policy.as_str(),
        )?;
        manager.set_config_value(config_keys::SHEET_SCOPE, config.sheet_scope.as_str())?;
        info!(?config, "导入配置已更新");
        Ok(())
    }
}
