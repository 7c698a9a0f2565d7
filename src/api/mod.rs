// ==========================================
// 发票导入系统 - API 层
// ==========================================
// 职责: 对外业务接口（CLI / 嵌入方调用）
// ==========================================

pub mod error;
pub mod import_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportApiResponse};
