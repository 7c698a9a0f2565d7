// ==========================================
// 发票导入系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约定: 行号 row 为原始文件行号（1 起，含表头）
// ==========================================

use crate::domain::types::EntityKind;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 数据源错误（不会发生任何写入）=====
    #[error("数据源打开失败 ({path}): {message}")]
    RowSourceOpen { path: String, message: String },

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xlsm/.xlsb/.xls/.ods/.csv）")]
    UnsupportedFormat(String),

    #[error("数据源读取失败 (行 {row}): {message}")]
    RowSourceRead { row: usize, message: String },

    // ===== 行数据错误 =====
    #[error("行结构错误 (行 {row}, 列 {column}): {message}")]
    MalformedRow {
        row: usize,
        column: usize,
        message: String,
    },

    #[error("数值解析失败 (行 {row}, 列 {column}): 无法解析 {value:?}")]
    InvalidNumericValue {
        row: usize,
        column: usize,
        value: String,
    },

    // ===== 存储错误 =====
    #[error("写入 {entity} 失败 (行 {row}): {source}")]
    StorageWrite {
        entity: EntityKind,
        row: usize,
        #[source]
        source: RepositoryError,
    },

    #[error("运行事务控制失败: {0}")]
    Transaction(#[source] RepositoryError),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 错误类别（日志/接口展示用）
    pub fn kind(&self) -> &'static str {
        match self {
            ImportError::RowSourceOpen { .. } | ImportError::UnsupportedFormat(_) => {
                "ROW_SOURCE_OPEN"
            }
            ImportError::RowSourceRead { .. } => "ROW_SOURCE_READ",
            ImportError::MalformedRow { .. } => "MALFORMED_ROW",
            ImportError::InvalidNumericValue { .. } => "INVALID_NUMERIC_VALUE",
            ImportError::StorageWrite { .. } | ImportError::Transaction(_) => "STORAGE_WRITE",
            ImportError::InternalError(_) | ImportError::Other(_) => "INTERNAL",
        }
    }

    /// 是否为单行提取阶段错误（此时该行尚未发生任何写入）
    pub fn is_row_extraction_error(&self) -> bool {
        matches!(
            self,
            ImportError::MalformedRow { .. } | ImportError::InvalidNumericValue { .. }
        )
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        let row = err
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(0);
        ImportError::RowSourceRead {
            row,
            message: err.to_string(),
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
