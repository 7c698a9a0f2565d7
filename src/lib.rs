// ==========================================
// 发票导入系统 - 核心库
// ==========================================
// 职责: 表格发票数据流式导入、运行内去重对账、关系化落库
// 技术栈: Rust + SQLite (rusqlite) + calamine/csv
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 行流对账导入
pub mod importer;

// 配置层 - 导入策略配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/迁移）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::EntityKind;

// 领域实体
pub use domain::{Customer, ImportSummary, Invoice, InvoiceItem, Product};

// 导入
pub use importer::{ImportError, ImportResult, InvoiceImporter};

// 仓储
pub use repository::{InvoiceStore, RepositoryError, SqliteInvoiceStore};

// 配置
pub use config::{CommitPolicy, ImportConfig, MalformedRowPolicy, SheetScope};

// API
pub use api::{ApiError, ImportApi, ImportApiResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "发票导入系统";
