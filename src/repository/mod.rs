// ==========================================
// 发票导入系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod customer_repo;
pub mod error;
pub mod invoice_item_repo;
pub mod invoice_repo;
pub mod invoice_store;
pub mod product_repo;

// 重导出核心仓储
pub use customer_repo::CustomerRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use invoice_item_repo::InvoiceItemRepository;
pub use invoice_repo::InvoiceRepository;
pub use invoice_store::{InvoiceStore, SqliteInvoiceStore};
pub use product_repo::ProductRepository;
