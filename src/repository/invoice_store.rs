// ==========================================
// 发票导入系统 - 导入写入端口
// ==========================================
// 职责: 定义导入器依赖的四个“仅创建”写入操作 + 运行级事务边界
// 实现者: SqliteInvoiceStore（rusqlite，单连接）；测试中可替换为内存实现
// 红线: 端口不做去重、不做回读
// ==========================================

use crate::db::migrations::MigrationRunner;
use crate::domain::invoice::{NewCustomer, NewInvoice, NewInvoiceItem, NewProduct};
use crate::repository::customer_repo::CustomerRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::invoice_item_repo::InvoiceItemRepository;
use crate::repository::invoice_repo::InvoiceRepository;
use crate::repository::product_repo::ProductRepository;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::debug;

// ==========================================
// InvoiceStore Trait
// ==========================================
pub trait InvoiceStore {
    /// 创建客户，返回新 id
    fn create_customer(&self, customer: &NewCustomer) -> RepositoryResult<i64>;

    /// 创建产品，返回新 id
    fn create_product(&self, product: &NewProduct) -> RepositoryResult<i64>;

    /// 创建发票，返回新 id
    fn create_invoice(&self, invoice: &NewInvoice) -> RepositoryResult<i64>;

    /// 创建发票明细，返回新 id
    fn create_invoice_item(&self, item: &NewInvoiceItem) -> RepositoryResult<i64>;

    /// 开启运行级事务（ALL_OR_NOTHING 策略下由导入器调用）
    fn begin_run(&self) -> RepositoryResult<()>;

    /// 提交运行级事务
    fn commit_run(&self) -> RepositoryResult<()>;

    /// 回滚运行级事务
    fn rollback_run(&self) -> RepositoryResult<()>;
}

// ==========================================
// SqliteInvoiceStore
// ==========================================
// 四个仓储共享同一连接，保证写入串行且处于同一事务
pub struct SqliteInvoiceStore {
    conn: Arc<Mutex<Connection>>,
    customers: CustomerRepository,
    products: ProductRepository,
    invoices: InvoiceRepository,
    items: InvoiceItemRepository,
}

impl SqliteInvoiceStore {
    /// 打开数据库文件并确保 schema 为最新
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Self::with_migrated_connection(conn)
    }

    /// 内存数据库（演练/测试用）
    pub fn open_in_memory() -> RepositoryResult<Self> {
        let conn = crate::db::open_in_memory_connection()?;
        Self::with_migrated_connection(conn)
    }

    fn with_migrated_connection(conn: Connection) -> RepositoryResult<Self> {
        MigrationRunner::invoice_schema().up(&conn)?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 从已有连接创建（不执行迁移）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            customers: CustomerRepository::from_connection(conn.clone()),
            products: ProductRepository::from_connection(conn.clone()),
            invoices: InvoiceRepository::from_connection(conn.clone()),
            items: InvoiceItemRepository::from_connection(conn.clone()),
            conn,
        }
    }

    /// 共享连接（配置读取等需与写入处于同一连接）
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }

    pub fn customers(&self) -> &CustomerRepository {
        &self.customers
    }

    pub fn products(&self) -> &ProductRepository {
        &self.products
    }

    pub fn invoices(&self) -> &InvoiceRepository {
        &self.invoices
    }

    pub fn items(&self) -> &InvoiceItemRepository {
        &self.items
    }

    fn execute_control(&self, sql: &str) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        conn.execute_batch(sql)
            .map_err(|e| RepositoryError::DatabaseTransactionError(format!("{}: {}", sql, e)))
    }
}

impl InvoiceStore for SqliteInvoiceStore {
    fn create_customer(&self, customer: &NewCustomer) -> RepositoryResult<i64> {
        self.customers.create(customer)
    }

    fn create_product(&self, product: &NewProduct) -> RepositoryResult<i64> {
        self.products.create(product)
    }

    fn create_invoice(&self, invoice: &NewInvoice) -> RepositoryResult<i64> {
        self.invoices.create(invoice)
    }

    fn create_invoice_item(&self, item: &NewInvoiceItem) -> RepositoryResult<i64> {
        self.items.create(item)
    }

    fn begin_run(&self) -> RepositoryResult<()> {
        debug!("BEGIN IMMEDIATE");
        self.execute_control("BEGIN IMMEDIATE")
    }

    fn commit_run(&self) -> RepositoryResult<()> {
        debug!("COMMIT");
        self.execute_control("COMMIT")
    }

    fn rollback_run(&self) -> RepositoryResult<()> {
        debug!("ROLLBACK");
        self.execute_control("ROLLBACK")
    }
}
