// ==========================================
// 发票导入系统 - 数据库迁移
// ==========================================
// 职责: 建表/删表迁移 + 事务化批量执行
// 约束: up 按顺序执行、down 逆序执行，整批在同一事务内，失败整体回滚
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use tracing::{debug, info};

/// 单个迁移
pub trait Migration: Send + Sync {
    /// 迁移版本号（严格递增）
    fn version(&self) -> i64;

    fn name(&self) -> &'static str;

    fn up(&self, conn: &Connection) -> rusqlite::Result<()>;

    fn down(&self, conn: &Connection) -> rusqlite::Result<()>;
}

// ==========================================
// 发票相关表
// ==========================================

pub struct CreateCustomersTable;

impl Migration for CreateCustomersTable {
    fn version(&self) -> i64 {
        1
    }

    fn name(&self) -> &'static str {
        "create_customers_table"
    }

    fn up(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS customers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                address TEXT NOT NULL
            );
            "#,
        )
    }

    fn down(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch("DROP TABLE IF EXISTS customers;")
    }
}

pub struct CreateProductsTable;

impl Migration for CreateProductsTable {
    fn version(&self) -> i64 {
        2
    }

    fn name(&self) -> &'static str {
        "create_products_table"
    }

    fn up(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                price DECIMAL(8, 2) NOT NULL
            );
            "#,
        )
    }

    fn down(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch("DROP TABLE IF EXISTS products;")
    }
}

pub struct CreateInvoicesTable;

impl Migration for CreateInvoicesTable {
    fn version(&self) -> i64 {
        3
    }

    fn name(&self) -> &'static str {
        "create_invoices_table"
    }

    fn up(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS invoices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                invoice_date DATE NOT NULL,
                customer_id INTEGER NOT NULL,
                grand_total DECIMAL(10, 2) NOT NULL,
                FOREIGN KEY (customer_id) REFERENCES customers(id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn down(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch("DROP TABLE IF EXISTS invoices;")
    }
}

pub struct CreateInvoiceItemsTable;

impl Migration for CreateInvoiceItemsTable {
    fn version(&self) -> i64 {
        4
    }

    fn name(&self) -> &'static str {
        "create_invoice_items_table"
    }

    fn up(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS invoice_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                invoice_id INTEGER NOT NULL,
                product_id INTEGER NOT NULL,
                quantity INTEGER NOT NULL,
                total DECIMAL(10, 2) NOT NULL,
                FOREIGN KEY (invoice_id) REFERENCES invoices(id) ON DELETE CASCADE,
                FOREIGN KEY (product_id) REFERENCES products(id)
            );
            "#,
        )
    }

    fn down(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch("DROP TABLE IF EXISTS invoice_items;")
    }
}

/// 发票库的完整迁移序列（按依赖顺序）
pub fn invoice_migrations() -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(CreateCustomersTable),
        Box::new(CreateProductsTable),
        Box::new(CreateInvoicesTable),
        Box::new(CreateInvoiceItemsTable),
    ]
}

// ==========================================
// MigrationRunner - 事务化迁移执行器
// ==========================================
pub struct MigrationRunner {
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationRunner {
    pub fn new(migrations: Vec<Box<dyn Migration>>) -> Self {
        Self { migrations }
    }

    /// 使用发票库默认迁移序列
    pub fn invoice_schema() -> Self {
        Self::new(invoice_migrations())
    }

    fn ensure_version_table(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )
    }

    /// 按顺序执行所有未应用的迁移（同一事务）
    ///
    /// # 返回
    /// - Ok(usize): 本次新应用的迁移数（已是最新时为 0）
    /// - Err(MigrationFailed): 任一迁移失败，整批回滚
    pub fn up(&self, conn: &Connection) -> RepositoryResult<usize> {
        let wrap = |e: rusqlite::Error| RepositoryError::MigrationFailed {
            direction: "up".to_string(),
            message: e.to_string(),
        };

        let tx = conn.unchecked_transaction().map_err(wrap)?;
        Self::ensure_version_table(&tx).map_err(wrap)?;

        let current: i64 = tx
            .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |row| {
                row.get(0)
            })
            .map_err(wrap)?;

        let mut applied = 0;
        for migration in self.migrations.iter().filter(|m| m.version() > current) {
            debug!(version = migration.version(), name = migration.name(), "应用迁移");
            migration.up(&tx).map_err(|e| RepositoryError::MigrationFailed {
                direction: "up".to_string(),
                message: format!("{}: {}", migration.name(), e),
            })?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![migration.version()],
            )
            .map_err(wrap)?;
            applied += 1;
        }

        tx.commit().map_err(wrap)?;
        info!(applied = applied, from_version = current, "数据库迁移完成");
        Ok(applied)
    }

    /// 逆序回退所有迁移（同一事务）
    pub fn down(&self, conn: &Connection) -> RepositoryResult<usize> {
        let wrap = |e: rusqlite::Error| RepositoryError::MigrationFailed {
            direction: "down".to_string(),
            message: e.to_string(),
        };

        let tx = conn.unchecked_transaction().map_err(wrap)?;
        Self::ensure_version_table(&tx).map_err(wrap)?;

        let mut reverted = 0;
        for migration in self.migrations.iter().rev() {
            debug!(version = migration.version(), name = migration.name(), "回退迁移");
            migration.down(&tx).map_err(|e| RepositoryError::MigrationFailed {
                direction: "down".to_string(),
                message: format!("{}: {}", migration.name(), e),
            })?;
            tx.execute(
                "DELETE FROM schema_version WHERE version = ?1",
                params![migration.version()],
            )
            .map_err(wrap)?;
            reverted += 1;
        }

        tx.commit().map_err(wrap)?;
        info!(reverted = reverted, "数据库迁移已回退");
        Ok(reverted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_in_memory_connection, read_schema_version, CURRENT_SCHEMA_VERSION};

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            params![name],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            > 0
    }

    struct BrokenMigration;

    impl Migration for BrokenMigration {
        fn version(&self) -> i64 {
            5
        }

        fn name(&self) -> &'static str {
            "broken"
        }

        fn up(&self, conn: &Connection) -> rusqlite::Result<()> {
            conn.execute_batch("CREATE TABLE broken (")
        }

        fn down(&self, _conn: &Connection) -> rusqlite::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_up_creates_all_tables_and_records_version() {
        let conn = open_in_memory_connection().unwrap();
        let applied = MigrationRunner::invoice_schema().up(&conn).unwrap();

        assert_eq!(applied, 4);
        for table in ["customers", "products", "invoices", "invoice_items"] {
            assert!(table_exists(&conn, table), "缺少表 {}", table);
        }
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_up_is_idempotent() {
        let conn = open_in_memory_connection().unwrap();
        let runner = MigrationRunner::invoice_schema();
        runner.up(&conn).unwrap();
        assert_eq!(runner.up(&conn).unwrap(), 0);
    }

    #[test]
    fn test_down_drops_tables_in_reverse_order() {
        let conn = open_in_memory_connection().unwrap();
        let runner = MigrationRunner::invoice_schema();
        runner.up(&conn).unwrap();

        assert_eq!(runner.down(&conn).unwrap(), 4);
        assert!(!table_exists(&conn, "customers"));
        assert!(!table_exists(&conn, "invoice_items"));
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }

    #[test]
    fn test_failed_migration_rolls_back_whole_batch() {
        let conn = open_in_memory_connection().unwrap();
        let mut migrations = invoice_migrations();
        migrations.push(Box::new(BrokenMigration));

        let result = MigrationRunner::new(migrations).up(&conn);

        assert!(matches!(result, Err(RepositoryError::MigrationFailed { .. })));
        assert!(!table_exists(&conn, "customers"));
    }
}
