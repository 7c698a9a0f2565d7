// ==========================================
// 发票导入系统 - 发票数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑，只负责数据访问
// 说明: invoice_date 以 TEXT(YYYY-MM-DD) 存储，读取时由 rusqlite chrono 特性解析
// ==========================================

use crate::domain::invoice::{Invoice, NewInvoice};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// InvoiceRepository - 发票仓储
// ==========================================
pub struct InvoiceRepository {
    conn: Arc<Mutex<Connection>>,
}

fn map_invoice(row: &Row<'_>) -> rusqlite::Result<Invoice> {
    Ok(Invoice {
        id: row.get(0)?,
        invoice_date: row.get(1)?,
        customer_id: row.get(2)?,
        grand_total: row.get(3)?,
    })
}

impl InvoiceRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建发票，返回新分配的 id
    ///
    /// customer_id 必须引用已存在的客户（外键约束）
    pub fn create(&self, invoice: &NewInvoice) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO invoices (invoice_date, customer_id, grand_total) VALUES (?1, ?2, ?3)",
            params![invoice.invoice_date, invoice.customer_id, invoice.grand_total],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find(&self, id: i64) -> RepositoryResult<Option<Invoice>> {
        let conn = self.get_conn()?;
        let invoice = conn
            .query_row(
                "SELECT id, invoice_date, customer_id, grand_total FROM invoices WHERE id = ?1",
                params![id],
                map_invoice,
            )
            .optional()?;
        Ok(invoice)
    }

    pub fn all(&self) -> RepositoryResult<Vec<Invoice>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, invoice_date, customer_id, grand_total FROM invoices ORDER BY id",
        )?;
        let invoices = stmt
            .query_map([], map_invoice)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(invoices)
    }

    /// 查询客户的所有发票（按日期倒序）
    pub fn find_by_customer(&self, customer_id: i64) -> RepositoryResult<Vec<Invoice>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, invoice_date, customer_id, grand_total
            FROM invoices
            WHERE customer_id = ?1
            ORDER BY invoice_date DESC, id DESC
            "#,
        )?;
        let invoices = stmt
            .query_map(params![customer_id], map_invoice)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(invoices)
    }
}
