// ==========================================
// 发票导入系统 - 发票明细数据仓储
// ==========================================

use crate::domain::invoice::{InvoiceItem, NewInvoiceItem};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

/// 发票明细仓储
/// 职责: 管理 invoice_items 表的读写
pub struct InvoiceItemRepository {
    conn: Arc<Mutex<Connection>>,
}

fn map_item(row: &Row<'_>) -> rusqlite::Result<InvoiceItem> {
    Ok(InvoiceItem {
        id: row.get(0)?,
        invoice_id: row.get(1)?,
        product_id: row.get(2)?,
        quantity: row.get(3)?,
        total: row.get(4)?,
    })
}

impl InvoiceItemRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建明细，返回新分配的 id
    pub fn create(&self, item: &NewInvoiceItem) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO invoice_items (invoice_id, product_id, quantity, total)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![item.invoice_id, item.product_id, item.quantity, item.total],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn all(&self) -> RepositoryResult<Vec<InvoiceItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, invoice_id, product_id, quantity, total FROM invoice_items ORDER BY id",
        )?;
        let items = stmt
            .query_map([], map_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// 查询发票下的所有明细
    pub fn find_by_invoice(&self, invoice_id: i64) -> RepositoryResult<Vec<InvoiceItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, invoice_id, product_id, quantity, total
            FROM invoice_items
            WHERE invoice_id = ?1
            ORDER BY id
            "#,
        )?;
        let items = stmt
            .query_map(params![invoice_id], map_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }
}
