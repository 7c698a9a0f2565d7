// ==========================================
// 发票导入系统 - 客户数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑（去重由导入器负责）
// ==========================================

use crate::domain::invoice::{Customer, NewCustomer};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// CustomerRepository - 客户仓储
// ==========================================
/// 客户仓储
/// 职责: 管理 customers 表的读写
pub struct CustomerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CustomerRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建客户，返回新分配的 id
    pub fn create(&self, customer: &NewCustomer) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO customers (name, address) VALUES (?1, ?2)",
            params![customer.name, customer.address],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按 id 查询
    ///
    /// # 返回
    /// - Ok(Some(Customer)): 找到客户
    /// - Ok(None): 未找到
    /// - Err: 数据库错误
    pub fn find(&self, id: i64) -> RepositoryResult<Option<Customer>> {
        let conn = self.get_conn()?;
        let customer = conn
            .query_row(
                "SELECT id, name, address FROM customers WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Customer {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        address: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(customer)
    }

    /// 查询全部客户（按 id 升序）
    pub fn all(&self) -> RepositoryResult<Vec<Customer>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, name, address FROM customers ORDER BY id")?;
        let customers = stmt
            .query_map([], |row| {
                Ok(Customer {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    address: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(customers)
    }
}
