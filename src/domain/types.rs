// ==========================================
// 发票导入系统 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 实体类型 (Entity Kind)
// ==========================================
// 导入过程中落库的四类实体
// 序列化格式: SCREAMING_SNAKE_CASE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Customer,    // 客户（按名称去重）
    Product,     // 产品（按名称去重）
    Invoice,     // 发票（按发票号去重）
    InvoiceItem, // 发票明细（不去重）
}

impl EntityKind {
    /// 对应的数据库表名
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Customer => "customers",
            EntityKind::Product => "products",
            EntityKind::Invoice => "invoices",
            EntityKind::InvoiceItem => "invoice_items",
        }
    }

    /// 是否参与运行内去重
    pub fn is_deduplicated(&self) -> bool {
        !matches!(self, EntityKind::InvoiceItem)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Customer => write!(f, "CUSTOMER"),
            EntityKind::Product => write!(f, "PRODUCT"),
            EntityKind::Invoice => write!(f, "INVOICE"),
            EntityKind::InvoiceItem => write!(f, "INVOICE_ITEM"),
        }
    }
}
