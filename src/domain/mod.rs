// ==========================================
// 发票导入系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、行投影、导入汇总
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod invoice;
pub mod types;

// 重导出核心类型
pub use invoice::{
    Customer, CustomerRecord, ImportSummary, Invoice, InvoiceHeaderRecord, InvoiceItem,
    ItemRecord, NewCustomer, NewInvoice, NewInvoiceItem, NewProduct, Product, ProductRecord,
    RowProjection,
};
pub use types::EntityKind;
