// ==========================================
// 发票导入系统 - 发票领域模型
// ==========================================
// 职责: 客户/产品/发票/明细 实体 + 表格行投影 + 导入汇总
// 对齐: customers / products / invoices / invoice_items 表
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// 待创建实体（写入端口入参）
// ==========================================
// 用途: 导入器构造,仓储落库,id 由存储分配

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,    // 客户名称（运行内去重键,区分大小写）
    pub address: String, // 客户地址
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String, // 产品名称（运行内去重键）
    pub price: f64,   // 单价（同名产品以首次出现为准）
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvoice {
    pub invoice_date: String, // YYYY-MM-DD（由表格日期序列号换算）
    pub customer_id: i64,     // FK -> customers.id
    pub grand_total: f64,     // 发票总额（同号发票以首行为准）
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvoiceItem {
    pub invoice_id: i64, // FK -> invoices.id
    pub product_id: i64, // FK -> products.id
    pub quantity: f64,
    pub total: f64,
}

// ==========================================
// 已落库实体（仓储查询返回）
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub invoice_date: NaiveDate,
    pub customer_id: i64,
    pub grand_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub id: i64,
    pub invoice_id: i64,
    pub product_id: i64,
    pub quantity: f64,
    pub total: f64,
}

// ==========================================
// 行投影（单元格提取产物）
// ==========================================
// 生命周期: 仅在单行处理内

/// 发票头投影: 列 0 / 1 / 8
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceHeaderRecord {
    pub invoice_number: i64, // 仅作关联键,不落库
    pub invoice_date_serial: f64,
    pub grand_total: f64,
}

/// 客户投影: 列 2 / 3
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub name: String,
    pub address: String,
}

/// 产品投影: 列 4 / 6
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub price: f64,
}

/// 明细投影: 列 5 / 7 + 透传发票号
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub invoice_number: i64,
    pub quantity: f64,
    pub total: f64,
}

/// 一行表格数据的四个投影
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowProjection {
    pub row_number: usize, // 原始文件行号（1 起,含表头）
    pub invoice: InvoiceHeaderRecord,
    pub customer: CustomerRecord,
    pub product: ProductRecord,
    pub item: ItemRecord,
}

impl CustomerRecord {
    pub fn to_new_customer(&self) -> NewCustomer {
        NewCustomer {
            name: self.name.clone(),
            address: self.address.clone(),
        }
    }
}

impl ProductRecord {
    pub fn to_new_product(&self) -> NewProduct {
        NewProduct {
            name: self.name.clone(),
            price: self.price,
        }
    }
}

// ==========================================
// ImportSummary - 导入汇总
// ==========================================
// 用途: 导入成功时的返回值（失败时返回类型化错误,不返回部分汇总）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub customers: usize,     // 新建客户数
    pub products: usize,      // 新建产品数
    pub invoices: usize,      // 新建发票数
    pub invoice_items: usize, // 新建明细数（= 已处理数据行数）
    pub rows_processed: usize,
    pub skipped_rows: usize, // 仅 SKIP 策略下非零
}

impl ImportSummary {
    /// 新建实体总数
    pub fn total_created(&self) -> usize {
        self.customers + self.products + self.invoices + self.invoice_items
    }
}
