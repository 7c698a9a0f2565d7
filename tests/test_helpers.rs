// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、.xlsx / .csv 测试夹具生成
// ==========================================

#![allow(dead_code)]

use invoice_import::db::migrations::MigrationRunner;
use invoice_import::db::open_sqlite_connection;
use rust_xlsxwriter::Workbook;
use std::error::Error;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// 表头（导入时跳过）
pub const HEADER: [&str; 9] = [
    "invoice_number",
    "invoice_date",
    "customer_name",
    "customer_address",
    "product_name",
    "quantity",
    "product_price",
    "item_total",
    "grand_total",
];

/// 一行测试数据（固定列布局）
#[derive(Debug, Clone)]
pub struct FixtureRow {
    pub invoice_number: i64,
    pub date_serial: f64,
    pub customer: String,
    pub address: String,
    pub product: String,
    pub quantity: f64,
    pub price: f64,
    pub item_total: f64,
    pub grand_total: f64,
}

/// 构造测试行（明细金额 = 数量 × 单价，地址由客户名派生）
pub fn fixture_row(
    invoice_number: i64,
    date_serial: f64,
    customer: &str,
    product: &str,
    quantity: f64,
    price: f64,
    grand_total: f64,
) -> FixtureRow {
    FixtureRow {
        invoice_number,
        date_serial,
        customer: customer.to_string(),
        address: format!("{} Headquarters", customer),
        product: product.to_string(),
        quantity,
        price,
        item_total: quantity * price,
        grand_total,
    }
}

/// 三行场景：前两行共享客户 Acme 与产品 Widget，第三行引入新客户 Globex
pub fn three_row_scenario() -> Vec<FixtureRow> {
    vec![
        fixture_row(1001, 44197.0, "Acme", "Widget", 2.0, 9.5, 19.0),
        fixture_row(1002, 44198.0, "Acme", "Widget", 1.0, 9.5, 9.5),
        fixture_row(1003, 44199.0, "Globex", "Widget", 4.0, 9.5, 38.0),
    ]
}

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时路径非 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    MigrationRunner::invoice_schema().up(&conn)?;

    Ok((temp_file, db_path))
}

/// 写入 .xlsx 夹具：每个元素为一张工作表（首行写表头）
pub fn write_xlsx(sheets: &[Vec<FixtureRow>]) -> Result<NamedTempFile, Box<dyn Error>> {
    let file = tempfile::Builder::new().suffix(".xlsx").tempfile()?;
    let mut workbook = Workbook::new();

    for rows in sheets {
        let worksheet = workbook.add_worksheet();
        for (col, title) in HEADER.iter().enumerate() {
            worksheet.write_string(0, col as u16, *title)?;
        }

        for (idx, row) in rows.iter().enumerate() {
            let r = idx as u32 + 1;
            worksheet.write_number(r, 0, row.invoice_number as f64)?;
            worksheet.write_number(r, 1, row.date_serial)?;
            worksheet.write_string(r, 2, row.customer.as_str())?;
            worksheet.write_string(r, 3, row.address.as_str())?;
            worksheet.write_string(r, 4, row.product.as_str())?;
            worksheet.write_number(r, 5, row.quantity)?;
            worksheet.write_number(r, 6, row.price)?;
            worksheet.write_number(r, 7, row.item_total)?;
            worksheet.write_number(r, 8, row.grand_total)?;
        }
    }

    workbook.save(file.path())?;
    Ok(file)
}

/// 写入 .csv 夹具（首行写表头）
pub fn write_csv(rows: &[FixtureRow]) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut lines = vec![HEADER.join(",")];
    lines.extend(rows.iter().map(|row| {
        format!(
            "{},{},{},{},{},{},{},{},{}",
            row.invoice_number,
            row.date_serial,
            row.customer,
            row.address,
            row.product,
            row.quantity,
            row.price,
            row.item_total,
            row.grand_total
        )
    }));
    write_raw_csv(&lines.join("\n"))
}

/// 写入任意内容的 .csv 文件
pub fn write_raw_csv(content: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile()?;
    file.write_all(content.as_bytes())?;
    file.write_all(b"\n")?;
    file.flush()?;
    Ok(file)
}

/// 统计某表行数
pub fn count_rows(db_path: &str, table: &str) -> Result<i64, Box<dyn Error>> {
    let conn = open_sqlite_connection(db_path)?;
    let count = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
    Ok(count)
}

pub fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
