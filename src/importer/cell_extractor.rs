// ==========================================
// 发票导入系统 - 单元格提取器
// ==========================================
// 职责: 固定列布局的一行 → 四个类型化投影（纯函数，无副作用）
// 列布局（0 起）:
//   0 发票号 | 1 开票日期(序列号) | 2 客户名称 | 3 客户地址 | 4 产品名称
//   5 数量   | 6 产品单价         | 7 明细金额 | 8 发票总额
// ==========================================

use crate::domain::invoice::{
    CustomerRecord, InvoiceHeaderRecord, ItemRecord, ProductRecord, RowProjection,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::normalizer::{coerce_f64, coerce_i64};
use crate::importer::row_source::{CellValue, RawRow};

pub mod columns {
    pub const INVOICE_NUMBER: usize = 0;
    pub const INVOICE_DATE: usize = 1;
    pub const CUSTOMER_NAME: usize = 2;
    pub const CUSTOMER_ADDRESS: usize = 3;
    pub const PRODUCT_NAME: usize = 4;
    pub const QUANTITY: usize = 5;
    pub const PRODUCT_PRICE: usize = 6;
    pub const ITEM_TOTAL: usize = 7;
    pub const GRAND_TOTAL: usize = 8;

    /// 每行至少需要的列数
    pub const REQUIRED_WIDTH: usize = 9;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CellExtractor;

impl CellExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 提取一行的四个投影
    ///
    /// # 返回
    /// - Err(MalformedRow): 列数不足/必填单元格缺失或类型不符
    /// - Err(InvalidNumericValue): 数值列无法解析
    pub fn extract(&self, row: &RawRow) -> ImportResult<RowProjection> {
        let r = row.row_number;

        if row.cells.len() < columns::REQUIRED_WIDTH {
            return Err(ImportError::MalformedRow {
                row: r,
                column: row.cells.len(),
                message: format!(
                    "仅有 {} 列，至少需要 {} 列",
                    row.cells.len(),
                    columns::REQUIRED_WIDTH
                ),
            });
        }

        let invoice_number = coerce_i64(row.cell(columns::INVOICE_NUMBER), r, columns::INVOICE_NUMBER)?;

        let invoice = InvoiceHeaderRecord {
            invoice_number,
            invoice_date_serial: coerce_f64(row.cell(columns::INVOICE_DATE), r, columns::INVOICE_DATE)?,
            grand_total: coerce_f64(row.cell(columns::GRAND_TOTAL), r, columns::GRAND_TOTAL)?,
        };

        let customer = CustomerRecord {
            name: required_text(row, columns::CUSTOMER_NAME)?,
            address: optional_text(row, columns::CUSTOMER_ADDRESS)?,
        };

        let product = ProductRecord {
            name: required_text(row, columns::PRODUCT_NAME)?,
            price: coerce_f64(row.cell(columns::PRODUCT_PRICE), r, columns::PRODUCT_PRICE)?,
        };

        let item = ItemRecord {
            invoice_number,
            quantity: coerce_f64(row.cell(columns::QUANTITY), r, columns::QUANTITY)?,
            total: coerce_f64(row.cell(columns::ITEM_TOTAL), r, columns::ITEM_TOTAL)?,
        };

        Ok(RowProjection {
            row_number: r,
            invoice,
            customer,
            product,
            item,
        })
    }
}

fn required_text(row: &RawRow, column: usize) -> ImportResult<String> {
    let text = optional_text(row, column)?;
    if text.is_empty() {
        return Err(ImportError::MalformedRow {
            row: row.row_number,
            column,
            message: "必填文本为空".to_string(),
        });
    }
    Ok(text)
}

// 数字单元格按原样转为文本（如产品编号 1001）
fn optional_text(row: &RawRow, column: usize) -> ImportResult<String> {
    match row.cell(column) {
        Some(CellValue::String(s)) => Ok(s.clone()),
        Some(CellValue::Int(v)) => Ok(v.to_string()),
        Some(CellValue::Float(v)) => Ok(v.to_string()),
        Some(CellValue::Empty) => Ok(String::new()),
        other => Err(ImportError::MalformedRow {
            row: row.row_number,
            column,
            message: format!("单元格类型不符，期望文本，实际 {:?}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::String(s.to_string())
    }

    fn sample_row() -> RawRow {
        RawRow::new(
            2,
            vec![
                CellValue::Int(1001),
                CellValue::Float(44197.0),
                text("Acme"),
                text("1 Road Runner Way"),
                text("Widget"),
                CellValue::Float(2.0),
                CellValue::Float(9.5),
                CellValue::Float(19.0),
                CellValue::Float(19.0),
            ],
        )
    }

    #[test]
    fn test_extracts_four_projections_by_position() {
        let projection = CellExtractor::new().extract(&sample_row()).unwrap();

        assert_eq!(projection.row_number, 2);
        assert_eq!(projection.invoice.invoice_number, 1001);
        assert_eq!(projection.invoice.invoice_date_serial, 44197.0);
        assert_eq!(projection.invoice.grand_total, 19.0);
        assert_eq!(projection.customer.name, "Acme");
        assert_eq!(projection.customer.address, "1 Road Runner Way");
        assert_eq!(projection.product.name, "Widget");
        assert_eq!(projection.product.price, 9.5);
        assert_eq!(projection.item.invoice_number, 1001);
        assert_eq!(projection.item.quantity, 2.0);
        assert_eq!(projection.item.total, 19.0);
    }

    #[test]
    fn test_short_row_is_malformed() {
        let mut row = sample_row();
        row.cells.truncate(8);

        let err = CellExtractor::new().extract(&row).unwrap_err();
        assert!(matches!(err, ImportError::MalformedRow { row: 2, column: 8, .. }));
    }

    #[test]
    fn test_empty_customer_name_is_malformed() {
        let mut row = sample_row();
        row.cells[columns::CUSTOMER_NAME] = CellValue::Empty;

        let err = CellExtractor::new().extract(&row).unwrap_err();
        assert!(matches!(
            err,
            ImportError::MalformedRow { column: columns::CUSTOMER_NAME, .. }
        ));
    }

    #[test]
    fn test_empty_address_is_allowed() {
        let mut row = sample_row();
        row.cells[columns::CUSTOMER_ADDRESS] = CellValue::Empty;

        let projection = CellExtractor::new().extract(&row).unwrap();
        assert_eq!(projection.customer.address, "");
    }

    #[test]
    fn test_names_are_taken_verbatim() {
        let mut row = sample_row();
        row.cells[columns::CUSTOMER_NAME] = CellValue::text("Acme ");
        row.cells[columns::PRODUCT_NAME] = CellValue::text(" Widget");

        let projection = CellExtractor::new().extract(&row).unwrap();
        assert_eq!(projection.customer.name, "Acme ");
        assert_eq!(projection.product.name, " Widget");
    }

    #[test]
    fn test_whitespace_only_name_is_malformed() {
        let mut row = sample_row();
        row.cells[columns::PRODUCT_NAME] = CellValue::text("   ");

        let err = CellExtractor::new().extract(&row).unwrap_err();
        assert!(matches!(
            err,
            ImportError::MalformedRow { column: columns::PRODUCT_NAME, .. }
        ));
    }

    #[test]
    fn test_numeric_product_name_is_stringified() {
        let mut row = sample_row();
        row.cells[columns::PRODUCT_NAME] = CellValue::Float(5001.0);

        let projection = CellExtractor::new().extract(&row).unwrap();
        assert_eq!(projection.product.name, "5001");
    }

    #[test]
    fn test_non_numeric_quantity_is_invalid_numeric() {
        let mut row = sample_row();
        row.cells[columns::QUANTITY] = text("two");

        let err = CellExtractor::new().extract(&row).unwrap_err();
        assert!(matches!(
            err,
            ImportError::InvalidNumericValue { column: columns::QUANTITY, .. }
        ));
    }
}
