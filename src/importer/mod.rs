// ==========================================
// 发票导入系统 - 导入层
// ==========================================
// 职责: 表格行流 → 去重对账 → 写入端口 → 导入汇总
// 数据流: RowSource → CellExtractor → Deduplicator → Normalizer → InvoiceImporter → InvoiceStore
// ==========================================

pub mod cell_extractor;
pub mod deduplicator;
pub mod error;
pub mod invoice_importer;
pub mod normalizer;
pub mod row_source;

// 重导出核心类型
pub use cell_extractor::CellExtractor;
pub use deduplicator::{DedupKey, Deduplicator, Resolution};
pub use error::{ImportError, ImportResult};
pub use invoice_importer::{InvoiceImporter, RowFailureAction};
pub use normalizer::{serial_to_date, to_calendar_date};
pub use row_source::{open_row_source, CellValue, CsvRowSource, ExcelRowSource, RawRow, RowSource};
