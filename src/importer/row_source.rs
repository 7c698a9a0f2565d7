// ==========================================
// 发票导入系统 - 行数据源
// ==========================================
// 职责: 将表格文件转为惰性、单次遍历的原始行序列
// 支持: Excel (.xlsx/.xlsm/.xlsb/.xls/.ods) / CSV (.csv)
// 约定:
// - 每张工作表（CSV 文件）首行为表头，始终跳过
// - 完全空白的行跳过，不计入已处理行
// - 读取出错后数据源终止（不再产出任何行）
// ==========================================

use crate::config::SheetScope;
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use csv::{ReaderBuilder, StringRecordsIntoIter};
use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

// ==========================================
// CellValue - 单元格原始值
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Error(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// 构造文本单元格：原样保留内容（名称按精确值去重），仅空白串视为空单元格
    pub fn text(value: &str) -> Self {
        if value.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::String(value.to_string())
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::Int(v) => CellValue::Int(*v),
            Data::Float(v) => CellValue::Float(*v),
            Data::String(s) => CellValue::text(s),
            Data::Bool(b) => CellValue::Bool(*b),
            // 日期单元格保留其序列号，由 normalizer 负责换算
            Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::text(s),
            Data::Error(e) => CellValue::Error(format!("{:?}", e)),
        }
    }
}

// ==========================================
// RawRow - 一行原始数据
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub row_number: usize, // 原始文件行号（1 起，含表头）
    pub cells: Vec<CellValue>,
}

impl RawRow {
    pub fn new(row_number: usize, cells: Vec<CellValue>) -> Self {
        Self { row_number, cells }
    }

    pub fn cell(&self, column: usize) -> Option<&CellValue> {
        self.cells.get(column)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(CellValue::is_empty)
    }
}

// ==========================================
// RowSource Trait
// ==========================================
// 有限、单次遍历、不可中途重启
pub trait RowSource: Iterator<Item = ImportResult<RawRow>> {
    /// 数据源描述（日志用）
    fn source_name(&self) -> &str;
}

// ==========================================
// Excel 行数据源（calamine）
// ==========================================
pub struct ExcelRowSource {
    path: String,
    workbook: Sheets<BufReader<File>>,
    pending_sheets: VecDeque<String>,
    current: Option<SheetCursor>,
    finished: bool,
}

struct SheetCursor {
    range: Range<Data>,
    origin: (usize, usize), // range 左上角的绝对 (行, 列)
    next_row: usize,        // range 内相对行号
}

impl SheetCursor {
    fn new(range: Range<Data>) -> Self {
        let origin = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));
        Self {
            range,
            origin,
            next_row: 1, // 相对行 0 为表头
        }
    }

    /// 读取下一行；列按绝对位置对齐（range 不从 A 列开始时左侧补空）
    fn next_raw_row(&mut self) -> Option<RawRow> {
        if self.next_row >= self.range.height() {
            return None;
        }

        let relative = self.next_row;
        self.next_row += 1;

        let (origin_row, origin_col) = self.origin;
        let mut cells = vec![CellValue::Empty; origin_col];
        cells.extend((0..self.range.width()).map(|col| {
            self.range
                .get((relative, col))
                .map(CellValue::from)
                .unwrap_or(CellValue::Empty)
        }));

        Some(RawRow::new(origin_row + relative + 1, cells))
    }
}

impl ExcelRowSource {
    /// 打开工作簿
    ///
    /// # 参数
    /// - path: 文件路径
    /// - scope: 读取全部工作表或仅第一张
    pub fn open(path: &Path, scope: SheetScope) -> ImportResult<Self> {
        let path_display = path.display().to_string();
        let workbook = open_workbook_auto(path).map_err(|e| ImportError::RowSourceOpen {
            path: path_display.clone(),
            message: e.to_string(),
        })?;

        let mut pending_sheets: VecDeque<String> = workbook.sheet_names().into_iter().collect();
        if scope == SheetScope::First {
            pending_sheets.truncate(1);
        }

        debug!(path = %path_display, sheets = pending_sheets.len(), "工作簿已打开");

        Ok(Self {
            path: path_display,
            workbook,
            pending_sheets,
            current: None,
            finished: false,
        })
    }
}

impl Iterator for ExcelRowSource {
    type Item = ImportResult<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }

            if self.current.is_none() {
                let Some(sheet) = self.pending_sheets.pop_front() else {
                    self.finished = true;
                    return None;
                };

                match self.workbook.worksheet_range(&sheet) {
                    Ok(range) => {
                        debug!(sheet = %sheet, rows = range.height(), "开始读取工作表");
                        self.current = Some(SheetCursor::new(range));
                    }
                    Err(e) => {
                        self.finished = true;
                        return Some(Err(ImportError::RowSourceRead {
                            row: 0,
                            message: format!("工作表 {} 读取失败: {}", sheet, e),
                        }));
                    }
                }
            }

            let next_row = self.current.as_mut().and_then(SheetCursor::next_raw_row);
            match next_row {
                Some(row) if row.is_blank() => continue,
                Some(row) => return Some(Ok(row)),
                None => self.current = None,
            }
        }
    }
}

impl RowSource for ExcelRowSource {
    fn source_name(&self) -> &str {
        &self.path
    }
}

// ==========================================
// CSV 行数据源（csv）
// ==========================================
pub struct CsvRowSource {
    path: String,
    records: StringRecordsIntoIter<File>,
    finished: bool,
}

impl CsvRowSource {
    pub fn open(path: &Path) -> ImportResult<Self> {
        let path_display = path.display().to_string();
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致，缺列由提取器报告
            .from_path(path)
            .map_err(|e| ImportError::RowSourceOpen {
                path: path_display.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            path: path_display,
            records: reader.into_records(),
            finished: false,
        })
    }
}

impl Iterator for CsvRowSource {
    type Item = ImportResult<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            match self.records.next()? {
                Ok(record) => {
                    let row_number = record
                        .position()
                        .map(|p| p.line() as usize)
                        .unwrap_or(0);
                    let row = RawRow::new(row_number, record.iter().map(CellValue::text).collect());
                    if row.is_blank() {
                        continue;
                    }
                    return Some(Ok(row));
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(ImportError::from(e)));
                }
            }
        }
        None
    }
}

impl RowSource for CsvRowSource {
    fn source_name(&self) -> &str {
        &self.path
    }
}

// ==========================================
// 按扩展名选择数据源
// ==========================================

/// 打开行数据源
///
/// # 返回
/// - Ok(Box<dyn RowSource>): 惰性行序列
/// - Err(RowSourceOpen): 文件不存在/无法打开
/// - Err(UnsupportedFormat): 扩展名不支持
pub fn open_row_source(path: &Path, scope: SheetScope) -> ImportResult<Box<dyn RowSource>> {
    if !path.exists() {
        return Err(ImportError::RowSourceOpen {
            path: path.display().to_string(),
            message: "文件不存在".to_string(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "csv" => Ok(Box::new(CsvRowSource::open(path)?)),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Box::new(ExcelRowSource::open(path, scope)?)),
        _ => Err(ImportError::UnsupportedFormat(ext)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_csv_skips_header_and_blank_rows() {
        let file = csv_file("no,date,name\n1,44197,Acme\n,,\n2,44198,Globex\n");
        let rows: Vec<RawRow> = open_row_source(file.path(), SheetScope::All)
            .unwrap()
            .collect::<ImportResult<_>>()
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[0].cell(2), Some(&CellValue::String("Acme".to_string())));
        assert_eq!(rows[1].row_number, 4);
    }

    #[test]
    fn test_csv_text_keeps_surrounding_whitespace() {
        let file = csv_file("a,b\nAcme ,Widget\n");
        let rows: Vec<RawRow> = CsvRowSource::open(file.path())
            .unwrap()
            .collect::<ImportResult<_>>()
            .unwrap();
        assert_eq!(rows[0].cell(0), Some(&CellValue::String("Acme ".to_string())));
    }

    #[test]
    fn test_csv_empty_cells_are_empty_values() {
        let file = csv_file("a,b\n1,  \n");
        let rows: Vec<RawRow> = CsvRowSource::open(file.path())
            .unwrap()
            .collect::<ImportResult<_>>()
            .unwrap();
        assert_eq!(rows[0].cells, vec![CellValue::String("1".to_string()), CellValue::Empty]);
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let result = open_row_source(Path::new("/nonexistent/invoices.xlsx"), SheetScope::All);
        assert!(matches!(result, Err(ImportError::RowSourceOpen { .. })));
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let result = open_row_source(file.path(), SheetScope::All);
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(ext)) if ext == "txt"));
    }

    #[test]
    fn test_corrupt_workbook_is_open_error() {
        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        file.write_all(b"not a zip archive").unwrap();
        file.flush().unwrap();

        let expected = file.path().display().to_string();
        match open_row_source(file.path(), SheetScope::All) {
            Err(ImportError::RowSourceOpen { path, .. }) => assert_eq!(path, expected),
            other => panic!("expected RowSourceOpen, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_cell_value_from_calamine_data() {
        assert_eq!(CellValue::from(&Data::Int(7)), CellValue::Int(7));
        assert_eq!(CellValue::from(&Data::Float(1.5)), CellValue::Float(1.5));
        assert_eq!(CellValue::from(&Data::String("  ".to_string())), CellValue::Empty);
        assert_eq!(
            CellValue::from(&Data::String(" Acme ".to_string())),
            CellValue::String(" Acme ".to_string())
        );
        assert_eq!(CellValue::from(&Data::Empty), CellValue::Empty);
    }
}
