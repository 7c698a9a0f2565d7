// ==========================================
// 发票导入系统 - 日期/数值规范化
// ==========================================
// 日期: 表格日期序列号 → YYYY-MM-DD（UTC）
//   unix 秒 = trunc(serial - 25569) * 86400，先截断整日再放大，时间部分丢弃
// 数值: 单元格（数字或文本）→ f64 / i64
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::row_source::CellValue;
use chrono::{DateTime, NaiveDate};

/// 表格日期纪元与 Unix 纪元相差的天数
pub const SERIAL_UNIX_EPOCH_OFFSET: f64 = 25569.0;

pub const SECONDS_PER_DAY: i64 = 86_400;

/// 日期序列号 → 日历日期
///
/// # 返回
/// - None: 序列号非有限值或超出可表示范围
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }

    let whole_days = (serial - SERIAL_UNIX_EPOCH_OFFSET).trunc();
    if whole_days.abs() > i64::MAX as f64 / SECONDS_PER_DAY as f64 {
        return None;
    }

    let seconds = (whole_days as i64).checked_mul(SECONDS_PER_DAY)?;
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.date_naive())
}

/// 日期序列号 → "YYYY-MM-DD"
pub fn to_calendar_date(serial: f64) -> Option<String> {
    serial_to_date(serial).map(|date| date.format("%Y-%m-%d").to_string())
}

/// 带行列定位的日期换算（失败按数值错误上报）
pub fn normalize_date(serial: f64, row: usize, column: usize) -> ImportResult<String> {
    to_calendar_date(serial).ok_or_else(|| ImportError::InvalidNumericValue {
        row,
        column,
        value: serial.to_string(),
    })
}

// ==========================================
// 数值强制转换
// ==========================================

fn missing_or_wrong_kind(cell: Option<&CellValue>, row: usize, column: usize) -> ImportError {
    let message = match cell {
        None => "缺少必填单元格".to_string(),
        Some(CellValue::Empty) => "必填单元格为空".to_string(),
        Some(other) => format!("单元格类型不符，期望数值，实际 {:?}", other),
    };
    ImportError::MalformedRow {
        row,
        column,
        message,
    }
}

/// 单元格 → f64
///
/// 文本单元格按十进制解析；无法解析时返回 InvalidNumericValue，
/// 缺失/空/布尔/错误单元格返回 MalformedRow。
pub fn coerce_f64(cell: Option<&CellValue>, row: usize, column: usize) -> ImportResult<f64> {
    match cell {
        Some(CellValue::Int(v)) => Ok(*v as f64),
        Some(CellValue::Float(v)) if v.is_finite() => Ok(*v),
        Some(CellValue::Float(v)) => Err(ImportError::InvalidNumericValue {
            row,
            column,
            value: v.to_string(),
        }),
        Some(CellValue::String(s)) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(ImportError::InvalidNumericValue {
                row,
                column,
                value: s.clone(),
            }),
        },
        other => Err(missing_or_wrong_kind(other, row, column)),
    }
}

/// 单元格 → i64（浮点值须为整数）
pub fn coerce_i64(cell: Option<&CellValue>, row: usize, column: usize) -> ImportResult<i64> {
    let invalid = |value: String| ImportError::InvalidNumericValue { row, column, value };

    match cell {
        Some(CellValue::Int(v)) => Ok(*v),
        Some(CellValue::Float(v)) => float_to_i64(*v).ok_or_else(|| invalid(v.to_string())),
        Some(CellValue::String(s)) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(float_to_i64))
                .ok_or_else(|| invalid(s.clone()))
        }
        other => Err(missing_or_wrong_kind(other, row, column)),
    }
}

fn float_to_i64(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}
