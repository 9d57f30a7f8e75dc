// ==========================================
// 员工假期追踪系统 - 字段映射器实现
// ==========================================
// 阶段: Normalize
// 职责: ImportRow → NormalizedImportRow（数值容错转换 + 年份解析）
// ==========================================

use crate::domain::{ImportColumn, ImportRow, NormalizedImportRow, RowError, RowErrorKind};
use crate::engine::error::parse_year;

/// 容错数值转换
///
/// - 去除千分位逗号与首尾空白
/// - 空值视为 0
/// - 非数值返回 None
pub fn safe_float(value: &str) -> Option<f64> {
    let cleaned: String = value.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Some(0.0);
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 年份单元格解析（空值取批次默认年份; 接受表格导出的 "2025.0"）
///
/// 结果须为四位年份, 与查询侧的年份校验一致
pub fn parse_year_cell(value: &str, default_year: i32) -> Option<i32> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(default_year);
    }
    let candidate = match trimmed.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v.is_finite() => format!("{:.0}", v),
        _ => trimmed.to_string(),
    };
    parse_year(&candidate).ok()
}

pub struct FieldMapper;

impl FieldMapper {
    /// 映射单行; 任一数值列或年份非法即为行级错误
    pub fn normalize(&self, row: &ImportRow, default_year: i32) -> Result<NormalizedImportRow, RowError> {
        let invalid = |column: ImportColumn| {
            RowError::new(
                row.row_number,
                RowErrorKind::InvalidNumber {
                    column: column.header().to_string(),
                    value: row.get(column).to_string(),
                },
            )
        };
        let number = |column: ImportColumn| -> Result<f64, RowError> {
            safe_float(row.get(column)).ok_or_else(|| invalid(column))
        };
        // 分配/已休/待批天数不得为负
        let amount = |column: ImportColumn| -> Result<f64, RowError> {
            number(column).and_then(|v| if v < 0.0 { Err(invalid(column)) } else { Ok(v) })
        };

        let year = parse_year_cell(row.year(), default_year).ok_or_else(|| {
            RowError::new(row.row_number, RowErrorKind::InvalidYear(row.year().to_string()))
        })?;

        Ok(NormalizedImportRow {
            row_number: row.row_number,
            employee_code: row.employee_code().to_string(),
            employee_name: row.employee_name().to_string(),
            department_name: row.department_name().to_string(),
            leave_type_name: row.leave_type_name().to_string(),
            year: year.to_string(),
            total_allocation: amount(ImportColumn::TotalAllocation)?,
            taken_leaves: amount(ImportColumn::TakenLeaves)?,
            pending_requests: amount(ImportColumn::PendingRequests)?,
            current_balance: number(ImportColumn::CurrentBalance)?,
            carry_forwarded: number(ImportColumn::CarryForwarded)?,
            expired_carry: number(ImportColumn::ExpiredCarry)?,
        })
    }
}
