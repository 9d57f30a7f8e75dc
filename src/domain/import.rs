// ==========================================
// 员工假期追踪系统 - 导入领域模型
// ==========================================
// 职责: 规范化导入行、行级错误、批次结果
// 说明: 解析边界统一为 11 列有序值, 后续阶段不再区分文件格式
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

// ==========================================
// ImportColumn - 导入模板列（顺序即位置）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportColumn {
    EmployeeId,
    Name,
    Department,
    LeaveType,
    Year,
    TotalAllocation,
    TakenLeaves,
    PendingRequests,
    CurrentBalance,
    CarryForwarded,
    ExpiredCarry,
}

impl ImportColumn {
    pub const ALL: [ImportColumn; 11] = [
        ImportColumn::EmployeeId,
        ImportColumn::Name,
        ImportColumn::Department,
        ImportColumn::LeaveType,
        ImportColumn::Year,
        ImportColumn::TotalAllocation,
        ImportColumn::TakenLeaves,
        ImportColumn::PendingRequests,
        ImportColumn::CurrentBalance,
        ImportColumn::CarryForwarded,
        ImportColumn::ExpiredCarry,
    ];

    /// 模板列数
    pub const COUNT: usize = 11;

    /// 模板表头
    pub fn header(&self) -> &'static str {
        match self {
            ImportColumn::EmployeeId => "Employee ID",
            ImportColumn::Name => "Name",
            ImportColumn::Department => "Department",
            ImportColumn::LeaveType => "Leave Type",
            ImportColumn::Year => "Year",
            ImportColumn::TotalAllocation => "Total Allocation",
            ImportColumn::TakenLeaves => "Taken Leaves",
            ImportColumn::PendingRequests => "Pending Requests",
            ImportColumn::CurrentBalance => "Current Balance",
            ImportColumn::CarryForwarded => "Carry Forwarded",
            ImportColumn::ExpiredCarry => "Expired Carry",
        }
    }

    pub fn index(&self) -> usize {
        ImportColumn::ALL
            .iter()
            .position(|c| c == self)
            .unwrap_or_default()
    }

    pub fn from_header(header: &str) -> Option<ImportColumn> {
        let trimmed = header.trim();
        ImportColumn::ALL
            .iter()
            .copied()
            .find(|c| c.header() == trimmed)
    }
}

// ==========================================
// ImportRow - 规范化导入行（解析阶段输出）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRow {
    pub row_number: usize, // 源文件行号（表头为第 1 行）
    values: Vec<String>,   // 固定 11 个, 已 trim
}

impl ImportRow {
    /// 由按位置排列的值构造（不足 11 列为行级错误, 多余列忽略）
    pub fn from_positional(row_number: usize, cells: Vec<String>) -> Result<Self, RowError> {
        if cells.len() < ImportColumn::COUNT {
            return Err(RowError::new(
                row_number,
                RowErrorKind::InsufficientColumns {
                    expected: ImportColumn::COUNT,
                    got: cells.len(),
                },
            ));
        }
        let values = cells
            .into_iter()
            .take(ImportColumn::COUNT)
            .map(|v| v.trim().to_string())
            .collect();
        Ok(Self { row_number, values })
    }

    /// 由按列名取值的闭包构造（缺失列视为空）
    pub fn from_named<F>(row_number: usize, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let values = ImportColumn::ALL
            .iter()
            .map(|c| lookup(c.header()).map(|v| v.trim().to_string()).unwrap_or_default())
            .collect();
        Self { row_number, values }
    }

    pub fn get(&self, column: ImportColumn) -> &str {
        self.values
            .get(column.index())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn employee_code(&self) -> &str {
        self.get(ImportColumn::EmployeeId)
    }

    pub fn employee_name(&self) -> &str {
        self.get(ImportColumn::Name)
    }

    pub fn department_name(&self) -> &str {
        self.get(ImportColumn::Department)
    }

    pub fn leave_type_name(&self) -> &str {
        self.get(ImportColumn::LeaveType)
    }

    pub fn year(&self) -> &str {
        self.get(ImportColumn::Year)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// 整行是否全部为空白单元格
pub fn is_blank_row<S: AsRef<str>>(cells: &[S]) -> bool {
    cells.iter().all(|c| c.as_ref().trim().is_empty())
}

// ==========================================
// NormalizedImportRow - 数值转换后的导入行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedImportRow {
    pub row_number: usize,
    pub employee_code: String,
    pub employee_name: String,
    pub department_name: String,
    pub leave_type_name: String,
    pub year: String,
    pub total_allocation: f64,
    pub taken_leaves: f64,
    pub pending_requests: f64,
    pub current_balance: f64,
    pub carry_forwarded: f64,
    pub expired_carry: f64,
}

// ==========================================
// RowError - 行级错误（不中断批次）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("Row {row}: {kind}")]
pub struct RowError {
    pub row: usize,
    pub kind: RowErrorKind,
}

impl RowError {
    pub fn new(row: usize, kind: RowErrorKind) -> Self {
        Self { row, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RowErrorKind {
    InsufficientColumns { expected: usize, got: usize },
    MissingIdentity,
    InvalidNumber { column: String, value: String },
    InvalidYear(String),
    EmployeeNotFound { code: String, name: String },
    LeaveTypeNotFound(String),
    AlreadyExists { employee: String, leave_type: String, year: String },
    Store(String),
}

impl fmt::Display for RowErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowErrorKind::InsufficientColumns { expected, got } => {
                write!(f, "Insufficient columns (expected {}, got {})", expected, got)
            }
            RowErrorKind::MissingIdentity => write!(f, "Missing Employee ID or Leave Type"),
            RowErrorKind::InvalidNumber { column, value } => {
                write!(f, "Invalid number '{}' in column '{}'", value, column)
            }
            RowErrorKind::InvalidYear(value) => write!(f, "Invalid year '{}'", value),
            RowErrorKind::EmployeeNotFound { code, name } => {
                write!(f, "Could not find employee {} ({})", code, name)
            }
            RowErrorKind::LeaveTypeNotFound(name) => write!(f, "Leave type '{}' not found", name),
            RowErrorKind::AlreadyExists {
                employee,
                leave_type,
                year,
            } => write!(
                f,
                "Record already exists for {} / {} / {}, skipped",
                employee, leave_type, year
            ),
            RowErrorKind::Store(message) => write!(f, "{}", message),
        }
    }
}

// ==========================================
// ImportOptions - 批次参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportOptions {
    pub update_existing: bool, // 已存在时是否更新
    pub default_year: i32,     // Year 列为空时使用
}

// ==========================================
// ImportBatchResult - 批次结果累加器
// ==========================================
// created + updated + errors.len() = 实际处理行数（不含空白行）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatchResult {
    pub batch_id: String,
    pub file_name: Option<String>,
    pub year: i32,
    pub created: usize,
    pub updated: usize,
    pub skipped_blank: usize,
    pub errors: Vec<RowError>,
    pub elapsed: Duration,
}

impl ImportBatchResult {
    pub fn new(batch_id: String, file_name: Option<String>, year: i32) -> Self {
        Self {
            batch_id,
            file_name,
            year,
            created: 0,
            updated: 0,
            skipped_blank: 0,
            errors: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// 实际处理的行数
    pub fn attempted(&self) -> usize {
        self.created + self.updated + self.errors.len()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_columns_message() {
        let cells: Vec<String> = (0..9).map(|i| i.to_string()).collect();
        let err = ImportRow::from_positional(4, cells).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Row 4: Insufficient columns (expected 11, got 9)"
        );
    }

    #[test]
    fn test_positional_row_trims_and_drops_extra_columns() {
        let mut cells: Vec<String> = ImportColumn::ALL.iter().map(|c| format!(" {} ", c.header())).collect();
        cells.push("extra".to_string());
        let row = ImportRow::from_positional(2, cells).unwrap();
        assert_eq!(row.values().len(), 11);
        assert_eq!(row.leave_type_name(), "Leave Type");
    }

    #[test]
    fn test_named_row_missing_columns_are_blank() {
        let row = ImportRow::from_named(3, |header| match header {
            "Employee ID" => Some("EMP9".to_string()),
            "Leave Type" => Some(" Sick Leave ".to_string()),
            _ => None,
        });
        assert_eq!(row.employee_code(), "EMP9");
        assert_eq!(row.leave_type_name(), "Sick Leave");
        assert_eq!(row.year(), "");
    }

    #[test]
    fn test_header_lookup() {
        assert_eq!(ImportColumn::from_header(" Carry Forwarded"), Some(ImportColumn::CarryForwarded));
        assert_eq!(ImportColumn::CarryForwarded.index(), 9);
        assert_eq!(ImportColumn::from_header("carry forwarded"), None);
    }

    #[test]
    fn test_blank_row() {
        assert!(is_blank_row(&["", "  ", "\t"]));
        assert!(!is_blank_row(&["", "x"]));
    }
}
