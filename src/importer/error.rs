// ==========================================
// 员工假期追踪系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 仅批次级校验错误（处理任何行之前即中止）
//       行级错误见 domain::import::RowError, 不经由此类型
// 约束: 错误文本原样返回调用方, 保持英文
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 输入校验 =====
    #[error("Please select a file to import.")]
    NoFileSelected,

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("{0} support is not available in this build; convert the file to CSV.")]
    SpreadsheetSupportMissing(String),

    #[error("Unable to decode CSV. Use UTF-8.")]
    UndecodableText,

    #[error("No data found in the file.")]
    NoData,

    // ===== 解析错误 =====
    #[error("CSV parsing error: {0}")]
    CsvParseError(String),

    #[error("Excel parsing error: {0}")]
    ExcelParseError(String),

    #[error("File read error: {0}")]
    FileReadError(String),

    // ===== 存储错误 =====
    #[error("Store error: {0}")]
    Store(#[from] RepositoryError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ImportError::FileNotFound(err.to_string()),
            _ => ImportError::FileReadError(err.to_string()),
        }
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
#[cfg(feature = "spreadsheet")]
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
