// ==========================================
// 员工假期追踪系统 - 导入层
// ==========================================
// 职责: 外部表格数据导入为追踪记录
// 支持: CSV, Excel (.xlsx/.xls, 需 spreadsheet 特性)
// ==========================================

// 模块声明
pub mod encoding;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod leave_importer;
pub mod template;

// 重导出核心类型
pub use encoding::{decode_text, TextEncoding};
pub use error::{ImportError, ImportResult};
pub use field_mapper::{safe_float, FieldMapper};
pub use file_parser::{positional_rows, CsvParser, FileKind, FileParser, ParsedRows, UniversalFileParser};
#[cfg(feature = "spreadsheet")]
pub use file_parser::ExcelParser;
pub use leave_importer::{render_summary, LeaveImporterImpl, TrackerImporter};
pub use template::{template_csv, TEMPLATE_FILE_NAME, TEMPLATE_MIME_TYPE};
