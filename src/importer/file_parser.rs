// ==========================================
// 员工假期追踪系统 - 文件解析器实现
// ==========================================
// 阶段: Parse
// 支持: CSV（按表头列名取值）/ Excel .xlsx .xls（按列位置取值）
// 输出: 统一为 ImportRow（11 列有序值）, 全空白行计数后跳过
// ==========================================

use crate::domain::{is_blank_row, ImportRow, RowError};
use crate::importer::encoding::decode_text;
use crate::importer::error::{ImportError, ImportResult};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::debug;

// ==========================================
// FileKind - 按扩展名判定文件类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Xlsx,
    Xls,
}

impl FileKind {
    /// 未知扩展名按 CSV 处理
    pub fn from_file_name(file_name: &str) -> Self {
        let lowered = file_name.trim().to_lowercase();
        if lowered.ends_with(".xlsx") {
            FileKind::Xlsx
        } else if lowered.ends_with(".xls") {
            FileKind::Xls
        } else {
            FileKind::Csv
        }
    }

    pub fn from_path(path: &Path) -> Self {
        Self::from_file_name(&path.to_string_lossy())
    }

    pub fn is_spreadsheet(&self) -> bool {
        matches!(self, FileKind::Xlsx | FileKind::Xls)
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Csv => "CSV",
            FileKind::Xlsx => "Excel (.xlsx)",
            FileKind::Xls => "Excel (.xls)",
        }
    }
}

// ==========================================
// ParsedRows - 解析阶段输出
// ==========================================
#[derive(Debug, Default)]
pub struct ParsedRows {
    pub rows: Vec<Result<ImportRow, RowError>>, // 形状错误的行以 Err 保留
    pub skipped_blank: usize,
}

impl ParsedRows {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 文件解析接口
pub trait FileParser: Send + Sync {
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<ParsedRows>;
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<ParsedRows> {
        let (text, encoding) = decode_text(bytes)?;
        debug!(?encoding, "CSV 编码识别完成");

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut parsed = ParsedRows::default();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            // 行号取记录起始行（表头为第 1 行）
            let row_number = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 2);

            let cells: Vec<&str> = record.iter().collect();
            if is_blank_row(&cells) {
                parsed.skipped_blank += 1;
                continue;
            }

            let row = ImportRow::from_named(row_number, |header| {
                headers
                    .iter()
                    .position(|h| h == header)
                    .and_then(|i| record.get(i))
                    .map(str::to_string)
            });
            parsed.rows.push(Ok(row));
        }

        Ok(parsed)
    }
}

/// 按位置排列的单元格转为导入行
///
/// - first_row: 表头所在的 1 基行号
/// - leading_columns: 数据区之前的空列数（补空对齐到 A 列）
pub fn positional_rows<I>(first_row: usize, leading_columns: usize, rows: I) -> ParsedRows
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut parsed = ParsedRows::default();
    // 跳过表头
    for (idx, cells) in rows.into_iter().enumerate().skip(1) {
        let row_number = first_row + idx;
        if is_blank_row(&cells) {
            parsed.skipped_blank += 1;
            continue;
        }
        let mut aligned = vec![String::new(); leading_columns];
        aligned.extend(cells);
        parsed.rows.push(ImportRow::from_positional(row_number, aligned));
    }
    parsed
}

// ==========================================
// Excel Parser 实现
// ==========================================
#[cfg(feature = "spreadsheet")]
pub struct ExcelParser;

#[cfg(feature = "spreadsheet")]
impl FileParser for ExcelParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<ParsedRows> {
        use calamine::{open_workbook_auto_from_rs, Reader};
        use std::io::Cursor;

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ImportError::ExcelParseError("workbook has no sheets".to_string()))??;

        let Some((start_row, start_col)) = range.start() else {
            return Ok(ParsedRows::default());
        };

        let rows = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string().trim().to_string()).collect::<Vec<_>>());

        Ok(positional_rows(
            start_row as usize + 1,
            start_col as usize,
            rows,
        ))
    }
}

// ==========================================
// 通用文件解析器（根据文件类型自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse_bytes(&self, kind: FileKind, bytes: &[u8]) -> ImportResult<ParsedRows> {
        match kind {
            FileKind::Csv => CsvParser.parse_bytes(bytes),
            #[cfg(feature = "spreadsheet")]
            FileKind::Xlsx | FileKind::Xls => ExcelParser.parse_bytes(bytes),
            #[cfg(not(feature = "spreadsheet"))]
            FileKind::Xlsx | FileKind::Xls => {
                Err(ImportError::SpreadsheetSupportMissing(kind.label().to_string()))
            }
        }
    }

    pub fn parse_file(&self, path: &Path) -> ImportResult<ParsedRows> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let bytes = std::fs::read(path)?;
        self.parse_bytes(FileKind::from_path(path), &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RowErrorKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "Employee ID,Name,Department,Leave Type,Year,Total Allocation,Taken Leaves,Pending Requests,Current Balance,Carry Forwarded,Expired Carry";

    #[test]
    fn test_file_kind_detection() {
        assert_eq!(FileKind::from_file_name("data.XLSX"), FileKind::Xlsx);
        assert_eq!(FileKind::from_file_name("legacy.xls"), FileKind::Xls);
        assert_eq!(FileKind::from_file_name("data.csv"), FileKind::Csv);
        assert_eq!(FileKind::from_file_name("export.txt"), FileKind::Csv);
    }

    #[test]
    fn test_csv_rows_by_header_name() {
        let content = format!(
            "{}\nEMP001,John Doe,HR,Annual Leave,2025,20,5,2,15,3,0\n,,,,,,,,,,\nEMP002,Jane,,Sick Leave,,,,,,,\n",
            HEADER
        );
        let parsed = CsvParser.parse_bytes(content.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.skipped_blank, 1);

        let first = parsed.rows[0].as_ref().unwrap();
        assert_eq!(first.row_number, 2);
        assert_eq!(first.employee_code(), "EMP001");
        assert_eq!(first.leave_type_name(), "Annual Leave");

        let second = parsed.rows[1].as_ref().unwrap();
        assert_eq!(second.row_number, 4);
        assert_eq!(second.year(), "");
    }

    #[test]
    fn test_csv_reordered_columns() {
        let content = "Leave Type,Employee ID,Year\nCasual Leave,EMP007,2024\n";
        let parsed = CsvParser.parse_bytes(content.as_bytes()).unwrap();
        let row = parsed.rows[0].as_ref().unwrap();
        assert_eq!(row.employee_code(), "EMP007");
        assert_eq!(row.leave_type_name(), "Casual Leave");
        assert_eq!(row.year(), "2024");
    }

    #[test]
    fn test_positional_rows_shape_errors() {
        let short: Vec<String> = (0..9).map(|i| format!("v{}", i)).collect();
        let header: Vec<String> = HEADER.split(',').map(str::to_string).collect();
        let blank = vec![String::new(); 11];
        let parsed = positional_rows(1, 0, vec![header, short, blank]);

        assert_eq!(parsed.skipped_blank, 1);
        assert_eq!(parsed.rows.len(), 1);
        let err = parsed.rows[0].as_ref().unwrap_err();
        assert_eq!(err.row, 2);
        assert!(matches!(err.kind, RowErrorKind::InsufficientColumns { got: 9, .. }));
        assert!(err.to_string().contains("Insufficient columns"));
    }

    #[test]
    fn test_positional_rows_pad_leading_columns() {
        let header: Vec<String> = HEADER.split(',').skip(1).map(str::to_string).collect();
        let data: Vec<String> = "John Doe,HR,Annual Leave,2025,20,5,2,15,3,0"
            .split(',')
            .map(str::to_string)
            .collect();
        let parsed = positional_rows(3, 1, vec![header, data]);
        let row = parsed.rows[0].as_ref().unwrap();
        assert_eq!(row.row_number, 4);
        assert_eq!(row.employee_code(), "");
        assert_eq!(row.employee_name(), "John Doe");
    }

    #[test]
    fn test_parse_file_missing() {
        let err = UniversalFileParser
            .parse_file(Path::new("/nonexistent/leave.csv"))
            .unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound(_)));
    }

    #[test]
    fn test_parse_file_csv() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{}", HEADER).unwrap();
        writeln!(temp_file, "EMP001,John Doe,HR,Annual Leave,2025,20,5,2,15,3,0").unwrap();
        temp_file.flush().unwrap();

        let parsed = UniversalFileParser.parse_file(temp_file.path()).unwrap();
        assert_eq!(parsed.rows.len(), 1);
    }

    #[test]
    #[cfg(feature = "spreadsheet")]
    fn test_invalid_workbook_bytes() {
        let err = UniversalFileParser
            .parse_bytes(FileKind::Xlsx, b"not a workbook")
            .unwrap_err();
        assert!(matches!(err, ImportError::ExcelParseError(_)));
    }
}
