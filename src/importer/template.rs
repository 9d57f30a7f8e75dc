// ==========================================
// 员工假期追踪系统 - 导入模板生成
// ==========================================

use crate::domain::ImportColumn;
use crate::importer::error::{ImportError, ImportResult};
use csv::WriterBuilder;

pub const TEMPLATE_FILE_NAME: &str = "hr_leave_template.csv";
pub const TEMPLATE_MIME_TYPE: &str = "text/csv";

const SAMPLE_ROW: [&str; ImportColumn::COUNT] = [
    "EMP001",
    "John Doe",
    "HR",
    "Annual Leave",
    "2025",
    "20",
    "5",
    "2",
    "15",
    "3",
    "0",
];

/// 生成模板 CSV 内容（表头 + 一行示例）
pub fn template_csv() -> ImportResult<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(ImportColumn::ALL.iter().map(|c| c.header()))?;
    writer.write_record(SAMPLE_ROW)?;
    writer
        .into_inner()
        .map_err(|e| ImportError::CsvParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::file_parser::{CsvParser, FileParser};

    #[test]
    fn test_template_content() {
        let bytes = template_csv().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Employee ID,Name,Department,Leave Type,Year,Total Allocation,Taken Leaves,Pending Requests,Current Balance,Carry Forwarded,Expired Carry")
        );
        assert_eq!(lines.next(), Some("EMP001,John Doe,HR,Annual Leave,2025,20,5,2,15,3,0"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_template_parses_back() {
        let parsed = CsvParser.parse_bytes(&template_csv().unwrap()).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].as_ref().unwrap().employee_name(), "John Doe");
    }
}
