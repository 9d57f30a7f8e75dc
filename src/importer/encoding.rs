// ==========================================
// 员工假期追踪系统 - 文本编码识别
// ==========================================
// 顺序: UTF-8 → UTF-8 (BOM) → ISO-8859-1 → Windows-1252
// 规则: ISO-8859-1 结果不得含 C1 控制字符 (U+0080..U+009F)
//       Windows-1252 结果不得含未定义码位 (0x81/0x8D/0x8F/0x90/0x9D)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use encoding_rs::WINDOWS_1252;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// 识别出的文本编码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf8Bom,
    Latin1,
    Windows1252,
}

fn is_c1_control(c: char) -> bool {
    ('\u{80}'..='\u{9F}').contains(&c)
}

fn decode_latin1(bytes: &[u8]) -> Option<String> {
    let text: String = bytes.iter().map(|&b| b as char).collect();
    if text.chars().any(is_c1_control) {
        None
    } else {
        Some(text)
    }
}

fn decode_windows_1252(bytes: &[u8]) -> Option<String> {
    // encoding_rs 将 5 个未定义字节映射为同值 C1 码位
    let (text, had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
    if had_errors || text.chars().any(is_c1_control) {
        None
    } else {
        Some(text.into_owned())
    }
}

/// 按固定顺序解码; 全部失败时整个导入中止
pub fn decode_text(bytes: &[u8]) -> ImportResult<(String, TextEncoding)> {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        if let Ok(text) = std::str::from_utf8(rest) {
            return Ok((text.to_string(), TextEncoding::Utf8Bom));
        }
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok((text.to_string(), TextEncoding::Utf8));
    }
    if let Some(text) = decode_latin1(bytes) {
        return Ok((text, TextEncoding::Latin1));
    }
    if let Some(text) = decode_windows_1252(bytes) {
        return Ok((text, TextEncoding::Windows1252));
    }
    Err(ImportError::UndecodableText)
}
