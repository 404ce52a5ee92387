//! 上传文件的魔术字节校验

const PDF_MAGIC: &[u8] = b"%PDF";
const ZIP_MAGIC: &[u8] = &[0x50, 0x4B, 0x03, 0x04];

/// 内容是否为 PDF
pub fn is_pdf(data: &[u8]) -> bool {
    data.starts_with(PDF_MAGIC)
}

/// 文件内容是否与扩展名（含点号，如 `.pdf`）一致
///
/// 纯文本类型不校验内容，未知扩展名一律拒绝。
pub fn validate_magic_bytes(data: &[u8], extension: &str) -> bool {
    if data.is_empty() {
        return false;
    }

    match extension.to_ascii_lowercase().as_str() {
        ".pdf" => is_pdf(data),
        ".png" => data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
        ".jpg" | ".jpeg" => data.starts_with(&[0xFF, 0xD8, 0xFF]),
        // OOXML 文档本质是 zip
        ".docx" | ".xlsx" | ".pptx" => data.starts_with(ZIP_MAGIC),
        ".txt" | ".md" | ".csv" => std::str::from_utf8(data).is_ok(),
        _ => false,
    }
}

/// 取文件名的扩展名（小写，含点号）
pub fn extension_of(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_magic() {
        assert!(validate_magic_bytes(b"%PDF-1.5\n", ".pdf"));
        assert!(validate_magic_bytes(b"%PDF-1.5\n", ".PDF"));
        assert!(!validate_magic_bytes(b"PK\x03\x04", ".pdf"));
    }

    #[test]
    fn test_office_documents_are_zip() {
        assert!(validate_magic_bytes(&[0x50, 0x4B, 0x03, 0x04, 0x14], ".docx"));
        assert!(!validate_magic_bytes(b"%PDF", ".xlsx"));
    }

    #[test]
    fn test_text_must_be_utf8() {
        assert!(validate_magic_bytes(b"Module 1: Lexical analysis", ".txt"));
        assert!(!validate_magic_bytes(&[0xFF, 0xFE, 0x00], ".txt"));
    }

    #[test]
    fn test_empty_and_unknown() {
        assert!(!validate_magic_bytes(&[], ".pdf"));
        assert!(!validate_magic_bytes(b"MZ", ".exe"));
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("Syllabus.PDF").as_deref(), Some(".pdf"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some(".gz"));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of("trailing."), None);
    }
}
