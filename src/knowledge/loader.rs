use std::path::Path;

use crate::error::IngestionError;

/// 支持的文档格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    PlainText,
    Markdown,
}

impl DocumentFormat {
    /// 根据文件扩展名判断文档格式
    pub fn from_filename(filename: &str) -> Result<Self, IngestionError> {
        let extension = Path::new(filename)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "txt" | "text" => Ok(DocumentFormat::PlainText),
            "md" | "markdown" => Ok(DocumentFormat::Markdown),
            _ => Err(IngestionError::UnsupportedFormat(filename.to_string())),
        }
    }
}

/// 提取文档的纯文本内容
pub fn extract_text(format: DocumentFormat, bytes: &[u8]) -> Result<String, IngestionError> {
    let text = match format {
        DocumentFormat::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| IngestionError::Pdf(e.to_string()))?,
        DocumentFormat::PlainText | DocumentFormat::Markdown => {
            String::from_utf8_lossy(bytes).to_string()
        }
    };

    Ok(normalize_whitespace(&text))
}

/// PDF抽取出的文本常带有大量空行与行尾空白
fn normalize_whitespace(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut blank_lines = 0;

    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_lines += 1;
            if blank_lines > 1 {
                continue;
            }
        } else {
            blank_lines = 0;
        }
        normalized.push_str(line);
        normalized.push('\n');
    }

    normalized.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_filename() {
        assert_eq!(
            DocumentFormat::from_filename("contract.PDF").unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::from_filename("notes.txt").unwrap(),
            DocumentFormat::PlainText
        );
        assert_eq!(
            DocumentFormat::from_filename("memo.md").unwrap(),
            DocumentFormat::Markdown
        );
        assert!(matches!(
            DocumentFormat::from_filename("image.png"),
            Err(IngestionError::UnsupportedFormat(_))
        ));
        assert!(DocumentFormat::from_filename("no_extension").is_err());
    }

    #[test]
    fn test_extract_plain_text_collapses_blank_lines() {
        let raw = "第一条  定义   \n\n\n\n第二条 付款\n";
        let text = extract_text(DocumentFormat::PlainText, raw.as_bytes()).unwrap();
        assert_eq!(text, "第一条  定义\n\n第二条 付款");
    }

    #[test]
    fn test_extract_invalid_pdf() {
        let result = extract_text(DocumentFormat::Pdf, b"definitely not a pdf");
        assert!(matches!(result, Err(IngestionError::Pdf(_))));
    }
}
