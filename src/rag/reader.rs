//! Document readers for the supported ingestion formats.
//!
//! Dispatch is by file extension: `.txt` straight from disk, `.pdf` via
//! `pdf-extract`, `.docx` by pulling `word/document.xml` out of the zip
//! container and stripping the WordprocessingML markup.

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::core::errors::RagError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Text,
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Maps a path's extension (case-insensitive) to a supported format.
    pub fn from_path(path: &Path) -> Option<DocumentFormat> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "txt" => Some(DocumentFormat::Text),
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            _ => None,
        }
    }
}

/// Reads the full text of one document. Unsupported extensions are an
/// error; ingestion decides whether to skip or abort.
pub fn read_document(path: &Path) -> Result<String, RagError> {
    let Some(format) = DocumentFormat::from_path(path) else {
        return Err(RagError::UnsupportedFormat(path.display().to_string()));
    };

    match format {
        DocumentFormat::Text => fs::read_to_string(path)
            .map_err(|e| RagError::document_read(path.display().to_string(), e)),
        DocumentFormat::Pdf => pdf_extract::extract_text(path)
            .map_err(|e| RagError::document_read(path.display().to_string(), e)),
        DocumentFormat::Docx => read_docx(path),
    }
}

fn read_docx(path: &Path) -> Result<String, RagError> {
    let file =
        fs::File::open(path).map_err(|e| RagError::document_read(path.display().to_string(), e))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| RagError::document_read(path.display().to_string(), e))?;
    let mut entry = archive
        .by_name("word/document.xml")
        .map_err(|e| RagError::document_read(path.display().to_string(), e))?;

    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| RagError::document_read(path.display().to_string(), e))?;

    Ok(docx_xml_to_text(&xml))
}

/// Extracts plain text from WordprocessingML, one line per paragraph.
fn docx_xml_to_text(xml: &str) -> String {
    // Paragraph closings become newlines before the markup is dropped.
    let with_breaks = xml.replace("</w:p>", "\n");

    let mut result = String::with_capacity(with_breaks.len());
    let mut in_tag = false;
    for c in with_breaks.chars() {
        if c == '<' {
            in_tag = true;
        } else if c == '>' {
            in_tag = false;
        } else if !in_tag {
            result.push(c);
        }
    }

    // Ampersand decoded last so double-escaped entities stay literal.
    let decoded = result
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&");

    decoded.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn extension_dispatch_is_case_insensitive() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("notes.txt")),
            Some(DocumentFormat::Text)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("REPORT.PDF")),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("letter.Docx")),
            Some(DocumentFormat::Docx)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("image.png")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("no_extension")), None);
    }

    #[test]
    fn reads_plain_text_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "Paris is the capital of France.").unwrap();

        let text = read_document(&path).unwrap();
        assert!(text.contains("Paris is the capital of France."));
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let result = read_document(Path::new("diagram.svg"));
        assert!(matches!(result, Err(RagError::UnsupportedFormat(_))));
    }

    #[test]
    fn missing_text_file_is_a_read_error() {
        let result = read_document(Path::new("/nonexistent/notes.txt"));
        assert!(matches!(result, Err(RagError::DocumentRead { .. })));
    }

    #[test]
    fn docx_markup_is_stripped_to_paragraphs() {
        let xml = r#"<w:document><w:body>
            <w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>
            <w:p><w:r><w:t>Second &amp; third.</w:t></w:r></w:p>
        </w:body></w:document>"#;

        let text = docx_xml_to_text(xml);
        assert!(text.contains("First paragraph."));
        assert!(text.contains("Second & third."));
        assert!(!text.contains('<'));
        let first_line = text.lines().next().unwrap().trim();
        assert_eq!(first_line, "First paragraph.");
    }
}
