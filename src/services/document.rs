use anyhow::{anyhow, Context, Result};
use epub::doc::EpubDoc;
use std::io::Cursor;
use std::path::Path;

/// Line width handed to html2text; the chunker re-splits on whitespace anyway.
const HTML_WIDTH: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Html,
    Epub,
    Pdf,
}

impl DocumentKind {
    pub const SUPPORTED_EXTENSIONS: &'static [&'static str] =
        &["txt", "md", "html", "htm", "epub", "pdf"];

    pub fn from_path(path: &str) -> Option<Self> {
        let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "md" => Some(DocumentKind::PlainText),
            "html" | "htm" => Some(DocumentKind::Html),
            "epub" => Some(DocumentKind::Epub),
            "pdf" => Some(DocumentKind::Pdf),
            _ => None,
        }
    }
}

/// Plain text of a document. May be empty; the caller decides what that means.
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String> {
    match kind {
        DocumentKind::PlainText => {
            String::from_utf8(bytes.to_vec()).context("Document is not valid UTF-8")
        }
        DocumentKind::Html => html_to_text(bytes),
        DocumentKind::Epub => epub_to_text(bytes),
        DocumentKind::Pdf => pdf_to_text(bytes),
    }
}

fn html_to_text(bytes: &[u8]) -> Result<String> {
    html2text::from_read(bytes, HTML_WIDTH).map_err(|e| anyhow!("Failed to render HTML: {:?}", e))
}

fn epub_to_text(bytes: &[u8]) -> Result<String> {
    let mut doc = EpubDoc::from_reader(Cursor::new(bytes.to_vec()))
        .map_err(|e| anyhow!("Failed to open EPUB: {:?}", e))?;

    let mut sections = Vec::new();
    loop {
        // Chapters that cannot be read are skipped
        if let Some((content, mimetype)) = doc.get_current_str() {
            if mimetype == "application/xhtml+xml" || mimetype == "text/html" {
                let text = html_to_text(content.as_bytes())?;
                if !text.trim().is_empty() {
                    sections.push(text);
                }
            }
        }
        if !doc.go_next() {
            break;
        }
    }

    Ok(sections.join("\n"))
}

fn pdf_to_text(bytes: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed fonts and streams
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| anyhow!("PDF parser panicked"))?
        .map_err(|e| anyhow!("Failed to read PDF: {:?}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(DocumentKind::from_path("a/b/report.TXT"), Some(DocumentKind::PlainText));
        assert_eq!(DocumentKind::from_path("notes.md"), Some(DocumentKind::PlainText));
        assert_eq!(DocumentKind::from_path("page.htm"), Some(DocumentKind::Html));
        assert_eq!(DocumentKind::from_path("book.epub"), Some(DocumentKind::Epub));
        assert_eq!(DocumentKind::from_path("paper.PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_path("slides.pptx"), None);
        assert_eq!(DocumentKind::from_path("no_extension"), None);
    }

    #[test]
    fn test_plain_text_passthrough() {
        let text = extract_text(DocumentKind::PlainText, "hello world".as_bytes()).unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        assert!(extract_text(DocumentKind::PlainText, &[0xff, 0xfe, 0x00]).is_err());
    }

    #[test]
    fn test_html_tags_stripped() {
        let html = b"<html><body><h1>Title</h1><p>Some <b>bold</b> text.</p></body></html>";
        let text = extract_text(DocumentKind::Html, html).unwrap();
        assert!(text.contains("Title"));
        assert!(text.contains("bold"));
        assert!(!text.contains("<p>"));
    }

    #[test]
    fn test_garbage_epub_rejected() {
        assert!(extract_text(DocumentKind::Epub, b"not a zip archive").is_err());
    }

    /// One-page PDF showing `text` in Helvetica, with a correct xref table.
    fn single_page_pdf(text: &str) -> Vec<u8> {
        let content = format!("BT /F1 24 Tf 72 720 Td ({}) Tj ET", text);
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
             /Resources << /Font << /F1 5 0 R >> >> >>"
                .to_string(),
            format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                content.len(),
                content
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref_start = pdf.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            xref.push_str(&format!("{:010} 00000 n \n", offset));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_start
        ));
        pdf.extend_from_slice(xref.as_bytes());
        pdf
    }

    #[test]
    fn test_pdf_text_extracted() {
        let pdf = single_page_pdf("Quarterly results improved");
        let text = extract_text(DocumentKind::Pdf, &pdf).unwrap();
        assert!(text.contains("Quarterly"));
        assert!(text.contains("improved"));
    }

    #[test]
    fn test_garbage_pdf_rejected() {
        assert!(extract_text(DocumentKind::Pdf, b"%PDF-1.7 truncated").is_err());
    }
}
