//! Modern word-processor (`.docx`) text recovery.
//!
//! The paragraph stream is decoded with `docx-rs`; table rows are rendered
//! as one tab-separated line each. When the typed reader fails or finds no
//! text, `word/document.xml` is pulled straight out of the zip container and
//! its `<w:t>` nodes are grouped by `<w:p>` paragraph.

use crate::error::{CapacityError, Result};
use crate::models::RecoveredText;
use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent, TableChild,
    TableRowChild, read_docx,
};
use regex::Regex;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, warn};

const DOCUMENT_PART: &str = "word/document.xml";

/// Recover lines from `.docx` bytes
pub fn recover(path: &Path, bytes: &[u8]) -> Result<RecoveredText> {
    Ok(RecoveredText::from_text(&extract_text(path, bytes)?))
}

/// Plain text of a `.docx`, paragraph stream first, raw XML second
pub fn extract_text(path: &Path, bytes: &[u8]) -> Result<String> {
    match paragraph_stream_text(bytes) {
        Ok(text) if !text.trim().is_empty() => return Ok(text),
        Ok(_) => debug!("Paragraph stream of {} is empty", path.display()),
        Err(reason) => warn!(
            "docx reader failed for {}: {}; falling back to raw XML",
            path.display(),
            reason
        ),
    }

    let text = container_text(bytes)?;
    if text.trim().is_empty() {
        return Err(CapacityError::RecoveryFailed {
            path: path.to_path_buf(),
            reason: "no text nodes in document part".to_string(),
        });
    }
    Ok(text)
}

fn paragraph_stream_text(bytes: &[u8]) -> std::result::Result<String, String> {
    let docx = read_docx(bytes).map_err(|e| format!("{:?}", e))?;
    let mut lines = Vec::new();

    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => lines.push(paragraph_text(paragraph)),
            DocumentChild::Table(table) => lines.extend(table_lines(table)),
            _ => {}
        }
    }

    Ok(lines.join("\n"))
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();

    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                match run_child {
                    RunChild::Text(t) => text.push_str(&t.text),
                    RunChild::Tab(_) => text.push('\t'),
                    _ => {}
                }
            }
        }
    }

    text
}

#[allow(irrefutable_let_patterns)]
fn table_lines(table: &Table) -> Vec<String> {
    let mut lines = Vec::new();

    for child in &table.rows {
        let TableChild::TableRow(row) = child else {
            continue;
        };
        let mut cells = Vec::new();
        for row_child in &row.cells {
            let TableRowChild::TableCell(cell) = row_child else {
                continue;
            };
            let mut cell_text = Vec::new();
            for content in &cell.children {
                match content {
                    TableCellContent::Paragraph(paragraph) => {
                        cell_text.push(paragraph_text(paragraph))
                    }
                    TableCellContent::Table(nested) => cell_text.extend(table_lines(nested)),
                    _ => {}
                }
            }
            cells.push(cell_text.join(" ").trim().to_string());
        }
        lines.push(cells.join("\t"));
    }

    lines
}

/// Text nodes of `word/document.xml`, one line per paragraph
pub fn container_text(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive.by_name(DOCUMENT_PART)?.read_to_string(&mut xml)?;

    xml_paragraphs(&xml)
}

fn xml_paragraphs(xml: &str) -> Result<String> {
    let paragraph = Regex::new(r"(?s)<w:p[ >].*?</w:p>")?;
    let node = Regex::new(r"(?s)<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:tab/>")?;

    let lines: Vec<String> = paragraph
        .find_iter(xml)
        .map(|p| {
            node.captures_iter(p.as_str())
                .map(|caps| match caps.get(1) {
                    Some(text) => decode_entities(text.as_str()),
                    None => "\t".to_string(),
                })
                .collect::<String>()
        })
        .filter(|line| !line.is_empty())
        .collect();

    Ok(lines.join("\n"))
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    /// Minimal `.docx` container with one paragraph per line
    pub(crate) fn build_docx(lines: &[&str]) -> Vec<u8> {
        let body: String = lines
            .iter()
            .map(|line| {
                let runs: String = line
                    .split('\t')
                    .map(|part| format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, part))
                    .collect::<Vec<_>>()
                    .join("<w:r><w:tab/></w:r>");
                format!("<w:p>{}</w:p>", runs)
            })
            .collect();
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        );

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            let options = SimpleFileOptions::default();
            writer.start_file("[Content_Types].xml", options).unwrap();
            writer
                .write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#)
                .unwrap();
            writer.start_file(DOCUMENT_PART, options).unwrap();
            writer.write_all(document.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn test_container_text_groups_paragraphs() {
        let bytes = build_docx(&["Prison Name", "Altcourse\t794", "A &amp; B"]);
        let text = container_text(&bytes).unwrap();
        assert_eq!(text, "Prison Name\nAltcourse\t794\nA & B");
    }

    #[test]
    fn test_extract_text_reads_paragraphs() {
        let bytes = build_docx(&["Report Date: 31/03/2023", "Prison Name  Baseline CNA"]);
        let text = extract_text(Path::new("report.docx"), &bytes).unwrap();
        assert!(text.contains("Report Date: 31/03/2023"));
        assert!(text.contains("Prison Name  Baseline CNA"));
    }

    #[test]
    fn test_paragraph_properties_not_mistaken_for_paragraphs() {
        let xml = r#"<w:body><w:p><w:pPr><w:tabs><w:tab w:val="left"/></w:tabs></w:pPr><w:r><w:t>Ashfield</w:t></w:r></w:p></w:body>"#;
        assert_eq!(xml_paragraphs(xml).unwrap(), "Ashfield");
    }

    #[test]
    fn test_not_a_zip_fails() {
        let result = extract_text(Path::new("broken.docx"), b"not a zip archive");
        assert!(result.is_err());
    }
}
