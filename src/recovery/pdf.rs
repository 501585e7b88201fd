//! Page document (`.pdf`) text recovery.
//!
//! Lines are rebuilt page by page from the content stream: a line break
//! comes from `T*`, `'`, `"` or a vertical move, and text placed further
//! along the same baseline is joined with a tab. The last page of a
//! multi-page report holds definitions and footnotes, so the table pass
//! leaves it out; the relaxed pass reads every page.

use crate::error::Result;
use crate::models::RecoveredText;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};
use std::path::Path;
use tracing::{debug, warn};

/// Vertical distance below which two positions share a baseline
const BASELINE_TOLERANCE: f64 = 1.0;

/// `TJ` adjustment (thousandths of an em) wide enough to read as a space
const TJ_SPACE_ADJUSTMENT: f64 = -200.0;

/// Text of every page, in page order
pub fn page_texts(path: &Path, bytes: &[u8]) -> Result<Vec<String>> {
    let document = Document::load_mem(bytes)?;
    let pages = document.get_pages();
    debug!("{} has {} pages", path.display(), pages.len());

    let texts = pages
        .iter()
        .map(|(&number, &page_id)| match page_lines(&document, page_id) {
            Ok(lines) if !lines.is_empty() => lines.join("\n"),
            Ok(_) => fallback_text(&document, number, path),
            Err(e) => {
                warn!(
                    "Could not read content of page {} of {}: {}",
                    number,
                    path.display(),
                    e
                );
                fallback_text(&document, number, path)
            }
        })
        .collect();

    Ok(texts)
}

/// Lines of one page rebuilt from its content stream
fn page_lines(document: &Document, page_id: ObjectId) -> Result<Vec<String>> {
    let content = Content::decode(&document.get_page_content(page_id)?)?;
    let mut builder = LineBuilder::default();
    for operation in &content.operations {
        builder.apply(operation);
    }
    Ok(builder.finish())
}

/// Text extraction without positioning, for pages the content walk cannot read
fn fallback_text(document: &Document, number: u32, path: &Path) -> String {
    document.extract_text(&[number]).unwrap_or_else(|e| {
        warn!(
            "Could not extract page {} of {}: {}",
            number,
            path.display(),
            e
        );
        String::new()
    })
}

/// Accumulates shown strings into lines while tracking the baseline
#[derive(Debug, Default)]
struct LineBuilder {
    lines: Vec<String>,
    current: String,
    /// Baseline of the text line matrix
    line_y: f64,
    /// Baseline the current line was started on
    current_y: Option<f64>,
    leading: f64,
    /// A move along the baseline happened since the last shown string
    pending_gap: bool,
}

impl LineBuilder {
    fn apply(&mut self, operation: &Operation) {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "BT" => self.line_y = 0.0,
            "TL" => self.leading = number(operands, 0).unwrap_or(self.leading),
            "Td" => self.move_to(self.line_y + number(operands, 1).unwrap_or(0.0)),
            "TD" => {
                let ty = number(operands, 1).unwrap_or(0.0);
                self.leading = -ty;
                self.move_to(self.line_y + ty);
            }
            "Tm" => self.move_to(number(operands, 5).unwrap_or(self.line_y)),
            "T*" => self.next_line(),
            "Tj" => self.show(operands.first()),
            "'" => {
                self.next_line();
                self.show(operands.first());
            }
            "\"" => {
                self.next_line();
                self.show(operands.get(2));
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        match item {
                            Object::String(..) => self.show(Some(item)),
                            other => {
                                let adjustment = as_number(other).unwrap_or(0.0);
                                if adjustment < TJ_SPACE_ADJUSTMENT && !self.current.ends_with(' ') {
                                    self.current.push(' ');
                                }
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn move_to(&mut self, y: f64) {
        self.line_y = y;
        match self.current_y {
            Some(current) if (current - y).abs() <= BASELINE_TOLERANCE => self.pending_gap = true,
            _ => self.break_line(),
        }
    }

    fn next_line(&mut self) {
        self.line_y -= self.leading;
        self.break_line();
    }

    fn break_line(&mut self) {
        let line = std::mem::take(&mut self.current);
        if !line.trim().is_empty() {
            self.lines.push(line.trim_end().to_string());
        }
        self.current_y = None;
        self.pending_gap = false;
    }

    fn show(&mut self, object: Option<&Object>) {
        let Some(Object::String(bytes, _)) = object else {
            return;
        };
        let text = decode_string(bytes);
        if text.is_empty() {
            return;
        }

        if self.current_y.is_none() {
            self.current_y = Some(self.line_y);
        }
        if self.pending_gap && !self.current.is_empty() && !self.current.ends_with(char::is_whitespace) {
            self.current.push('\t');
        }
        self.pending_gap = false;
        self.current.push_str(&text);
    }

    fn finish(mut self) -> Vec<String> {
        self.break_line();
        self.lines
    }
}

fn number(operands: &[Object], index: usize) -> Option<f64> {
    operands.get(index).and_then(as_number)
}

fn as_number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

/// UTF-16BE when the string carries a byte order mark, Latin-1 otherwise
fn decode_string(bytes: &[u8]) -> String {
    match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => {
            let units: Vec<u16> = utf16
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        None => bytes.iter().map(|&byte| char::from(byte)).collect(),
    }
}

/// Recover table pages, dropping the trailing definitions page
pub fn recover(path: &Path, bytes: &[u8]) -> Result<RecoveredText> {
    let mut pages = page_texts(path, bytes)?;
    if pages.len() > 1 {
        pages.pop();
    }
    Ok(RecoveredText::from_pages(pages))
}

/// Recover every page, for the relaxed fallback scan
pub fn recover_all_pages(path: &Path, bytes: &[u8]) -> Result<RecoveredText> {
    Ok(RecoveredText::from_pages(page_texts(path, bytes)?))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    /// Build a PDF with one page per entry, one text line per element
    pub(crate) fn build_pdf(pages: &[Vec<&str>]) -> Vec<u8> {
        let pages: Vec<Vec<Operation>> = pages
            .iter()
            .map(|lines| {
                let mut operations = vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 10.into()]),
                    Operation::new("TL", vec![12.into()]),
                    Operation::new("Td", vec![40.into(), 800.into()]),
                ];
                for line in lines {
                    operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
                    operations.push(Operation::new("T*", vec![]));
                }
                operations.push(Operation::new("ET", vec![]));
                operations
            })
            .collect();
        build_pdf_from_operations(pages)
    }

    /// Build a PDF with one page per content stream
    pub(crate) fn build_pdf_from_operations(pages: Vec<Vec<Operation>>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for operations in pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_last_page_dropped_for_multi_page_documents() {
        let bytes = build_pdf(&[
            vec!["Prison Name page one"],
            vec!["Definitions of Accommodation"],
        ]);
        let text = recover(Path::new("report.pdf"), &bytes).unwrap();
        let plain = text.plain_text();
        assert!(plain.contains("page one"));
        assert!(!plain.contains("Definitions"));

        let all = recover_all_pages(Path::new("report.pdf"), &bytes).unwrap();
        assert!(all.plain_text().contains("Definitions"));
    }

    #[test]
    fn test_single_page_kept() {
        let bytes = build_pdf(&[vec!["Prison Name only page"]]);
        let text = recover(Path::new("report.pdf"), &bytes).unwrap();
        assert!(text.plain_text().contains("only page"));
    }

    #[test]
    fn test_line_breaks_follow_text_positioning() {
        let bytes = build_pdf(&[vec![
            "Report Date: 31/03/2023",
            "Altcourse 794 794 1164 1150 145% 1%",
            "Total 794",
        ]]);
        let pages = page_texts(Path::new("report.pdf"), &bytes).unwrap();
        assert_eq!(
            pages,
            vec!["Report Date: 31/03/2023\nAltcourse 794 794 1164 1150 145% 1%\nTotal 794"]
        );
    }

    #[test]
    fn test_cells_on_one_baseline_joined_with_tabs() {
        let text = |s: &str| Object::string_literal(s);
        let bytes = build_pdf_from_operations(vec![vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Tm", vec![1.into(), 0.into(), 0.into(), 1.into(), 40.into(), 700.into()]),
            Operation::new("Tj", vec![text("Prison Name")]),
            Operation::new("Td", vec![120.into(), 0.into()]),
            Operation::new("Tj", vec![text("Population")]),
            Operation::new("ET", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Tm", vec![1.into(), 0.into(), 0.into(), 1.into(), 40.into(), 688.into()]),
            Operation::new(
                "TJ",
                vec![Object::Array(vec![text("Brixton"), (-400).into(), text("700")])],
            ),
            Operation::new("TD", vec![0.into(), (-12).into()]),
            Operation::new("Tj", vec![text("Bure")]),
            Operation::new("'", vec![text("Channings Wood")]),
            Operation::new("ET", vec![]),
        ]]);

        let pages = page_texts(Path::new("report.pdf"), &bytes).unwrap();
        let lines: Vec<&str> = pages[0].lines().collect();
        assert_eq!(lines, vec!["Prison Name\tPopulation", "Brixton 700", "Bure", "Channings Wood"]);
    }

    #[test]
    fn test_utf16_strings_decoded() {
        assert_eq!(decode_string(&[0xFE, 0xFF, 0x00, 0x41, 0x00, 0xE9]), "A\u{e9}");
        assert_eq!(decode_string(b"Wymott"), "Wymott");
    }

    #[test]
    fn test_invalid_pdf_is_error() {
        assert!(recover(Path::new("broken.pdf"), b"%PDF-garbage").is_err());
    }
}
