//! Spreadsheet (`.ods`) cell recovery.

use crate::error::{CapacityError, Result};
use crate::models::RecoveredText;
use calamine::{Data, Ods, Reader};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Rows of the first sheet as cell text
pub fn recover(path: &Path, bytes: &[u8]) -> Result<RecoveredText> {
    let mut workbook: Ods<_> =
        Ods::new(Cursor::new(bytes)).map_err(|e| CapacityError::RecoveryFailed {
            path: path.to_path_buf(),
            reason: format!("not a readable spreadsheet: {}", e),
        })?;

    let range = match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => range,
        Some(Err(e)) => {
            return Err(CapacityError::RecoveryFailed {
                path: path.to_path_buf(),
                reason: format!("first sheet unreadable: {}", e),
            });
        }
        None => {
            debug!("{} has no sheets", path.display());
            return Ok(RecoveredText::empty());
        }
    };

    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    debug!("{}: {} spreadsheet rows", path.display(), rows.len());

    Ok(RecoveredText::from_rows(rows))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.trim().to_string(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        Data::Float(value) => value.to_string(),
        Data::Int(value) => value.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::SourceLine;
    use std::io::Write;
    use zip::CompressionMethod;
    use zip::write::SimpleFileOptions;

    const MIMETYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";
    const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?><manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.2"><manifest:file-entry manifest:full-path="/" manifest:version="1.2" manifest:media-type="application/vnd.oasis.opendocument.spreadsheet"/><manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/></manifest:manifest>"#;

    /// Minimal single-sheet `.ods`; numeric-looking cells become float cells
    pub(crate) fn build_ods(rows: &[Vec<&str>]) -> Vec<u8> {
        let body: String = rows
            .iter()
            .map(|row| {
                let cells: String = row
                    .iter()
                    .map(|cell| match cell.parse::<f64>() {
                        Ok(value) => format!(
                            r#"<table:table-cell office:value-type="float" office:value="{}"><text:p>{}</text:p></table:table-cell>"#,
                            value, cell
                        ),
                        Err(_) if cell.is_empty() => "<table:table-cell/>".to_string(),
                        Err(_) => format!(
                            r#"<table:table-cell office:value-type="string"><text:p>{}</text:p></table:table-cell>"#,
                            cell
                        ),
                    })
                    .collect();
                format!("<table:table-row>{}</table:table-row>", cells)
            })
            .collect();

        let content = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" office:version="1.2"><office:body><office:spreadsheet><table:table table:name="Sheet1">{}</table:table></office:spreadsheet></office:body></office:document-content>"#,
            body
        );

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
            writer.start_file("mimetype", stored).unwrap();
            writer.write_all(MIMETYPE.as_bytes()).unwrap();
            writer
                .start_file("META-INF/manifest.xml", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(MANIFEST.as_bytes()).unwrap();
            writer
                .start_file("content.xml", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn test_rows_recovered_as_cells() {
        let bytes = build_ods(&[
            vec!["Prison Name", "Baseline CNA", "Population *"],
            vec!["Altcourse", "794", "1,150"],
        ]);
        let text = recover(Path::new("report.ods"), &bytes).unwrap();
        let page = &text.pages()[0];

        assert_eq!(
            page[0],
            SourceLine::Cells(vec![
                "Prison Name".to_string(),
                "Baseline CNA".to_string(),
                "Population *".to_string()
            ])
        );
        assert_eq!(
            page[1],
            SourceLine::Cells(vec![
                "Altcourse".to_string(),
                "794".to_string(),
                "1,150".to_string()
            ])
        );
    }

    #[test]
    fn test_integral_floats_render_without_fraction() {
        assert_eq!(cell_text(&Data::Float(794.0)), "794");
        assert_eq!(cell_text(&Data::Float(97.5)), "97.5");
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String("  Ashfield ".into())), "Ashfield");
    }

    #[test]
    fn test_not_a_spreadsheet() {
        let result = recover(Path::new("broken.ods"), b"plain text");
        assert!(matches!(result, Err(CapacityError::RecoveryFailed { .. })));
    }
}
