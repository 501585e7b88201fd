//! Text recovery layer.
//!
//! Turns a [`RawDocument`] into [`RecoveredText`] according to its declared
//! format. Recovery never fails to the caller: any internal error is logged
//! and surfaces as empty recovered text, which downstream treats as "no
//! usable content".

pub mod capabilities;
pub mod docx;
pub mod legacy;
pub mod ods;
pub mod pdf;
pub mod process;
pub mod rtf;

pub use capabilities::{Capabilities, Editor};

use crate::error::Result;
use crate::models::{DocumentFormat, RawDocument, RecoveredText};
use crate::oracle::TextOracle;
use legacy::{LegacyInput, TempFile};
use std::fs;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Format dispatcher for text recovery
#[derive(Debug, Clone)]
pub struct TextRecovery {
    capabilities: Capabilities,
    oracle: TextOracle,
    tool_timeout: Duration,
}

impl TextRecovery {
    pub fn new(capabilities: Capabilities, oracle: TextOracle, tool_timeout: Duration) -> Self {
        Self {
            capabilities,
            oracle,
            tool_timeout,
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Recover text from a document; failures yield empty text
    pub fn recover(&self, document: &RawDocument) -> RecoveredText {
        match self.try_recover(document) {
            Ok(text) => {
                debug!(
                    "Recovered {} lines from {}",
                    text.line_count(),
                    document.path.display()
                );
                text
            }
            Err(e) => {
                warn!("Text recovery failed for {}: {}", document.file_name(), e);
                RecoveredText::empty()
            }
        }
    }

    /// Recover every page of a page document, final page included
    pub fn recover_all_pages(&self, document: &RawDocument) -> RecoveredText {
        pdf::recover_all_pages(&document.path, &document.bytes).unwrap_or_else(|e| {
            warn!("Relaxed page read failed for {}: {}", document.file_name(), e);
            RecoveredText::empty()
        })
    }

    fn try_recover(&self, document: &RawDocument) -> Result<RecoveredText> {
        let path = &document.path;
        let bytes = &document.bytes;

        match document.format {
            DocumentFormat::RichText => Ok(rtf::recover(bytes)),
            DocumentFormat::ModernWord => docx::recover(path, bytes),
            DocumentFormat::PageDocument => pdf::recover(path, bytes),
            DocumentFormat::Spreadsheet => ods::recover(path, bytes),
            DocumentFormat::LegacyWord => Ok(self.recover_legacy(document)),
        }
    }

    fn recover_legacy(&self, document: &RawDocument) -> RecoveredText {
        let (path, bytes) = match legacy::classify_temp_file(&document.path) {
            TempFile::NotTemp => (document.path.clone(), document.bytes.clone()),
            TempFile::Sibling(original) => {
                info!(
                    "{} is a temp file, reading {} instead",
                    document.file_name(),
                    original.display()
                );
                match fs::read(&original) {
                    Ok(bytes) => (original, bytes),
                    Err(e) => {
                        warn!("Could not read {}: {}", original.display(), e);
                        return RecoveredText::empty();
                    }
                }
            }
            TempFile::Orphan => {
                info!("Skipping temp file {}", document.file_name());
                return RecoveredText::empty();
            }
        };

        let input = LegacyInput {
            path: &path,
            bytes: &bytes,
            capabilities: &self.capabilities,
            timeout: self.tool_timeout,
        };

        match legacy::recover(&input, &self.oracle) {
            Some((_, text)) => RecoveredText::from_text(&text),
            None => RecoveredText::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OracleConfig;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn recovery() -> TextRecovery {
        TextRecovery::new(
            Capabilities::none(),
            TextOracle::new(OracleConfig::default()).unwrap(),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_rtf_dispatch() {
        let document = RawDocument::from_bytes(
            "report.rtf",
            DocumentFormat::RichText,
            br"{\rtf1 Prison Name\par Altcourse\par}".to_vec(),
        );
        let text = recovery().recover(&document);
        assert_eq!(text.plain_text(), "Prison Name\nAltcourse");
    }

    #[test]
    fn test_corrupt_document_yields_empty_text() {
        for format in [
            DocumentFormat::ModernWord,
            DocumentFormat::PageDocument,
            DocumentFormat::Spreadsheet,
            DocumentFormat::LegacyWord,
        ] {
            let document =
                RawDocument::from_bytes(PathBuf::from("broken"), format, vec![0u8; 32]);
            assert!(recovery().recover(&document).is_empty(), "{:?}", format);
        }
    }

    #[test]
    fn test_orphan_temp_file_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("~$report.doc");
        let document = RawDocument::from_bytes(
            path,
            DocumentFormat::LegacyWord,
            b"Prison Name Report Date: 31/03/2023 ".repeat(10),
        );
        assert!(recovery().recover(&document).is_empty());
    }

    #[test]
    fn test_temp_file_reads_sibling() {
        let temp_dir = TempDir::new().unwrap();
        let body = "Prison Population Bulletin\nReport Date: 31/03/2023\n".repeat(4);
        fs::write(temp_dir.path().join("report.doc"), &body).unwrap();

        let document = RawDocument::from_bytes(
            temp_dir.path().join("~$report.doc"),
            DocumentFormat::LegacyWord,
            vec![0u8; 8],
        );
        let text = recovery().recover(&document);
        assert!(text.plain_text().contains("Report Date: 31/03/2023"));
    }
}
