//! Legacy binary word-processor (`.doc`) recovery.
//!
//! No single method reads every `.doc` in the corpus, so recovery is an
//! ordered list of named stages. Each stage takes the raw document and
//! returns optional text; the first output the validity oracle accepts wins
//! and later stages never run. Stages that need host tools consult the
//! capability descriptor and return `None` when the tool is absent.

use super::capabilities::{Capabilities, Editor};
use super::docx;
use super::process::run_bounded;
use crate::constants::{MIN_PRINTABLE_RUN, TEMP_FILE_PREFIX};
use crate::oracle::TextOracle;
use std::ffi::OsString;
use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info, warn};

const WORD_STREAM: &str = "/WordDocument";

/// Everything a recovery stage may look at
#[derive(Debug, Clone, Copy)]
pub struct LegacyInput<'a> {
    pub path: &'a Path,
    pub bytes: &'a [u8],
    pub capabilities: &'a Capabilities,
    pub timeout: Duration,
}

pub type Attempt = fn(&LegacyInput<'_>) -> Option<String>;

/// A named recovery attempt
#[derive(Debug, Clone, Copy)]
pub struct Stage {
    pub name: &'static str,
    pub attempt: Attempt,
}

/// Recovery stages in the order they are tried
pub const DEFAULT_STAGES: [Stage; 7] = [
    Stage {
        name: "editor",
        attempt: editor_text,
    },
    Stage {
        name: "compound-file",
        attempt: compound_stream_text,
    },
    Stage {
        name: "antiword",
        attempt: antiword_text,
    },
    Stage {
        name: "catdoc",
        attempt: catdoc_text,
    },
    Stage {
        name: "docx-conversion",
        attempt: docx_conversion_text,
    },
    Stage {
        name: "wide-runs",
        attempt: wide_runs_text,
    },
    Stage {
        name: "printable-runs",
        attempt: printable_runs_text,
    },
];

/// Run the default stages; `None` when every stage fails or is rejected
pub fn recover(input: &LegacyInput<'_>, oracle: &TextOracle) -> Option<(&'static str, String)> {
    recover_with_stages(input, &DEFAULT_STAGES, oracle)
}

/// Run `stages` in order until one produces text the oracle accepts
pub fn recover_with_stages(
    input: &LegacyInput<'_>,
    stages: &[Stage],
    oracle: &TextOracle,
) -> Option<(&'static str, String)> {
    for stage in stages {
        debug!("Trying {} recovery for {}", stage.name, input.path.display());

        let Some(text) = (stage.attempt)(input) else {
            debug!("{} produced no text", stage.name);
            continue;
        };

        let verdict = oracle.assess(&text);
        if verdict.is_accepted() {
            info!(
                "Recovered {} with {} ({} chars)",
                input.path.display(),
                stage.name,
                text.len()
            );
            return Some((stage.name, text));
        }
        debug!("{} output rejected: {:?}", stage.name, verdict);
    }

    warn!(
        "All {} recovery stages failed for {}",
        stages.len(),
        input.path.display()
    );
    None
}

/// How a possible lock/temp file should be handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TempFile {
    NotTemp,
    /// Temp file whose real document exists alongside it
    Sibling(PathBuf),
    /// Temp file with no real document next to it
    Orphan,
}

pub fn classify_temp_file(path: &Path) -> TempFile {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return TempFile::NotTemp;
    };
    let Some(original) = name.strip_prefix(TEMP_FILE_PREFIX) else {
        return TempFile::NotTemp;
    };

    let sibling = path.with_file_name(original);
    if !original.is_empty() && sibling.is_file() {
        TempFile::Sibling(sibling)
    } else {
        TempFile::Orphan
    }
}

fn editor_text(input: &LegacyInput<'_>) -> Option<String> {
    let editor = input.capabilities.editor.as_ref()?;
    let profile = tempfile::tempdir().ok()?;

    let mut command = Command::new(editor.program());
    match editor {
        Editor::LibreOffice(_) => command
            .arg(profile_argument(profile.path()))
            .args(["--headless", "--cat"])
            .arg(input.path),
        Editor::TextUtil(_) => command
            .args(["-convert", "txt", "-stdout"])
            .arg(input.path),
    };

    run_tool(editor.name(), &mut command, input.timeout)
}

fn compound_stream_text(input: &LegacyInput<'_>) -> Option<String> {
    let mut container = cfb::CompoundFile::open(Cursor::new(input.bytes)).ok()?;
    if !container.is_stream(WORD_STREAM) {
        debug!("{} has no WordDocument stream", input.path.display());
        return None;
    }

    let mut data = Vec::new();
    container
        .open_stream(WORD_STREAM)
        .ok()?
        .read_to_end(&mut data)
        .ok()?;

    let text = filter_word_bytes(&data);
    (!text.is_empty()).then_some(text)
}

fn antiword_text(input: &LegacyInput<'_>) -> Option<String> {
    let program = input.capabilities.antiword.as_ref()?;
    let mut command = Command::new(program);
    command.arg(input.path);
    run_tool("antiword", &mut command, input.timeout)
}

fn catdoc_text(input: &LegacyInput<'_>) -> Option<String> {
    let program = input.capabilities.catdoc.as_ref()?;
    let mut command = Command::new(program);
    command.arg(input.path);
    run_tool("catdoc", &mut command, input.timeout)
}

fn docx_conversion_text(input: &LegacyInput<'_>) -> Option<String> {
    let editor = input.capabilities.editor.as_ref()?;
    let stem = input.path.file_stem()?.to_string_lossy().to_string();
    let workspace = tempfile::tempdir().ok()?;
    let converted = workspace.path().join(format!("{}.docx", stem));

    let mut command = Command::new(editor.program());
    match editor {
        Editor::LibreOffice(_) => command
            .arg(profile_argument(&workspace.path().join("profile")))
            .args(["--headless", "--convert-to", "docx", "--outdir"])
            .arg(workspace.path())
            .arg(input.path),
        Editor::TextUtil(_) => command
            .args(["-convert", "docx", "-output"])
            .arg(&converted)
            .arg(input.path),
    };
    run_bounded(editor.name(), &mut command, input.timeout)
        .map_err(|e| debug!("docx conversion failed: {}", e))
        .ok()?;

    let bytes = fs::read(&converted).ok()?;
    docx::extract_text(&converted, &bytes).ok()
}

/// Printable runs of UTF-16LE text, as Word 97 stores most strings
fn wide_runs_text(input: &LegacyInput<'_>) -> Option<String> {
    let text = utf16le_runs(input.bytes);
    (!text.is_empty()).then_some(text)
}

fn printable_runs_text(input: &LegacyInput<'_>) -> Option<String> {
    let pattern = format!(r"[\t\x20-\x7E\r\n]{{{},}}", MIN_PRINTABLE_RUN);
    let runs = regex::bytes::Regex::new(&pattern).ok()?;

    let text = runs
        .find_iter(input.bytes)
        .map(|run| String::from_utf8_lossy(run.as_bytes()).replace('\r', "\n"))
        .filter(|run| run.chars().any(|c| c.is_ascii_alphanumeric()))
        .collect::<Vec<_>>()
        .join("\n");

    (!text.is_empty()).then_some(text)
}

/// Decode both byte alignments as UTF-16LE and keep the printable runs
pub fn utf16le_runs(bytes: &[u8]) -> String {
    let mut runs = Vec::new();
    for offset in 0..2 {
        let units = bytes
            .get(offset..)
            .unwrap_or_default()
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));

        let mut current = String::new();
        for decoded in char::decode_utf16(units) {
            match decoded {
                Ok(c) if c == '\t' || c == '\r' || c == '\n' || (' '..='~').contains(&c) => {
                    current.push(c)
                }
                _ => flush_run(&mut runs, &mut current),
            }
        }
        flush_run(&mut runs, &mut current);
    }
    runs.join("\n")
}

fn flush_run(runs: &mut Vec<String>, current: &mut String) {
    let run = std::mem::take(current);
    if run.chars().count() >= MIN_PRINTABLE_RUN && run.chars().any(|c| c.is_ascii_alphanumeric()) {
        runs.push(run.replace('\r', "\n"));
    }
}

/// Keep the text bytes of a Word stream; paragraph marks become newlines
/// and cell marks become tabs
pub fn filter_word_bytes(data: &[u8]) -> String {
    let mut text = String::with_capacity(data.len() / 2);
    for &byte in data {
        match byte {
            0x0D | 0x0A | 0x0B => text.push('\n'),
            0x07 | 0x09 => text.push('\t'),
            0x20..=0x7E => text.push(byte as char),
            _ => {}
        }
    }

    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn profile_argument(dir: &Path) -> OsString {
    let mut argument = OsString::from("-env:UserInstallation=file://");
    argument.push(dir);
    argument
}

fn run_tool(name: &str, command: &mut Command, timeout: Duration) -> Option<String> {
    match run_bounded(name, command, timeout) {
        Ok(output) => {
            let text = output.stdout_text();
            (!text.trim().is_empty()).then_some(text)
        }
        Err(e) => {
            debug!("{} unavailable for this file: {}", name, e);
            None
        }
    }
}
