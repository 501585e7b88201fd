//! Host capability probing.
//!
//! External editors and extractors are looked up on `PATH` once per run and
//! recorded here. Recovery code only ever consults this descriptor, so tests
//! can hand it a fake capability set.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A document editor that can be driven headlessly
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Editor {
    /// LibreOffice / OpenOffice `soffice`
    LibreOffice(PathBuf),
    /// macOS `textutil`
    TextUtil(PathBuf),
}

impl Editor {
    pub fn program(&self) -> &Path {
        match self {
            Editor::LibreOffice(path) | Editor::TextUtil(path) => path,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Editor::LibreOffice(_) => "soffice",
            Editor::TextUtil(_) => "textutil",
        }
    }
}

/// Tools available on the host for legacy document recovery
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub editor: Option<Editor>,
    pub antiword: Option<PathBuf>,
    pub catdoc: Option<PathBuf>,
}

impl Capabilities {
    /// No external tools; only in-process recovery stages run
    pub fn none() -> Self {
        Self::default()
    }

    /// Look up every supported tool on `PATH`
    pub fn probe() -> Self {
        let editor = find_editor();
        let capabilities = Self {
            editor,
            antiword: which::which("antiword").ok(),
            catdoc: which::which("catdoc").ok(),
        };

        info!("Host capabilities: {}", capabilities.summary());
        capabilities
    }

    pub fn with_editor(mut self, editor: Editor) -> Self {
        self.editor = Some(editor);
        self
    }

    pub fn with_antiword(mut self, program: PathBuf) -> Self {
        self.antiword = Some(program);
        self
    }

    pub fn with_catdoc(mut self, program: PathBuf) -> Self {
        self.catdoc = Some(program);
        self
    }

    /// One-line description for logs
    pub fn summary(&self) -> String {
        let mut tools = Vec::new();
        if let Some(editor) = &self.editor {
            tools.push(editor.name());
        }
        if self.antiword.is_some() {
            tools.push("antiword");
        }
        if self.catdoc.is_some() {
            tools.push("catdoc");
        }

        if tools.is_empty() {
            "no external tools".to_string()
        } else {
            tools.join(", ")
        }
    }
}

fn find_editor() -> Option<Editor> {
    for candidate in ["soffice", "libreoffice"] {
        if let Ok(path) = which::which(candidate) {
            debug!("Found document editor {} at {}", candidate, path.display());
            return Some(Editor::LibreOffice(path));
        }
    }

    if cfg!(target_os = "macos") {
        if let Ok(path) = which::which("textutil") {
            debug!("Found textutil at {}", path.display());
            return Some(Editor::TextUtil(path));
        }
    }

    None
}
