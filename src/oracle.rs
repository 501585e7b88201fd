//! Text validity oracle.
//!
//! Decides whether recovered text is trustworthy report content or binary
//! noise. It is the single gate between the legacy binary recovery chain and
//! the tabular parser.

use crate::config::OracleConfig;
use crate::error::Result;
use regex::Regex;
use tracing::debug;

/// Outcome of assessing a piece of recovered text
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted,
    TooShort { length: usize },
    TooNoisy { ratio: f64 },
    VendorBoilerplate { occurrences: usize },
    CorruptionSignature { signature: String },
    NoDomainContent,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Heuristic classifier for recovered text
#[derive(Debug, Clone)]
pub struct TextOracle {
    config: OracleConfig,
    data_shaped_line: Regex,
}

impl TextOracle {
    pub fn new(config: OracleConfig) -> Result<Self> {
        Ok(Self {
            config,
            data_shaped_line: Regex::new(r"^[A-Za-z][A-Za-z\s]+\s+\d+\s+\d+")?,
        })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    pub fn is_valid(&self, text: &str) -> bool {
        self.assess(text).is_accepted()
    }

    /// Run every rejection rule, then the acceptance rules
    pub fn assess(&self, text: &str) -> Verdict {
        let length = text.chars().count();
        if length < self.config.min_length {
            return Verdict::TooShort { length };
        }

        let noisy = text.chars().filter(|c| is_noise(*c)).count();
        let ratio = noisy as f64 / length as f64;
        if ratio > self.config.max_noise_ratio {
            return Verdict::TooNoisy { ratio };
        }

        let occurrences: usize = self
            .config
            .vendor_markers
            .iter()
            .map(|marker| text.matches(marker.as_str()).count())
            .sum();
        if occurrences > self.config.max_vendor_markers {
            return Verdict::VendorBoilerplate { occurrences };
        }

        if let Some(signature) = self
            .config
            .corruption_signatures
            .iter()
            .find(|signature| text.contains(signature.as_str()))
        {
            return Verdict::CorruptionSignature {
                signature: signature.escape_debug().to_string(),
            };
        }

        if self
            .config
            .domain_keywords
            .iter()
            .any(|keyword| text.contains(keyword.as_str()))
        {
            return Verdict::Accepted;
        }

        let data_lines = self.count_data_shaped_lines(text);
        debug!("No domain keyword found, {} data-shaped lines", data_lines);
        if data_lines >= self.config.min_data_shaped_lines {
            Verdict::Accepted
        } else {
            Verdict::NoDomainContent
        }
    }

    fn count_data_shaped_lines(&self, text: &str) -> usize {
        text.lines()
            .filter(|line| self.data_shaped_line.is_match(line.trim()))
            .count()
    }
}

// Newline, carriage return and tab are ordinary layout characters.
fn is_noise(c: char) -> bool {
    !c.is_ascii() || (c.is_ascii_control() && !matches!(c, '\n' | '\r' | '\t'))
}
