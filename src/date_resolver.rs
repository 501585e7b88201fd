//! Report date resolution.
//!
//! A report's date comes from the first source that yields one: the
//! `Report Date:` line in the document body, then month and year tokens in
//! the file name, then the looser rules for known file-name families.
//! Callers fall back to the file's modification time when all of these fail.

use crate::error::Result;
use chrono::{DateTime, Local, NaiveDate};
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Month spellings in lookup order; full names are tried before abbreviations
const MONTHS: &[(&str, u32)] = &[
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("sept", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
];

const SEPARATORS: [&str; 2] = ["-", "_"];

/// Which rule produced a date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    Content,
    FileName,
    FileNameFamily,
}

#[derive(Debug, Clone)]
pub struct DateResolver {
    content_date: Regex,
    year: Regex,
}

impl DateResolver {
    pub fn new() -> Result<Self> {
        Ok(Self {
            content_date: Regex::new(r"Report Date:\s*(\d{2}/\d{2}/\d{4})")?,
            year: Regex::new(r"20\d{2}")?,
        })
    }

    /// Resolve a date from optional document text and the file name
    pub fn resolve(&self, content: Option<&str>, file_name: &str) -> Option<NaiveDate> {
        self.resolve_with_source(content, file_name)
            .map(|(date, _)| date)
    }

    pub fn resolve_with_source(
        &self,
        content: Option<&str>,
        file_name: &str,
    ) -> Option<(NaiveDate, DateSource)> {
        if let Some(date) = content.and_then(|text| self.content_date(text)) {
            return Some((date, DateSource::Content));
        }
        if let Some(date) = self.filename_date(file_name) {
            return Some((date, DateSource::FileName));
        }
        if let Some(date) = self.family_date(file_name) {
            return Some((date, DateSource::FileNameFamily));
        }

        debug!("No report date found for {}", file_name);
        None
    }

    /// `Report Date: dd/mm/yyyy` anywhere in the text
    pub fn content_date(&self, text: &str) -> Option<NaiveDate> {
        let captures = self.content_date.captures(text)?;
        NaiveDate::parse_from_str(&captures[1], "%d/%m/%Y").ok()
    }

    /// Year plus a month next to it, or a month delimited by separators
    pub fn filename_date(&self, file_name: &str) -> Option<NaiveDate> {
        let name = file_name.to_lowercase();
        let year = self.find_year(&name)?;

        for &(month_name, month) in MONTHS {
            for separator in SEPARATORS {
                let month_then_year = name.contains(&format!("{}{}", month_name, year))
                    || name.contains(&format!("{}{}{}", month_name, separator, year));
                let year_then_month = name.contains(&format!("{}{}", year, month_name))
                    || name.contains(&format!("{}{}{}", year, separator, month_name));
                let isolated = name.contains(&format!("{0}{1}{0}", separator, month_name))
                    || name.starts_with(&format!("{}{}", month_name, separator))
                    || name.ends_with(&format!("{}{}", separator, month_name));

                if month_then_year || year_then_month || isolated {
                    return last_day_of_month(year, month);
                }
            }
        }

        None
    }

    /// Monthly bulletins and `prison-pop` files: any month substring plus the year
    pub fn family_date(&self, file_name: &str) -> Option<NaiveDate> {
        let name = file_name.to_lowercase();
        let bulletin = name.contains("monthly") && name.contains("bulletin");
        let prison_pop = name.contains("prison-pop") || name.contains("prison_pop");

        if !bulletin && !prison_pop {
            return None;
        }

        let year = self.find_year(&name)?;
        MONTHS
            .iter()
            .find(|(month_name, _)| name.contains(month_name))
            .and_then(|&(_, month)| last_day_of_month(year, month))
    }

    fn find_year(&self, name: &str) -> Option<i32> {
        self.year.find(name)?.as_str().parse().ok()
    }
}

/// Fixed month lengths: February is always 28 days
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let day = match month {
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Local date of the file's last modification
pub fn file_modified_date(path: &Path) -> Option<NaiveDate> {
    let modified = fs::metadata(path).and_then(|meta| meta.modified()).ok()?;
    Some(DateTime::<Local>::from(modified).date_naive())
}
