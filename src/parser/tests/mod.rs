//! Test utilities for the tabular parser
//!
//! Fixture builders for the line shapes each recovery path produces.

use crate::models::RecoveredText;

mod stats_tests;

/// Tab-separated report as rich-text and modern word recovery emit it
pub fn create_text_report() -> String {
    [
        "HM Prison & Probation Service",
        "Population and Capacity Briefing",
        "Report Date: 31/03/2023",
        "",
        "Prison Name\tBaseline CNA\tIn Use CNA\tOperational Capacity\tPopulation *\t% Pop to In Use CNA\t% Accommodation Available",
        "Altcourse\t794\t794\t1,164\t1,150\t145%\t1%",
        "Ashfield\t400\t400\t408\t390\t98%\t2%",
        "Askham Grange\t128\t128\t128\tN/A\t76%\t24%",
        "Page 2",
        "Bedford\t322\t322\t506\t491\t152%\t3%",
        "Sub total\t1644\t1644\t2206\t2031",
        "Belmarsh\t797\t797\t910\t902\t113%\t1%",
    ]
    .join("\n")
}

/// Page-document pages: data lines separated by single spaces
pub fn create_page_report() -> Vec<String> {
    vec![
        [
            "Report Date: 30/06/2021",
            "Prison Name Baseline CNA In Use CNA Operational Population % Pop to In Use CNA % Accommodation Available",
            "Altcourse 794 794 1164 1150 145% 1%",
            "Hatfield Lakes",
            "   ",
            "160 160 160 150 94% 0%",
            "3",
        ]
        .join("\n"),
        [
            "Prison Name Baseline CNA In Use CNA Operational Population % Pop to In Use CNA % Accommodation Available",
            "Wymott 1,174 1,168 1,176 1,126 96% 1%",
            "Page 4",
            "NOMS Operated Prisons",
            "Ranby 1,038 1,038 1,090 1,030 99% 0%",
        ]
        .join("\n"),
    ]
}

/// Recovered text for a single text page
pub fn text(report: &str) -> RecoveredText {
    RecoveredText::from_text(report)
}

/// Recovered spreadsheet rows
pub fn cells(rows: &[&[&str]]) -> RecoveredText {
    RecoveredText::from_rows(
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect(),
    )
}
