//! Integration tests for the processor module
//!
//! Builds small report corpora in temporary directories and runs the whole
//! combining pipeline over them without any host tools.

use crate::config::PipelineConfig;
use crate::processor::CorpusCombiner;
use crate::recovery::Capabilities;
use crate::recovery::docx::tests::build_docx;
use crate::recovery::legacy::tests::build_doc;
use crate::recovery::ods::tests::build_ods;
use crate::recovery::pdf::tests::build_pdf;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;


const STANDARD_HEADER_LINE: &str = "Prison Name\tBaseline CNA\tIn Use CNA\tOperational Capacity\tPopulation *\t% Pop to In Use CNA\t% Accommodation Available";

/// Rich-text report dated in its content
pub fn rtf_report(report_date: &str, rows: &[&str]) -> Vec<u8> {
    let mut body = format!(
        r"{{\rtf1\ansi{{\fonttbl{{\f0 Arial;}}}}\f0 Population and Capacity Briefing\par Report Date: {}\par ",
        report_date
    );
    body.push_str(&STANDARD_HEADER_LINE.replace('\t', r"\tab "));
    body.push_str(r"\par ");
    for row in rows {
        body.push_str(&row.replace('\t', r"\tab "));
        body.push_str(r"\par ");
    }
    body.push_str(r"Total\tab 0\par }");
    body.into_bytes()
}

/// Modern word report dated in its content
pub fn docx_report(report_date: &str, rows: &[&str]) -> Vec<u8> {
    let date_line = format!("Report Date: {}", report_date);
    let mut lines = vec![date_line.as_str(), STANDARD_HEADER_LINE];
    lines.extend_from_slice(rows);
    lines.push("Sub total\t1\t2");
    build_docx(&lines)
}

/// Spreadsheet report; the date must come from the file name
pub fn ods_report(rows: &[Vec<&str>]) -> Vec<u8> {
    let mut all_rows = vec![
        vec!["Prison Population Bulletin", "", "", ""],
        vec!["Prison Name", "Baseline CNA", "In Use CNA", "Population"],
    ];
    all_rows.extend(rows.iter().cloned());
    all_rows.push(vec!["Total", "0", "0", "0"]);
    build_ods(&all_rows)
}

/// Page document with the table on the first page and notes on the last
pub fn pdf_report(report_date: &str, rows: &[&str]) -> Vec<u8> {
    let date_line = format!("Report Date: {}", report_date);
    let header = STANDARD_HEADER_LINE.replace('\t', " ");
    let mut table = vec![date_line.as_str(), header.as_str()];
    table.extend_from_slice(rows);
    build_pdf(&[table, vec!["Definitions of Accommodation", "Notes 1 2 3"]])
}

/// Legacy word report held in a compound file
pub fn doc_report(report_date: &str, rows: &[&str]) -> Vec<u8> {
    let date_line = format!("Report Date: {}", report_date);
    let mut lines = vec!["Prison Population Bulletin", date_line.as_str(), STANDARD_HEADER_LINE];
    lines.extend_from_slice(rows);
    lines.push("Total\t0");
    build_doc(&lines)
}

/// Three usable reports and one broken file
pub fn create_mixed_corpus(temp_dir: &TempDir) -> PathBuf {
    let root = temp_dir.path().join("reports");
    let nested = root.join("2023");
    fs::create_dir_all(&nested).unwrap();

    write(
        &root.join("bulletin-march-2023.rtf"),
        &rtf_report(
            "31/03/2023",
            &[
                "Altcourse\t794\t794\t1,164\t1,150\t145%\t1%",
                "Askham Grange\t128\t128\t128\tN/A\t76%\t24%",
            ],
        ),
    );
    write(
        &nested.join("bulletin-april-2023.docx"),
        &docx_report(
            "30/04/2023",
            &[
                "Brixton\t528\t528\t798\t700\t133%\t0%",
                "Bure\t603\t603\t652\t640\t106%\t0%",
            ],
        ),
    );
    write(
        &nested.join("prison-pop-may-2023.ods"),
        &ods_report(&[
            vec!["Cardiff", "531", "531", "780"],
            vec!["Channings Wood", "724", "720", "700"],
        ]),
    );
    write(&root.join("bulletin-june-2023.docx"), b"PK\x03\x04 truncated");

    root
}

pub fn write(path: &Path, bytes: &[u8]) {
    fs::write(path, bytes).unwrap();
}

/// Combiner with no host tools, writing into `<temp>/output`
pub fn combiner(root: PathBuf, temp_dir: &TempDir) -> CorpusCombiner {
    CorpusCombiner::with_capabilities(
        root,
        Some(temp_dir.path().join("output")),
        Capabilities::none(),
    )
    .unwrap()
}

pub fn output_config(temp_dir: &TempDir) -> PipelineConfig {
    PipelineConfig::default().with_output_dir(temp_dir.path().join("output"))
}
