//! Application constants for prison capacity extraction
//!
//! Markers, keyword lists, thresholds and column names shared by the
//! recovery layer, the validity oracle, the tabular parser and the
//! combiner. Tunable values are surfaced again through `config`.

// =============================================================================
// Input Discovery
// =============================================================================

/// File extensions the combiner dispatches on (compared case-insensitively)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["ods", "rtf", "pdf", "doc", "docx"];

/// Prefix word processors give to lock/owner files
pub const TEMP_FILE_PREFIX: &str = "~$";

// =============================================================================
// Output Artifacts
// =============================================================================

/// Combined master table file name
pub const COMBINED_FILE_NAME: &str = "combined_prison_data.csv";

/// Monthly aggregate file name
pub const TIME_SERIES_FILE_NAME: &str = "prison_capacity_time_series.csv";

/// Default output directory, relative to the working directory
pub const DEFAULT_OUTPUT_DIR: &str = "output";

// =============================================================================
// Column Names
// =============================================================================

/// Column names as they appear in reports and in the combined CSV
pub mod columns {
    pub const PRISON_NAME: &str = "Prison Name";
    pub const BASELINE_CNA: &str = "Baseline CNA";
    pub const IN_USE_CNA: &str = "In Use CNA";
    pub const OPERATIONAL_CAPACITY: &str = "Operational Capacity";
    pub const POPULATION: &str = "Population *";
    pub const POPULATION_PLAIN: &str = "Population";
    pub const PCT_POP_TO_IN_USE: &str = "% Pop to In Use CNA";
    pub const PCT_ACCOMMODATION_AVAILABLE: &str = "% Accommodation Available";
    pub const REPORT_DATE: &str = "Report_Date";
    pub const YEAR_MONTH: &str = "Year_Month";

    /// Seven-column layout substituted when a text header cannot be trusted
    pub const STANDARD_HEADER: &[&str] = &[
        PRISON_NAME,
        BASELINE_CNA,
        IN_USE_CNA,
        OPERATIONAL_CAPACITY,
        POPULATION,
        PCT_POP_TO_IN_USE,
        PCT_ACCOMMODATION_AVAILABLE,
    ];

    /// Metrics aggregated by the monthly time series
    pub const CORE_METRICS: &[&str] = &[BASELINE_CNA, IN_USE_CNA, OPERATIONAL_CAPACITY, POPULATION];

    /// Derived percentage columns removed from the master table
    pub const DENYLIST: &[&str] = &[PCT_POP_TO_IN_USE, PCT_ACCOMMODATION_AVAILABLE];
}

// =============================================================================
// Table Markers
// =============================================================================

/// Literal header text identifying the row-label column
pub const FACILITY_NAME_MARKER: &str = "Prison Name";

/// Header terms; a header needs the facility marker plus one of these
pub const CAPACITY_TERM_MARKERS: &[&str] = &["Baseline", "CNA", "Population", "Capacity"];

/// Fragment that marks a wrapped second header line
pub const HEADER_CONTINUATION_MARKER: &str = "Capacity";

/// Substrings that end the data section of a text table
pub const FOOTER_MARKERS: &[&str] = &[
    "Sub total",
    "NOMS Operated",
    "Definitions of Accommodation",
    "Total",
];

/// Any of these on a page opens the relaxed page scan
pub const RELAXED_HEADER_KEYWORDS: &[&str] = &["Prison", "CNA", "Capacity"];

/// Case-insensitive name fragment that excludes a row
pub const TOTAL_MARKER: &str = "total";

/// Content date prefix
pub const REPORT_DATE_PREFIX: &str = "Report Date:";

/// Line prefix for page furniture
pub const PAGE_PREFIX: &str = "Page";

/// Expected width of a text table, name column included
pub const STANDARD_COLUMN_COUNT: usize = 7;

// =============================================================================
// Validity Oracle
// =============================================================================

/// Shortest recovered text considered at all
pub const MIN_VALID_TEXT_LENGTH: usize = 100;

/// Largest tolerated share of non-printable or non-ASCII characters
pub const MAX_NOISE_RATIO: f64 = 0.20;

/// Application-name stamps left behind by binary recovery
pub const VENDOR_MARKERS: &[&str] = &["Microsoft Word", "Microsoft Office"];

/// More vendor stamps than this means the text is container noise
pub const MAX_VENDOR_MARKERS: usize = 3;

/// Byte patterns seen only in corrupted recoveries
pub const CORRUPTION_SIGNATURES: &[&str] = &["@Unknown", "Times N", "\x00", "}\x00{"];

/// Any of these qualifies text as domain content
pub const DOMAIN_KEYWORDS: &[&str] = &[
    "Prison",
    "CNA",
    "Capacity",
    "Population",
    "Report Date",
    "Operational",
];

/// Lines shaped like "name 123 456" needed when no keyword matched.
/// Domain-specific; review with a domain expert before tightening.
pub const MIN_DATA_SHAPED_LINES: usize = 5;

// =============================================================================
// Structural Validation (legacy binary documents)
// =============================================================================

pub const MIN_STRUCTURAL_ROWS: usize = 2;
pub const MIN_ROW_FIELDS: usize = 2;
pub const MAX_ROW_FIELDS: usize = 10;

/// Upper bound for any capacity figure. Domain-specific; flagged for review.
pub const MAX_CAPACITY_VALUE: f64 = 10_000.0;

// =============================================================================
// External Processes
// =============================================================================

/// Upper bound on any external extractor or editor run
pub const EXTERNAL_TOOL_TIMEOUT_SECS: u64 = 60;

/// Poll interval while waiting on a child process
pub const PROCESS_POLL_INTERVAL_MS: u64 = 50;

/// Shortest printable byte run kept by the raw-bytes scan
pub const MIN_PRINTABLE_RUN: usize = 4;

/// Check whether a file extension is one the combiner handles
pub fn is_supported_extension(extension: &str) -> bool {
    let lower = extension.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS.contains(&lower.as_str())
}

/// Check whether a column is a derived percentage dropped from the master table
pub fn is_denylisted_column(name: &str) -> bool {
    columns::DENYLIST.contains(&name)
}
