//! CSV writing module for capacity tables
//!
//! Converts parsed tables to data frames, writes one CSV per source file and
//! assembles the combined master table.

use crate::constants::columns;
use crate::error::Result;
use crate::models::{Metric, ParsedTable};

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Days from 0001-01-01 to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Writer for per-file and combined CSV output
#[derive(Debug, Clone)]
pub struct TableWriter {
    output_dir: PathBuf,
    column_denylist: Vec<String>,
}

impl TableWriter {
    pub fn new(output_dir: PathBuf, column_denylist: Vec<String>) -> Self {
        Self {
            output_dir,
            column_denylist,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write one parsed file's CSV, named after its path below `input_root`
    ///
    /// `2019/may.rtf` becomes `2019_may.csv`, so equal stems in different
    /// folders keep separate outputs.
    pub fn write_per_file(&self, source: &Path, input_root: &Path, frame: &DataFrame) -> Result<PathBuf> {
        let path = self.output_dir.join(format!("{}.csv", per_file_name(source, input_root)));

        write_csv(&path, &mut frame.clone())?;
        debug!("Wrote {} rows to {}", frame.height(), path.display());
        Ok(path)
    }

    /// Union, clean, sort and deduplicate per-file frames
    pub fn build_master(&self, frames: Vec<DataFrame>) -> Result<DataFrame> {
        let lazy_frames: Vec<LazyFrame> = frames
            .into_iter()
            .map(|frame| standardize_columns(frame).map(IntoLazy::lazy))
            .collect::<Result<_>>()?;

        let combined = concat_lf_diagonal(lazy_frames, UnionArgs::default())?;
        let schema_names: Vec<String> = combined
            .clone()
            .collect_schema()?
            .iter_names()
            .map(|name| name.to_string())
            .collect();

        let mut selection = vec![col(columns::PRISON_NAME)];
        for metric in Metric::ALL {
            let name = metric.column_name();
            if schema_names.iter().any(|n| n == name) && !self.is_denylisted(name) {
                selection.push(col(name).cast(DataType::Float64));
            }
        }
        selection.push(col(columns::REPORT_DATE).cast(DataType::Date));

        let master = combined
            .select(selection)
            .sort_by_exprs(
                [col(columns::REPORT_DATE), col(columns::PRISON_NAME)],
                SortMultipleOptions::default(),
            )
            .unique_stable(None, UniqueKeepStrategy::First)
            .collect()?;

        debug!(
            "Master table has {} rows and {} columns",
            master.height(),
            master.width()
        );
        Ok(master)
    }

    /// Write the combined table to `<output_dir>/<file_name>`
    pub fn write_master(&self, master: &mut DataFrame, file_name: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(file_name);
        write_csv(&path, master)?;
        Ok(path)
    }

    fn is_denylisted(&self, name: &str) -> bool {
        self.column_denylist.iter().any(|c| c == name)
    }
}

/// Data frame for one parsed table: name, its metric columns, report date
pub fn table_to_frame(table: &ParsedTable) -> Result<DataFrame> {
    let names: Vec<&str> = table
        .records
        .iter()
        .map(|r| r.facility_name.as_str())
        .collect();
    let mut frame_columns = vec![Column::new(columns::PRISON_NAME.into(), names)];

    for metric in &table.columns {
        let values: Vec<Option<f64>> = table.records.iter().map(|r| r.metric(*metric)).collect();
        frame_columns.push(Column::new(metric.column_name().into(), values));
    }

    let dates: Vec<Option<i32>> = table
        .records
        .iter()
        .map(|r| r.report_date.map(days_since_epoch))
        .collect();
    let dates = Series::new(columns::REPORT_DATE.into(), dates).cast(&DataType::Date)?;
    frame_columns.push(dates.into());

    Ok(DataFrame::new(frame_columns)?)
}

/// Rename the bare population header to its canonical form
pub fn standardize_columns(mut frame: DataFrame) -> Result<DataFrame> {
    let names = frame.get_column_names_str();
    let has_plain = names.contains(&columns::POPULATION_PLAIN);
    let has_canonical = names.contains(&columns::POPULATION);

    if has_plain && !has_canonical {
        frame.rename(columns::POPULATION_PLAIN, columns::POPULATION.into())?;
    }
    Ok(frame)
}

/// Read a CSV written by this crate, parsing the date column
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|options| options.with_try_parse_dates(true))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(frame)
}

fn per_file_name(source: &Path, input_root: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "report".to_string());

    let folders: Vec<String> = source
        .strip_prefix(input_root)
        .ok()
        .and_then(Path::parent)
        .map(|parent| {
            parent
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();

    folders.into_iter().chain(std::iter::once(stem)).collect::<Vec<_>>().join("_")
}

pub(crate) fn write_csv(path: &Path, frame: &mut DataFrame) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(frame)?;
    Ok(())
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TableRecord;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(name: &str, values: &[(Metric, Option<f64>)], report_date: NaiveDate) -> TableRecord {
        let mut record = TableRecord::new(name);
        record.metrics = values.iter().copied().collect();
        record.report_date = Some(report_date);
        record
    }

    fn writer(temp_dir: &TempDir) -> TableWriter {
        TableWriter::new(
            temp_dir.path().to_path_buf(),
            columns::DENYLIST.iter().map(|c| c.to_string()).collect(),
        )
    }

    #[test]
    fn test_days_since_epoch() {
        assert_eq!(days_since_epoch(date(1970, 1, 1)), 0);
        assert_eq!(days_since_epoch(date(1970, 1, 2)), 1);
        assert_eq!(days_since_epoch(date(1969, 12, 31)), -1);
    }

    #[test]
    fn test_table_to_frame() {
        let table = ParsedTable {
            records: vec![record(
                "Altcourse",
                &[(Metric::Population, Some(1150.0)), (Metric::BaselineCapacity, None)],
                date(2023, 3, 31),
            )],
            columns: vec![Metric::BaselineCapacity, Metric::Population],
            report_date: Some(date(2023, 3, 31)),
        };

        let frame = table_to_frame(&table).unwrap();
        assert_eq!(
            frame.get_column_names_str(),
            vec!["Prison Name", "Baseline CNA", "Population *", "Report_Date"]
        );
        assert_eq!(frame.column("Report_Date").unwrap().dtype(), &DataType::Date);
        assert_eq!(frame.column("Baseline CNA").unwrap().null_count(), 1);
    }

    #[test]
    fn test_master_pads_missing_columns_with_nulls() {
        let temp_dir = TempDir::new().unwrap();
        let march = ParsedTable {
            records: vec![record("Brixton", &[(Metric::Population, Some(700.0))], date(2023, 3, 31))],
            columns: vec![Metric::Population],
            report_date: None,
        };
        let february = ParsedTable {
            records: vec![record(
                "Altcourse",
                &[
                    (Metric::BaselineCapacity, Some(794.0)),
                    (Metric::Population, Some(1150.0)),
                    (Metric::PctPopulationToInUse, Some(145.0)),
                ],
                date(2023, 2, 28),
            )],
            columns: vec![
                Metric::BaselineCapacity,
                Metric::Population,
                Metric::PctPopulationToInUse,
            ],
            report_date: None,
        };

        let frames = vec![
            table_to_frame(&march).unwrap(),
            table_to_frame(&february).unwrap(),
        ];
        let master = writer(&temp_dir).build_master(frames).unwrap();

        assert_eq!(
            master.get_column_names_str(),
            vec!["Prison Name", "Baseline CNA", "Population *", "Report_Date"]
        );
        let names: Vec<Option<&str>> = master.column("Prison Name").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(names, vec![Some("Altcourse"), Some("Brixton")]);

        let baseline = master.column("Baseline CNA").unwrap().f64().unwrap();
        assert_eq!(baseline.get(0), Some(794.0));
        assert_eq!(baseline.get(1), None);
    }

    #[test]
    fn test_master_drops_exact_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let table = ParsedTable {
            records: vec![record("Brixton", &[(Metric::Population, Some(700.0))], date(2023, 3, 31))],
            columns: vec![Metric::Population],
            report_date: None,
        };

        let frames = vec![table_to_frame(&table).unwrap(), table_to_frame(&table).unwrap()];
        let master = writer(&temp_dir).build_master(frames).unwrap();
        assert_eq!(master.height(), 1);
    }

    #[test]
    fn test_plain_population_renamed() {
        let frame = df!(
            "Prison Name" => ["Altcourse"],
            "Population" => [1150.0]
        )
        .unwrap();
        let frame = standardize_columns(frame).unwrap();
        assert_eq!(frame.get_column_names_str(), vec!["Prison Name", "Population *"]);
    }

    #[test]
    fn test_csv_round_trip_preserves_rows_and_nulls() {
        let temp_dir = TempDir::new().unwrap();
        let writer = writer(&temp_dir);
        let table = ParsedTable {
            records: vec![
                record(
                    "Altcourse",
                    &[(Metric::InUseCapacity, Some(794.0)), (Metric::Population, None)],
                    date(2023, 3, 31),
                ),
                record(
                    "Ashfield",
                    &[(Metric::InUseCapacity, Some(400.0)), (Metric::Population, Some(390.0))],
                    date(2023, 3, 31),
                ),
            ],
            columns: vec![Metric::InUseCapacity, Metric::Population],
            report_date: None,
        };

        let mut master = writer.build_master(vec![table_to_frame(&table).unwrap()]).unwrap();
        let path = writer.write_master(&mut master, "combined.csv").unwrap();
        let read_back = read_csv(&path).unwrap();

        assert_eq!(read_back.height(), 2);
        assert_eq!(read_back.column("Population *").unwrap().null_count(), 1);
        assert_eq!(read_back.column("Report_Date").unwrap().dtype(), &DataType::Date);
    }

    #[test]
    fn test_per_file_csv_named_after_source() {
        let temp_dir = TempDir::new().unwrap();
        let frame = df!("Prison Name" => ["Altcourse"]).unwrap();
        let path = writer(&temp_dir)
            .write_per_file(Path::new("/reports/june_2019.rtf"), Path::new("/reports"), &frame)
            .unwrap();

        assert_eq!(path, temp_dir.path().join("june_2019.csv"));
        assert!(path.exists());
    }

    #[test]
    fn test_per_file_csv_keeps_folders_apart() {
        let temp_dir = TempDir::new().unwrap();
        let writer = writer(&temp_dir);
        let root = Path::new("/reports");

        let first = df!("Prison Name" => ["Altcourse"]).unwrap();
        let second = df!("Prison Name" => ["Brixton", "Bure"]).unwrap();
        let a = writer
            .write_per_file(&root.join("2019").join("bulletin.rtf"), root, &first)
            .unwrap();
        let b = writer
            .write_per_file(&root.join("2020").join("q1").join("bulletin.rtf"), root, &second)
            .unwrap();

        assert_eq!(a, temp_dir.path().join("2019_bulletin.csv"));
        assert_eq!(b, temp_dir.path().join("2020_q1_bulletin.csv"));
        assert_eq!(read_csv(&a).unwrap().height(), 1);
        assert_eq!(read_csv(&b).unwrap().height(), 2);
    }

    #[test]
    fn test_per_file_name_outside_root_uses_stem() {
        assert_eq!(
            per_file_name(Path::new("/elsewhere/june.pdf"), Path::new("/reports")),
            "june"
        );
    }
}
