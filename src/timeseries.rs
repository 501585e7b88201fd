//! Monthly aggregates and capacity analysis over the combined table.

use crate::constants::{TOTAL_MARKER, columns};
use crate::error::Result;
use crate::processor::writer::{read_csv, write_csv};
use polars::prelude::*;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Facility names excluded from the capacity analysis
const NON_FACILITY_MARKERS: &[&str] = &[TOTAL_MARKER, "Total", "IRC"];

/// Monthly totals of the core capacity metrics
///
/// Rows with no report date or a null in any core metric are dropped
/// before grouping. Excluded months use the `YYYY-MM` form.
pub fn monthly_time_series(csv_path: &Path, exclude_months: &[String]) -> Result<DataFrame> {
    let frame = read_csv(csv_path)?;
    debug!("Read {} rows from {}", frame.height(), csv_path.display());

    let complete = columns::CORE_METRICS
        .iter()
        .fold(col(columns::REPORT_DATE).is_not_null(), |acc, metric| {
            acc.and(col(*metric).is_not_null())
        });
    let kept_month = exclude_months.iter().fold(lit(true), |acc, month| {
        acc.and(col(columns::YEAR_MONTH).neq(lit(month.as_str())))
    });

    let sums: Vec<Expr> = columns::CORE_METRICS
        .iter()
        .map(|metric| col(*metric).cast(DataType::Float64).sum())
        .collect();

    let series = frame
        .lazy()
        .with_column(
            col(columns::REPORT_DATE)
                .cast(DataType::Date)
                .dt()
                .strftime("%Y-%m")
                .alias(columns::YEAR_MONTH),
        )
        .filter(complete)
        .group_by([col(columns::YEAR_MONTH)])
        .agg(sums)
        .sort_by_exprs([col(columns::YEAR_MONTH)], SortMultipleOptions::default())
        .filter(kept_month)
        .collect()?;

    if !exclude_months.is_empty() {
        info!("Excluded {} month(s) from the time series", exclude_months.len());
    }
    Ok(series)
}

/// Write the monthly series, creating the parent directory if needed
pub fn write_time_series(series: &mut DataFrame, path: &Path) -> Result<()> {
    write_csv(path, series)?;
    info!("Wrote {} months to {}", series.height(), path.display());
    Ok(())
}

/// Headline occupancy figures for a set of facility rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacitySummary {
    /// Mean of population / in-use CNA, as a percentage
    pub average_occupancy_percent: f64,
    pub overcrowded_prisons_count: usize,
    /// Facilities whose population exceeds operational capacity
    pub overcrowded_prisons: Vec<String>,
    pub most_overcrowded_prison: String,
    pub most_overcrowded_percent: f64,
}

/// Occupancy and overcrowding over every facility row
pub fn analyze_capacity(frame: &DataFrame) -> Result<CapacitySummary> {
    let names = frame.column(columns::PRISON_NAME)?.str()?.clone();
    let population = float_column(frame, columns::POPULATION)?;
    let in_use = float_column(frame, columns::IN_USE_CNA)?;
    let operational = float_column(frame, columns::OPERATIONAL_CAPACITY)?;

    let mut occupancy_total = 0.0;
    let mut occupancy_count = 0usize;
    let mut overcrowded = Vec::new();
    let mut most: Option<(String, f64)> = None;

    for index in 0..frame.height() {
        let Some(name) = names.get(index) else {
            continue;
        };
        if NON_FACILITY_MARKERS.iter().any(|marker| name.contains(marker)) {
            continue;
        }

        let pop = population.get(index);
        if let (Some(pop), Some(capacity)) = (pop, operational.get(index)) {
            if pop > capacity {
                overcrowded.push(name.to_string());
            }
        }

        let occupancy = match (pop, in_use.get(index)) {
            (Some(pop), Some(cna)) if cna != 0.0 => pop / cna * 100.0,
            _ => continue,
        };
        occupancy_total += occupancy;
        occupancy_count += 1;

        if most.as_ref().is_none_or(|(_, best)| occupancy > *best) {
            most = Some((name.to_string(), occupancy));
        }
    }

    let average_occupancy_percent = if occupancy_count == 0 {
        f64::NAN
    } else {
        occupancy_total / occupancy_count as f64
    };
    let (most_overcrowded_prison, most_overcrowded_percent) =
        most.unwrap_or_else(|| ("Unknown".to_string(), 0.0));

    Ok(CapacitySummary {
        average_occupancy_percent,
        overcrowded_prisons_count: overcrowded.len(),
        overcrowded_prisons: overcrowded,
        most_overcrowded_prison,
        most_overcrowded_percent,
    })
}

/// Rows from the most recent report date only
pub fn latest_report(frame: &DataFrame) -> Result<DataFrame> {
    let latest = frame
        .clone()
        .lazy()
        .filter(col(columns::REPORT_DATE).eq(col(columns::REPORT_DATE).max()))
        .collect()?;
    Ok(latest)
}

fn float_column(frame: &DataFrame, name: &str) -> Result<Float64Chunked> {
    Ok(frame
        .column(name)?
        .cast(&DataType::Float64)?
        .f64()?
        .clone())
}
