use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use prison_capacity::cli::Args;
use prison_capacity::constants::TIME_SERIES_FILE_NAME;
use prison_capacity::processor::CorpusCombiner;
use prison_capacity::timeseries::{self, CapacitySummary};
use std::process;
use tracing::debug;

fn main() {
    let args = Args::parse();

    if let Err(error) = run(args) {
        eprintln!("{} {:#}", "Error:".bright_red().bold(), error);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    setup_logging(&args);
    args.validate()?;

    let config = args.to_pipeline_config()?;
    let output_dir = config.output_dir.clone();

    let mut combiner = CorpusCombiner::new(args.input_dir.clone(), None)?.with_config(config)?;
    let stats = combiner.process()?;

    if args.time_series {
        let mut series =
            timeseries::monthly_time_series(&stats.output_path, &args.exclude_months)
                .context("Failed to build monthly time series")?;
        let path = output_dir.join(TIME_SERIES_FILE_NAME);
        timeseries::write_time_series(&mut series, &path)?;
        println!(
            "\n{} {} months to {}",
            "Time series:".bright_green().bold(),
            series.height().to_string().bright_white(),
            path.display()
        );
    }

    if args.summary {
        if let Some(master) = combiner.master_table() {
            let latest = timeseries::latest_report(master)?;
            let summary = timeseries::analyze_capacity(&latest)?;
            print_capacity_summary(&summary);
        }
    }

    Ok(())
}

/// Set up structured logging on stderr
fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("prison_capacity={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .init();

    debug!("Logging initialized at level: {}", log_level);
}

fn print_capacity_summary(summary: &CapacitySummary) {
    println!("\n{}", "Capacity Summary".bright_green().bold());
    println!(
        "  {} {:.1}%",
        "Average occupancy:".bright_cyan(),
        summary.average_occupancy_percent
    );
    println!(
        "  {} {}",
        "Overcrowded prisons:".bright_cyan(),
        summary.overcrowded_prisons_count.to_string().bright_yellow().bold()
    );
    for name in &summary.overcrowded_prisons {
        println!("    - {}", name);
    }
    println!(
        "  {} {} ({:.1}%)",
        "Most overcrowded:".bright_cyan(),
        summary.most_overcrowded_prison.bright_white(),
        summary.most_overcrowded_percent
    );
}
