//! Anomaly Sheets CLI - highlight anomalies in a monthly report workbook

use anomaly_sheets::prelude::*;
use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "anomaly-sheets")]
#[command(
    author,
    version,
    about = "Highlight missing and outlying latest-month values in an xlsx report"
)]
struct Cli {
    /// Input workbook (.xlsx)
    input: PathBuf,

    /// Output workbook (default: <input>_highlighted.xlsx next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Worksheet holding the report
    #[arg(short, long, default_value = DEFAULT_SHEET_NAME, conflicts_with = "first_sheet")]
    sheet: String,

    /// Analyze the first worksheet instead of a named one
    #[arg(long)]
    first_sheet: bool,

    /// More log output (-v: per-row verdicts, -vv: debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    validate_input(&cli.input)?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| highlighted_path(&cli.input));

    let options = DetectorOptions {
        sheet: if cli.first_sheet {
            SheetSelector::First
        } else {
            SheetSelector::Named(cli.sheet.clone())
        },
        ..Default::default()
    };
    let diagnostics = if cli.verbose > 0 {
        Diagnostics::Verbose
    } else {
        Diagnostics::Summary
    };

    let input = std::fs::read(&cli.input)
        .with_context(|| format!("Failed to read '{}'", cli.input.display()))?;
    let detection = Detector::with_options(options)
        .with_observer(LogObserver::new(diagnostics))
        .run(&input)
        .with_context(|| format!("Failed to process '{}'", cli.input.display()))?;

    std::fs::write(&output, &detection.bytes)
        .with_context(|| format!("Failed to write '{}'", output.display()))?;
    log::debug!(
        "wrote {} highlighted cells to '{}'",
        detection.report.highlights.len(),
        output.display()
    );

    println!("{}", output.display());
    println!(
        "{} density anomalies, {} missing anomalies",
        detection.report.density_rows().len(),
        detection.report.missing_rows().len()
    );
    Ok(())
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// The input must exist and carry an `.xlsx` extension
fn validate_input(path: &Path) -> Result<()> {
    let is_xlsx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
    if !is_xlsx {
        bail!("'{}' is not an .xlsx file", path.display());
    }
    if !path.is_file() {
        bail!("'{}' does not exist", path.display());
    }
    Ok(())
}

/// `dir/report.xlsx` becomes `dir/report_highlighted.xlsx`
fn highlighted_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "xlsx".to_string());
    input.with_file_name(format!("{}_highlighted.{}", stem, extension))
}
