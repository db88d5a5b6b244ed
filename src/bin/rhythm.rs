//! Rhythm CLI - Command-line interface for Synheart Rhythm
//!
//! Commands:
//! - analyze: Compute every rhythm statistic for a recording and print a JSON report
//! - validate: Check activity records for ordering and value problems

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use synheart_rhythm::series::RecordIssue;
use synheart_rhythm::{
    ActivityRecord, ActivitySeries, AnalyzerConfig, CycleAnalyzer, ReportEncoder, RhythmError,
    SignalOptions, RHYTHM_VERSION,
};

/// Rhythm - Circadian activity-rhythm analysis engine
#[derive(Parser)]
#[command(name = "rhythm")]
#[command(author = "Synheart AI Inc")]
#[command(version = RHYTHM_VERSION)]
#[command(about = "Analyze circadian rhythms of timestamped activity", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze activity records and print a rhythm report
    Analyze {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Analyzer configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Discretization step, e.g. "5m" or "01:00"
        #[arg(long)]
        step: Option<String>,

        /// Window start, e.g. 2020-01-01T06:00:00
        #[arg(long)]
        start: Option<NaiveDateTime>,

        /// Window stop (exclusive)
        #[arg(long)]
        stop: Option<NaiveDateTime>,

        /// Minimum instants for a day to count as valid
        #[arg(long)]
        activity_threshold: Option<usize>,

        /// Use bout coverage instead of event counts
        #[arg(long)]
        bouts: bool,

        /// Treat every record as an activity instant, including zero values
        #[arg(long)]
        all_records: bool,
    },

    /// Validate activity records
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), RhythmCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            output,
            input_format,
            config,
            step,
            start,
            stop,
            activity_threshold,
            bouts,
            all_records,
        } => {
            let mut cfg = match config {
                Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
                None => AnalyzerConfig::default(),
            };
            if let Some(step) = step {
                cfg.step = step.into();
            }
            if start.is_some() {
                cfg.start = start;
            }
            if stop.is_some() {
                cfg.stop = stop;
            }
            if let Some(threshold) = activity_threshold {
                cfg.activity_threshold = threshold;
            }
            cmd_analyze(&input, &output, input_format, cfg, bouts, all_records)
        }

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),
    }
}

fn read_records(input: &Path, input_format: InputFormat) -> Result<Vec<ActivityRecord>, RhythmCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(RhythmCliError::NoInput);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let records = match input_format {
        InputFormat::Ndjson => ActivitySeries::parse_ndjson(&input_data)?,
        InputFormat::Json => ActivitySeries::parse_array(&input_data)?,
    };
    log::debug!("read {} records from {}", records.len(), input.display());
    Ok(records)
}

fn cmd_analyze(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    config: AnalyzerConfig,
    bouts: bool,
    all_records: bool,
) -> Result<(), RhythmCliError> {
    let records = read_records(input, input_format)?;
    if records.is_empty() {
        return Err(RhythmCliError::NoRecords);
    }

    let series = ActivitySeries::from_records(records);
    let analyzer = if all_records {
        CycleAnalyzer::new(series.events(), config)?
    } else {
        CycleAnalyzer::from_series(&series, config)?
    };

    let signal = SignalOptions::new().with_bouts(bouts);
    let report = ReportEncoder::new().encode_to_json(&analyzer, &signal)?;

    if output.to_string_lossy() == "-" {
        println!("{report}");
    } else {
        fs::write(output, report)?;
    }

    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), RhythmCliError> {
    let records = read_records(input, input_format)?;
    let issues = ActivitySeries::validate_records(&records);

    let report = ValidationReport {
        total_records: records.len(),
        active_records: records.iter().filter(|r| r.value > 0.0).count(),
        night_records: records.iter().filter(|r| r.night).count(),
        first: records.iter().map(|r| r.time).min(),
        last: records.iter().map(|r| r.time).max(),
        issues,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:  {}", report.total_records);
        println!("Active records: {}", report.active_records);
        println!("Night records:  {}", report.night_records);
        if let (Some(first), Some(last)) = (report.first, report.last) {
            println!("Time span:      {first} .. {last}");
        }

        if !report.issues.is_empty() {
            println!("\nIssues:");
            for issue in &report.issues {
                println!("  - Record {}: {}", issue.index, issue.message);
            }
        }
    }

    if report.issues.is_empty() {
        Ok(())
    } else {
        Err(RhythmCliError::ValidationFailed(report.issues.len()))
    }
}

// Error handling

#[derive(Debug)]
enum RhythmCliError {
    Io(io::Error),
    Analysis(RhythmError),
    Json(serde_json::Error),
    NoInput,
    NoRecords,
    ValidationFailed(usize),
}

impl From<io::Error> for RhythmCliError {
    fn from(e: io::Error) -> Self {
        RhythmCliError::Io(e)
    }
}

impl From<RhythmError> for RhythmCliError {
    fn from(e: RhythmError) -> Self {
        RhythmCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for RhythmCliError {
    fn from(e: serde_json::Error) -> Self {
        RhythmCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<RhythmCliError> for CliError {
    fn from(e: RhythmCliError) -> Self {
        match e {
            RhythmCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            RhythmCliError::Analysis(e) => {
                let (code, hint) = match &e {
                    RhythmError::InvalidTimespec(_) => (
                        "INVALID_TIMESPEC",
                        "Use durations like \"5m\" or clock times like \"06:00\"",
                    ),
                    RhythmError::InvalidNightSchedule(_) => (
                        "INVALID_NIGHT",
                        "Night boundaries must come in start/end pairs",
                    ),
                    RhythmError::InvalidWindow(_) => (
                        "INVALID_WINDOW",
                        "Check --start/--stop or provide activity inside the window",
                    ),
                    RhythmError::InvalidParameter(_) => (
                        "INVALID_PARAMETER",
                        "The step must divide one day and every analysis window",
                    ),
                    RhythmError::ParseError(_) | RhythmError::JsonError(_) => (
                        "PARSE_ERROR",
                        "Records need a \"time\" field like 2020-01-01T01:05:00",
                    ),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            RhythmCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            RhythmCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "stdin is a terminal, nothing to read".to_string(),
                hint: Some("Pipe records into the command or pass a file with --input".to_string()),
            },
            RhythmCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            RhythmCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} record issues found", count),
                hint: Some("Fix the listed records and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    active_records: usize,
    night_records: usize,
    first: Option<NaiveDateTime>,
    last: Option<NaiveDateTime>,
    issues: Vec<RecordIssue>,
}
