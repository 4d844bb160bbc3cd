//! agcflow - Command-line interface for AGC Flowchart
//!
//! Commands:
//! - classify: Run the flowchart over a telemetry table
//! - validate: Check sample records before classification
//! - doctor: Diagnose configuration and environment
//! - config: Print the default thresholds

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use agc_flowchart::encoder::{rows_to_csv, rows_to_ndjson, ReportEncoder};
use agc_flowchart::pipeline::FlowchartProcessor;
use agc_flowchart::schema::{SampleAdapter, SampleRecord, REQUIRED_COLUMNS};
use agc_flowchart::{FlowchartConfig, PerturbationRequest, FLOWCHART_VERSION, PRODUCER_NAME};

/// agcflow - Flowchart anomaly classification for AGC telemetry
#[derive(Parser)]
#[command(name = "agcflow")]
#[command(version = FLOWCHART_VERSION)]
#[command(about = "Classify AGC telemetry with the three-step anomaly flowchart", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the flowchart over a telemetry table
    Classify {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Threshold overrides (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Injection window start (YYYY-MM-DD HH:MM:SS)
        #[arg(long, requires = "end")]
        start: Option<String>,

        /// Injection window end (YYYY-MM-DD HH:MM:SS)
        #[arg(long, requires = "start")]
        end: Option<String>,

        /// AGC error to add inside the window (MW)
        #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
        agc_offset: f64,

        /// Frequency error to add inside the window (Hz)
        #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
        freq_offset: f64,
    },

    /// Check sample records before classification
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

    /// Diagnose configuration and environment
    Doctor {
        /// Check a thresholds file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default thresholds as JSON
    Config,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one classified row per line)
    Ndjson,
    /// Full report as JSON
    Json,
    /// Full report as pretty-printed JSON
    JsonPretty,
    /// Table with the dashboard export columns
    Csv,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AgcCliError> {
    match cli.command {
        Commands::Classify {
            input,
            output,
            input_format,
            output_format,
            config,
            start,
            end,
            agc_offset,
            freq_offset,
        } => {
            let perturbation = match (start, end) {
                (Some(start), Some(end)) => Some(PerturbationRequest {
                    start,
                    end,
                    agc_offset,
                    frequency_offset: freq_offset,
                }),
                _ => None,
            };
            cmd_classify(
                &input,
                &output,
                input_format,
                output_format,
                config.as_deref(),
                perturbation.as_ref(),
            )
        }

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),

        Commands::Config => {
            println!("{}", FlowchartConfig::default().to_json()?);
            Ok(())
        }
    }
}

fn cmd_classify(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    config: Option<&Path>,
    perturbation: Option<&PerturbationRequest>,
) -> Result<(), AgcCliError> {
    let records = read_records(input, &input_format)?;
    if records.is_empty() {
        return Err(AgcCliError::NoRecords);
    }

    let samples = SampleAdapter::to_samples(&records)?;
    if samples.is_empty() {
        return Err(AgcCliError::NoSamples);
    }

    let mut processor = FlowchartProcessor::new();

    if let Some(config_path) = config {
        let config_json = fs::read_to_string(config_path)?;
        processor.load_config(&config_json)?;
    }

    if let Some(request) = perturbation {
        processor.apply_request(request);
    }

    let report = processor.report(&samples);
    log::info!(
        "classified {} rows: {} alarms",
        report.summary.total_rows,
        report.summary.alarm_count()
    );

    let encoder = ReportEncoder::new();
    let output_data = match output_format {
        OutputFormat::Ndjson => rows_to_ndjson(&report.rows)?,
        OutputFormat::Json => encoder.to_json(&report)?,
        OutputFormat::JsonPretty => encoder.to_json_pretty(&report)?,
        OutputFormat::Csv => rows_to_csv(&report.rows),
    };

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), AgcCliError> {
    let records = read_records(input, &input_format)?;
    let results = SampleAdapter::validate_records(&records);

    let report = ValidationReport {
        total_records: records.len(),
        valid_records: records.len() - results.len(),
        invalid_records: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                timestamp: r.timestamp.clone(),
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Record {} ({}): {}",
                    err.index,
                    err.timestamp.as_deref().unwrap_or("no timestamp"),
                    err.error
                );
            }
        }
    }

    if report.invalid_records > 0 {
        Err(AgcCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), AgcCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} {}", PRODUCER_NAME, FLOWCHART_VERSION),
    });

    checks.push(DoctorCheck {
        name: "input_columns".to_string(),
        status: CheckStatus::Ok,
        message: format!("Required columns: {}", REQUIRED_COLUMNS.join(", ")),
    });

    if let Some(config_path) = config {
        let check = if !config_path.exists() {
            DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist; defaults will be used".to_string(),
            }
        } else {
            match fs::read_to_string(config_path) {
                Ok(content) => match FlowchartConfig::from_json(&content) {
                    Ok(cfg) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Config valid (drift alarm after {} rows, ramp limit {} MW/min)",
                            cfg.drift_alarm_threshold, cfg.ramp_limit_mw_per_min
                        ),
                    },
                    Err(e) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: e.to_string(),
                    },
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read config file: {}", e),
                },
            }
        };
        checks.push(check);
    }

    // Check stdin is available (for piped input)
    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (interactive mode)"
    } else {
        "stdin is a pipe (ready for --input -)"
    };
    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: stdin_message.to_string(),
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: FLOWCHART_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("agcflow Doctor Report");
        println!("=====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(AgcCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_records(input: &Path, format: &InputFormat) -> Result<Vec<SampleRecord>, AgcCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let records = match format {
        InputFormat::Ndjson => SampleAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => SampleAdapter::parse_array(&input_data)?,
    };
    Ok(records)
}

// Error types

#[derive(Debug)]
enum AgcCliError {
    Io(io::Error),
    Flowchart(agc_flowchart::FlowchartError),
    Json(serde_json::Error),
    NoRecords,
    NoSamples,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for AgcCliError {
    fn from(e: io::Error) -> Self {
        AgcCliError::Io(e)
    }
}

impl From<agc_flowchart::FlowchartError> for AgcCliError {
    fn from(e: agc_flowchart::FlowchartError) -> Self {
        AgcCliError::Flowchart(e)
    }
}

impl From<serde_json::Error> for AgcCliError {
    fn from(e: serde_json::Error) -> Self {
        AgcCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<AgcCliError> for CliError {
    fn from(e: AgcCliError) -> Self {
        match e {
            AgcCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            AgcCliError::Flowchart(e) => CliError {
                code: "INPUT_ERROR".to_string(),
                message: e.to_string(),
                hint: Some(format!(
                    "Records need the columns {}",
                    REQUIRED_COLUMNS.join(", ")
                )),
            },
            AgcCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            AgcCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            AgcCliError::NoSamples => CliError {
                code: "NO_SAMPLES".to_string(),
                message: "Every record was missing a required field".to_string(),
                hint: Some("Run 'agcflow validate' for details".to_string()),
            },
            AgcCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            AgcCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    timestamp: Option<String>,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
