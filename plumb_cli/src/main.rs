//! # Plumbline CLI
//!
//! Command-line driver for pipe-section sizing and building load
//! calculations.
//!
//! ```text
//! plumb sections request.json --format table
//! plumb loads --consumer 1 --fixtures 120 --t-hot 65
//! plumb consumers
//! plumb diameters
//! ```

mod config;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use plumb_core::calculations::{
    calculate_loads, calculate_sections, LoadInput, PipeSection, SectionBatch, SectionRequest,
};
use plumb_core::report;
use plumb_core::{BatchPolicy, CalcError, CalcResult, ReferenceDataset, Stream, VelocityMode};

use config::Config;

#[derive(Debug, Parser)]
#[command(name = "plumb")]
#[command(about = "Plumbline - Water-supply pipe sizing per SP 30.13330", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory with custom reference tables
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// Log calculation details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Calculate pipe sections from a JSON request
    Sections {
        /// Path to the request JSON file
        request: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Batch failure policy
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,
        /// Velocity mode
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        /// Calculated stream
        #[arg(long, value_enum)]
        stream: Option<StreamArg>,
    },
    /// Calculate building flows and heat loads
    Loads {
        /// Consumer type t
        #[arg(long)]
        consumer: u32,
        /// Total number of fixtures U
        #[arg(long)]
        fixtures: f64,
        /// Hot-water temperature (°C)
        #[arg(long)]
        t_hot: Option<f64>,
        /// Cold-water temperature (°C)
        #[arg(long)]
        t_cold: Option<f64>,
        /// Consumption period (h)
        #[arg(long)]
        period: Option<f64>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// List consumer types
    Consumers {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// List supported pipe diameters, or check one
    Diameters {
        /// Diameter to check (mm)
        diameter: Option<u32>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    Stop,
    Collect,
}

impl From<PolicyArg> for BatchPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Stop => BatchPolicy::StopOnFirstError,
            PolicyArg::Collect => BatchPolicy::CollectErrors,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Read velocity from the diameter's table
    Table,
    /// 4q / (πD²)
    Formula,
}

impl From<ModeArg> for VelocityMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Table => VelocityMode::TableInterpolation,
            ModeArg::Formula => VelocityMode::ClosedFormPipeFlow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StreamArg {
    Total,
    Hot,
    Cold,
}

impl From<StreamArg> for Stream {
    fn from(arg: StreamArg) -> Self {
        match arg {
            StreamArg::Total => Stream::Total,
            StreamArg::Hot => Stream::Hot,
            StreamArg::Cold => Stream::Cold,
        }
    }
}

/// Request file; unset fields fall back to the configuration.
#[derive(Deserialize)]
struct RequestFile {
    consumer: u32,
    stream: Option<Stream>,
    velocity_mode: Option<VelocityMode>,
    policy: Option<BatchPolicy>,
    sections: Vec<PipeSection>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            if let Ok(json) = serde_json::to_string(&err) {
                eprintln!("{json}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CalcResult<()> {
    let config = Config::load_or_default(cli.config.as_deref())?;

    let custom;
    let dataset: &ReferenceDataset = match cli.dataset.as_ref().or(config.dataset.as_ref()) {
        Some(dir) => {
            custom = ReferenceDataset::load_dir(dir)?;
            &custom
        }
        None => ReferenceDataset::standard()?,
    };

    match cli.command {
        Commands::Sections {
            request,
            format,
            policy,
            mode,
            stream,
        } => {
            let mut request = read_request(&request, &config)?;
            if let Some(policy) = policy {
                request.policy = policy.into();
            }
            if let Some(mode) = mode {
                request.velocity_mode = mode.into();
            }
            if let Some(stream) = stream {
                request.stream = stream.into();
            }
            let batch = calculate_sections(dataset, &request)?;
            print_sections(request.stream, &batch, format)
        }
        Commands::Loads {
            consumer,
            fixtures,
            t_hot,
            t_cold,
            period,
            format,
        } => {
            let settings = &config.settings;
            let input = LoadInput::new(fixtures)
                .with_temperatures(
                    t_hot.unwrap_or(settings.hot_water_temp_c),
                    t_cold.unwrap_or(settings.cold_water_temp_c),
                )
                .with_period(period.unwrap_or(settings.period_hours));
            cmd_loads(dataset, consumer, &input, format)
        }
        Commands::Consumers { format } => cmd_consumers(dataset, format),
        Commands::Diameters { diameter } => cmd_diameters(dataset, diameter),
    }
}

fn read_request(path: &Path, config: &Config) -> CalcResult<SectionRequest> {
    let content = fs::read_to_string(path)
        .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;
    let file: RequestFile = serde_json::from_str(&content)?;
    let settings = &config.settings;
    Ok(SectionRequest::new(file.consumer, file.sections)
        .with_stream(file.stream.unwrap_or(settings.stream))
        .with_velocity_mode(file.velocity_mode.unwrap_or(settings.velocity_mode))
        .with_policy(file.policy.unwrap_or(settings.batch_policy)))
}

fn print_sections(stream: Stream, batch: &SectionBatch, format: OutputFormat) -> CalcResult<()> {
    let mut out = io::stdout().lock();
    match format {
        OutputFormat::Json => write_out(&mut out, &serde_json::to_string_pretty(batch)?)?,
        OutputFormat::Csv => report::write_sections_csv(&mut out, stream, &batch.results)?,
        OutputFormat::Table => {
            let table = report::render_table(&report::section_headers(stream), &report::section_rows(&batch.results));
            write_out(&mut out, &table)?;
            for failure in &batch.failures {
                write_out(&mut out, &format!("! {failure}"))?;
            }
        }
    }
    Ok(())
}

fn cmd_loads(dataset: &ReferenceDataset, consumer: u32, input: &LoadInput, format: OutputFormat) -> CalcResult<()> {
    let profile = dataset.profile_for(consumer)?;
    let loads = calculate_loads(dataset, profile, input)?;

    let mut out = io::stdout().lock();
    match format {
        OutputFormat::Json => write_out(&mut out, &serde_json::to_string_pretty(&loads)?),
        OutputFormat::Csv => report::write_aggregate_csv(&mut out, &loads),
        OutputFormat::Table => {
            write_out(&mut out, &format!("{} (t={})\n", profile.label, profile.t))?;
            write_out(
                &mut out,
                &report::render_table(&report::aggregate_headers(), &report::aggregate_rows(&loads)),
            )
        }
    }
}

fn cmd_consumers(dataset: &ReferenceDataset, format: OutputFormat) -> CalcResult<()> {
    let profiles: Vec<_> = dataset.consumers().collect();
    let mut out = io::stdout().lock();
    match format {
        OutputFormat::Json => write_out(&mut out, &serde_json::to_string_pretty(&profiles)?),
        OutputFormat::Table | OutputFormat::Csv => {
            let headers = ["t", "Группа", "Потребитель", "q_(tot)hru", "q_(h)hru", "q_(c)hru"];
            let rows: Vec<Vec<String>> = profiles
                .iter()
                .map(|p| {
                    vec![
                        p.t.to_string(),
                        p.group.to_string(),
                        p.label.clone(),
                        p.total.hru.to_string(),
                        p.hot.hru.to_string(),
                        p.cold.hru.to_string(),
                    ]
                })
                .collect();
            if format == OutputFormat::Csv {
                report::write_table_csv(&mut out, &headers, &rows)
            } else {
                write_out(&mut out, &report::render_table(&headers, &rows))
            }
        }
    }
}

fn cmd_diameters(dataset: &ReferenceDataset, diameter: Option<u32>) -> CalcResult<()> {
    if let Some(diameter_mm) = diameter {
        if !dataset.supports_diameter(diameter_mm) {
            return Err(CalcError::UnknownDiameter { diameter_mm });
        }
        return write_out(&mut io::stdout().lock(), &format!("D={diameter_mm} mm is supported"));
    }
    let diameters: Vec<String> = dataset
        .supported_diameters()
        .iter()
        .map(|d| d.to_string())
        .collect();
    write_out(&mut io::stdout().lock(), &diameters.join("\n"))
}

fn write_out(out: &mut impl Write, text: &str) -> CalcResult<()> {
    writeln!(out, "{}", text.trim_end()).map_err(|e| CalcError::file_error("write", "stdout", e.to_string()))
}
