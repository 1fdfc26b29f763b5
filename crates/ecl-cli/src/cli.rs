//! CLI argument definitions for the ECL query lab.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "ecl-lab",
    version,
    about = "Compare ECL query results against curated LOINC reference sets",
    long_about = "Build ECL query variants for a laboratory concept, execute them \n\
                  against a SNOMED CT terminology server, map the matched concepts \n\
                  to LOINC codes and score the result against the Interpolar \n\
                  expert reference."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the full pipeline for one primary LOINC code.
    Analyze(AnalyzeArgs),

    /// Run the pipeline for every primary code in a CSV list.
    Batch(BatchArgs),

    /// Print the rendered ECL for every experiment without any network call.
    Render(RenderArgs),
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Primary LOINC code, e.g. 718-7.
    #[arg(value_name = "PRIMARY_LOINC")]
    pub primary_loinc: String,

    /// Analyte name used in output file names, e.g. hemoglobin.
    #[arg(value_name = "NAME")]
    pub name: String,

    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub server: ServerArgs,

    /// Comma-separated specimen SNOMED IDs to exclude from the refined query.
    #[arg(long = "exclude-specimens", value_delimiter = ',', value_name = "IDS")]
    pub exclude_specimens: Vec<String>,

    /// Directory for generated report files.
    #[arg(long = "output-dir", value_name = "DIR", default_value = "output")]
    pub output_dir: PathBuf,
}

#[derive(Args)]
pub struct BatchArgs {
    /// CSV with `loinc` and `name` columns, one primary code per row.
    #[arg(value_name = "LIST.csv")]
    pub list: PathBuf,

    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub server: ServerArgs,

    /// Comma-separated specimen SNOMED IDs to exclude from the refined query.
    #[arg(long = "exclude-specimens", value_delimiter = ',', value_name = "IDS")]
    pub exclude_specimens: Vec<String>,

    /// Directory for generated report files.
    #[arg(long = "output-dir", value_name = "DIR", default_value = "output")]
    pub output_dir: PathBuf,
}

#[derive(Args)]
pub struct RenderArgs {
    /// Primary LOINC code, e.g. 718-7.
    #[arg(value_name = "PRIMARY_LOINC")]
    pub primary_loinc: String,

    /// RF2 identifier snapshot TSV (LOINC to SNOMED mapping).
    #[arg(long = "identifier-file", value_name = "PATH")]
    pub identifier_file: PathBuf,

    /// RF2 relationship snapshot TSV for attribute discovery.
    #[arg(long = "relationship-file", value_name = "PATH")]
    pub relationship_file: PathBuf,

    /// Comma-separated specimen SNOMED IDs to exclude from the refined query.
    #[arg(long = "exclude-specimens", value_delimiter = ',', value_name = "IDS")]
    pub exclude_specimens: Vec<String>,
}

/// Static input files shared by analyze and batch.
#[derive(Args)]
pub struct DataArgs {
    /// RF2 identifier snapshot TSV (LOINC to SNOMED mapping).
    #[arg(long = "identifier-file", value_name = "PATH")]
    pub identifier_file: PathBuf,

    /// RF2 relationship snapshot TSV for attribute discovery.
    #[arg(long = "relationship-file", value_name = "PATH")]
    pub relationship_file: PathBuf,

    /// Interpolar comparability CSV export.
    #[arg(long = "interpolar-file", value_name = "PATH")]
    pub interpolar_file: PathBuf,
}

/// Terminology server selection and tuning.
#[derive(Args)]
pub struct ServerArgs {
    /// Terminology server backend.
    #[arg(long = "server", value_enum, default_value = "snowstorm")]
    pub server: ServerArg,

    /// Override the backend base URL.
    #[arg(long = "base-url", value_name = "URL")]
    pub base_url: Option<String>,

    /// Snowstorm branch path, e.g. MAIN/LOINC/2025-09-21.
    #[arg(long = "branch", value_name = "BRANCH")]
    pub branch: Option<String>,

    /// SNOMED edition/version URL for the FHIR backend.
    #[arg(long = "version-url", value_name = "URL")]
    pub version_url: Option<String>,

    /// Use POST with a ValueSet body instead of the GET fhir_vs form.
    #[arg(long = "use-post")]
    pub use_post: bool,

    /// PKCS#12 client certificate for mTLS (falls back to auth_path/auth_file env).
    #[arg(long = "pkcs12", value_name = "PATH")]
    pub pkcs12: Option<PathBuf>,

    /// Certificate password (falls back to auth_pw env).
    #[arg(long = "pkcs12-password", value_name = "PW")]
    pub pkcs12_password: Option<String>,

    /// Maximum concepts requested per expand call.
    #[arg(long = "limit", value_name = "N", default_value_t = 1000)]
    pub limit: usize,

    /// Fixed pause between consecutive requests, in milliseconds.
    #[arg(long = "request-delay-ms", value_name = "MS")]
    pub request_delay_ms: Option<u64>,

    /// Maximum attempts per request for transient failures.
    #[arg(long = "retry-attempts", value_name = "N", default_value_t = 3)]
    pub retry_attempts: u32,

    /// Base retry delay in milliseconds; grows linearly per attempt.
    #[arg(long = "retry-delay-ms", value_name = "MS", default_value_t = 500)]
    pub retry_delay_ms: u64,

    /// Per-request timeout in seconds.
    #[arg(long = "timeout-secs", value_name = "SECS")]
    pub timeout_secs: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ServerArg {
    Snowstorm,
    Ontoserver,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
