use bfmap::engine::config::MissingValuePolicy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "bfmap - Map per-residue observables onto the temperature factor column of PDB structure files.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used when mapping several columns.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write table values into the B-factor field of a structure file, one output per column.
    Map(MapArgs),
    /// Collect per-run cpptraj B-factor files of a dataset into one CSV table.
    Aggregate(AggregateArgs),
    /// Summarise a per-frame observable against closed/opened thresholds.
    Stats(StatsArgs),
}

/// Arguments for the `map` subcommand.
#[derive(Args, Debug)]
pub struct MapArgs {
    // --- Core Arguments ---
    /// Path to the input structure file (e.g., protein.pdb).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to the observable table (CSV, residue index in the first column).
    #[arg(short, long, value_name = "PATH")]
    pub table: Option<PathBuf>,

    /// Table columns to map. Each column produces its own output file.
    #[arg(short, long = "column", value_name = "NAME", num_args(1..))]
    pub columns: Vec<String>,

    /// Path to a configuration file in TOML format.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Output Overrides ---
    /// Exact output path. Only valid when a single column is mapped.
    #[arg(short, long, value_name = "PATH", conflicts_with = "output_dir")]
    pub output: Option<PathBuf>,

    /// Directory for derived output names (<stem>_bfactors_<column>.<ext>).
    /// Defaults to the directory of the input file.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// What to write for residues without a value: zero, blank or keep.
    #[arg(short, long, value_name = "POLICY")]
    pub missing_value: Option<MissingValuePolicy>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S mapping.missing-value=blank
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `aggregate` subcommand.
#[derive(Args, Debug)]
pub struct AggregateArgs {
    /// Dataset directory holding the run* subdirectories. Its name selects the offset.
    #[arg(required = true, value_name = "DIR")]
    pub root: PathBuf,

    /// Output CSV path. Writes to standard output when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Path to a configuration file in TOML format.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Data file inside each run directory; '{dataset}' is replaced by the dataset name.
    #[arg(long, value_name = "TEMPLATE")]
    pub datafile: Option<String>,

    /// Only aggregate these runs (comma separated).
    #[arg(long, value_name = "RUNS", value_delimiter = ',')]
    pub runs: Vec<String>,

    /// Residue numbering offset for a dataset. Can be used multiple times.
    /// Example: --offset rluc8=9
    #[arg(long = "offset", value_name = "DATASET=N")]
    pub offsets: Vec<String>,

    /// Set a specific configuration value, overriding the config file.
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `stats` subcommand.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Per-frame observable table (CSV, frame index in the first column, one column per run).
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Crystal value of the closed state.
    #[arg(long, required = true, value_name = "FLOAT", allow_negative_numbers = true)]
    pub closed: f64,

    /// Crystal value of the opened state.
    #[arg(long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub opened: Option<f64>,

    /// Output CSV path. Writes to standard output when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}
