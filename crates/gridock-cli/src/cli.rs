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
    author = "The gridock developers",
    version,
    about = "gridock - exhaustive FFT-based rigid-body docking of two protein structures.",
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
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a global translational and rotational scan of a mobile partner against a static one.
    Dock(DockArgs),
    /// Show how many rotations an angle step samples, to size sharded runs.
    Angles(AnglesArgs),
}

/// Arguments for the `dock` subcommand.
#[derive(Args, Debug)]
pub struct DockArgs {
    // --- Inputs and outputs ---
    /// The static partner (usually the larger one), as a fixed-width ATOM file.
    #[arg(short = 's', long = "static", value_name = "PATH", required_unless_present = "rescue")]
    pub static_path: Option<PathBuf>,

    /// The mobile partner, rotated and translated over the static one.
    #[arg(short = 'm', long = "mobile", value_name = "PATH", required_unless_present = "rescue")]
    pub mobile_path: Option<PathBuf>,

    /// Path for the ranked result file.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the scratch checkpoint files.
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    // --- Grid ---
    /// Fixed grid edge, in cells (must be even).
    #[arg(long, value_name = "INT", conflicts_with = "calculate_grid")]
    pub grid: Option<usize>,

    /// Size the grid automatically for this approximate cell span, in Angstroms.
    #[arg(long, value_name = "FLOAT")]
    pub calculate_grid: Option<f64>,

    // --- Scoring ---
    /// Angular step of the rotation scan, in degrees.
    #[arg(long, value_name = "DEG")]
    pub angle_step: Option<u32>,

    /// Thickness of the static surface shell, in Angstroms.
    #[arg(long = "surface", value_name = "FLOAT")]
    pub surface_thickness: Option<f64>,

    /// Value given to the static core, penalizing interpenetration.
    #[arg(long = "internal", value_name = "FLOAT", allow_negative_numbers = true)]
    pub internal_value: Option<f64>,

    /// Turn the electrostatic filter off.
    #[arg(long)]
    pub noelec: bool,

    /// Number of translations retained per rotation.
    #[arg(long = "keep", value_name = "INT")]
    pub keep_per_rotation: Option<usize>,

    /// Drop translations closer than this squared grid distance to a better
    /// one of the same rotation.
    #[arg(long, value_name = "INT")]
    pub reduce_translations: Option<u32>,

    // --- Runs ---
    /// Resume an interrupted scan from the checkpoint files.
    #[arg(long)]
    pub rescue: bool,

    /// Split the rotation scan into this many independent shards.
    #[arg(long, value_name = "P", requires = "parallel_id")]
    pub parallel_parts: Option<usize>,

    /// The 1-based shard handled by this process.
    #[arg(long, value_name = "S", requires = "parallel_parts")]
    pub parallel_id: Option<usize>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S search.angle-step=15
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `angles` subcommand.
#[derive(Args, Debug)]
pub struct AnglesArgs {
    /// Angular step in degrees.
    #[arg(long, value_name = "DEG")]
    pub step: u32,

    /// Print every Euler triple, not just the count.
    #[arg(long)]
    pub list: bool,
}
