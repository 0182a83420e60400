//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use tscut_models::timestamp::parse_timestamp;

/// Find safe cut points in MPEG-TS recordings and split them without re-encoding.
#[derive(Parser, Debug)]
#[command(name = "tscut", author, version, about, long_about = None)]
pub struct Cli {
    /// Hide progress bars
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a recording and write its PTS map
    Analyze(AnalyzeArgs),

    /// Split a recording into one file per clip
    Split(SplitArgs),

    /// Stream a time range or whole clips of a recording
    Extract(ExtractArgs),

    /// List the clips of an index
    Clips(ClipsArgs),
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Source recording
    #[arg(short, long)]
    pub input: PathBuf,

    /// Index file [default: <input dir>/_metadata/<input stem>.ptsmap]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Minimum silence length in milliseconds [default: 800]
    #[arg(short = 'l', long = "length")]
    pub min_silence_ms: Option<u64>,

    /// Silence threshold in dB [default: -80]
    #[arg(short = 't', long = "threshold", allow_negative_numbers = true)]
    pub threshold_db: Option<f64>,

    /// Seconds the frame query is widened by around each silence [default: 1]
    #[arg(short = 's', long = "shift")]
    pub split_pos_shift: Option<f64>,

    /// Widen windows until a clear scene change is found
    #[arg(long)]
    pub iterative: bool,

    /// Overwrite an existing index
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Source recording
    #[arg(short, long)]
    pub input: PathBuf,

    /// Index file [default: <input dir>/_metadata/<input stem>.ptsmap]
    #[arg(short = 'x', long)]
    pub index: Option<PathBuf>,

    /// Output directory, recreated on every run [default: input path without extension]
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Source recording
    #[arg(short, long)]
    pub input: PathBuf,

    /// Index file [default: <input dir>/_metadata/<input stem>.ptsmap]
    #[arg(short = 'x', long)]
    pub index: Option<PathBuf>,

    /// Range start (SS, MM:SS or HH:MM:SS)
    #[arg(long, value_parser = parse_timestamp, required_unless_present = "clip", requires = "to")]
    pub from: Option<f64>,

    /// Range end (SS, MM:SS or HH:MM:SS)
    #[arg(long, value_parser = parse_timestamp, requires = "from")]
    pub to: Option<f64>,

    /// Start key of a whole clip; repeat to concatenate clips
    #[arg(long, value_parser = parse_timestamp, conflicts_with_all = ["from", "to"])]
    pub clip: Vec<f64>,

    /// Output file [default: stdout]
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[command(group = clap::ArgGroup::new("source").required(true).args(["index", "input"]))]
pub struct ClipsArgs {
    /// Index file
    #[arg(short = 'x', long)]
    pub index: Option<PathBuf>,

    /// Source recording, to locate its default index
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Minimum clip length in seconds for the long-clip selection
    #[arg(long, default_value_t = 150.0)]
    pub min_length: f64,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}
