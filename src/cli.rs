//! CLI interface module
//!
//! Provides command-line interface using clap derive macros.

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use crate::config::CliOverrides;
use crate::deskew::Interpolation;

/// Exit codes for the CLI
///
/// Per-document failures inside a batch do not change the exit code; only
/// setup problems do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    /// Invalid arguments or options
    InvalidArgs = 2,
    InputNotFound = 3,
    /// Output directory missing and not creatable, or not writable
    OutputError = 4,
}

impl ExitCode {
    /// Convert to process exit code
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Get human-readable description
    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::InvalidArgs => "Invalid arguments",
            ExitCode::InputNotFound => "Input file or directory not found",
            ExitCode::OutputError => "Output error (permission denied, disk full, etc.)",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.code()
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code() as u8)
    }
}

/// Skew detection and correction for scanned documents
#[derive(Parser, Debug)]
#[command(name = "hough-deskew")]
#[command(version)]
#[command(about = "Skew detection and correction for scanned documents", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deskew every matching image in a directory
    Run(RunArgs),
    /// Estimate the skew of one image without writing anything
    Estimate(EstimateArgs),
    /// Show version and default parameters
    Info,
}

/// Resampling filter choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InterpolationArg {
    Nearest,
    Bilinear,
    Lanczos3,
}

impl From<InterpolationArg> for Interpolation {
    fn from(arg: InterpolationArg) -> Self {
        match arg {
            InterpolationArg::Nearest => Interpolation::Nearest,
            InterpolationArg::Bilinear => Interpolation::Bilinear,
            InterpolationArg::Lanczos3 => Interpolation::Lanczos3,
        }
    }
}

/// Arguments for the run command
#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Input directory
    pub input: PathBuf,

    /// Output directory [default: ./output]
    pub output: Option<PathBuf>,

    /// Glob pattern for input file names [default: *.png]
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Config file (defaults to ./hough-deskew.toml, then the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// No-op threshold in degrees [default: 0.5]
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Minimum Hough votes for a candidate line [default: 200]
    #[arg(long)]
    pub vote_threshold: Option<u32>,

    /// Resampling filter used for rotation [default: lanczos3]
    #[arg(short, long, value_enum)]
    pub interpolation: Option<InterpolationArg>,

    /// Write `<stem>-lines.<ext>` with the strong lines drawn in
    #[arg(short, long)]
    pub annotate: bool,

    /// Copy documents that are not rotated to the output directory
    #[arg(long)]
    pub write_skipped: bool,

    /// Process documents in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Show execution plan without processing
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    /// Values given on the command line, for merging over the config file
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            input_dir: Some(self.input.clone()),
            output_dir: self.output.clone(),
            pattern: self.pattern.clone(),
            threshold_angle: self.threshold,
            vote_threshold: self.vote_threshold,
            interpolation: self.interpolation.map(Interpolation::from),
            annotate: self.annotate.then_some(true),
            write_skipped: self.write_skipped.then_some(true),
            parallel: self.parallel.then_some(true),
        }
    }
}

/// Arguments for the estimate command
#[derive(clap::Args, Debug)]
pub struct EstimateArgs {
    /// Image file
    pub file: PathBuf,

    /// Config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Minimum Hough votes for a candidate line [default: 200]
    #[arg(long)]
    pub vote_threshold: Option<u32>,

    /// No-op threshold in degrees [default: 0.5]
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl EstimateArgs {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            threshold_angle: self.threshold,
            vote_threshold: self.vote_threshold,
            ..Default::default()
        }
    }
}

/// Create a styled progress bar for document processing
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}
