//! hough-deskew - Skew detection and correction for scanned documents
//!
//! CLI entry point

use clap::Parser;
use indicatif::ProgressBar;
use std::fmt;
use std::path::{Path, PathBuf};

use hough_deskew::util::log_level_for_verbosity;
use hough_deskew::{
    create_progress_bar, format_duration, init_tracing, BatchReport, Cli, Commands, Config,
    ConfigError, DeskewError, DeskewOptions, DeskewPipeline, DocumentOutcome, DocumentReport,
    EstimateArgs, ExitCode, FsImageStore, HoughDeskewer, ImageStore, Line, PipelineConfig,
    PipelineError, ProgressCallback, RotationDecision, RunArgs, SkewEstimate, StoreError,
};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => run_deskew(&args),
        Commands::Estimate(args) => run_estimate(&args),
        Commands::Info => run_info(),
    };

    match result {
        Ok(()) => ExitCode::Success.into(),
        Err(failure) => {
            eprintln!("Error: {}", failure.message);
            failure.code.into()
        }
    }
}

// ============ Failures ============

/// Setup error with the exit code it maps to
#[derive(Debug)]
struct Failure {
    code: ExitCode,
    message: String,
}

impl Failure {
    fn new(code: ExitCode, message: impl fmt::Display) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }
}

impl From<PipelineError> for Failure {
    fn from(e: PipelineError) -> Self {
        let code = match e {
            PipelineError::InputNotFound(_) => ExitCode::InputNotFound,
            PipelineError::OutputNotWritable(_) => ExitCode::OutputError,
            PipelineError::InvalidOptions(_) => ExitCode::InvalidArgs,
            PipelineError::Store(_) => ExitCode::GeneralError,
        };
        Self::new(code, e)
    }
}

impl From<ConfigError> for Failure {
    fn from(e: ConfigError) -> Self {
        let code = match e {
            ConfigError::NotFound(_) | ConfigError::TomlParse(_) => ExitCode::InvalidArgs,
            ConfigError::Io(_) => ExitCode::GeneralError,
        };
        Self::new(code, e)
    }
}

// ============ Progress Callback Implementation ============

/// Prints the per-document report to stdout above a progress bar
struct CliProgress {
    bar: ProgressBar,
    quiet: bool,
}

impl CliProgress {
    fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            create_progress_bar(0)
        };
        Self { bar, quiet }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for CliProgress {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn on_document_start(&self, index: usize, total: usize, source: &Path) {
        tracing::debug!(index = index + 1, total, file = %source.display(), "processing");
    }

    fn on_document_complete(&self, report: &DocumentReport) {
        if !self.quiet {
            self.bar.suspend(|| print_document_report(report));
        }
        self.bar.inc(1);
    }
}

// ============ Run Command ============

fn run_deskew(args: &RunArgs) -> Result<(), Failure> {
    let file_config = Config::load_with(args.config.as_deref())?;
    let verbose = args.verbose.max(file_config.general.verbose.unwrap_or(0));
    init_tracing(log_level_for_verbosity(verbose, args.quiet));

    // Merge config file with CLI arguments (CLI takes precedence)
    let pipeline_config = file_config.merge_with_cli(&args.overrides());
    let pipeline = DeskewPipeline::new(pipeline_config)?;

    if args.dry_run {
        let files = pipeline.plan()?;
        print_execution_plan(pipeline.config(), &files);
        return Ok(());
    }

    let progress = CliProgress::new(args.quiet);
    let report = pipeline.run_with_progress(&progress)?;
    progress.finish();

    if !args.quiet {
        print_summary(&report);
    }

    Ok(())
}

fn print_summary(report: &BatchReport) {
    println!();
    println!(
        "Summary: {} documents, {} rotated, {} skipped, {} failed",
        report.total(),
        report.rotated_count(),
        report.skipped_count(),
        report.failed_count()
    );
    println!("Total time: {}", format_duration(report.elapsed));
}

fn print_execution_plan(config: &PipelineConfig, files: &[PathBuf]) {
    let options = &config.options;

    println!("=== Dry Run - Execution Plan ===");
    println!();
    println!("Input: {}", config.input_dir.display());
    println!("Pattern: {}", config.pattern);
    println!("Output: {}", config.output_dir.display());
    println!("Files to process: {}", files.len());
    println!();
    println!("Detection:");
    println!("  Canny thresholds: {} / {}", options.canny_low, options.canny_high);
    println!(
        "  Theta band: {}° .. {}° (step {}°)",
        options.min_theta, options.max_theta, options.angle_resolution
    );
    println!("  Vote threshold: {}", options.vote_threshold);
    println!(
        "  Duplicate tolerance: {} px / {}°",
        options.rho_tolerance, options.angle_tolerance
    );
    println!();
    println!("Correction:");
    println!("  Mode policy: {:?}", options.mode_policy);
    println!("  Threshold: {}°", options.threshold_angle);
    println!("  Interpolation: {:?}", options.interpolation);
    println!("  Background: {:?}", options.background_color);
    println!();
    println!("Output Options:");
    println!("  Suffix: {}", config.suffix);
    println!("  Annotate: {}", if config.annotate { "YES" } else { "NO" });
    println!("  Write skipped: {}", if config.write_skipped { "YES" } else { "NO" });
    println!("  Parallel: {}", if config.parallel { "YES" } else { "NO" });
    println!();
    println!("Files:");
    for (i, file) in files.iter().enumerate() {
        println!("  {}. {}", i + 1, file.display());
    }
}

// ============ Report Printing ============

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_lines(lines: &[Line]) {
    println!("  Strong lines: {}", lines.len());
    for line in lines {
        println!(
            "    rho = {:8.1}  theta = {:6.2}°  votes = {}",
            line.rho,
            line.theta_degrees(),
            line.votes
        );
    }
}

fn print_estimate(estimate: &SkewEstimate) {
    println!(
        "  Dominant angle: {:.2}° ({} lines)",
        estimate.dominant_degrees(),
        estimate.support
    );
}

fn print_document_report(report: &DocumentReport) {
    println!("{}", display_name(&report.source));

    if !report.strong_lines.is_empty() {
        print_lines(&report.strong_lines);
    }
    if let Some(estimate) = &report.estimate {
        print_estimate(estimate);
    }
    if let Some(path) = &report.annotation {
        println!("  Lines drawn: {}", path.display());
    }

    match &report.outcome {
        DocumentOutcome::Rotated {
            angle,
            output,
            original_size,
            rotated_size,
        } => println!(
            "  Rotated by {:.2}° -> {} ({}x{} -> {}x{})",
            angle,
            output.display(),
            original_size.0,
            original_size.1,
            rotated_size.0,
            rotated_size.1
        ),
        DocumentOutcome::Skipped { reason, output } => {
            println!("  Skipped: {}", reason);
            if let Some(path) = output {
                println!("  Copied -> {}", path.display());
            }
        }
        DocumentOutcome::Failed { error } => println!("  Failed: {}", error),
    }
}

// ============ Estimate Command ============

fn run_estimate(args: &EstimateArgs) -> Result<(), Failure> {
    let file_config = Config::load_with(args.config.as_deref())?;
    init_tracing(log_level_for_verbosity(args.verbose, false));

    let options = file_config.merge_with_cli(&args.overrides()).options;
    let deskewer =
        HoughDeskewer::new(options).map_err(|e| Failure::new(ExitCode::InvalidArgs, e))?;

    let image = FsImageStore.read(&args.file).map_err(|e| match e {
        StoreError::NotFound(_) => Failure::new(ExitCode::InputNotFound, e),
        other => Failure::new(ExitCode::GeneralError, other),
    })?;

    println!("{}", display_name(&args.file));

    let detection = match deskewer.detect_lines(&image) {
        Ok(detection) => detection,
        Err(DeskewError::NoLinesDetected) => {
            println!("  No lines detected");
            return Ok(());
        }
        Err(e) => return Err(Failure::new(ExitCode::GeneralError, e)),
    };
    println!("  Candidates: {}", detection.candidate_count);
    print_lines(&detection.strong_lines);

    let estimate = match deskewer.estimate(&detection.strong_lines) {
        Ok(estimate) => estimate,
        Err(DeskewError::AmbiguousOrientation(n)) => {
            println!("  Ambiguous orientation among {} lines", n);
            return Ok(());
        }
        Err(e) => return Err(Failure::new(ExitCode::GeneralError, e)),
    };
    print_estimate(&estimate);

    match estimate.decision {
        RotationDecision::Rotate { angle } => println!("  Correction: rotate by {:.2}°", angle),
        RotationDecision::NoCorrection { angle } => {
            println!("  Correction: none ({:.2}° is within threshold)", angle)
        }
    }

    Ok(())
}

// ============ Info Command ============

fn run_info() -> Result<(), Failure> {
    let options = DeskewOptions::default();
    let config = PipelineConfig::default();

    println!("hough-deskew v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("System Information:");
    println!("  Platform: {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);
    println!("  Threads: {}", rayon::current_num_threads());

    println!();
    println!("Default Parameters:");
    println!("  Pattern: {}", config.pattern);
    println!("  Output suffix: {}", config.suffix);
    println!("  Canny thresholds: {} / {}", options.canny_low, options.canny_high);
    println!("  Theta band: {}° .. {}°", options.min_theta, options.max_theta);
    println!("  Angle resolution: {}°", options.angle_resolution);
    println!("  Vote threshold: {}", options.vote_threshold);
    println!(
        "  Duplicate tolerance: {} px / {}°",
        options.rho_tolerance, options.angle_tolerance
    );
    println!("  Threshold: {}°", options.threshold_angle);
    println!("  Interpolation: {:?}", options.interpolation);

    println!();
    println!("Config File Locations:");
    for path in Config::search_paths() {
        println!("  {}", path.display());
    }

    Ok(())
}
