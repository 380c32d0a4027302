//! Pipeline processing module
//!
//! Provides a clean API for batch deskewing, separating business logic
//! from CLI handling.
//!
//! ## Processing Steps (per document)
//!
//! 1. Read the raster from the [`ImageStore`]
//! 2. Detect edges and candidate lines, keep the strong lines
//! 3. Optionally write the line overlay (`<stem>-lines.<ext>`)
//! 4. Estimate the dominant orientation and decide on a rotation
//! 5. Rotate without cropping and write `<stem>-rotated.<ext>`
//!
//! Per-document failures are recorded in the [`BatchReport`] and never
//! abort the batch. Only setup problems (missing input directory,
//! unwritable output directory, invalid options) surface as
//! [`PipelineError`].

use glob::Pattern;
use image::DynamicImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::annotate::{draw_lines, LINE_COLOR};
use crate::deskew::{DeskewError, DeskewOptions, HoughDeskewer, Line, RotationDecision, SkewEstimate};
use crate::store::{derived_path, FsImageStore, ImageStore, StoreError};

/// Default input file pattern
pub const DEFAULT_PATTERN: &str = "*.png";

/// Suffix appended to the stem of rotated outputs
pub const DEFAULT_SUFFIX: &str = "-rotated";

/// Suffix appended to the stem of line overlays
pub const ANNOTATION_SUFFIX: &str = "-lines";

/// Default output directory
pub const DEFAULT_OUTPUT_DIR: &str = "output";

// ============================================================
// Progress
// ============================================================

/// Progress callback for batch processing
pub trait ProgressCallback: Send + Sync {
    /// Called once with the number of documents found
    fn on_batch_start(&self, total: usize);
    /// Called before a document is read
    fn on_document_start(&self, index: usize, total: usize, source: &Path);
    /// Called with the finished report of a document
    fn on_document_complete(&self, report: &DocumentReport);
}

/// No-op progress callback (silent mode)
pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_batch_start(&self, _total: usize) {}
    fn on_document_start(&self, _index: usize, _total: usize, _source: &Path) {}
    fn on_document_complete(&self, _report: &DocumentReport) {}
}

// ============================================================
// Errors
// ============================================================

/// Pipeline processing error
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input directory not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Output directory not writable: {0}")]
    OutputNotWritable(PathBuf),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

// ============================================================
// Configuration
// ============================================================

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory scanned for input rasters
    pub input_dir: PathBuf,
    /// Directory receiving rotated rasters and overlays
    pub output_dir: PathBuf,
    /// Glob pattern matched against file names (`*`, `?`, `[...]`)
    pub pattern: String,
    /// Suffix appended to the stem of rotated outputs
    pub suffix: String,
    /// Write the strong-line overlay for each document
    pub annotate: bool,
    /// Copy documents that are not rotated to the output directory
    pub write_skipped: bool,
    /// Process documents in parallel
    pub parallel: bool,
    /// Algorithm options
    pub options: DeskewOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            pattern: DEFAULT_PATTERN.to_string(),
            suffix: DEFAULT_SUFFIX.to_string(),
            annotate: false,
            write_skipped: false,
            parallel: false,
            options: DeskewOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// Configuration for `input_dir` -> `output_dir` with default options
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    /// Builder pattern: set file pattern
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Builder pattern: set output suffix
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Builder pattern: set annotation
    pub fn with_annotate(mut self, enabled: bool) -> Self {
        self.annotate = enabled;
        self
    }

    /// Builder pattern: set pass-through of skipped documents
    pub fn with_write_skipped(mut self, enabled: bool) -> Self {
        self.write_skipped = enabled;
        self
    }

    /// Builder pattern: set parallel processing
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Builder pattern: set algorithm options
    pub fn with_options(mut self, options: DeskewOptions) -> Self {
        self.options = options;
        self
    }

    /// Rotated output path for `source`
    pub fn output_path(&self, source: &Path) -> PathBuf {
        derived_path(&self.output_dir, source, &self.suffix)
    }

    /// Overlay output path for `source`
    pub fn annotation_path(&self, source: &Path) -> PathBuf {
        derived_path(&self.output_dir, source, ANNOTATION_SUFFIX)
    }
}

// ============================================================
// Reports
// ============================================================

/// Why a document was left unrotated
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipReason {
    /// The line detector found nothing
    NoLines,
    /// Strong lines had no repeated orientation
    Ambiguous(usize),
    /// Correction within the no-op threshold
    BelowThreshold { angle: f64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoLines => write!(f, "no lines detected"),
            SkipReason::Ambiguous(n) => write!(f, "ambiguous orientation among {} lines", n),
            SkipReason::BelowThreshold { angle } => {
                write!(f, "below threshold ({:.2}°)", angle)
            }
        }
    }
}

/// What happened to one document
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    Rotated {
        angle: f64,
        output: PathBuf,
        original_size: (u32, u32),
        rotated_size: (u32, u32),
    },
    Skipped {
        reason: SkipReason,
        /// Pass-through copy, when `write_skipped` is set
        output: Option<PathBuf>,
    },
    Failed {
        error: String,
    },
}

/// Per-document result
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentReport {
    pub source: PathBuf,
    /// Raw candidates returned by the line detector
    pub candidate_count: usize,
    pub strong_lines: Vec<Line>,
    pub estimate: Option<SkewEstimate>,
    /// Line overlay written for this document
    pub annotation: Option<PathBuf>,
    pub outcome: DocumentOutcome,
}

impl DocumentReport {
    fn new(source: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            candidate_count: 0,
            strong_lines: Vec::new(),
            estimate: None,
            annotation: None,
            outcome: DocumentOutcome::Failed {
                error: "not processed".to_string(),
            },
        }
    }

    fn fail(mut self, error: impl fmt::Display) -> Self {
        warn!(file = %self.source.display(), error = %error, "document failed");
        self.outcome = DocumentOutcome::Failed {
            error: error.to_string(),
        };
        self
    }

    pub fn is_rotated(&self) -> bool {
        matches!(self.outcome, DocumentOutcome::Rotated { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, DocumentOutcome::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, DocumentOutcome::Failed { .. })
    }
}

/// Result of a batch run, documents in input order
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub documents: Vec<DocumentReport>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.documents.len()
    }

    pub fn rotated_count(&self) -> usize {
        self.documents.iter().filter(|d| d.is_rotated()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.documents.iter().filter(|d| d.is_skipped()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.documents.iter().filter(|d| d.is_failed()).count()
    }
}

// ============================================================
// Pipeline
// ============================================================

/// Batch deskew pipeline over an image store
pub struct DeskewPipeline<S: ImageStore = FsImageStore> {
    config: PipelineConfig,
    store: S,
    deskewer: HoughDeskewer,
    pattern: Pattern,
}

impl DeskewPipeline<FsImageStore> {
    /// Pipeline reading and writing the local filesystem
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Self::with_store(config, FsImageStore)
    }
}

impl<S: ImageStore> DeskewPipeline<S> {
    /// Pipeline over a caller-supplied store
    pub fn with_store(config: PipelineConfig, store: S) -> Result<Self> {
        let deskewer = HoughDeskewer::new(config.options.clone()).map_err(|e| match e {
            DeskewError::InvalidOptions(message) => PipelineError::InvalidOptions(message),
            other => PipelineError::InvalidOptions(other.to_string()),
        })?;
        let pattern = Pattern::new(&config.pattern).map_err(|e| {
            PipelineError::InvalidOptions(format!("file pattern {:?}: {}", config.pattern, e))
        })?;
        Ok(Self {
            config,
            store,
            deskewer,
            pattern,
        })
    }

    /// Get the pipeline configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Input files that a run would process, in processing order
    pub fn plan(&self) -> Result<Vec<PathBuf>> {
        self.store
            .list(&self.config.input_dir, &self.pattern)
            .map_err(|e| match e {
                StoreError::NotFound(dir) => PipelineError::InputNotFound(dir),
                other => PipelineError::Store(other),
            })
    }

    /// Process every matching document (silent mode)
    pub fn run(&self) -> Result<BatchReport> {
        self.run_with_progress(&SilentProgress)
    }

    /// Process every matching document with progress callback
    pub fn run_with_progress<P: ProgressCallback>(&self, progress: &P) -> Result<BatchReport> {
        let start_time = Instant::now();

        let files = self.plan()?;
        self.store
            .prepare_output_dir(&self.config.output_dir)
            .map_err(|_| PipelineError::OutputNotWritable(self.config.output_dir.clone()))?;

        let total = files.len();
        info!(
            input = %self.config.input_dir.display(),
            output = %self.config.output_dir.display(),
            documents = total,
            "starting batch"
        );
        progress.on_batch_start(total);

        let process = |(index, source): (usize, &PathBuf)| {
            progress.on_document_start(index, total, source);
            let report = self.process_document(source);
            progress.on_document_complete(&report);
            report
        };

        let documents: Vec<DocumentReport> = if self.config.parallel {
            files.par_iter().enumerate().map(process).collect()
        } else {
            files.iter().enumerate().map(process).collect()
        };

        let report = BatchReport {
            documents,
            elapsed: start_time.elapsed(),
        };
        info!(
            rotated = report.rotated_count(),
            skipped = report.skipped_count(),
            failed = report.failed_count(),
            "batch complete"
        );
        Ok(report)
    }

    /// Process one document. Never fails: errors are recorded in the
    /// report's outcome.
    pub fn process_document(&self, source: &Path) -> DocumentReport {
        let mut report = DocumentReport::new(source);

        let image = match self.store.read(source) {
            Ok(image) => image,
            Err(e) => return report.fail(e),
        };

        let detection = match self.deskewer.detect_lines(&image) {
            Ok(detection) => detection,
            Err(DeskewError::NoLinesDetected) => {
                return self.skip(report, &image, SkipReason::NoLines);
            }
            Err(e) => return report.fail(e),
        };
        report.candidate_count = detection.candidate_count;
        report.strong_lines = detection.strong_lines;
        debug!(
            file = %source.display(),
            candidates = report.candidate_count,
            strong_lines = report.strong_lines.len(),
            "lines detected"
        );

        if self.config.annotate {
            let path = self.config.annotation_path(source);
            let overlay = DynamicImage::ImageRgb8(draw_lines(&image, &report.strong_lines, LINE_COLOR));
            match self.store.write(&path, &overlay) {
                Ok(()) => report.annotation = Some(path),
                Err(e) => warn!(file = %source.display(), error = %e, "line overlay not written"),
            }
        }

        let estimate = match self.deskewer.estimate(&report.strong_lines) {
            Ok(estimate) => estimate,
            Err(DeskewError::AmbiguousOrientation(n)) => {
                return self.skip(report, &image, SkipReason::Ambiguous(n));
            }
            Err(e) => return report.fail(e),
        };
        report.estimate = Some(estimate);

        let angle = match estimate.decision {
            RotationDecision::NoCorrection { angle } => {
                return self.skip(report, &image, SkipReason::BelowThreshold { angle });
            }
            RotationDecision::Rotate { angle } => angle,
        };

        let rotated = match self.deskewer.correct(&image, &estimate.decision) {
            Ok(Some(rotated)) => rotated,
            Ok(None) => return self.skip(report, &image, SkipReason::BelowThreshold { angle }),
            Err(e) => return report.fail(e),
        };

        let output = self.config.output_path(source);
        if let Err(e) = self.store.write(&output, &rotated) {
            return report.fail(e);
        }

        info!(
            file = %source.display(),
            angle = angle,
            strong_lines = report.strong_lines.len(),
            "rotated"
        );
        report.outcome = DocumentOutcome::Rotated {
            angle,
            output,
            original_size: (image.width(), image.height()),
            rotated_size: (rotated.width(), rotated.height()),
        };
        report
    }

    fn skip(&self, mut report: DocumentReport, image: &DynamicImage, reason: SkipReason) -> DocumentReport {
        let mut output = None;
        if self.config.write_skipped {
            let path = self.config.output_path(&report.source);
            if let Err(e) = self.store.write(&path, image) {
                return report.fail(e);
            }
            output = Some(path);
        }

        info!(file = %report.source.display(), reason = %reason, "skipped");
        report.outcome = DocumentOutcome::Skipped { reason, output };
        report
    }
}
