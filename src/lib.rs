//! hough-deskew - Skew detection and correction for scanned documents
//!
//! Finds the dominant line orientation of a page with a Hough transform and
//! rotates the page so its text baselines become horizontal, growing the
//! canvas instead of cropping.
//!
//! # Features
//!
//! - **Deskew** ([`deskew`]) - Edge and line detection, strong-line
//!   selection, skew estimation and bounding-box rotation
//! - **Image Store** ([`store`]) - Filesystem and in-memory raster storage
//! - **Annotation** ([`annotate`]) - Strong-line overlays for diagnostics
//! - **Pipeline** ([`pipeline`]) - Batch processing with per-document reports
//! - **Config** ([`config`]) - TOML configuration with CLI overrides
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use hough_deskew::{DeskewPipeline, PipelineConfig};
//!
//! let config = PipelineConfig::new("scans", "scans/out").with_annotate(true);
//! let pipeline = DeskewPipeline::new(config).unwrap();
//! let report = pipeline.run().unwrap();
//! println!("{} rotated, {} skipped", report.rotated_count(), report.skipped_count());
//! ```
//!
//! ## Using Builder Patterns
//!
//! ```rust
//! use hough_deskew::{DeskewOptions, Interpolation};
//!
//! let options = DeskewOptions::builder()
//!     .vote_threshold(150)
//!     .threshold_angle(0.25)
//!     .interpolation(Interpolation::Bilinear)
//!     .build();
//! assert!(options.validate().is_ok());
//!
//! // Or use presets
//! let fast = DeskewOptions::fast();
//! ```
//!
//! # Architecture
//!
//! ```text
//! ImageStore -> Canny edges -> Hough lines -> strong lines -> skew estimate
//!                                   |                              |
//!                              annotation                 bounding-box rotation
//!                                                                  |
//!                                                             ImageStore
//! ```
//!
//! # License
//!
//! AGPL-3.0

pub mod annotate;
pub mod cli;
pub mod config;
pub mod deskew;
pub mod pipeline;
pub mod store;
pub mod util;

// Re-exports for convenience
pub use annotate::{draw_lines, line_endpoints, LINE_COLOR};
pub use cli::{create_progress_bar, Cli, Commands, EstimateArgs, ExitCode, InterpolationArg, RunArgs};
pub use config::{CliOverrides, Config, ConfigError};
pub use deskew::{
    rotate_bound, select_strong_lines, CannyEdgeDetector, DeskewError, DeskewOptions,
    DeskewOptionsBuilder, DeskewOutput, EdgeDetector, HoughDeskewer, HoughLineDetector,
    Interpolation, Line, LineDetection, LineDetector, ModePolicy, RotationDecision, SkewEstimate,
    Similarity,
};
pub use pipeline::{
    BatchReport, DeskewPipeline, DocumentOutcome, DocumentReport, PipelineConfig, PipelineError,
    ProgressCallback, SilentProgress, SkipReason,
};
pub use store::{derived_path, FsImageStore, ImageStore, MemoryImageStore, StoreError};
pub use util::{ensure_dir_writable, format_duration, init_tracing};
