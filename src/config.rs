//! Configuration file support for hough-deskew
//!
//! Supports TOML configuration files with the following search order:
//! 1. `--config <path>` - explicitly specified path
//! 2. `./hough-deskew.toml` - current directory
//! 3. `~/.config/hough-deskew/config.toml` - user config
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [input]
//! dir = "scans"
//! pattern = "*.png"
//!
//! [output]
//! dir = "scans/out"
//! annotate = true
//!
//! [lines]
//! vote_threshold = 150
//!
//! [rotation]
//! threshold_angle = 0.5
//! interpolation = "lanczos3"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::deskew::{Interpolation, ModePolicy};
use crate::PipelineConfig;

/// Config file name looked up in the current directory
pub const LOCAL_CONFIG_FILE: &str = "hough-deskew.toml";

/// Directory under the user config dir
pub const CONFIG_DIR_NAME: &str = "hough-deskew";

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// File not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

/// Input selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InputConfig {
    /// Directory scanned for rasters
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// File name pattern
    #[serde(default)]
    pub pattern: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Suffix appended to the file stem
    #[serde(default)]
    pub suffix: Option<String>,

    /// Write strong-line overlays
    #[serde(default)]
    pub annotate: Option<bool>,

    /// Copy unrotated documents to the output directory
    #[serde(default)]
    pub write_skipped: Option<bool>,
}

/// Edge detector settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EdgesConfig {
    #[serde(default)]
    pub canny_low: Option<f32>,

    #[serde(default)]
    pub canny_high: Option<f32>,

    #[serde(default)]
    pub aperture_size: Option<u32>,
}

/// Line detector and selector settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LinesConfig {
    /// Degrees
    #[serde(default)]
    pub angle_resolution: Option<f64>,

    /// Pixels
    #[serde(default)]
    pub rho_resolution: Option<f64>,

    /// Degrees, inclusive
    #[serde(default)]
    pub min_theta: Option<f64>,

    /// Degrees, exclusive
    #[serde(default)]
    pub max_theta: Option<f64>,

    #[serde(default)]
    pub vote_threshold: Option<u32>,

    /// Pixels
    #[serde(default)]
    pub rho_tolerance: Option<f64>,

    /// Degrees
    #[serde(default)]
    pub angle_tolerance: Option<f64>,
}

/// Estimation and rotation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RotationConfig {
    #[serde(default)]
    pub mode_policy: Option<ModePolicy>,

    /// No-op threshold in degrees
    #[serde(default)]
    pub threshold_angle: Option<f64>,

    #[serde(default)]
    pub interpolation: Option<Interpolation>,

    /// RGB fill for exposed corners
    #[serde(default)]
    pub background_color: Option<[u8; 3]>,
}

/// General configuration options
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Process documents in parallel
    #[serde(default)]
    pub parallel: Option<bool>,

    /// Verbosity level (0-3)
    #[serde(default)]
    pub verbose: Option<u8>,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub edges: EdgesConfig,

    #[serde(default)]
    pub lines: LinesConfig,

    #[serde(default)]
    pub rotation: RotationConfig,

    #[serde(default)]
    pub general: GeneralConfig,
}

impl Config {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the default search path
    ///
    /// Search order:
    /// 1. `./hough-deskew.toml`
    /// 2. `~/.config/hough-deskew/config.toml`
    /// 3. Default values (if no file found)
    pub fn load() -> Result<Self, ConfigError> {
        for path in Self::search_paths() {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load `explicit` when given, otherwise search the default paths
    pub fn load_with(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Convert to PipelineConfig
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default();

        // Input and output
        if let Some(dir) = &self.input.dir {
            config.input_dir = dir.clone();
        }
        if let Some(pattern) = &self.input.pattern {
            config = config.with_pattern(pattern.clone());
        }
        if let Some(dir) = &self.output.dir {
            config.output_dir = dir.clone();
        }
        if let Some(suffix) = &self.output.suffix {
            config = config.with_suffix(suffix.clone());
        }
        if let Some(annotate) = self.output.annotate {
            config = config.with_annotate(annotate);
        }
        if let Some(write_skipped) = self.output.write_skipped {
            config = config.with_write_skipped(write_skipped);
        }
        if let Some(parallel) = self.general.parallel {
            config = config.with_parallel(parallel);
        }

        // Algorithm knobs
        let options = &mut config.options;
        if let Some(low) = self.edges.canny_low {
            options.canny_low = low;
        }
        if let Some(high) = self.edges.canny_high {
            options.canny_high = high;
        }
        if let Some(aperture) = self.edges.aperture_size {
            options.aperture_size = aperture;
        }
        if let Some(resolution) = self.lines.angle_resolution {
            options.angle_resolution = resolution;
        }
        if let Some(resolution) = self.lines.rho_resolution {
            options.rho_resolution = resolution;
        }
        if let Some(min) = self.lines.min_theta {
            options.min_theta = min;
        }
        if let Some(max) = self.lines.max_theta {
            options.max_theta = max;
        }
        if let Some(votes) = self.lines.vote_threshold {
            options.vote_threshold = votes;
        }
        if let Some(rho) = self.lines.rho_tolerance {
            options.rho_tolerance = rho;
        }
        if let Some(angle) = self.lines.angle_tolerance {
            options.angle_tolerance = angle;
        }
        if let Some(policy) = self.rotation.mode_policy {
            options.mode_policy = policy;
        }
        if let Some(threshold) = self.rotation.threshold_angle {
            options.threshold_angle = threshold;
        }
        if let Some(interpolation) = self.rotation.interpolation {
            options.interpolation = interpolation;
        }
        if let Some(color) = self.rotation.background_color {
            options.background_color = color;
        }

        config
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&self, cli: &CliOverrides) -> PipelineConfig {
        let mut config = self.to_pipeline_config();

        if let Some(dir) = &cli.input_dir {
            config.input_dir = dir.clone();
        }
        if let Some(dir) = &cli.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(pattern) = &cli.pattern {
            config = config.with_pattern(pattern.clone());
        }
        if let Some(annotate) = cli.annotate {
            config = config.with_annotate(annotate);
        }
        if let Some(write_skipped) = cli.write_skipped {
            config = config.with_write_skipped(write_skipped);
        }
        if let Some(parallel) = cli.parallel {
            config = config.with_parallel(parallel);
        }
        if let Some(threshold) = cli.threshold_angle {
            config.options.threshold_angle = threshold;
        }
        if let Some(votes) = cli.vote_threshold {
            config.options.vote_threshold = votes;
        }
        if let Some(interpolation) = cli.interpolation {
            config.options.interpolation = interpolation;
        }

        config
    }

    /// Get config file search paths
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(CONFIG_DIR_NAME).join("config.toml"));
        }

        paths
    }
}

/// CLI override values for merging with config file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub pattern: Option<String>,
    pub threshold_angle: Option<f64>,
    pub vote_threshold: Option<u32>,
    pub interpolation: Option<Interpolation>,
    pub annotate: Option<bool>,
    pub write_skipped: Option<bool>,
    pub parallel: Option<bool>,
}

impl CliOverrides {
    /// Create new empty overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Set input directory override
    pub fn with_input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.input_dir = Some(dir.into());
        self
    }

    /// Set output directory override
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Set pattern override
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Set no-op threshold override
    pub fn with_threshold_angle(mut self, degrees: f64) -> Self {
        self.threshold_angle = Some(degrees);
        self
    }

    /// Set vote threshold override
    pub fn with_vote_threshold(mut self, votes: u32) -> Self {
        self.vote_threshold = Some(votes);
        self
    }

    /// Set interpolation override
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = Some(interpolation);
        self
    }
}
