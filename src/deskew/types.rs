//! Deskew module core types
//!
//! Contains the line representation, rotation decision, options and error
//! types shared by the selector, estimator and rotator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================
// Constants
// ============================================================

/// Canny hysteresis low threshold
pub const DEFAULT_CANNY_LOW: f32 = 50.0;

/// Canny hysteresis high threshold
pub const DEFAULT_CANNY_HIGH: f32 = 150.0;

/// Sobel aperture used by the edge detector (only 3 is supported)
pub const DEFAULT_APERTURE_SIZE: u32 = 3;

/// Hough accumulator angle resolution (degrees)
pub const DEFAULT_ANGLE_RESOLUTION: f64 = 1.0;

/// Hough accumulator rho resolution (pixels)
pub const DEFAULT_RHO_RESOLUTION: f64 = 1.0;

/// Lower bound of the theta band searched for near-horizontal lines (degrees)
pub const DEFAULT_MIN_THETA: f64 = 57.0;

/// Upper bound (exclusive) of the theta band (degrees)
pub const DEFAULT_MAX_THETA: f64 = 126.0;

/// Minimum accumulator votes for a candidate line
pub const DEFAULT_VOTE_THRESHOLD: u32 = 200;

/// Two lines closer than this in rho (pixels) may be duplicates
pub const DEFAULT_RHO_TOLERANCE: f64 = 10.0;

/// Two lines closer than this in theta (degrees) may be duplicates
pub const DEFAULT_ANGLE_TOLERANCE: f64 = 5.0;

/// Corrections with |angle| <= this value (degrees) are skipped
pub const DEFAULT_THRESHOLD_ANGLE: f64 = 0.5;

/// Default background color (white) for areas exposed by rotation
pub const DEFAULT_BACKGROUND_COLOR: [u8; 3] = [255, 255, 255];

/// Normal angle of a perfectly horizontal line (degrees)
pub const HORIZONTAL_NORMAL_DEGREES: f64 = 90.0;

// ============================================================
// Error Types
// ============================================================

/// Deskew error types
#[derive(Debug, Error)]
pub enum DeskewError {
    /// The line detector produced no candidates
    #[error("No lines detected")]
    NoLinesDetected,

    /// Strong lines disagree, no theta occurs more than once
    #[error("Ambiguous orientation: no dominant angle among {0} strong lines")]
    AmbiguousOrientation(usize),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

pub type Result<T> = std::result::Result<T, DeskewError>;

// ============================================================
// Lines
// ============================================================

/// A detected line in normal form.
///
/// `rho` is the signed distance (pixels) from the top-left pixel to the
/// line, `theta` the angle (radians) of the line's normal measured from the
/// x axis, with y pointing down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub rho: f64,
    pub theta: f64,
    /// Accumulator votes (0 when the line did not come from a detector)
    #[serde(default)]
    pub votes: u32,
}

impl Line {
    pub fn new(rho: f64, theta: f64) -> Self {
        Self {
            rho,
            theta,
            votes: 0,
        }
    }

    #[must_use]
    pub fn with_votes(mut self, votes: u32) -> Self {
        self.votes = votes;
        self
    }

    /// Normal angle in degrees
    pub fn theta_degrees(&self) -> f64 {
        self.theta.to_degrees()
    }
}

// ============================================================
// Options and Enums
// ============================================================

/// How the dominant theta is picked from the strong lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModePolicy {
    /// Most frequent bitwise-identical theta
    Exact,
    /// Most populated bucket when thetas are quantized at the angle resolution
    #[default]
    Binned,
}

/// Resampling filter used by the rotator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Nearest neighbor (fast, blocky)
    Nearest,
    /// Bilinear
    Bilinear,
    /// Windowed sinc with a 3-lobe Lanczos window
    #[default]
    Lanczos3,
}

/// Deskew detection and correction options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskewOptions {
    /// Canny low threshold
    pub canny_low: f32,
    /// Canny high threshold
    pub canny_high: f32,
    /// Sobel aperture size
    pub aperture_size: u32,
    /// Hough angle resolution (degrees)
    pub angle_resolution: f64,
    /// Hough rho resolution (pixels)
    pub rho_resolution: f64,
    /// Smallest theta searched (degrees)
    pub min_theta: f64,
    /// Largest theta searched, exclusive (degrees)
    pub max_theta: f64,
    /// Minimum votes for a candidate line
    pub vote_threshold: u32,
    /// Duplicate rho tolerance (pixels)
    pub rho_tolerance: f64,
    /// Duplicate theta tolerance (degrees)
    pub angle_tolerance: f64,
    /// Dominant angle statistic
    pub mode_policy: ModePolicy,
    /// No-op threshold (degrees, inclusive)
    pub threshold_angle: f64,
    /// Rotation resampling filter
    pub interpolation: Interpolation,
    /// Fill color for areas exposed by rotation
    pub background_color: [u8; 3],
}

impl Default for DeskewOptions {
    fn default() -> Self {
        Self {
            canny_low: DEFAULT_CANNY_LOW,
            canny_high: DEFAULT_CANNY_HIGH,
            aperture_size: DEFAULT_APERTURE_SIZE,
            angle_resolution: DEFAULT_ANGLE_RESOLUTION,
            rho_resolution: DEFAULT_RHO_RESOLUTION,
            min_theta: DEFAULT_MIN_THETA,
            max_theta: DEFAULT_MAX_THETA,
            vote_threshold: DEFAULT_VOTE_THRESHOLD,
            rho_tolerance: DEFAULT_RHO_TOLERANCE,
            angle_tolerance: DEFAULT_ANGLE_TOLERANCE,
            mode_policy: ModePolicy::Binned,
            threshold_angle: DEFAULT_THRESHOLD_ANGLE,
            interpolation: Interpolation::Lanczos3,
            background_color: DEFAULT_BACKGROUND_COLOR,
        }
    }
}

impl DeskewOptions {
    /// Create a new options builder
    pub fn builder() -> DeskewOptionsBuilder {
        DeskewOptionsBuilder::default()
    }

    /// Create options optimized for fast processing
    pub fn fast() -> Self {
        Self {
            interpolation: Interpolation::Bilinear,
            ..Default::default()
        }
    }

    /// Check that the options describe a usable detector setup
    pub fn validate(&self) -> Result<()> {
        if !(self.canny_low >= 0.0 && self.canny_low <= self.canny_high) {
            return Err(DeskewError::InvalidOptions(format!(
                "canny thresholds must satisfy 0 <= low <= high (got {} / {})",
                self.canny_low, self.canny_high
            )));
        }
        if self.aperture_size != DEFAULT_APERTURE_SIZE {
            return Err(DeskewError::InvalidOptions(format!(
                "unsupported aperture size {} (only 3 is available)",
                self.aperture_size
            )));
        }
        if !(self.angle_resolution > 0.0) || !(self.rho_resolution > 0.0) {
            return Err(DeskewError::InvalidOptions(
                "angle and rho resolution must be positive".to_string(),
            ));
        }
        if !(self.min_theta >= 0.0 && self.min_theta < self.max_theta && self.max_theta <= 180.0)
        {
            return Err(DeskewError::InvalidOptions(format!(
                "theta band must satisfy 0 <= min < max <= 180 (got {}..{})",
                self.min_theta, self.max_theta
            )));
        }
        if self.rho_tolerance < 0.0 || self.angle_tolerance < 0.0 || self.threshold_angle < 0.0 {
            return Err(DeskewError::InvalidOptions(
                "tolerances and threshold must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for DeskewOptions
#[derive(Debug, Default)]
pub struct DeskewOptionsBuilder {
    options: DeskewOptions,
}

impl DeskewOptionsBuilder {
    /// Set the Canny hysteresis thresholds
    #[must_use]
    pub fn canny_thresholds(mut self, low: f32, high: f32) -> Self {
        self.options.canny_low = low;
        self.options.canny_high = high;
        self
    }

    /// Set the Hough angle resolution (degrees)
    #[must_use]
    pub fn angle_resolution(mut self, degrees: f64) -> Self {
        self.options.angle_resolution = degrees.abs();
        self
    }

    /// Set the searched theta band (degrees)
    #[must_use]
    pub fn theta_band(mut self, min: f64, max: f64) -> Self {
        self.options.min_theta = min;
        self.options.max_theta = max;
        self
    }

    /// Set the minimum accumulator votes
    #[must_use]
    pub fn vote_threshold(mut self, votes: u32) -> Self {
        self.options.vote_threshold = votes;
        self
    }

    /// Set the duplicate tolerances (pixels, degrees)
    #[must_use]
    pub fn tolerances(mut self, rho: f64, angle: f64) -> Self {
        self.options.rho_tolerance = rho.abs();
        self.options.angle_tolerance = angle.abs();
        self
    }

    /// Set the dominant angle statistic
    #[must_use]
    pub fn mode_policy(mut self, policy: ModePolicy) -> Self {
        self.options.mode_policy = policy;
        self
    }

    /// Set the correction threshold angle
    #[must_use]
    pub fn threshold_angle(mut self, angle: f64) -> Self {
        self.options.threshold_angle = angle.abs();
        self
    }

    /// Set the rotation resampling filter
    #[must_use]
    pub fn interpolation(mut self, interpolation: Interpolation) -> Self {
        self.options.interpolation = interpolation;
        self
    }

    /// Set the background color for rotated areas
    #[must_use]
    pub fn background_color(mut self, color: [u8; 3]) -> Self {
        self.options.background_color = color;
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> DeskewOptions {
        self.options
    }
}

// ============================================================
// Result Types
// ============================================================

/// Outcome of the threshold policy.
///
/// Angles are in degrees, positive = clockwise on screen (y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationDecision {
    /// The measured skew is within the threshold; `angle` is what was measured
    NoCorrection { angle: f64 },
    /// Rotate the document by `angle`
    Rotate { angle: f64 },
}

impl RotationDecision {
    /// Whether the image should be rotated
    pub fn is_rotate(&self) -> bool {
        matches!(self, RotationDecision::Rotate { .. })
    }

    /// Measured corrective angle in degrees
    pub fn angle(&self) -> f64 {
        match *self {
            RotationDecision::NoCorrection { angle } | RotationDecision::Rotate { angle } => angle,
        }
    }
}

/// Dominant orientation derived from a strong line set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkewEstimate {
    /// Dominant normal angle (radians)
    pub dominant_theta: f64,
    /// Number of strong lines supporting the dominant angle
    pub support: usize,
    /// Corrective rotation and whether to apply it
    pub decision: RotationDecision,
}

impl SkewEstimate {
    /// Dominant normal angle in degrees
    pub fn dominant_degrees(&self) -> f64 {
        self.dominant_theta.to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deskew_options_default() {
        let opts = DeskewOptions::default();
        assert_eq!(opts.canny_low, 50.0);
        assert_eq!(opts.canny_high, 150.0);
        assert_eq!(opts.aperture_size, 3);
        assert_eq!(opts.vote_threshold, 200);
        assert_eq!(opts.rho_tolerance, 10.0);
        assert_eq!(opts.angle_tolerance, 5.0);
        assert_eq!(opts.threshold_angle, 0.5);
        assert_eq!(opts.background_color, [255, 255, 255]);
        assert_eq!(opts.mode_policy, ModePolicy::Binned);
        assert_eq!(opts.interpolation, Interpolation::Lanczos3);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_deskew_options_fast() {
        let opts = DeskewOptions::fast();
        assert_eq!(opts.interpolation, Interpolation::Bilinear);
        assert_eq!(opts.threshold_angle, DEFAULT_THRESHOLD_ANGLE);
    }

    #[test]
    fn test_deskew_options_builder() {
        let opts = DeskewOptions::builder()
            .canny_thresholds(30.0, 90.0)
            .theta_band(60.0, 120.0)
            .vote_threshold(150)
            .tolerances(-8.0, 3.0)
            .mode_policy(ModePolicy::Exact)
            .threshold_angle(-0.3)
            .interpolation(Interpolation::Nearest)
            .background_color([0, 0, 0])
            .build();

        assert_eq!(opts.canny_low, 30.0);
        assert_eq!(opts.canny_high, 90.0);
        assert_eq!(opts.min_theta, 60.0);
        assert_eq!(opts.max_theta, 120.0);
        assert_eq!(opts.vote_threshold, 150);
        assert_eq!(opts.rho_tolerance, 8.0);
        assert_eq!(opts.angle_tolerance, 3.0);
        assert_eq!(opts.mode_policy, ModePolicy::Exact);
        assert_eq!(opts.threshold_angle, 0.3);
        assert_eq!(opts.interpolation, Interpolation::Nearest);
        assert_eq!(opts.background_color, [0, 0, 0]);
    }

    #[test]
    fn test_validate_rejects_bad_options() {
        let swapped = DeskewOptions::builder().canny_thresholds(150.0, 50.0).build();
        assert!(matches!(
            swapped.validate(),
            Err(DeskewError::InvalidOptions(_))
        ));

        let aperture = DeskewOptions {
            aperture_size: 5,
            ..Default::default()
        };
        assert!(aperture.validate().is_err());

        let band = DeskewOptions::builder().theta_band(120.0, 60.0).build();
        assert!(band.validate().is_err());

        let resolution = DeskewOptions {
            rho_resolution: 0.0,
            ..Default::default()
        };
        assert!(resolution.validate().is_err());
    }

    #[test]
    fn test_rotation_decision_accessors() {
        let rotate = RotationDecision::Rotate { angle: 1.2 };
        let skip = RotationDecision::NoCorrection { angle: -0.2 };
        assert!(rotate.is_rotate());
        assert!(!skip.is_rotate());
        assert_eq!(rotate.angle(), 1.2);
        assert_eq!(skip.angle(), -0.2);
    }

    #[test]
    fn test_line_degrees() {
        let line = Line::new(12.0, std::f64::consts::FRAC_PI_2).with_votes(300);
        assert!((line.theta_degrees() - 90.0).abs() < 1e-12);
        assert_eq!(line.votes, 300);
    }

    #[test]
    fn test_options_toml_round_trip_keeps_enums_lowercase() {
        let opts = DeskewOptions::builder()
            .mode_policy(ModePolicy::Exact)
            .interpolation(Interpolation::Bilinear)
            .build();
        let text = toml::to_string(&opts).unwrap();
        assert!(text.contains("mode_policy = \"exact\""));
        assert!(text.contains("interpolation = \"bilinear\""));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(DeskewError::NoLinesDetected.to_string(), "No lines detected");
        assert!(DeskewError::AmbiguousOrientation(4)
            .to_string()
            .contains("4 strong lines"));
    }
}
