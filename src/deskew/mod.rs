//! Deskew (Skew Correction) module
//!
//! Detects the dominant line orientation of a scanned page and rotates the
//! page so that orientation becomes horizontal.
//!
//! # Pipeline
//!
//! ```text
//! gray -> Canny edges -> Hough candidates -> strong lines -> mode theta
//!      -> 90° - theta -> threshold -> bounding-box rotation
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use hough_deskew::{DeskewOptions, HoughDeskewer};
//!
//! let options = DeskewOptions::builder()
//!     .vote_threshold(200)
//!     .threshold_angle(0.5)
//!     .build();
//! let deskewer = HoughDeskewer::new(options).unwrap();
//!
//! let page = image::open("scanned.png").unwrap();
//! let output = deskewer.deskew(&page).unwrap();
//! println!("Rotation: {:.2}°", output.estimate.decision.angle());
//! ```

// Submodules
mod algorithm;
mod detector;
mod estimator;
mod rotate;
mod selector;
mod types;

// Re-export public API
pub use algorithm::{DeskewOutput, HoughDeskewer, LineDetection};
pub use detector::{CannyEdgeDetector, EdgeDetector, HoughLineDetector, LineDetector};
pub use estimator::{decide, dominant_theta, estimate_skew, rotation_angle};
pub use rotate::{bounding_dimensions, rotate_bound, rotate_buffer, ALPHA_OPAQUE};
pub use selector::{select_strong_lines, Similarity};
pub use types::{
    DeskewError, DeskewOptions, DeskewOptionsBuilder, Interpolation, Line, ModePolicy, Result,
    RotationDecision, SkewEstimate, DEFAULT_ANGLE_RESOLUTION, DEFAULT_ANGLE_TOLERANCE,
    DEFAULT_APERTURE_SIZE, DEFAULT_BACKGROUND_COLOR, DEFAULT_CANNY_HIGH, DEFAULT_CANNY_LOW,
    DEFAULT_MAX_THETA, DEFAULT_MIN_THETA, DEFAULT_RHO_RESOLUTION, DEFAULT_RHO_TOLERANCE,
    DEFAULT_THRESHOLD_ANGLE, DEFAULT_VOTE_THRESHOLD, HORIZONTAL_NORMAL_DEGREES,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = DeskewOptions::default();

        assert_eq!(opts.min_theta, DEFAULT_MIN_THETA);
        assert_eq!(opts.max_theta, DEFAULT_MAX_THETA);
        assert_eq!(opts.threshold_angle, 0.5);
        assert_eq!(opts.background_color, [255, 255, 255]);
        assert_eq!(opts.interpolation, Interpolation::Lanczos3);
    }

    #[test]
    fn test_builder_pattern() {
        let options = DeskewOptions::builder()
            .vote_threshold(120)
            .threshold_angle(1.0)
            .background_color([128, 128, 128])
            .interpolation(Interpolation::Bilinear)
            .build();

        assert_eq!(options.vote_threshold, 120);
        assert_eq!(options.threshold_angle, 1.0);
        assert_eq!(options.background_color, [128, 128, 128]);
        assert_eq!(options.interpolation, Interpolation::Bilinear);
    }

    #[test]
    fn test_detectors_follow_options() {
        let options = DeskewOptions::builder()
            .canny_thresholds(20.0, 60.0)
            .theta_band(80.0, 100.0)
            .vote_threshold(42)
            .build();

        let canny = CannyEdgeDetector::from_options(&options);
        assert_eq!(canny.low_threshold, 20.0);
        assert_eq!(canny.high_threshold, 60.0);

        let hough = HoughLineDetector::from_options(&options);
        assert_eq!(hough.vote_threshold, 42);
        assert_eq!(hough.thetas().len(), 20);
    }

    #[test]
    fn test_end_to_end_decision_from_lines() {
        let strong = select_strong_lines(
            &[
                Line::new(100.0, 1.55),
                Line::new(104.0, 1.56),
                Line::new(300.0, 1.55),
                Line::new(500.0, 1.20),
            ],
            &Similarity::new(DEFAULT_RHO_TOLERANCE, DEFAULT_ANGLE_TOLERANCE),
        )
        .unwrap();
        assert_eq!(strong.len(), 3);

        let estimate = estimate_skew(&strong, &DeskewOptions::default()).unwrap();
        assert!(estimate.decision.is_rotate());
        assert!((estimate.decision.angle() - 1.19).abs() < 0.01);
    }
}
