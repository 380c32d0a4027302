//! Deskew Algorithm Implementation
//!
//! Chains edge detection, Hough line detection, strong line selection,
//! skew estimation and bounding-box rotation for one in-memory image.

use image::DynamicImage;

use super::detector::{CannyEdgeDetector, EdgeDetector, HoughLineDetector, LineDetector};
use super::estimator::estimate_skew;
use super::rotate::rotate_bound;
use super::selector::{select_strong_lines, Similarity};
use super::types::{DeskewError, DeskewOptions, Line, Result, RotationDecision, SkewEstimate};

/// Lines found in one image
#[derive(Debug, Clone, PartialEq)]
pub struct LineDetection {
    /// Raw candidates returned by the line detector
    pub candidate_count: usize,
    /// Deduplicated representatives, in candidate order
    pub strong_lines: Vec<Line>,
}

/// Result of a full detect-estimate-rotate pass
#[derive(Debug, Clone)]
pub struct DeskewOutput {
    pub detection: LineDetection,
    pub estimate: SkewEstimate,
    /// Rotated raster, `None` when the decision was not to rotate
    pub rotated: Option<DynamicImage>,
}

/// Hough-line deskewer, generic over its edge and line detectors
#[derive(Debug, Clone)]
pub struct HoughDeskewer<E = CannyEdgeDetector, L = HoughLineDetector> {
    options: DeskewOptions,
    edge_detector: E,
    line_detector: L,
}

impl HoughDeskewer {
    /// Deskewer with Canny edges and a Hough accumulator configured from
    /// `options`
    pub fn new(options: DeskewOptions) -> Result<Self> {
        let edge_detector = CannyEdgeDetector::from_options(&options);
        let line_detector = HoughLineDetector::from_options(&options);
        Self::with_detectors(options, edge_detector, line_detector)
    }
}

impl<E: EdgeDetector, L: LineDetector> HoughDeskewer<E, L> {
    /// Deskewer with caller-supplied detectors
    pub fn with_detectors(options: DeskewOptions, edge_detector: E, line_detector: L) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            edge_detector,
            line_detector,
        })
    }

    pub fn options(&self) -> &DeskewOptions {
        &self.options
    }

    fn similarity(&self) -> Similarity {
        Similarity::new(self.options.rho_tolerance, self.options.angle_tolerance)
    }

    /// Detect candidate lines and reduce them to strong lines
    ///
    /// # Errors
    /// * `InvalidImage` for a zero-sized raster
    /// * `NoLinesDetected` when the detector finds nothing
    pub fn detect_lines(&self, img: &DynamicImage) -> Result<LineDetection> {
        if img.width() == 0 || img.height() == 0 {
            return Err(DeskewError::InvalidImage(format!(
                "empty raster ({}x{})",
                img.width(),
                img.height()
            )));
        }

        let gray = img.to_luma8();
        let edges = self.edge_detector.detect_edges(&gray);
        let candidates = self.line_detector.detect_lines(&edges);
        let strong_lines = select_strong_lines(&candidates, &self.similarity())?;

        Ok(LineDetection {
            candidate_count: candidates.len(),
            strong_lines,
        })
    }

    /// Estimate skew from strong lines
    pub fn estimate(&self, strong_lines: &[Line]) -> Result<SkewEstimate> {
        estimate_skew(strong_lines, &self.options)
    }

    /// Apply a rotation decision. Returns `None` for `NoCorrection`.
    pub fn correct(
        &self,
        img: &DynamicImage,
        decision: &RotationDecision,
    ) -> Result<Option<DynamicImage>> {
        match *decision {
            RotationDecision::NoCorrection { .. } => Ok(None),
            RotationDecision::Rotate { angle } => rotate_bound(
                img,
                angle,
                self.options.interpolation,
                self.options.background_color,
            )
            .map(Some),
        }
    }

    /// Detect, estimate and rotate in one call
    pub fn deskew(&self, img: &DynamicImage) -> Result<DeskewOutput> {
        let detection = self.detect_lines(img)?;
        let estimate = self.estimate(&detection.strong_lines)?;
        let rotated = self.correct(img, &estimate.decision)?;

        Ok(DeskewOutput {
            detection,
            estimate,
            rotated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deskew::types::ModePolicy;
    use image::{GrayImage, Luma, RgbImage};

    /// Line detector that returns a fixed candidate list
    struct FixedLines(Vec<Line>);

    impl LineDetector for FixedLines {
        fn detect_lines(&self, _edges: &GrayImage) -> Vec<Line> {
            self.0.clone()
        }
    }

    fn blank() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(80, 60, image::Rgb([255, 255, 255])))
    }

    fn deskewer_with(lines: Vec<Line>) -> HoughDeskewer<CannyEdgeDetector, FixedLines> {
        let options = DeskewOptions::builder()
            .mode_policy(ModePolicy::Exact)
            .build();
        let canny = CannyEdgeDetector::from_options(&options);
        HoughDeskewer::with_detectors(options, canny, FixedLines(lines)).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_options() {
        let options = DeskewOptions::builder().theta_band(100.0, 90.0).build();
        assert!(matches!(
            HoughDeskewer::new(options),
            Err(DeskewError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_blank_image_has_no_lines() {
        let deskewer = HoughDeskewer::new(DeskewOptions::default()).unwrap();
        let result = deskewer.deskew(&blank());
        assert!(matches!(result, Err(DeskewError::NoLinesDetected)));
    }

    #[test]
    fn test_empty_image_is_invalid() {
        let deskewer = HoughDeskewer::new(DeskewOptions::default()).unwrap();
        let empty = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        assert!(matches!(
            deskewer.detect_lines(&empty),
            Err(DeskewError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_deskew_with_fixed_lines_rotates() {
        let deskewer = deskewer_with(vec![
            Line::new(10.0, 1.55),
            Line::new(12.0, 1.55),
            Line::new(40.0, 1.55),
            Line::new(90.0, 1.20),
        ]);

        let output = deskewer.deskew(&blank()).unwrap();
        assert_eq!(output.detection.candidate_count, 4);
        assert_eq!(output.detection.strong_lines.len(), 3);
        assert_eq!(output.estimate.dominant_theta, 1.55);
        assert_eq!(output.estimate.support, 2);
        let rotated = output.rotated.expect("angle above threshold");
        assert!(rotated.width() > 80 && rotated.height() > 60);
    }

    #[test]
    fn test_deskew_below_threshold_does_not_rotate() {
        let theta = 89.7f64.to_radians();
        let deskewer = deskewer_with(vec![Line::new(10.0, theta), Line::new(40.0, theta)]);

        let output = deskewer.deskew(&blank()).unwrap();
        assert!(!output.estimate.decision.is_rotate());
        assert!(output.rotated.is_none());
    }

    #[test]
    fn test_deskew_ambiguous() {
        let deskewer = deskewer_with(vec![Line::new(10.0, 1.30), Line::new(60.0, 1.50)]);
        assert!(matches!(
            deskewer.deskew(&blank()),
            Err(DeskewError::AmbiguousOrientation(2))
        ));
    }

    #[test]
    fn test_detect_lines_on_ruled_page() {
        let mut gray = GrayImage::from_pixel(400, 300, Luma([255]));
        for y in [60u32, 120, 180, 240] {
            for x in 20..380 {
                for t in 0..3 {
                    gray.put_pixel(x, y + t, Luma([0]));
                }
            }
        }

        let deskewer = HoughDeskewer::new(DeskewOptions::default()).unwrap();
        let detection = deskewer
            .detect_lines(&DynamicImage::ImageLuma8(gray))
            .unwrap();
        assert!(detection.candidate_count >= detection.strong_lines.len());
        assert!(detection.strong_lines.len() >= 4);

        let estimate = deskewer.estimate(&detection.strong_lines).unwrap();
        assert!(!estimate.decision.is_rotate());
        assert!((estimate.dominant_degrees() - 90.0).abs() < 1e-6);
    }
}
