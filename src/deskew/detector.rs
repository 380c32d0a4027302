//! Edge and line detection
//!
//! The skew estimator only needs two things from the outside world: a
//! binary edge map and a confidence-ordered list of candidate lines. Both are
//! behind traits so tests and callers can swap in their own detectors.

use image::GrayImage;

use super::types::{DeskewOptions, Line};

/// Turns a grayscale raster into a binary edge map (0 / 255)
pub trait EdgeDetector {
    fn detect_edges(&self, gray: &GrayImage) -> GrayImage;
}

/// Turns an edge map into candidate lines, most confident first
pub trait LineDetector {
    fn detect_lines(&self, edges: &GrayImage) -> Vec<Line>;
}

// ============================================================
// Canny
// ============================================================

/// Canny edge detector with a 3x3 Sobel aperture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CannyEdgeDetector {
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl CannyEdgeDetector {
    pub fn new(low_threshold: f32, high_threshold: f32) -> Self {
        Self {
            low_threshold,
            high_threshold,
        }
    }

    pub fn from_options(options: &DeskewOptions) -> Self {
        Self::new(options.canny_low, options.canny_high)
    }
}

impl EdgeDetector for CannyEdgeDetector {
    fn detect_edges(&self, gray: &GrayImage) -> GrayImage {
        if gray.width() == 0 || gray.height() == 0 {
            return gray.clone();
        }
        imageproc::edges::canny(gray, self.low_threshold, self.high_threshold)
    }
}

// ============================================================
// Hough
// ============================================================

/// Standard Hough transform restricted to a band of normal angles.
///
/// Thetas are sampled at `min_theta + k * angle_resolution` for every value
/// below `max_theta`. A cell becomes a candidate when its votes exceed
/// `vote_threshold` and it is a local maximum among its four neighbours.
/// Candidates come out in descending vote order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughLineDetector {
    /// Theta step (degrees)
    pub angle_resolution: f64,
    /// Rho step (pixels)
    pub rho_resolution: f64,
    /// First theta (degrees)
    pub min_theta: f64,
    /// Theta upper bound, exclusive (degrees)
    pub max_theta: f64,
    /// Votes a cell must exceed
    pub vote_threshold: u32,
}

impl HoughLineDetector {
    pub fn from_options(options: &DeskewOptions) -> Self {
        Self {
            angle_resolution: options.angle_resolution,
            rho_resolution: options.rho_resolution,
            min_theta: options.min_theta,
            max_theta: options.max_theta,
            vote_threshold: options.vote_threshold,
        }
    }

    /// Sampled thetas in radians
    pub fn thetas(&self) -> Vec<f64> {
        let span = (self.max_theta - self.min_theta) / self.angle_resolution;
        let count = (span - 1e-9).ceil().max(0.0) as usize;
        (0..count)
            .map(|k| (self.min_theta + k as f64 * self.angle_resolution).to_radians())
            .collect()
    }
}

impl Default for HoughLineDetector {
    fn default() -> Self {
        Self::from_options(&DeskewOptions::default())
    }
}

impl LineDetector for HoughLineDetector {
    fn detect_lines(&self, edges: &GrayImage) -> Vec<Line> {
        let (width, height) = edges.dimensions();
        let thetas = self.thetas();
        if width == 0 || height == 0 || thetas.is_empty() {
            return Vec::new();
        }

        let max_rho = (width as f64).hypot(height as f64);
        let num_rho = (2.0 * max_rho / self.rho_resolution).ceil() as usize + 1;
        let rho_offset = (num_rho / 2) as i64;
        let num_angles = thetas.len();

        // One cell of zero padding around the table keeps the peak test branch-free
        let stride = num_rho + 2;
        let mut accumulator = vec![0u32; (num_angles + 2) * stride];

        let cos_table: Vec<f64> = thetas
            .iter()
            .map(|t| t.cos() / self.rho_resolution)
            .collect();
        let sin_table: Vec<f64> = thetas
            .iter()
            .map(|t| t.sin() / self.rho_resolution)
            .collect();

        for (x, y, pixel) in edges.enumerate_pixels() {
            if pixel.0[0] == 0 {
                continue;
            }
            let (xf, yf) = (x as f64, y as f64);
            for (n, (&cos_t, &sin_t)) in cos_table.iter().zip(sin_table.iter()).enumerate() {
                let r = (xf * cos_t + yf * sin_t).round() as i64 + rho_offset;
                if r >= 0 && (r as usize) < num_rho {
                    accumulator[(n + 1) * stride + r as usize + 1] += 1;
                }
            }
        }

        let mut peaks: Vec<(u32, usize, usize)> = Vec::new();
        for n in 0..num_angles {
            for r in 0..num_rho {
                let base = (n + 1) * stride + r + 1;
                let votes = accumulator[base];
                if votes > self.vote_threshold
                    && votes > accumulator[base - 1]
                    && votes >= accumulator[base + 1]
                    && votes > accumulator[base - stride]
                    && votes >= accumulator[base + stride]
                {
                    peaks.push((votes, n, r));
                }
            }
        }

        // Stable: equal votes keep theta-then-rho order
        peaks.sort_by(|a, b| b.0.cmp(&a.0));

        let lines: Vec<Line> = peaks
            .into_iter()
            .map(|(votes, n, r)| {
                let rho = (r as i64 - rho_offset) as f64 * self.rho_resolution;
                Line::new(rho, thetas[n]).with_votes(votes)
            })
            .collect();

        tracing::debug!(
            edge_pixels = edges.pixels().filter(|p| p.0[0] != 0).count(),
            candidates = lines.len(),
            "hough line detection"
        );
        lines
    }
}
