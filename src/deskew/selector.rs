//! Strong line selection
//!
//! Collapses the detector's candidate list, which usually holds several
//! detections of every physical line, into one representative per line.

use super::types::{DeskewError, Line, Result};

/// Near-duplicate tolerances
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity {
    /// Maximum rho difference (pixels)
    pub rho_tolerance: f64,
    /// Maximum theta difference (radians)
    pub theta_tolerance: f64,
}

impl Similarity {
    /// Tolerances from a pixel distance and an angle in degrees
    pub fn new(rho_tolerance: f64, angle_tolerance_degrees: f64) -> Self {
        Self {
            rho_tolerance,
            theta_tolerance: angle_tolerance_degrees.to_radians(),
        }
    }

    /// Whether two lines are near-duplicates.
    ///
    /// Theta is compared without wraparound: 0.01 and π - 0.01 are far apart.
    pub fn is_similar(&self, a: &Line, b: &Line) -> bool {
        (a.rho - b.rho).abs() <= self.rho_tolerance
            && (a.theta - b.theta).abs() <= self.theta_tolerance
    }
}

/// Keep the first line of every cluster of near-duplicates.
///
/// Candidates are visited in the given (confidence) order. The first one is
/// always kept; every later one is kept only if it is not similar to any
/// line kept so far.
///
/// # Errors
/// `NoLinesDetected` when `candidates` is empty.
pub fn select_strong_lines(candidates: &[Line], similarity: &Similarity) -> Result<Vec<Line>> {
    let (first, rest) = candidates
        .split_first()
        .ok_or(DeskewError::NoLinesDetected)?;

    let mut strong = vec![*first];
    for line in rest {
        if !strong.iter().any(|kept| similarity.is_similar(line, kept)) {
            strong.push(*line);
        }
    }

    tracing::debug!(
        candidates = candidates.len(),
        strong = strong.len(),
        "selected strong lines"
    );
    Ok(strong)
}
