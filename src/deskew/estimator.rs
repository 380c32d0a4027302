//! Skew estimation
//!
//! Turns a strong line set into one corrective rotation. The dominant normal
//! angle is the mode of the strong lines' thetas; its deviation from 90° is
//! the skew.
//!
//! Sign convention used end to end: a positive angle is a clockwise rotation
//! on screen (y axis pointing down). A text line rising to the right has a
//! normal below 90° and yields a positive (clockwise) correction.

use super::types::{
    DeskewError, DeskewOptions, Line, ModePolicy, Result, RotationDecision, SkewEstimate,
    HORIZONTAL_NORMAL_DEGREES,
};

/// A group of equal (or equally binned) thetas
#[derive(Debug, Clone, Copy)]
struct ThetaGroup {
    key: i64,
    count: usize,
    sum: f64,
}

fn group_key(theta: f64, policy: ModePolicy, resolution: f64) -> i64 {
    match policy {
        ModePolicy::Exact => theta.to_bits() as i64,
        ModePolicy::Binned => (theta / resolution).round() as i64,
    }
}

/// Most frequent theta and the number of lines supporting it.
///
/// Ties between equally frequent groups go to the group seen first. With
/// `Binned`, the returned theta is the mean of the winning bucket.
///
/// # Arguments
/// * `thetas` - Normal angles (radians), in strong line order
/// * `policy` - Exact or binned grouping
/// * `resolution` - Bucket width (radians), ignored for `Exact`
///
/// # Errors
/// * `NoLinesDetected` when `thetas` is empty
/// * `AmbiguousOrientation` when several values are present and none repeats
pub fn dominant_theta(thetas: &[f64], policy: ModePolicy, resolution: f64) -> Result<(f64, usize)> {
    if thetas.is_empty() {
        return Err(DeskewError::NoLinesDetected);
    }

    let mut groups: Vec<ThetaGroup> = Vec::new();
    for &theta in thetas {
        let key = group_key(theta, policy, resolution);
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => {
                group.count += 1;
                group.sum += theta;
            }
            None => groups.push(ThetaGroup {
                key,
                count: 1,
                sum: theta,
            }),
        }
    }

    let mut best = groups[0];
    for group in &groups[1..] {
        if group.count > best.count {
            best = *group;
        }
    }

    if thetas.len() > 1 && best.count == 1 {
        return Err(DeskewError::AmbiguousOrientation(thetas.len()));
    }

    Ok((best.sum / best.count as f64, best.count))
}

/// Corrective rotation (degrees) for a dominant normal angle (radians)
pub fn rotation_angle(dominant_theta: f64) -> f64 {
    HORIZONTAL_NORMAL_DEGREES - dominant_theta.to_degrees()
}

/// Apply the no-op threshold. The boundary is inclusive: `|angle| <= threshold`
/// is not corrected.
pub fn decide(angle: f64, threshold: f64) -> RotationDecision {
    if angle.abs() <= threshold {
        RotationDecision::NoCorrection { angle }
    } else {
        RotationDecision::Rotate { angle }
    }
}

/// Estimate the skew of a document from its strong lines
pub fn estimate_skew(strong_lines: &[Line], options: &DeskewOptions) -> Result<SkewEstimate> {
    let thetas: Vec<f64> = strong_lines.iter().map(|line| line.theta).collect();
    let (theta, support) = dominant_theta(
        &thetas,
        options.mode_policy,
        options.angle_resolution.to_radians(),
    )?;

    let angle = rotation_angle(theta);
    let decision = decide(angle, options.threshold_angle);

    tracing::debug!(
        dominant_degrees = theta.to_degrees(),
        support,
        angle,
        rotate = decision.is_rotate(),
        "estimated skew"
    );

    Ok(SkewEstimate {
        dominant_theta: theta,
        support,
        decision,
    })
}
