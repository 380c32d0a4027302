//! End-to-end deskew tests
//!
//! Synthetic skewed pages go through the full Canny + Hough chain with the
//! default parameters, get rotated, and are measured again.

use hough_deskew::{
    DeskewOptions, DeskewPipeline, DocumentOutcome, FsImageStore, HoughDeskewer, ImageStore,
    PipelineConfig, RotationDecision,
};
use image::{DynamicImage, GrayImage, Luma};
use tempfile::TempDir;

/// White page with thick dark lines rising to the right by `degrees`
fn ruled_page(degrees: f64) -> DynamicImage {
    let (width, height) = (640u32, 480u32);
    let mut img = GrayImage::from_pixel(width, height, Luma([255]));
    let slope = degrees.to_radians().tan();
    for base in [120.0, 190.0, 260.0, 330.0, 400.0] {
        for x in 60..580u32 {
            let y = (base - slope * x as f64).round() as i64;
            for t in 0..3 {
                let yy = y + t;
                if (0..height as i64).contains(&yy) {
                    img.put_pixel(x, yy as u32, Luma([0]));
                }
            }
        }
    }
    DynamicImage::ImageLuma8(img)
}

#[test]
fn test_three_degree_page_is_detected() {
    let deskewer = HoughDeskewer::new(DeskewOptions::default()).unwrap();
    let output = deskewer.deskew(&ruled_page(3.0)).unwrap();

    assert!(output.detection.strong_lines.len() >= 5);
    match output.estimate.decision {
        RotationDecision::Rotate { angle } => {
            assert!((angle - 3.0).abs() <= 1.0, "expected about 3°, got {}", angle)
        }
        other => panic!("expected a rotation, got {:?}", other),
    }

    let rotated = output.rotated.expect("rotated raster");
    assert!(rotated.width() > 640 && rotated.height() > 480);
}

#[test]
fn test_rotated_page_measures_horizontal() {
    let options = DeskewOptions::default();
    let deskewer = HoughDeskewer::new(options.clone()).unwrap();

    let first = deskewer.deskew(&ruled_page(3.0)).unwrap();
    let rotated = first.rotated.expect("rotated raster");

    let second = deskewer.deskew(&rotated).unwrap();
    let residual = second.estimate.decision.angle();
    assert!(
        residual.abs() <= options.threshold_angle,
        "residual skew {}",
        residual
    );
    assert!(!second.estimate.decision.is_rotate());
    assert!(second.rotated.is_none());
}

#[test]
fn test_opposite_skew_has_opposite_sign() {
    let deskewer = HoughDeskewer::new(DeskewOptions::default()).unwrap();
    let output = deskewer.deskew(&ruled_page(-3.0)).unwrap();

    let angle = output.estimate.decision.angle();
    assert!(output.estimate.decision.is_rotate());
    assert!((angle + 3.0).abs() <= 1.0, "expected about -3°, got {}", angle);
}

#[test]
fn test_batch_on_filesystem() {
    let input = TempDir::new().unwrap();
    let output = input.path().join("out");
    let store = FsImageStore;
    store
        .write(&input.path().join("page-1.png"), &ruled_page(3.0))
        .unwrap();
    store
        .write(&input.path().join("page-2.png"), &ruled_page(0.0))
        .unwrap();

    let config = PipelineConfig::new(input.path(), &output).with_annotate(true);
    let report = DeskewPipeline::new(config).unwrap().run().unwrap();

    assert_eq!(report.total(), 2);
    assert_eq!(report.rotated_count(), 1);
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(report.failed_count(), 0);

    let rotated_path = output.join("page-1-rotated.png");
    assert!(matches!(
        &report.documents[0].outcome,
        DocumentOutcome::Rotated { output, .. } if output == &rotated_path
    ));

    // The written file keeps the source's pixel format
    let written = store.read(&rotated_path).unwrap();
    assert!(matches!(written, DynamicImage::ImageLuma8(_)));

    assert!(output.join("page-1-lines.png").exists());
    assert!(output.join("page-2-lines.png").exists());
    assert!(!output.join("page-2-rotated.png").exists());
}
