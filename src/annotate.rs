//! Diagnostic line overlay
//!
//! Draws detected lines over a copy of the source page. The overlay is a
//! separate artifact: it never feeds into the rotated output.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

use crate::deskew::Line;

/// Default overlay color (green)
pub const LINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Overlay stroke width in pixels
pub const LINE_THICKNESS: u32 = 2;

/// Two points on `line`, `half_length` pixels either side of the foot of the
/// normal from the origin
pub fn line_endpoints(line: &Line, half_length: f64) -> ((f32, f32), (f32, f32)) {
    let (b, a) = line.theta.sin_cos();
    let x0 = a * line.rho;
    let y0 = b * line.rho;
    let start = (x0 - half_length * b, y0 + half_length * a);
    let end = (x0 + half_length * b, y0 - half_length * a);
    (
        (start.0 as f32, start.1 as f32),
        (end.0 as f32, end.1 as f32),
    )
}

/// Copy of `img` with every line drawn across the full canvas
pub fn draw_lines(img: &DynamicImage, lines: &[Line], color: Rgb<u8>) -> RgbImage {
    let mut canvas = img.to_rgb8();
    let (width, height) = canvas.dimensions();
    let half_length = (width as f64).hypot(height as f64);

    for line in lines {
        for offset in 0..LINE_THICKNESS {
            let shifted = Line::new(line.rho + offset as f64, line.theta);
            let (start, end) = line_endpoints(&shifted, half_length);
            draw_line_segment_mut(&mut canvas, start, end, color);
        }
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn white(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 255, 255])))
    }

    #[test]
    fn test_endpoints_lie_on_line() {
        let line = Line::new(37.0, 1.2);
        let ((x1, y1), (x2, y2)) = line_endpoints(&line, 500.0);
        for (x, y) in [(x1, y1), (x2, y2)] {
            let rho = x as f64 * line.theta.cos() + y as f64 * line.theta.sin();
            assert!((rho - line.rho).abs() < 1e-2);
        }
    }

    #[test]
    fn test_draw_horizontal_line() {
        let img = white(50, 40);
        let drawn = draw_lines(&img, &[Line::new(20.0, FRAC_PI_2)], LINE_COLOR);

        assert_eq!(drawn.dimensions(), (50, 40));
        assert_eq!(drawn.get_pixel(25, 20), &LINE_COLOR);
        assert_eq!(drawn.get_pixel(0, 20), &LINE_COLOR);
        assert_eq!(drawn.get_pixel(49, 21), &LINE_COLOR);
        assert_eq!(drawn.get_pixel(25, 5), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_source_is_untouched() {
        let img = white(30, 30);
        let _ = draw_lines(&img, &[Line::new(10.0, FRAC_PI_2)], LINE_COLOR);
        assert_eq!(img.to_rgb8().get_pixel(15, 10), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_no_lines_is_plain_copy() {
        let img = white(10, 10);
        assert_eq!(draw_lines(&img, &[], LINE_COLOR), img.to_rgb8());
    }
}
