//! Bounding-box rotation
//!
//! Rotates a raster about its center and grows the canvas so that no source
//! pixel is cropped. Pixel `(i, j)` sits at coordinate `(i, j)`; the center of
//! a `w x h` raster is `((w - 1) / 2, (h - 1) / 2)`.

use image::{DynamicImage, ImageBuffer, Luma, LumaA, Pixel, Rgb, Rgba};

use super::types::{DeskewError, Interpolation, Result};

/// Fully opaque alpha value
pub const ALPHA_OPAQUE: u8 = 255;

/// Lanczos window size (lobes)
const LANCZOS_A: f64 = 3.0;

/// Slack absorbed before rounding canvas sizes up, so that `cos(90°)` noise
/// does not add a pixel
const DIMENSION_EPSILON: f64 = 1e-6;

/// Canvas size that holds a `width x height` raster rotated by `angle_degrees`.
///
/// `new_w = h·|sin| + w·|cos|`, `new_h = h·|cos| + w·|sin|`, rounded up.
pub fn bounding_dimensions(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    let (sin, cos) = angle_degrees.to_radians().sin_cos();
    let (w, h) = (width as f64, height as f64);
    let new_w = h * sin.abs() + w * cos.abs();
    let new_h = h * cos.abs() + w * sin.abs();
    (round_up(new_w), round_up(new_h))
}

fn round_up(value: f64) -> u32 {
    (value - DIMENSION_EPSILON).ceil().max(1.0) as u32
}

/// Rotate an 8-bit image buffer clockwise by `angle_degrees` without cropping.
///
/// Areas of the new canvas not covered by the source are set to `fill`.
pub fn rotate_buffer<P>(
    img: &ImageBuffer<P, Vec<u8>>,
    angle_degrees: f64,
    interpolation: Interpolation,
    fill: P,
) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = img.dimensions();
    let (new_width, new_height) = bounding_dimensions(width, height, angle_degrees);
    let (sin_a, cos_a) = angle_degrees.to_radians().sin_cos();

    let cx = (width as f64 - 1.0) / 2.0;
    let cy = (height as f64 - 1.0) / 2.0;
    let ncx = (new_width as f64 - 1.0) / 2.0;
    let ncy = (new_height as f64 - 1.0) / 2.0;

    let (min_x, max_x) = (-0.5, width as f64 - 0.5);
    let (min_y, max_y) = (-0.5, height as f64 - 0.5);

    let mut rotated = ImageBuffer::from_pixel(new_width, new_height, fill);
    for (nx, ny, pixel) in rotated.enumerate_pixels_mut() {
        // Inverse of the clockwise rotation, back into source coordinates
        let dx = nx as f64 - ncx;
        let dy = ny as f64 - ncy;
        let ox = dx * cos_a + dy * sin_a + cx;
        let oy = -dx * sin_a + dy * cos_a + cy;

        if ox < min_x || ox > max_x || oy < min_y || oy > max_y {
            continue;
        }
        *pixel = match interpolation {
            Interpolation::Nearest => nearest_neighbor(img, ox, oy),
            Interpolation::Bilinear => bilinear(img, ox, oy),
            Interpolation::Lanczos3 => lanczos(img, ox, oy),
        };
    }

    rotated
}

/// Rotate a decoded image clockwise by `angle_degrees`, growing the canvas.
///
/// 8-bit gray, gray+alpha, RGB and RGBA images keep their color type; other
/// layouts are converted to RGBA8 first.
///
/// # Errors
/// `InvalidImage` for a zero-sized raster.
pub fn rotate_bound(
    img: &DynamicImage,
    angle_degrees: f64,
    interpolation: Interpolation,
    background: [u8; 3],
) -> Result<DynamicImage> {
    if img.width() == 0 || img.height() == 0 {
        return Err(DeskewError::InvalidImage(format!(
            "cannot rotate a {}x{} raster",
            img.width(),
            img.height()
        )));
    }

    let [r, g, b] = background;
    let luma = background_luma(background);

    let rotated = match img {
        DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(rotate_buffer(
            buf,
            angle_degrees,
            interpolation,
            Luma([luma]),
        )),
        DynamicImage::ImageLumaA8(buf) => DynamicImage::ImageLumaA8(rotate_buffer(
            buf,
            angle_degrees,
            interpolation,
            LumaA([luma, ALPHA_OPAQUE]),
        )),
        DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(rotate_buffer(
            buf,
            angle_degrees,
            interpolation,
            Rgb([r, g, b]),
        )),
        DynamicImage::ImageRgba8(buf) => DynamicImage::ImageRgba8(rotate_buffer(
            buf,
            angle_degrees,
            interpolation,
            Rgba([r, g, b, ALPHA_OPAQUE]),
        )),
        other => DynamicImage::ImageRgba8(rotate_buffer(
            &other.to_rgba8(),
            angle_degrees,
            interpolation,
            Rgba([r, g, b, ALPHA_OPAQUE]),
        )),
    };

    Ok(rotated)
}

fn background_luma([r, g, b]: [u8; 3]) -> u8 {
    (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64)
        .round()
        .clamp(0.0, 255.0) as u8
}

fn clamp_index(value: i64, len: u32) -> u32 {
    value.clamp(0, len as i64 - 1) as u32
}

fn pixel_from_channels<P>(values: &[f64; 4]) -> P
where
    P: Pixel<Subpixel = u8>,
{
    let mut channels = [0u8; 4];
    for (out, v) in channels.iter_mut().zip(values.iter()) {
        *out = v.round().clamp(0.0, 255.0) as u8;
    }
    *P::from_slice(&channels[..P::CHANNEL_COUNT as usize])
}

/// Nearest neighbor interpolation
fn nearest_neighbor<P>(img: &ImageBuffer<P, Vec<u8>>, x: f64, y: f64) -> P
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = img.dimensions();
    *img.get_pixel(
        clamp_index(x.round() as i64, width),
        clamp_index(y.round() as i64, height),
    )
}

/// Bilinear interpolation with edge replication
fn bilinear<P>(img: &ImageBuffer<P, Vec<u8>>, x: f64, y: f64) -> P
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = img.dimensions();
    let xf = x.floor();
    let yf = y.floor();
    let dx = x - xf;
    let dy = y - yf;

    let x0 = clamp_index(xf as i64, width);
    let x1 = clamp_index(xf as i64 + 1, width);
    let y0 = clamp_index(yf as i64, height);
    let y1 = clamp_index(yf as i64 + 1, height);

    let p00 = img.get_pixel(x0, y0).channels();
    let p10 = img.get_pixel(x1, y0).channels();
    let p01 = img.get_pixel(x0, y1).channels();
    let p11 = img.get_pixel(x1, y1).channels();

    let mut result = [0.0f64; 4];
    for (c, value) in result.iter_mut().enumerate().take(P::CHANNEL_COUNT as usize) {
        *value = p00[c] as f64 * (1.0 - dx) * (1.0 - dy)
            + p10[c] as f64 * dx * (1.0 - dy)
            + p01[c] as f64 * (1.0 - dx) * dy
            + p11[c] as f64 * dx * dy;
    }

    pixel_from_channels(&result)
}

/// Lanczos interpolation kernel
fn lanczos_kernel(x: f64, a: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else if x.abs() < a {
        let pi_x = std::f64::consts::PI * x;
        let pi_x_a = pi_x / a;
        (pi_x.sin() / pi_x) * (pi_x_a.sin() / pi_x_a)
    } else {
        0.0
    }
}

/// Lanczos-3 interpolation. Taps outside the raster are dropped and the
/// remaining weights renormalized.
fn lanczos<P>(img: &ImageBuffer<P, Vec<u8>>, x: f64, y: f64) -> P
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = img.dimensions();
    let channels = P::CHANNEL_COUNT as usize;
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    let mut result = [0.0f64; 4];
    let mut weight_sum = 0.0f64;

    for j in (y0 - 2)..=(y0 + 3) {
        if j < 0 || j >= height as i64 {
            continue;
        }
        let wy = lanczos_kernel(y - j as f64, LANCZOS_A);
        if wy == 0.0 {
            continue;
        }
        for i in (x0 - 2)..=(x0 + 3) {
            if i < 0 || i >= width as i64 {
                continue;
            }
            let weight = lanczos_kernel(x - i as f64, LANCZOS_A) * wy;
            let pixel = img.get_pixel(i as u32, j as u32).channels();
            for c in 0..channels {
                result[c] += pixel[c] as f64 * weight;
            }
            weight_sum += weight;
        }
    }

    if weight_sum.abs() > f64::EPSILON {
        for value in result.iter_mut().take(channels) {
            *value /= weight_sum;
        }
        pixel_from_channels(&result)
    } else {
        bilinear(img, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, RgbImage};

    fn smooth_value(x: f64, y: f64) -> f64 {
        128.0 + 60.0 * (x / 9.0).sin() * (y / 7.0).cos()
    }

    fn smooth_image(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            Luma([smooth_value(x as f64, y as f64).round() as u8])
        })
    }

    #[test]
    fn test_bounding_dimensions() {
        assert_eq!(bounding_dimensions(100, 50, 0.0), (100, 50));
        assert_eq!(bounding_dimensions(100, 50, 90.0), (50, 100));
        assert_eq!(bounding_dimensions(100, 50, -90.0), (50, 100));
        assert_eq!(bounding_dimensions(100, 50, 180.0), (100, 50));

        // 120x90 by 7°: 119.1 + 10.97 and 14.6 + 89.3
        assert_eq!(bounding_dimensions(120, 90, 7.0), (131, 104));
        assert_eq!(bounding_dimensions(120, 90, -7.0), (131, 104));
    }

    #[test]
    fn test_zero_angle_is_identity() {
        let img = smooth_image(40, 30);
        for interpolation in [
            Interpolation::Nearest,
            Interpolation::Bilinear,
            Interpolation::Lanczos3,
        ] {
            let rotated = rotate_buffer(&img, 0.0, interpolation, Luma([0]));
            assert_eq!(rotated, img, "{:?} changed the image", interpolation);
        }
    }

    #[test]
    fn test_positive_angle_is_clockwise() {
        let mut img = RgbImage::from_pixel(101, 101, Rgb([255, 255, 255]));
        // Mark right of center
        img.put_pixel(90, 50, Rgb([0, 0, 0]));

        let rotated = rotate_buffer(&img, 90.0, Interpolation::Nearest, Rgb([255, 255, 255]));
        assert_eq!(rotated.dimensions(), (101, 101));
        // Clockwise on screen: right moves to bottom
        assert_eq!(rotated.get_pixel(50, 90), &Rgb([0, 0, 0]));
        assert_eq!(rotated.get_pixel(90, 50), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_rotation_keeps_all_content() {
        let img = GrayImage::from_pixel(60, 40, Luma([0]));
        let rotated = rotate_buffer(&img, 30.0, Interpolation::Bilinear, Luma([255]));

        let (w, h) = rotated.dimensions();
        assert!(w > 60 && h > 40);
        let dark = rotated.pixels().filter(|p| p.0[0] < 128).count() as f64;
        let area = 60.0 * 40.0;
        assert!(
            (dark - area).abs() / area < 0.05,
            "dark area {} should match source area {}",
            dark,
            area
        );
        // Corners of the new canvas are background
        assert_eq!(rotated.get_pixel(0, 0).0[0], 255);
        assert_eq!(rotated.get_pixel(w - 1, h - 1).0[0], 255);
    }

    #[test]
    fn test_round_trip_restores_content() {
        let (w, h) = (120u32, 90u32);
        let img = smooth_image(w, h);

        let forward = rotate_buffer(&img, 7.0, Interpolation::Lanczos3, Luma([0]));
        let back = rotate_buffer(&forward, -7.0, Interpolation::Lanczos3, Luma([0]));

        let (bw, bh) = back.dimensions();
        let off_x = (bw as f64 - 1.0) / 2.0 - (w as f64 - 1.0) / 2.0;
        let off_y = (bh as f64 - 1.0) / 2.0 - (h as f64 - 1.0) / 2.0;

        let margin = 8;
        let mut max_err = 0.0f64;
        for y in margin..(h - margin) {
            for x in margin..(w - margin) {
                let bx = (x as f64 + off_x).round() as u32;
                let by = (y as f64 + off_y).round() as u32;
                let expected = smooth_value(bx as f64 - off_x, by as f64 - off_y);
                let actual = back.get_pixel(bx, by).0[0] as f64;
                max_err = max_err.max((actual - expected).abs());
            }
        }
        assert!(max_err < 8.0, "round trip error too large: {}", max_err);
    }

    #[test]
    fn test_rotate_bound_keeps_color_type() {
        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 10, Rgb([10, 20, 30])));
        let rotated = rotate_bound(&rgb, 15.0, Interpolation::Lanczos3, [255, 255, 255]).unwrap();
        assert!(matches!(rotated, DynamicImage::ImageRgb8(_)));
        assert_eq!(
            (rotated.width(), rotated.height()),
            bounding_dimensions(20, 10, 15.0)
        );

        let gray = DynamicImage::ImageLuma8(GrayImage::new(20, 10));
        let rotated = rotate_bound(&gray, 15.0, Interpolation::Bilinear, [0, 0, 0]).unwrap();
        assert!(matches!(rotated, DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn test_rotate_bound_fills_with_background() {
        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 50, Rgb([0, 0, 0])));
        let rotated = rotate_bound(&rgb, 45.0, Interpolation::Nearest, [10, 200, 30]).unwrap();
        let corner = rotated.to_rgb8().get_pixel(0, 0).0;
        assert_eq!(corner, [10, 200, 30]);
    }

    #[test]
    fn test_rotate_bound_rejects_empty_image() {
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        let result = rotate_bound(&empty, 5.0, Interpolation::Lanczos3, [255, 255, 255]);
        assert!(matches!(result, Err(DeskewError::InvalidImage(_))));
    }

    #[test]
    fn test_lanczos_kernel_center() {
        assert!((lanczos_kernel(0.0, 3.0) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_lanczos_kernel_outside() {
        let kernel = lanczos_kernel(5.0, 3.0);
        assert!(
            kernel.abs() < 0.001,
            "Kernel outside range should be 0.0, got {}",
            kernel
        );
    }

    #[test]
    fn test_background_luma() {
        assert_eq!(background_luma([255, 255, 255]), 255);
        assert_eq!(background_luma([0, 0, 0]), 0);
    }
}
