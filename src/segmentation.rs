use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::open;
use tracing::debug;

use crate::config::LocatorConfig;

/// Intermediate images of the segmentation stage
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Thresholded mask after morphological opening
    pub opened: GrayImage,
    /// Blurred edge map ready for contour tracing
    pub edges: GrayImage,
}

/// Convert to grayscale with the 0.299/0.587/0.114 luma weights,
/// rounded to the nearest level
pub fn to_grayscale(img: &RgbImage) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut gray = GrayImage::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let luma = 0.299 * pixel[0] as f64 + 0.587 * pixel[1] as f64 + 0.114 * pixel[2] as f64;
        gray.put_pixel(x, y, Luma([luma.round().clamp(0.0, 255.0) as u8]));
    }

    gray
}

/// Inverse binary threshold: pixels darker than or equal to `level`
/// become `max_value`, everything else becomes 0
pub fn threshold_inverse(gray: &GrayImage, level: u8, max_value: u8) -> GrayImage {
    let mut out = gray.clone();
    for pixel in out.pixels_mut() {
        pixel[0] = if pixel[0] > level { 0 } else { max_value };
    }
    out
}

/// Morphological opening with a `kernel_size` square of ones.
/// The foreground keeps the value `foreground`.
pub fn open_mask(mask: &GrayImage, kernel_size: u32, foreground: u8) -> GrayImage {
    let radius = (kernel_size / 2).min(u8::MAX as u32) as u8;
    let mut opened = open(mask, Norm::LInf, radius);
    for pixel in opened.pixels_mut() {
        if pixel[0] > 0 {
            pixel[0] = foreground;
        }
    }
    opened
}

/// Gaussian sigma matching a square kernel of the given size when no
/// sigma is supplied explicitly
pub fn sigma_for_kernel(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Run grayscale, threshold, opening, blur, Canny and the final blur
pub fn segment(img: &RgbImage, config: &LocatorConfig) -> Segmentation {
    let gray = to_grayscale(img);

    let thresh = threshold_inverse(&gray, config.threshold_level, config.threshold_max_value);
    let opened = open_mask(&thresh, config.opening_kernel_size, config.threshold_max_value);
    debug!(
        "Opened mask with {}x{} kernel ({} foreground pixels)",
        config.opening_kernel_size,
        config.opening_kernel_size,
        opened.pixels().filter(|p| p[0] > 0).count()
    );

    let sigma = sigma_for_kernel(config.blur_kernel_size);
    let blurred = gaussian_blur_f32(&opened, sigma);
    let edged = canny(&blurred, config.canny_low, config.canny_high);
    let edges = gaussian_blur_f32(&edged, sigma);
    debug!(
        "Applied Canny edge detection ({:.1}, {:.1}) with blur sigma {:.2}",
        config.canny_low, config.canny_high, sigma
    );

    Segmentation { opened, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    #[test]
    fn test_grayscale_luma() {
        let img = RgbImage::from_pixel(1, 1, Rgb([100, 100, 100]));
        assert_eq!(to_grayscale(&img).get_pixel(0, 0)[0], 100);
        let img = RgbImage::from_pixel(1, 1, Rgb([255, 0, 0]));
        assert_eq!(to_grayscale(&img).get_pixel(0, 0)[0], 76);
    }

    #[test]
    fn test_grayscale_rounds_to_nearest() {
        // 100.886 must land above the default threshold level
        let img = RgbImage::from_pixel(1, 1, Rgb([101, 101, 100]));
        let gray = to_grayscale(&img);
        assert_eq!(gray.get_pixel(0, 0)[0], 101);
        assert_eq!(threshold_inverse(&gray, 100, 250).get_pixel(0, 0)[0], 0);

        // 0.587 rounds up, 0.299 rounds down
        let green = RgbImage::from_pixel(1, 1, Rgb([0, 1, 0]));
        assert_eq!(to_grayscale(&green).get_pixel(0, 0)[0], 1);
        let red = RgbImage::from_pixel(1, 1, Rgb([1, 0, 0]));
        assert_eq!(to_grayscale(&red).get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_threshold_inverse() {
        let mut gray = GrayImage::new(3, 1);
        gray.put_pixel(0, 0, Luma([20]));
        gray.put_pixel(1, 0, Luma([100]));
        gray.put_pixel(2, 0, Luma([101]));
        let out = threshold_inverse(&gray, 100, 250);
        assert_eq!(out.get_pixel(0, 0)[0], 250);
        assert_eq!(out.get_pixel(1, 0)[0], 250);
        assert_eq!(out.get_pixel(2, 0)[0], 0);
    }

    #[test]
    fn test_opening_removes_specks() {
        let mut mask = GrayImage::new(60, 60);
        // 3x3 speck is smaller than the 5x5 element
        draw_filled_rect_mut(&mut mask, Rect::at(5, 5).of_size(3, 3), Luma([250]));
        draw_filled_rect_mut(&mut mask, Rect::at(25, 25).of_size(20, 20), Luma([250]));

        let opened = open_mask(&mask, 5, 250);
        assert_eq!(opened.get_pixel(6, 6)[0], 0);
        assert_eq!(opened.get_pixel(35, 35)[0], 250);
        assert_eq!(opened.get_pixel(25, 25)[0], 250);
    }

    #[test]
    fn test_sigma_for_default_kernel() {
        assert!((sigma_for_kernel(5) - 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_segment_blank_image_has_no_edges() {
        let img = RgbImage::from_pixel(50, 40, Rgb([255, 255, 255]));
        let seg = segment(&img, &LocatorConfig::default());
        assert!(seg.opened.pixels().all(|p| p[0] == 0));
        assert!(seg.edges.pixels().all(|p| p[0] == 0));
    }
}
