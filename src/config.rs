use crate::error::{LocateError, Result};

/// Physical extent of the camera's field of view, in millimeters.
/// The default rig sees 350 x 240 mm from a height of 300 mm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub area_width_mm: f64,
    pub area_height_mm: f64,
}

impl Calibration {
    pub fn new(area_width_mm: f64, area_height_mm: f64) -> Self {
        Self {
            area_width_mm,
            area_height_mm,
        }
    }

    /// Millimeters per pixel along x and y for an image of the given size
    pub fn mm_per_pixel(&self, width: u32, height: u32) -> (f64, f64) {
        (
            self.area_width_mm / width as f64,
            self.area_height_mm / height as f64,
        )
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new(350.0, 240.0)
    }
}

/// Tunable parameters of the hole locating pipeline.
///
/// The thresholds are tuned for one lighting setup; a different rig
/// usually needs a new `threshold_level` and Canny pair.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatorConfig {
    pub calibration: Calibration,
    /// Smallest accepted contour area, as a fraction of the image area (exclusive)
    pub min_area_fraction: f64,
    /// Largest accepted contour area, as a fraction of the image area (exclusive)
    pub max_area_fraction: f64,
    /// Image width at which annotation strokes have their nominal size
    pub max_pix: u32,
    /// Pixels at or below this intensity become foreground
    pub threshold_level: u8,
    /// Foreground value written by the inverse threshold
    pub threshold_max_value: u8,
    /// Side of the square all-ones structuring element used for opening
    pub opening_kernel_size: u32,
    /// Side of the Gaussian kernel applied around edge detection
    pub blur_kernel_size: u32,
    pub canny_low: f32,
    pub canny_high: f32,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            calibration: Calibration::default(),
            min_area_fraction: 0.005,
            max_area_fraction: 0.1,
            max_pix: 2000,
            threshold_level: 100,
            threshold_max_value: 250,
            opening_kernel_size: 5,
            blur_kernel_size: 5,
            canny_low: 10.0,
            canny_high: 100.0,
        }
    }
}

impl LocatorConfig {
    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let cal = &self.calibration;
        if !(cal.area_width_mm > 0.0 && cal.area_height_mm > 0.0) {
            return Err(LocateError::InvalidConfig(format!(
                "calibration area must be positive, got {}x{} mm",
                cal.area_width_mm, cal.area_height_mm
            )));
        }

        if !(self.min_area_fraction >= 0.0
            && self.min_area_fraction < self.max_area_fraction
            && self.max_area_fraction <= 1.0)
        {
            return Err(LocateError::InvalidConfig(format!(
                "area fractions must satisfy 0 <= min < max <= 1, got {} and {}",
                self.min_area_fraction, self.max_area_fraction
            )));
        }

        if self.max_pix == 0 {
            return Err(LocateError::InvalidConfig("max_pix must be non-zero".to_string()));
        }

        for (name, size) in [
            ("opening_kernel_size", self.opening_kernel_size),
            ("blur_kernel_size", self.blur_kernel_size),
        ] {
            if size == 0 || size % 2 == 0 {
                return Err(LocateError::InvalidConfig(format!(
                    "{} must be odd and positive, got {}",
                    name, size
                )));
            }
        }

        if self.threshold_max_value == 0 {
            return Err(LocateError::InvalidConfig(
                "threshold_max_value must be non-zero".to_string(),
            ));
        }

        for (name, value) in [("canny_low", self.canny_low), ("canny_high", self.canny_high)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(LocateError::InvalidConfig(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.canny_low > self.canny_high {
            return Err(LocateError::InvalidConfig(format!(
                "canny_low ({}) exceeds canny_high ({})",
                self.canny_low, self.canny_high
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(LocatorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_mm_per_pixel() {
        let cal = Calibration::new(350.0, 240.0);
        let (sx, sy) = cal.mm_per_pixel(1000, 800);
        assert!((sx - 0.35).abs() < 1e-12);
        assert!((sy - 0.30).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = LocatorConfig::default().with_calibration(Calibration::new(0.0, 240.0));
        assert!(matches!(config.validate(), Err(LocateError::InvalidConfig(_))));

        let config = LocatorConfig {
            min_area_fraction: 0.2,
            max_area_fraction: 0.1,
            ..LocatorConfig::default()
        };
        assert!(config.validate().is_err());

        let config = LocatorConfig {
            opening_kernel_size: 4,
            ..LocatorConfig::default()
        };
        assert!(config.validate().is_err());

        let config = LocatorConfig {
            canny_low: 120.0,
            ..LocatorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_nan_and_negative_canny() {
        for (low, high) in [(f32::NAN, 100.0), (10.0, f32::NAN), (-5.0, 100.0), (-20.0, -10.0)] {
            let config = LocatorConfig {
                canny_low: low,
                canny_high: high,
                ..LocatorConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(LocateError::InvalidConfig(_))),
                "accepted canny {} / {}",
                low,
                high
            );
        }
    }

    #[test]
    fn test_rejects_zero_threshold_max_value() {
        let config = LocatorConfig {
            threshold_max_value: 0,
            ..LocatorConfig::default()
        };
        assert!(matches!(config.validate(), Err(LocateError::InvalidConfig(_))));
    }
}
