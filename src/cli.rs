use clap::Parser;
use std::path::PathBuf;

use crate::config::{Calibration, LocatorConfig};

#[derive(Parser, Debug)]
#[command(name = "hole-center")]
#[command(version, about = "Locate the most centered hole in a photo and report its offset in mm")]
pub struct Cli {
    /// Path to the image to be scanned
    #[arg(short, long, required = true)]
    pub image: PathBuf,

    /// Physical width seen by the camera, in mm
    #[arg(long, default_value = "350", value_parser = parse_positive)]
    pub area_width: f64,

    /// Physical height seen by the camera, in mm
    #[arg(long, default_value = "240", value_parser = parse_positive)]
    pub area_height: f64,

    /// Do not write opened.jpg and contours.jpg
    #[arg(long)]
    pub no_annotate: bool,

    /// Show detection details
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    pub fn config(&self) -> LocatorConfig {
        LocatorConfig::default()
            .with_calibration(Calibration::new(self.area_width, self.area_height))
    }
}

fn parse_positive(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("Invalid number: {}", s))?;

    if !(value > 0.0) || !value.is_finite() {
        return Err(format!("Value must be positive, got {}", s));
    }

    Ok(value)
}
