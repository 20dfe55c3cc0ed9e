pub mod annotate;
pub mod cli;
pub mod config;
pub mod detection;
pub mod error;
pub mod geometry;
pub mod locator;
pub mod segmentation;

pub use annotate::{AnnotationSink, FileSink, MemorySink, NoopSink};
pub use cli::Cli;
pub use config::{Calibration, LocatorConfig};
pub use detection::{select_nearest, Candidate};
pub use error::{LocateError, Result};
pub use geometry::{HoleOffset, ImageGeometry};
pub use locator::{
    locate_hole, locate_hole_with_sink, pick_center, pick_center_with_sink, HoleDetection,
};
