use std::path::Path;

use image::{DynamicImage, ImageError, ImageReader};
use tracing::{debug, info};

use crate::annotate::{render_annotations, AnnotationSink, NoopSink};
use crate::config::LocatorConfig;
use crate::detection::{find_candidates, running_best, Candidate};
use crate::error::{LocateError, Result};
use crate::geometry::{to_millimeters, HoleOffset, ImageGeometry};
use crate::segmentation::segment;

/// Everything one run of the locator found
#[derive(Debug, Clone)]
pub struct HoleDetection {
    pub geometry: ImageGeometry,
    /// Accepted candidates, largest area first
    pub candidates: Vec<Candidate>,
    /// Candidates that improved the running nearest distance, in order
    pub improvements: Vec<usize>,
    /// Index of the chosen candidate
    pub chosen: usize,
    pub offset: HoleOffset,
}

impl HoleDetection {
    pub fn winner(&self) -> &Candidate {
        &self.candidates[self.chosen]
    }
}

/// Decode the image at `path`
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    let load_error = |source| LocateError::ImageLoad {
        path: path.to_path_buf(),
        source,
    };

    ImageReader::open(path)
        .map_err(|e| load_error(ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| load_error(ImageError::IoError(e)))?
        .decode()
        .map_err(load_error)
}

/// Millimeter offset of the most centered hole in the image at `path`
pub fn pick_center(path: impl AsRef<Path>, config: &LocatorConfig) -> Result<HoleOffset> {
    pick_center_with_sink(path, config, &mut NoopSink)
}

/// Like [`pick_center`], handing the diagnostic images to `sink`
pub fn pick_center_with_sink(
    path: impl AsRef<Path>,
    config: &LocatorConfig,
    sink: &mut dyn AnnotationSink,
) -> Result<HoleOffset> {
    let path = path.as_ref();
    let img = load_image(path)?;
    debug!("Loaded image: {:?} ({}x{})", path, img.width(), img.height());

    locate_hole_with_sink(&img, config, sink).map(|d| d.offset)
}

/// Run the pipeline on an already decoded image without side effects
pub fn locate_hole(img: &DynamicImage, config: &LocatorConfig) -> Result<HoleDetection> {
    locate_hole_with_sink(img, config, &mut NoopSink)
}

/// Run the pipeline on an already decoded image.
///
/// The sink receives the opened mask and, when enabled, the annotated
/// image. Both are delivered before `NoHoleFound` is reported.
pub fn locate_hole_with_sink(
    img: &DynamicImage,
    config: &LocatorConfig,
    sink: &mut dyn AnnotationSink,
) -> Result<HoleDetection> {
    config.validate()?;

    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return Err(LocateError::EmptyImage);
    }

    let geometry = ImageGeometry::new(width, height, config.max_pix);
    debug!(
        "Origin: ({}, {}), display scale {:.3}",
        geometry.origin.0, geometry.origin.1, geometry.display_scale
    );

    // Alpha is dropped, as for any photo decoded without transparency
    let rgb = img.to_rgb8();
    let segmentation = segment(&rgb, config);
    sink.opened_mask(&segmentation.opened)?;

    let candidates = find_candidates(&segmentation.edges, &geometry, config);
    let improvements = running_best(&candidates, geometry.corner_distance());
    let chosen = improvements.last().copied();

    if sink.enabled() {
        let annotated = render_annotations(
            &rgb,
            &geometry,
            &candidates,
            &improvements,
            chosen,
        );
        sink.contours(&annotated)?;
    }

    let chosen = chosen.ok_or(LocateError::NoHoleFound)?;
    let winner = &candidates[chosen];
    let offset = to_millimeters(winner.centroid, &geometry, &config.calibration);

    info!(
        "Hole center at ({:.1}, {:.1}) px, area {:.0} px², offset ({:.4}, {:.4}) mm",
        winner.centroid.x, winner.centroid.y, winner.area, offset.rel_x, offset.rel_y
    );

    Ok(HoleDetection {
        geometry,
        candidates,
        improvements,
        chosen,
        offset,
    })
}
