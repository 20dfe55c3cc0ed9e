use std::path::PathBuf;

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use imageproc::point::Point;
use tracing::debug;

use crate::detection::Candidate;
use crate::error::{LocateError, Result};
use crate::geometry::ImageGeometry;

pub const OPENED_FILE: &str = "opened.jpg";
pub const CONTOURS_FILE: &str = "contours.jpg";

const ACCEPTED_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const CHOSEN_COLOR: Rgb<u8> = Rgb([255, 255, 0]);

/// Receives the diagnostic images produced during a run
pub trait AnnotationSink {
    /// When false the annotated image is not rendered at all
    fn enabled(&self) -> bool {
        true
    }

    fn opened_mask(&mut self, mask: &GrayImage) -> Result<()>;

    fn contours(&mut self, annotated: &RgbImage) -> Result<()>;
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl AnnotationSink for NoopSink {
    fn enabled(&self) -> bool {
        false
    }

    fn opened_mask(&mut self, _mask: &GrayImage) -> Result<()> {
        Ok(())
    }

    fn contours(&mut self, _annotated: &RgbImage) -> Result<()> {
        Ok(())
    }
}

/// Keeps the last images in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub opened: Option<GrayImage>,
    pub annotated: Option<RgbImage>,
}

impl AnnotationSink for MemorySink {
    fn opened_mask(&mut self, mask: &GrayImage) -> Result<()> {
        self.opened = Some(mask.clone());
        Ok(())
    }

    fn contours(&mut self, annotated: &RgbImage) -> Result<()> {
        self.annotated = Some(annotated.clone());
        Ok(())
    }
}

/// Writes `opened.jpg` and `contours.jpg` into a directory
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn opened_path(&self) -> PathBuf {
        self.dir.join(OPENED_FILE)
    }

    pub fn contours_path(&self) -> PathBuf {
        self.dir.join(CONTOURS_FILE)
    }
}

fn finish_write(path: PathBuf, result: image::ImageResult<()>) -> Result<()> {
    result.map_err(|source| LocateError::AnnotationWrite {
        path: path.clone(),
        source,
    })?;
    debug!("Wrote {:?}", path);
    Ok(())
}

impl AnnotationSink for FileSink {
    fn opened_mask(&mut self, mask: &GrayImage) -> Result<()> {
        let path = self.opened_path();
        let result = mask.save(&path);
        finish_write(path, result)
    }

    fn contours(&mut self, annotated: &RgbImage) -> Result<()> {
        let path = self.contours_path();
        let result = annotated.save(&path);
        finish_write(path, result)
    }
}

/// Draw a closed polyline with the given stroke thickness
fn draw_contour(img: &mut RgbImage, contour: &[Point<i32>], thickness: i32, color: Rgb<u8>) {
    if contour.is_empty() {
        return;
    }

    let r = thickness / 2;
    for (i, p) in contour.iter().enumerate() {
        let q = contour[(i + 1) % contour.len()];
        for dy in -r..=r {
            for dx in -r..=r {
                draw_line_segment_mut(
                    img,
                    ((p.x + dx) as f32, (p.y + dy) as f32),
                    ((q.x + dx) as f32, (q.y + dy) as f32),
                    color,
                );
            }
        }
    }
}

/// Overlay accepted contours, every running-best center, the origin and
/// the chosen contour on a copy of the input.
///
/// Markers only: no "Hole Center" / "Origin" captions are drawn, since
/// text rendering would need a bundled font.
pub fn render_annotations(
    image: &RgbImage,
    geometry: &ImageGeometry,
    candidates: &[Candidate],
    improvements: &[usize],
    chosen: Option<usize>,
) -> RgbImage {
    let mut canvas = image.clone();

    for (i, candidate) in candidates.iter().enumerate() {
        draw_contour(&mut canvas, &candidate.contour, geometry.stroke(5.0), ACCEPTED_COLOR);
        if improvements.contains(&i) {
            let c = candidate.centroid;
            draw_filled_circle_mut(
                &mut canvas,
                (c.x as i32, c.y as i32),
                geometry.stroke(10.0),
                ACCEPTED_COLOR,
            );
        }
    }

    let (ox, oy) = geometry.origin;
    draw_filled_circle_mut(
        &mut canvas,
        (ox as i32, oy as i32),
        geometry.stroke(20.0),
        CHOSEN_COLOR,
    );

    if let Some(best) = chosen.and_then(|i| candidates.get(i)) {
        draw_contour(&mut canvas, &best.contour, geometry.stroke(10.0), CHOSEN_COLOR);
    }

    canvas
}
