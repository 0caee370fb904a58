use std::path::PathBuf;

use ndarray::{s, ArrayViewMut3, Axis};

use crate::analytics::domain::overlay_state::{OverlayLabel, OverlayState};
use crate::export::domain::capture_writer::CaptureWriter;
use crate::shared::bounding_box::{BoundingBox, PixelRect};
use crate::shared::error::PipelineError;
use crate::shared::frame::VideoFrame;

const BOX_COLOR: [u8; 3] = [0, 0, 255];
const BOX_LINE_WIDTH: u32 = 2;
const PLATE_COLOR: [u8; 3] = [0, 0, 0];
const PLATE_ALPHA: f32 = 0.6;
const PLATE_PADDING: f64 = 5.0;
const LINE_HEIGHT: f64 = 14.0;
/// Approximate advance of one glyph at the label font size.
const GLYPH_WIDTH: f64 = 7.0;

/// Flattens the live frame and the overlay into one exported image.
pub struct CaptureCompositor {
    export_dir: PathBuf,
    prefix: String,
    writer: Box<dyn CaptureWriter>,
}

impl CaptureCompositor {
    pub fn new(export_dir: impl Into<PathBuf>, prefix: impl Into<String>, writer: Box<dyn CaptureWriter>) -> Self {
        Self {
            export_dir: export_dir.into(),
            prefix: prefix.into(),
            writer,
        }
    }

    pub fn file_name(&self, unix_millis: i64) -> String {
        format!("{}_{unix_millis}.png", self.prefix)
    }

    /// Composes and writes a capture. Returns the written path.
    pub fn capture(&self, frame: &VideoFrame, overlay: &OverlayState) -> Result<PathBuf, PipelineError> {
        if frame.is_empty() || overlay.is_empty() {
            return Err(PipelineError::NothingToCapture);
        }
        let composed = compose(frame, overlay);
        let path = self
            .export_dir
            .join(self.file_name(chrono::Utc::now().timestamp_millis()));
        self.writer
            .write(&path, &composed)
            .map_err(|e| PipelineError::Export {
                path: path.clone(),
                cause: e.to_string(),
            })?;
        log::info!("Capture saved to {}", path.display());
        Ok(path)
    }
}

/// Draws the overlay onto a copy of `frame` at its native resolution: box
/// outlines first, then a translucent label plate under each box.
pub fn compose(frame: &VideoFrame, overlay: &OverlayState) -> VideoFrame {
    let mut out = frame.clone();
    let (w, h) = (out.width(), out.height());
    let labels = overlay.labels();
    let mut view = out.as_ndarray_mut();

    for label in &labels {
        if let Some(rect) = label.bounding_box.to_pixel_rect(w, h) {
            draw_outline(&mut view, rect, BOX_COLOR, BOX_LINE_WIDTH);
        }
    }
    for label in &labels {
        if let Some(rect) = plate_rect(label).to_pixel_rect(w, h) {
            blend_rect(&mut view, rect, PLATE_COLOR, PLATE_ALPHA);
        }
    }
    drop(view);
    out
}

/// Plate holding all of a label's lines, hanging from the box's
/// bottom-left corner.
fn plate_rect(label: &OverlayLabel) -> BoundingBox {
    let longest = label.lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    if longest == 0 {
        return BoundingBox::new(0.0, 0.0, 0.0, 0.0);
    }
    let (x, y) = label.anchor();
    BoundingBox::new(
        x,
        y,
        longest as f64 * GLYPH_WIDTH + 2.0 * PLATE_PADDING,
        label.lines.len() as f64 * LINE_HEIGHT + 2.0 * PLATE_PADDING,
    )
}

fn draw_outline(view: &mut ArrayViewMut3<'_, u8>, (x, y, w, h): PixelRect, rgb: [u8; 3], line: u32) {
    let tx = line.min(w);
    let ty = line.min(h);
    fill_rect(view, (x, y, w, ty), rgb);
    fill_rect(view, (x, y + h - ty, w, ty), rgb);
    fill_rect(view, (x, y, tx, h), rgb);
    fill_rect(view, (x + w - tx, y, tx, h), rgb);
}

fn fill_rect(view: &mut ArrayViewMut3<'_, u8>, rect: PixelRect, rgb: [u8; 3]) {
    let mut region = region_mut(view, rect);
    for mut px in region.lanes_mut(Axis(2)) {
        for (c, v) in px.iter_mut().zip(rgb) {
            *c = v;
        }
    }
}

fn blend_rect(view: &mut ArrayViewMut3<'_, u8>, rect: PixelRect, rgb: [u8; 3], alpha: f32) {
    let mut region = region_mut(view, rect);
    for mut px in region.lanes_mut(Axis(2)) {
        for (c, v) in px.iter_mut().zip(rgb) {
            *c = (*c as f32 * (1.0 - alpha) + v as f32 * alpha).round() as u8;
        }
    }
}

fn region_mut<'a>(view: &'a mut ArrayViewMut3<'_, u8>, (x, y, w, h): PixelRect) -> ArrayViewMut3<'a, u8> {
    let (x, y, w, h) = (x as usize, y as usize, w as usize, h as usize);
    view.slice_mut(s![y..y + h, x..x + w, ..])
}
