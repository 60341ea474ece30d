use std::io::Cursor;

use ab_glyph::{FontArc, PxScale};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::models::{BoundingRect, DetectedObject};

// ── Style ────────────────────────────────────────────────────────────────────

const CYAN: Rgb<u8> = Rgb([0, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const STROKE_WIDTH: u32 = 3;
/// 16pt at 96 dpi.
const LABEL_SCALE: f32 = 16.0 * 96.0 / 72.0;
/// Longest distance a label can extend from its anchor.
const LABEL_REACH: i64 = 1 << 20;

static BUNDLED_FONT_DATA: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

static BUNDLED_FONT: Lazy<FontArc> =
    Lazy::new(|| FontArc::try_from_slice(BUNDLED_FONT_DATA).expect("bundled DejaVu Sans is a valid font"));

#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("failed to encode image: {0}")]
    Encode(String),
}

/// DejaVu Sans, compiled into the binary so labels never depend on the host.
pub fn bundled_font() -> FontArc {
    BUNDLED_FONT.clone()
}

#[derive(Clone)]
pub struct OverlayStyle {
    pub stroke: Rgb<u8>,
    pub stroke_width: u32,
    pub label_color: Rgb<u8>,
    pub label_scale: PxScale,
    pub font: FontArc,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self::with_font(bundled_font())
    }
}

impl OverlayStyle {
    pub fn with_font(font: FontArc) -> Self {
        Self {
            stroke: CYAN,
            stroke_width: STROKE_WIDTH,
            label_color: BLACK,
            label_scale: PxScale::from(LABEL_SCALE),
            font,
        }
    }
}

// ── Drawing plan ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Rectangle(BoundingRect),
    Label { text: String, x: i32, y: i32 },
}

/// One rectangle then one label per object, in list order.
pub fn plan_overlay(objects: &[DetectedObject]) -> Vec<Annotation> {
    objects
        .iter()
        .flat_map(|obj| {
            let r = obj.rectangle;
            [
                Annotation::Rectangle(r),
                Annotation::Label {
                    text: obj.label.clone(),
                    x: r.x,
                    y: r.y,
                },
            ]
        })
        .collect()
}

// ── Rasterization ────────────────────────────────────────────────────────────

/// Draw every object onto `canvas`. Shapes outside the canvas are clipped.
pub fn annotate(canvas: &mut RgbImage, objects: &[DetectedObject], style: &OverlayStyle) {
    for annotation in plan_overlay(objects) {
        match annotation {
            Annotation::Rectangle(r) => draw_stroke(canvas, r, style),
            Annotation::Label { text, x, y } => draw_label(canvas, &text, x, y, style),
        }
    }
}

/// The stroke is centered on the rectangle edge, like a pen of that width.
/// Edges are computed in i64 and pulled to at most one pixel outside the
/// canvas, so wire values near the i32 limits cannot overflow.
fn draw_stroke(canvas: &mut RgbImage, r: BoundingRect, style: &OverlayStyle) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    let width = style.stroke_width.max(1) as i64;
    let inner = -((width - 1) / 2);
    for offset in inner..inner + width {
        let left = r.x as i64 - offset;
        let top = r.y as i64 - offset;
        let right = r.x as i64 + r.w as i64 - 1 + offset;
        let bottom = r.y as i64 + r.h as i64 - 1 + offset;
        if right < left || bottom < top {
            continue;
        }
        let (left, right) = (left.clamp(-1, cw), right.clamp(-1, cw));
        let (top, bottom) = (top.clamp(-1, ch), bottom.clamp(-1, ch));
        let rect = Rect::at(left as i32, top as i32)
            .of_size((right - left + 1) as u32, (bottom - top + 1) as u32);
        draw_hollow_rect_mut(canvas, rect, style.stroke);
    }
}

/// Text runs right and down from the anchor, so anchors past the right or
/// bottom edge are invisible. Anchors far to the left or top are skipped too,
/// before imageproc adds glyph offsets to them in i32.
fn draw_label(canvas: &mut RgbImage, text: &str, x: i32, y: i32, style: &OverlayStyle) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    let (ax, ay) = (x as i64, y as i64);
    if ax >= cw || ay >= ch || ax < -LABEL_REACH || ay < -LABEL_REACH {
        return;
    }
    draw_text_mut(canvas, style.label_color, x, y, style.label_scale, &style.font, text);
}

/// Decode `source`, draw the objects and encode the result as JPEG.
pub fn render_overlay(
    source: &[u8],
    objects: &[DetectedObject],
    style: &OverlayStyle,
) -> Result<Vec<u8>, OverlayError> {
    let decoded = image::load_from_memory(source).map_err(|e| OverlayError::Decode(e.to_string()))?;
    let mut canvas = decoded.to_rgb8();
    debug!(
        "annotating {}x{} image with {} objects",
        canvas.width(),
        canvas.height(),
        objects.len()
    );

    annotate(&mut canvas, objects, style);

    let mut encoded = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(canvas)
        .write_to(&mut encoded, ImageFormat::Jpeg)
        .map_err(|e| OverlayError::Encode(e.to_string()))?;
    Ok(encoded.into_inner())
}
