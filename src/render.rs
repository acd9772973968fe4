//! Draws the three haiku lines as vertical columns on the mug image.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use rusttype::{Font, Scale, point};
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::constants::{
    CANVAS_HEIGHT, CANVAS_WIDTH, COLUMN_HEIGHT, COLUMN_OFFSETS, COLUMN_SCALES, COLUMN_WIDTH,
    FIRST_BASELINE, FONT_SIZE_PX, ROW_STEP,
};
use crate::error::HaikuError;

const TEXT_COLOR: [u8; 3] = [255, 255, 255];

/// Something that can rasterize single characters.
pub trait GlyphFace: Send + Sync {
    /// Horizontal advance of `ch` at `px` pixels.
    fn advance(&self, ch: char, px: f32) -> f32;

    /// Rasterizes `ch` with its origin at (`x`, `baseline`), calling `plot` with
    /// each covered pixel and its coverage in `0.0..=1.0`.
    fn rasterize(
        &self,
        ch: char,
        px: f32,
        x: f32,
        baseline: f32,
        plot: &mut dyn FnMut(i32, i32, f32),
    );
}

/// A serif typeface loaded from a TrueType/OpenType file.
pub struct SerifFont {
    font: Font<'static>,
}

impl SerifFont {
    /// Parses font data.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, HaikuError> {
        Font::try_from_vec(bytes)
            .map(|font| Self { font })
            .ok_or_else(|| HaikuError::Configuration("Font data couldn't be parsed".to_string()))
    }

    /// Reads and parses a font file.
    pub fn from_path(path: &Path) -> Result<Self, HaikuError> {
        let bytes = std::fs::read(path).map_err(|err| {
            HaikuError::Configuration(format!("Failed to read font {}: {err}", path.display()))
        })?;
        Self::from_bytes(bytes)
    }
}

impl GlyphFace for SerifFont {
    fn advance(&self, ch: char, px: f32) -> f32 {
        self.font
            .glyph(ch)
            .scaled(Scale::uniform(px))
            .h_metrics()
            .advance_width
    }

    fn rasterize(
        &self,
        ch: char,
        px: f32,
        x: f32,
        baseline: f32,
        plot: &mut dyn FnMut(i32, i32, f32),
    ) {
        let glyph = self
            .font
            .glyph(ch)
            .scaled(Scale::uniform(px))
            .positioned(point(x, baseline));
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| plot(gx as i32 + bb.min.x, gy as i32 + bb.min.y, v));
        }
    }
}

// -----------------------------
// Background readiness
// -----------------------------

/// Load progress of the background image.
#[derive(Clone, Debug)]
pub enum BackgroundState {
    /// Still decoding
    Loading,
    /// Decoded and ready to draw
    Ready(Arc<RgbaImage>),
    /// Decoding failed, with the reason
    Failed(String),
}

/// Handle to a background image that may still be loading.
#[derive(Clone, Debug)]
pub struct Background {
    state: watch::Receiver<BackgroundState>,
}

impl Background {
    /// A handle still loading, plus the sender used to signal completion.
    pub fn pending() -> (watch::Sender<BackgroundState>, Self) {
        let (tx, state) = watch::channel(BackgroundState::Loading);
        (tx, Self { state })
    }

    /// A handle that's ready straight away.
    pub fn ready_image(image: RgbaImage) -> Self {
        let (_tx, state) = watch::channel(BackgroundState::Ready(Arc::new(image)));
        Self { state }
    }

    /// Starts decoding `path` on the blocking pool; the handle turns ready when it's done.
    pub fn load(path: PathBuf) -> Self {
        let (tx, background) = Self::pending();
        tokio::task::spawn_blocking(move || {
            let state = match decode_background(&path) {
                Ok(image) => {
                    info!(
                        "Loaded background {} ({}x{})",
                        path.display(),
                        image.width(),
                        image.height()
                    );
                    BackgroundState::Ready(Arc::new(image))
                }
                Err(err) => {
                    error!("Failed to load background {}: {}", path.display(), err);
                    BackgroundState::Failed(err.to_string())
                }
            };
            tx.send_replace(state);
        });
        background
    }

    /// True once the image has been decoded.
    pub fn is_ready(&self) -> bool {
        matches!(*self.state.borrow(), BackgroundState::Ready(_))
    }

    /// Waits for the load to finish and returns the image.
    pub async fn ready(&self) -> Result<Arc<RgbaImage>, HaikuError> {
        let mut state = self.state.clone();
        loop {
            {
                let current = state.borrow_and_update();
                match &*current {
                    BackgroundState::Ready(image) => return Ok(image.clone()),
                    BackgroundState::Failed(message) => {
                        return Err(HaikuError::InternalServerError(format!(
                            "Background image unavailable: {message}"
                        )));
                    }
                    BackgroundState::Loading => {}
                }
            }
            debug!("Waiting for the background image");
            if state.changed().await.is_err() {
                return Err(HaikuError::InternalServerError(
                    "Background loader stopped before finishing".to_string(),
                ));
            }
        }
    }
}

/// Decodes an image file of any supported format into RGBA.
pub fn decode_background(path: &Path) -> Result<RgbaImage, HaikuError> {
    let reader = image::ImageReader::open(path)
        .map_err(|err| HaikuError::NotFound(format!("{}: {err}", path.display())))?
        .with_guessed_format()?;
    Ok(reader.decode()?.to_rgba8())
}

// -----------------------------
// Layout
// -----------------------------

/// Where one column buffer lands on the surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnPlacement {
    /// Horizontal center of the column
    pub anchor_x: f32,
    /// Left edge after scaling
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Drawn width after scaling
    pub width: f32,
    /// Drawn height
    pub height: f32,
    /// Horizontal scale factor
    pub scale: f32,
}

/// Fixed column layout for a surface of `width` by `height`.
pub fn column_placements(width: u32, height: u32) -> [ColumnPlacement; 3] {
    let center = width as f32 / 2.0;
    let y = height as f32 / 3.0;
    std::array::from_fn(|idx| {
        let scale = COLUMN_SCALES[idx];
        let anchor_x = center + COLUMN_OFFSETS[idx];
        let drawn = COLUMN_WIDTH as f32 * scale;
        ColumnPlacement {
            anchor_x,
            x: anchor_x - drawn / 2.0,
            y,
            width: drawn,
            height: COLUMN_HEIGHT as f32,
            scale,
        }
    })
}

// -----------------------------
// Drawing
// -----------------------------

/// The three lines and the background for a single draw.
#[derive(Clone, Copy, Debug)]
pub struct RenderRequest<'a> {
    /// Lines drawn right of center, first line leftmost
    pub lines: &'a [String; 3],
    /// Decoded background
    pub background: &'a RgbaImage,
}

/// Draws haiku columns onto mug images.
#[derive(Clone)]
pub struct MugRenderer {
    face: Arc<dyn GlyphFace>,
}

impl MugRenderer {
    /// Renderer drawing with `face`.
    pub fn new(face: impl GlyphFace + 'static) -> Self {
        Self {
            face: Arc::new(face),
        }
    }

    /// Clears `surface`, paints the background and composites the three columns.
    ///
    /// Lines longer than a column clip silently.
    pub fn render(&self, surface: &mut RgbaImage, request: &RenderRequest<'_>) {
        let (width, height) = surface.dimensions();
        surface
            .pixels_mut()
            .for_each(|pixel| *pixel = Rgba([0, 0, 0, 0]));
        if width == 0 || height == 0 {
            return;
        }
        if request.background.width() > 0 && request.background.height() > 0 {
            let background =
                imageops::resize(request.background, width, height, FilterType::Triangle);
            composite(surface, &background, 0, 0);
        }

        for (line, placement) in request.lines.iter().zip(column_placements(width, height)) {
            let column = self.draw_column(line);
            let scaled = scale_column(column, &placement);
            composite(
                surface,
                &scaled,
                placement.x.round() as i64,
                placement.y.round() as i64,
            );
        }
    }

    /// Renders one line top to bottom into a fresh column buffer.
    pub fn draw_column(&self, line: &str) -> RgbaImage {
        let mut column = RgbaImage::new(COLUMN_WIDTH, COLUMN_HEIGHT);
        let center = COLUMN_WIDTH as f32 / 2.0;
        for (row, ch) in line.chars().enumerate() {
            let baseline = FIRST_BASELINE + row as f32 * ROW_STEP;
            let x = center - self.face.advance(ch, FONT_SIZE_PX) / 2.0;
            self.face.rasterize(
                ch,
                FONT_SIZE_PX,
                x,
                baseline,
                &mut |px: i32, py: i32, coverage: f32| {
                    blend_at(&mut column, i64::from(px), i64::from(py), text_pixel(coverage));
                },
            );
        }
        column
    }

    /// Waits for `background`, then renders onto `surface`.
    pub async fn render_when_ready(
        &self,
        surface: &mut RgbaImage,
        background: &Background,
        lines: &[String; 3],
    ) -> Result<(), HaikuError> {
        let image = background.ready().await?;
        self.render(
            surface,
            &RenderRequest {
                lines,
                background: &image,
            },
        );
        Ok(())
    }

    /// Renders a standard-size mug and encodes it as PNG.
    pub fn render_png(
        &self,
        lines: &[String; 3],
        background: &RgbaImage,
    ) -> Result<Vec<u8>, HaikuError> {
        let mut surface = RgbaImage::new(CANVAS_WIDTH, CANVAS_HEIGHT);
        self.render(&mut surface, &RenderRequest { lines, background });
        encode_png(&surface)
    }
}

/// Encodes an RGBA image as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, HaikuError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

fn text_pixel(coverage: f32) -> Rgba<u8> {
    let alpha = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([TEXT_COLOR[0], TEXT_COLOR[1], TEXT_COLOR[2], alpha])
}

fn scale_column(column: RgbaImage, placement: &ColumnPlacement) -> RgbaImage {
    let width = placement.width.round().max(1.0) as u32;
    if width == column.width() {
        return column;
    }
    imageops::resize(&column, width, column.height(), FilterType::Triangle)
}

/// Source-over blend of `layer` onto `base` with its top-left corner at (`x`, `y`).
fn composite(base: &mut RgbaImage, layer: &RgbaImage, x: i64, y: i64) {
    for (lx, ly, pixel) in layer.enumerate_pixels() {
        blend_at(base, x + i64::from(lx), y + i64::from(ly), *pixel);
    }
}

fn blend_at(base: &mut RgbaImage, x: i64, y: i64, src: Rgba<u8>) {
    let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
        return;
    };
    if x >= base.width() || y >= base.height() {
        return;
    }
    blend(base.get_pixel_mut(x, y), src);
}

fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let sa = f32::from(src.0[3]) / 255.0;
    if sa <= 0.0 {
        return;
    }
    if src.0[3] == u8::MAX {
        *dst = src;
        return;
    }
    let da = f32::from(dst.0[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for channel in 0..3 {
        let value = (f32::from(src.0[channel]) * sa
            + f32::from(dst.0[channel]) * da * (1.0 - sa))
            / out_a;
        dst.0[channel] = value.round() as u8;
    }
    dst.0[3] = (out_a * 255.0).round() as u8;
}
