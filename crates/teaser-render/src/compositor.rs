//! CPU compositor: draws one [`VisualState`] onto a frame.
//!
//! Layer order, bottom to top: background gradient, top overlay, image card,
//! title, description. Every layer above the background is multiplied by the
//! global end-fade opacity.

use std::sync::Arc;

use teaser_core::{Color, FrameBuffer, PixelFormat, TeaserError, TeaserResult};
use teaser_timeline::{InputProps, TextState, VisualState};

use crate::bundle::{background_stops, overlay_stops, Bundle};
use crate::image_loader::{cover_fit, scale_by};
use crate::text::{TextAlign, TextBlock, TextRenderer};

const PADDING: f64 = 48.0;
const CARD_WIDTH_RATIO: f64 = 0.85;
const CARD_MAX_WIDTH: f64 = 720.0;
const CARD_ASPECT: f64 = 16.0 / 10.0;
const CARD_RADIUS: f64 = 24.0;
const CARD_MARGIN_BOTTOM: f64 = 48.0;
const TITLE_LINE_HEIGHT: f32 = 1.2;
const DESCRIPTION_MAX_WIDTH: f64 = 800.0;
const DESCRIPTION_LINE_HEIGHT: f32 = 1.4;
const DESCRIPTION_MARGIN_TOP: f64 = 24.0;
const PLACEHOLDER_FONT_SIZE: f32 = 24.0;

fn title_color() -> Color {
    Color::from_rgba8(248, 250, 252, 1.0)
}

fn description_color() -> Color {
    Color::from_rgba8(203, 213, 225, 0.95)
}

fn card_fill() -> Color {
    Color::from_rgba8(30, 41, 59, 0.8)
}

fn placeholder_color() -> Color {
    Color::from_rgba8(148, 163, 184, 0.6)
}

/// Size of the image card on a canvas `width` pixels wide: 85% of the padded
/// width, at most 720 px, 16:10.
pub fn card_size(width: u32) -> (u32, u32) {
    let w = ((width as f64 - 2.0 * PADDING) * CARD_WIDTH_RATIO)
        .min(CARD_MAX_WIDTH)
        .max(2.0);
    let h = (w / CARD_ASPECT).max(1.0);
    (w.round() as u32, h.round() as u32)
}

/// Anti-aliased coverage of pixel (x, y) inside a rounded rectangle.
fn rounded_rect_coverage(x: u32, y: u32, w: u32, h: u32, radius: f64) -> f64 {
    let px = x as f64 + 0.5;
    let py = y as f64 + 0.5;
    let r = radius.min(w as f64 / 2.0).min(h as f64 / 2.0);
    let cx = px.clamp(r, w as f64 - r);
    let cy = py.clamp(r, h as f64 - r);
    let dist = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
    (r - dist + 0.5).clamp(0.0, 1.0)
}

/// Rasterize the image card once per job: rounded fill with either the
/// cover-fitted hero image or a "No image" placeholder.
pub fn build_card(
    text: &TextRenderer,
    width: u32,
    height: u32,
    image: Option<&FrameBuffer>,
) -> TeaserResult<FrameBuffer> {
    let mut card = FrameBuffer::solid(width, height, &card_fill());

    match image {
        Some(img) => {
            let fitted = cover_fit(img, width, height)?;
            card.composite_over(&fitted, 0, 0);
        }
        None => {
            let label = text.render_text("No image", PLACEHOLDER_FONT_SIZE, &placeholder_color());
            let x = (width as i32 - label.width as i32) / 2;
            let y = (height as i32 - label.height as i32) / 2;
            card.composite_over(&label, x, y);
        }
    }

    for y in 0..height {
        for x in 0..width {
            let coverage = rounded_rect_coverage(x, y, width, height, CARD_RADIUS);
            if coverage >= 1.0 {
                continue;
            }
            let offset = ((y * width + x) * 4 + 3) as usize;
            card.data[offset] = (card.data[offset] as f64 * coverage).round() as u8;
        }
    }

    Ok(card)
}

/// Draws frames for one job: one composition size, one set of props.
pub struct Compositor {
    bundle: Arc<Bundle>,
    width: u32,
    height: u32,
    background: FrameBuffer,
    overlay: FrameBuffer,
    card: FrameBuffer,
    title: String,
    description: String,
}

impl Compositor {
    /// `image` is the decoded hero image, `None` for the placeholder.
    pub fn new(
        bundle: Arc<Bundle>,
        width: u32,
        height: u32,
        props: &InputProps,
        image: Option<&FrameBuffer>,
    ) -> TeaserResult<Self> {
        let (card_w, card_h) = card_size(width);
        let card = build_card(&bundle.text, card_w, card_h, image)?;
        // Static layers come from the bundle when it was compiled for this size.
        let sized = (bundle.background.width, bundle.background.height) == (width, height);
        let (background, overlay) = if sized {
            (bundle.background.clone(), bundle.overlay.clone())
        } else {
            (
                FrameBuffer::vertical_gradient(width, height, &background_stops()),
                FrameBuffer::vertical_gradient(width, height, &overlay_stops()),
            )
        };
        Ok(Self {
            width,
            height,
            background,
            overlay,
            card,
            title: props.title.clone(),
            description: props.display_description().to_string(),
            bundle,
        })
    }

    pub fn card(&self) -> &FrameBuffer {
        &self.card
    }

    fn draw_text(
        &self,
        canvas: &mut FrameBuffer,
        block: &TextBlock,
        state: &TextState,
        color: &Color,
        (x, y): (f64, f64),
        global_opacity: f64,
    ) {
        let opacity = state.opacity * global_opacity;
        if opacity <= 0.0 {
            return;
        }
        let visible = state.revealed.chars().count();
        let drawn = self.bundle.text.draw(block, visible, color, state.caret_visible);
        canvas.composite_over_with_opacity(
            &drawn,
            (x + state.offset_x).round() as i32,
            (y + state.offset_y).round() as i32,
            opacity,
        );
    }

    /// Render the frame described by `state`.
    pub fn compose(&self, state: &VisualState) -> TeaserResult<FrameBuffer> {
        let w = self.width as f64;
        let h = self.height as f64;
        let g = state.global_opacity;

        let mut canvas = self.background.clone();
        if g <= 0.0 {
            return Ok(canvas);
        }

        canvas.composite_over_with_opacity(&self.overlay, 0, 0, g);

        let text = &self.bundle.text;
        let title_block = text.layout(
            &self.title,
            state.title.font_size as f32,
            (w - 2.0 * PADDING) as f32,
            TITLE_LINE_HEIGHT,
            TextAlign::Center,
        );
        let description_block = text.layout(
            &self.description,
            state.description.font_size as f32,
            DESCRIPTION_MAX_WIDTH.min(w - 2.0 * PADDING) as f32,
            DESCRIPTION_LINE_HEIGHT,
            TextAlign::Center,
        );

        // Vertical column centered on the canvas; the card's share of the
        // column follows its layout slot.
        let card_w = self.card.width as f64;
        let card_h = self.card.height as f64;
        let slot = state.image.slot.clamp(0.0, 1.0);
        let card_space = (card_h + CARD_MARGIN_BOTTOM) * slot;
        let column = card_space
            + title_block.height as f64
            + DESCRIPTION_MARGIN_TOP
            + description_block.height as f64;
        let top = (h - column) / 2.0;

        let image_opacity = state.image.opacity * g;
        if slot > 0.0 && image_opacity > 0.0 {
            let scale = state.image.scale.max(0.0);
            let center_x = w / 2.0 + state.image.offset_x;
            let center_y = top + card_h / 2.0 + state.image.offset_y;
            if (scale - 1.0).abs() < 1e-9 {
                canvas.composite_over_with_opacity(
                    &self.card,
                    (center_x - card_w / 2.0).round() as i32,
                    (center_y - card_h / 2.0).round() as i32,
                    image_opacity,
                );
            } else if scale > 0.0 {
                let scaled = scale_by(&self.card, scale)?;
                canvas.composite_over_with_opacity(
                    &scaled,
                    (center_x - scaled.width as f64 / 2.0).round() as i32,
                    (center_y - scaled.height as f64 / 2.0).round() as i32,
                    image_opacity,
                );
            }
        }

        let title_y = top + card_space;
        let title_x = (w - title_block.width as f64) / 2.0;
        self.draw_text(&mut canvas, &title_block, &state.title, &title_color(), (title_x, title_y), g);

        let description_y = title_y + title_block.height as f64 + DESCRIPTION_MARGIN_TOP;
        let description_x = (w - description_block.width as f64) / 2.0;
        self.draw_text(
            &mut canvas,
            &description_block,
            &state.description,
            &description_color(),
            (description_x, description_y),
            g,
        );

        Ok(canvas)
    }
}

/// Encode a frame as PNG bytes, for single-frame previews.
pub fn encode_png(frame: &FrameBuffer) -> TeaserResult<Vec<u8>> {
    debug_assert_eq!(frame.format, PixelFormat::Rgba8);
    let img = image::RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or_else(|| TeaserError::Render("frame buffer size mismatch".into()))?;
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| TeaserError::Render(format!("failed to encode png: {}", e)))?;
    Ok(out.into_inner())
}
