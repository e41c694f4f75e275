//! Text rendering module.
//! Uses fontdue for CPU-based font rasterization.
//!
//! Text is laid out once on its full content and then drawn with only a
//! prefix of its characters visible, so streamed text never reflows.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fontdue::{Font, FontSettings};
use teaser_core::{Color, FrameBuffer, PixelFormat, TeaserError, TeaserResult};

/// Fonts tried, in order, when no font path is configured.
pub const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Load a TTF/OTF font from disk.
pub fn load_font(path: &Path) -> TeaserResult<(Font, Vec<u8>)> {
    let data = std::fs::read(path).map_err(|e| {
        TeaserError::asset(format!("failed to read font file: {}", e), path.display().to_string())
    })?;
    let font = Font::from_bytes(data.as_slice(), FontSettings::default()).map_err(|e| {
        TeaserError::asset(format!("failed to parse font: {}", e), path.display().to_string())
    })?;
    Ok((font, data))
}

/// Resolve the font to render with: `explicit` if given, otherwise the first
/// entry of [`SYSTEM_FONT_PATHS`] that exists.
pub fn discover_font(explicit: Option<&Path>) -> TeaserResult<(PathBuf, Font, Vec<u8>)> {
    if let Some(path) = explicit {
        let (font, data) = load_font(path)?;
        return Ok((path.to_path_buf(), font, data));
    }
    for candidate in SYSTEM_FONT_PATHS {
        let path = Path::new(candidate);
        if !path.is_file() {
            continue;
        }
        match load_font(path) {
            Ok((font, data)) => return Ok((path.to_path_buf(), font, data)),
            Err(e) => tracing::warn!("skipping font {}: {}", path.display(), e),
        }
    }
    Err(TeaserError::Compile(
        "no usable font found; set render.font_path or TEASER_FONT".into(),
    ))
}

/// Text horizontal alignment options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
}

/// Text laid out into lines at a fixed size.
///
/// Concatenating `lines` gives back the original text exactly, so a character
/// count into the original text maps straight onto the laid-out lines.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub font_size: f32,
    /// Height of one line box in pixels.
    pub line_height: f32,
    pub width: u32,
    pub height: u32,
    pub align: TextAlign,
    line_widths: Vec<f32>,
    ascent: f32,
    descent: f32,
}

impl TextBlock {
    pub fn char_count(&self) -> usize {
        self.lines.iter().map(|l| l.chars().count()).sum()
    }
}

/// Rasterizes text blocks into a `FrameBuffer`.
#[derive(Clone)]
pub struct TextRenderer {
    font: Arc<Font>,
}

impl TextRenderer {
    pub fn new(font: Font) -> Self {
        Self {
            font: Arc::new(font),
        }
    }

    pub fn font(&self) -> &Font {
        &self.font
    }

    fn vertical_metrics(&self, font_size: f32) -> (f32, f32) {
        match self.font.horizontal_line_metrics(font_size) {
            Some(m) => (m.ascent, m.descent),
            None => (font_size * 0.8, -font_size * 0.2),
        }
    }

    /// Advance width of `text` on one line. Control characters take no space.
    pub fn line_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .filter(|c| !c.is_control())
            .map(|c| self.font.metrics(c, font_size).advance_width)
            .sum()
    }

    /// Break `text` into lines no wider than `max_width`, at spaces and newlines.
    ///
    /// Spaces stay at the end of the line they follow. A single word wider
    /// than `max_width` gets a line of its own.
    pub fn wrap(&self, text: &str, font_size: f32, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.split_inclusive('\n') {
            let mut line = String::new();
            for token in paragraph.split_inclusive(' ') {
                if !line.is_empty() {
                    let candidate = format!("{}{}", line, token);
                    if self.line_width(candidate.trim_end(), font_size) > max_width {
                        lines.push(std::mem::take(&mut line));
                    }
                }
                line.push_str(token);
            }
            lines.push(line);
        }
        if lines.is_empty() {
            lines.push(String::new());
        }
        lines
    }

    /// Lay `text` out at `font_size`, wrapping at `max_width`.
    pub fn layout(
        &self,
        text: &str,
        font_size: f32,
        max_width: f32,
        line_height_factor: f32,
        align: TextAlign,
    ) -> TextBlock {
        let lines = self.wrap(text, font_size, max_width);
        let line_widths: Vec<f32> = lines
            .iter()
            .map(|l| self.line_width(l.trim_end(), font_size))
            .collect();
        let max_line = line_widths.iter().copied().fold(0.0, f32::max);
        let line_height = font_size * line_height_factor;
        let (ascent, descent) = self.vertical_metrics(font_size);
        TextBlock {
            width: max_line.ceil().max(1.0) as u32,
            height: (line_height * lines.len() as f32).ceil().max(1.0) as u32,
            lines,
            font_size,
            line_height,
            align,
            line_widths,
            ascent,
            descent,
        }
    }

    /// Draw the first `visible_chars` characters of `block`.
    ///
    /// The buffer always has the size of the full block. With `caret` set, a
    /// bar is drawn right after the last visible character.
    pub fn draw(&self, block: &TextBlock, visible_chars: usize, color: &Color, caret: bool) -> FrameBuffer {
        let mut fb = FrameBuffer::new(block.width, block.height, PixelFormat::Rgba8);
        let rgba = color.to_rgba8();
        let mut remaining = visible_chars;
        let mut caret_at: Option<(f32, f32)> = None;
        let half_leading = (block.line_height - (block.ascent - block.descent)) / 2.0;

        for (i, line) in block.lines.iter().enumerate() {
            let line_top = i as f32 * block.line_height;
            let baseline = line_top + half_leading + block.ascent;
            let x_start = match block.align {
                TextAlign::Left => 0.0,
                TextAlign::Center => (block.width as f32 - block.line_widths[i]) / 2.0,
            };
            let mut cursor_x = x_start;
            if caret_at.is_none() || remaining > 0 {
                caret_at = Some((cursor_x, line_top + half_leading));
            }

            for ch in line.chars() {
                if remaining == 0 {
                    break;
                }
                remaining -= 1;
                if ch.is_control() {
                    continue;
                }
                let (metrics, bitmap) = self.font.rasterize(ch, block.font_size);
                let glyph_x = (cursor_x + metrics.xmin as f32).round() as i32;
                let glyph_y = (baseline - (metrics.height as i32 + metrics.ymin) as f32).round() as i32;

                for gy in 0..metrics.height {
                    for gx in 0..metrics.width {
                        let coverage = bitmap[gy * metrics.width + gx];
                        if coverage == 0 {
                            continue;
                        }
                        fb.blend_pixel(glyph_x + gx as i32, glyph_y + gy as i32, rgba, coverage);
                    }
                }

                cursor_x += metrics.advance_width;
                caret_at = Some((cursor_x, line_top + half_leading));
            }

            if remaining == 0 {
                break;
            }
        }

        if caret {
            if let Some((x, top)) = caret_at {
                let bar_width = (block.font_size * 0.08).max(2.0).round() as i32;
                let bar_height = (block.ascent - block.descent).round() as i32;
                let x0 = (x + block.font_size * 0.05).round() as i32;
                let y0 = top.round() as i32;
                for y in y0..y0 + bar_height {
                    for x in x0..x0 + bar_width {
                        fb.blend_pixel(x, y, rgba, 255);
                    }
                }
            }
        }

        fb
    }

    /// Lay out and draw `text` in one step, fully visible.
    pub fn render_text(&self, text: &str, font_size: f32, color: &Color) -> FrameBuffer {
        let block = self.layout(text, font_size, f32::INFINITY, 1.2, TextAlign::Left);
        self.draw(&block, block.char_count(), color, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> Option<TextRenderer> {
        match discover_font(None) {
            Ok((_, font, _)) => Some(TextRenderer::new(font)),
            Err(_) => {
                eprintln!("no system font available, skipping");
                None
            }
        }
    }

    fn has_ink(fb: &FrameBuffer) -> bool {
        fb.data.chunks_exact(4).any(|p| p[3] > 0)
    }

    #[test]
    fn test_missing_font_file() {
        let err = load_font(Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(matches!(err, TeaserError::Asset { .. }));
        assert!(discover_font(Some(Path::new("/nonexistent/font.ttf"))).is_err());
    }

    #[test]
    fn test_render_single_line() {
        let Some(renderer) = renderer() else { return };
        let fb = renderer.render_text("Hello", 24.0, &Color::WHITE);
        assert!(fb.width > 0 && fb.height > 0);
        assert!(has_ink(&fb), "rendered text should have visible pixels");
    }

    #[test]
    fn test_wrap_preserves_text() {
        let Some(renderer) = renderer() else { return };
        let text = "Build better products faster with a toolkit made for small teams\nand big ideas.";
        let lines = renderer.wrap(text, 28.0, 300.0);
        assert!(lines.len() > 2);
        assert_eq!(lines.concat(), text);
        for line in &lines {
            let w = renderer.line_width(line.trim_end(), 28.0);
            let single_word = !line.trim_end().contains(' ');
            assert!(w <= 300.0 || single_word, "line '{}' is {}px wide", line, w);
        }
    }

    #[test]
    fn test_wrap_empty_text() {
        let Some(renderer) = renderer() else { return };
        assert_eq!(renderer.wrap("", 28.0, 800.0), vec![String::new()]);
        let block = renderer.layout("", 28.0, 800.0, 1.4, TextAlign::Center);
        assert_eq!(block.char_count(), 0);
        assert!(block.width >= 1 && block.height >= 1);
    }

    #[test]
    fn test_prefix_draw_keeps_block_size() {
        let Some(renderer) = renderer() else { return };
        let block = renderer.layout("Discover more.", 28.0, 800.0, 1.4, TextAlign::Center);
        let none = renderer.draw(&block, 0, &Color::WHITE, false);
        let some = renderer.draw(&block, 4, &Color::WHITE, false);
        let all = renderer.draw(&block, block.char_count(), &Color::WHITE, false);
        assert_eq!((none.width, none.height), (all.width, all.height));
        assert_eq!((some.width, some.height), (all.width, all.height));
        assert!(!has_ink(&none));
        assert!(has_ink(&some));
        assert_ne!(some, all);
    }

    #[test]
    fn test_caret_draws_even_with_no_text() {
        let Some(renderer) = renderer() else { return };
        let block = renderer.layout("Acme", 56.0, 1800.0, 1.2, TextAlign::Center);
        let fb = renderer.draw(&block, 0, &Color::WHITE, true);
        assert!(has_ink(&fb));
    }

    #[test]
    fn test_multi_line_is_taller() {
        let Some(renderer) = renderer() else { return };
        let single = renderer.layout("Hello", 24.0, 1000.0, 1.4, TextAlign::Center);
        let multi = renderer.layout("Hello\nWorld", 24.0, 1000.0, 1.4, TextAlign::Center);
        assert_eq!(multi.lines.len(), 2);
        assert!(multi.height > single.height);
    }

    #[test]
    fn test_text_color() {
        let Some(renderer) = renderer() else { return };
        let fb = renderer.render_text("X", 48.0, &Color::RED);
        let found_red = fb.data.chunks_exact(4).any(|p| p[3] > 0 && p[0] > 0 && p[2] == 0);
        assert!(found_red, "red text should have red-channel pixels");
    }
}
