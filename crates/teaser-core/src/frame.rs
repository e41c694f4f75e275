use serde::{Deserialize, Serialize};

use crate::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Four bytes per pixel, straight (non-premultiplied) alpha. This is the
    /// layout FFmpeg receives as `-pix_fmt rgba`.
    Rgba8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// CPU raster for one rendered frame or one pre-rendered layer.
///
/// Rows are stored top to bottom with no padding, so `data.len()` is always
/// `width * height * 4`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

/// Source-over for one pixel. `factor` (0..=255) scales the source alpha and
/// carries both layer opacity and glyph/shape coverage.
#[inline]
fn blend_over(dst: &mut [u8], src: [u8; 4], factor: u32) {
    let src_a = (src[3] as u32 * factor + 127) / 255;
    match src_a {
        0 => {}
        255 => {
            dst[..3].copy_from_slice(&src[..3]);
            dst[3] = 255;
        }
        _ => {
            let dst_a = dst[3] as u32;
            let keep = 255 - src_a;
            let out_a = src_a + dst_a * keep / 255;
            if out_a == 0 {
                return;
            }
            for (d, s) in dst[..3].iter_mut().zip(&src[..3]) {
                let mixed = *s as u32 * src_a * 255 + *d as u32 * dst_a * keep;
                *d = (mixed / (out_a * 255)) as u8;
            }
            dst[3] = out_a as u8;
        }
    }
}

/// Color at `pos` along stops sorted by position. Positions outside the
/// stops take the nearest end color.
fn sample_gradient(stops: &[(f32, Color)], pos: f32) -> Color {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return Color::TRANSPARENT;
    };
    if pos <= first.0 {
        return first.1;
    }
    stops
        .windows(2)
        .find(|pair| pos <= pair[1].0)
        .map(|pair| {
            let ((p0, c0), (p1, c1)) = (pair[0], pair[1]);
            c0.lerp(&c1, (pos - p0) / (p1 - p0).max(f32::EPSILON))
        })
        .unwrap_or(last.1)
}

impl FrameBuffer {
    /// Fully transparent buffer.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            data: vec![0; width as usize * height as usize * format.bytes_per_pixel()],
            width,
            height,
            format,
        }
    }

    pub fn solid(width: u32, height: u32, color: &Color) -> Self {
        Self {
            data: color.to_rgba8().repeat(width as usize * height as usize),
            width,
            height,
            format: PixelFormat::Rgba8,
        }
    }

    /// Top-to-bottom gradient; `stops` are `(position in 0..=1, color)`.
    pub fn vertical_gradient(width: u32, height: u32, stops: &[(f32, Color)]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        let last_row = height.saturating_sub(1).max(1) as f32;
        for y in 0..height {
            let pixel = sample_gradient(stops, y as f32 / last_row).to_rgba8();
            data.extend(pixel.repeat(width as usize));
        }
        Self {
            data,
            width,
            height,
            format: PixelFormat::Rgba8,
        }
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| (y as usize * self.width as usize + x as usize) * 4)
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let i = self.offset(x, y)?;
        let mut px = [0; 4];
        px.copy_from_slice(&self.data[i..i + 4]);
        Some(px)
    }

    /// Overwrite one pixel; out-of-bounds writes are dropped.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if let Some(i) = self.offset(x, y) {
            self.data[i..i + 4].copy_from_slice(&rgba);
        }
    }

    /// Blend `rgba` over one pixel with `coverage` (0..=255). Signed
    /// coordinates so rasterizers can draw partly off-canvas.
    pub fn blend_pixel(&mut self, x: i32, y: i32, rgba: [u8; 4], coverage: u8) {
        if x < 0 || y < 0 {
            return;
        }
        if let Some(i) = self.offset(x as u32, y as u32) {
            blend_over(&mut self.data[i..i + 4], rgba, coverage as u32);
        }
    }

    pub fn composite_over(&mut self, src: &FrameBuffer, dx: i32, dy: i32) {
        self.composite_over_with_opacity(src, dx, dy, 1.0);
    }

    /// Draw `src` with its top-left corner at (`dx`, `dy`) and its alpha
    /// scaled by `opacity`. The parts falling outside `self` are clipped.
    pub fn composite_over_with_opacity(&mut self, src: &FrameBuffer, dx: i32, dy: i32, opacity: f64) {
        let factor = (opacity.clamp(0.0, 1.0) * 255.0).round() as u32;
        if factor == 0 {
            return;
        }

        // Visible source rectangle, in source coordinates.
        let x0 = (-dx).max(0);
        let y0 = (-dy).max(0);
        let x1 = (src.width as i32).min(self.width as i32 - dx);
        let y1 = (src.height as i32).min(self.height as i32 - dy);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let row_len = (x1 - x0) as usize * 4;
        for sy in y0..y1 {
            let s = (sy as usize * src.width as usize + x0 as usize) * 4;
            let d = ((sy + dy) as usize * self.width as usize + (x0 + dx) as usize) * 4;
            let src_row = &src.data[s..s + row_len];
            let dst_row = &mut self.data[d..d + row_len];
            for (sp, dp) in src_row.chunks_exact(4).zip(dst_row.chunks_exact_mut(4)) {
                blend_over(dp, [sp[0], sp[1], sp[2], sp[3]], factor);
            }
        }
    }
}
