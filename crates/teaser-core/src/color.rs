use serde::{Deserialize, Serialize};

/// Straight-alpha RGBA, each channel in `0.0..=1.0`.
///
/// Palette entries are written the way a stylesheet would spell them:
/// `Color::from_rgba8(15, 23, 42, 0.7)` is CSS `rgba(15, 23, 42, 0.7)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// 8-bit color channels with a fractional alpha.
    pub fn from_rgba8(r: u8, g: u8, b: u8, alpha: f32) -> Self {
        let unit = |c: u8| c as f32 / 255.0;
        Self::rgba(unit(r), unit(g), unit(b), alpha.clamp(0.0, 1.0))
    }

    /// Quantize to the `[r, g, b, a]` bytes stored in a frame buffer.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [byte(self.r), byte(self.g), byte(self.b), byte(self.a)]
    }

    /// Channel-wise mix; `t` is clamped to `0..=1`.
    pub fn lerp(&self, other: &Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |from: f32, to: f32| from + (to - from) * t;
        Color::rgba(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::TRANSPARENT
    }
}
