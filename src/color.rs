use serde::{Deserialize, Serialize};

/// Dye cell value. Channels are nominally in `[0, 1]`; splats may push them
/// past that and the display layer decides how to map them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn transparent() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Converts an 8-bit brush color to dye intensity, dividing each channel by `gain`.
    pub fn from_rgb8(r: u8, g: u8, b: u8, gain: f32) -> Self {
        Self::new(r as f32 / gain, g as f32 / gain, b as f32 / gain, 0.0)
    }

    pub fn add(self, other: Self) -> Self {
        Self::new(
            self.r + other.r,
            self.g + other.g,
            self.b + other.b,
            self.a + other.a,
        )
    }

    pub fn sub(self, other: Self) -> Self {
        Self::new(
            self.r - other.r,
            self.g - other.g,
            self.b - other.b,
            self.a - other.a,
        )
    }

    pub fn scale(self, s: f32) -> Self {
        Self::new(self.r * s, self.g * s, self.b * s, self.a * s)
    }

    pub fn max_channel(self) -> f32 {
        self.r.abs().max(self.g.abs()).max(self.b.abs()).max(self.a.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgb8_divides_by_gain() {
        let c = Rgba::from_rgb8(255, 51, 0, 510.0);
        assert_eq!(c, Rgba::new(0.5, 0.1, 0.0, 0.0));
    }

    #[test]
    fn max_channel_uses_magnitude() {
        assert_eq!(Rgba::new(0.2, -0.7, 0.1, 0.0).max_channel(), 0.7);
    }
}
