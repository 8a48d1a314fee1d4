use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    pub fn scale(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s)
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Rotates by -90 degrees, so `(x, y)` becomes `(y, -x)`.
    pub fn perp(self) -> Self {
        Self::new(self.y, -self.x)
    }

    pub fn clamp_components(self, limit: f32) -> Self {
        Self::new(self.x.clamp(-limit, limit), self.y.clamp(-limit, limit))
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perp_is_orthogonal() {
        let v = Vec2::new(3.0, -2.0);
        let p = v.perp();
        assert_eq!(p, Vec2::new(-2.0, -3.0));
        assert_eq!(v.x * p.x + v.y * p.y, 0.0);
    }

    #[test]
    fn clamp_components_limits_each_axis() {
        let v = Vec2::new(2500.0, -1500.0).clamp_components(1000.0);
        assert_eq!(v, Vec2::new(1000.0, -1000.0));
    }
}
