use crate::boundary::BoundaryMode;
use crate::error::SimError;

/// Index of a grid tap after boundary resolution, plus which axes were
/// mirrored to get there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedTap {
    pub x: usize,
    pub y: usize,
    pub flip_x: bool,
    pub flip_y: bool,
}

/// Fixed W×H cell grid over the normalized domain `[0, 1]²`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid2 {
    width: usize,
    height: usize,
}

impl Grid2 {
    pub fn new(width: usize, height: usize) -> Result<Self, SimError> {
        if width == 0 || height == 0 {
            return Err(SimError::InvalidGrid { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Normalized size of one cell. Cells are treated as square with the
    /// domain width as reference.
    pub fn cell_size(&self) -> f32 {
        1.0 / self.width as f32
    }

    pub fn size(&self) -> usize {
        self.width * self.height
    }

    pub fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    pub fn cell_center(&self, x: usize, y: usize) -> (f32, f32) {
        (
            (x as f32 + 0.5) / self.width as f32,
            (y as f32 + 0.5) / self.height as f32,
        )
    }

    /// Continuous cell-space coordinate of a normalized position, offset so
    /// that integer values land on cell centers.
    pub fn to_cell_space(&self, pos: (f32, f32)) -> (f32, f32) {
        (
            pos.0 * self.width as f32 - 0.5,
            pos.1 * self.height as f32 - 0.5,
        )
    }

    pub fn resolve(&self, x: i32, y: i32, mode: BoundaryMode) -> ResolvedTap {
        let (x, flip_x) = mode.resolve_axis(x, self.width);
        let (y, flip_y) = mode.resolve_axis(y, self.height);
        ResolvedTap {
            x,
            y,
            flip_x,
            flip_y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimension_fails_fast() {
        assert!(matches!(
            Grid2::new(0, 4),
            Err(SimError::InvalidGrid { width: 0, height: 4 })
        ));
        assert!(Grid2::new(4, 0).is_err());
    }

    #[test]
    fn cell_center_round_trips_through_cell_space() {
        let grid = Grid2::new(8, 4).unwrap();
        let (gx, gy) = grid.to_cell_space(grid.cell_center(3, 2));
        assert!((gx - 3.0).abs() < 1e-5);
        assert!((gy - 2.0).abs() < 1e-5);
    }

    #[test]
    fn resolve_reports_mirrored_axes() {
        let grid = Grid2::new(4, 4).unwrap();
        let tap = grid.resolve(4, 1, BoundaryMode::ReflectNegate);
        assert_eq!(
            tap,
            ResolvedTap {
                x: 3,
                y: 1,
                flip_x: true,
                flip_y: false
            }
        );
    }
}
