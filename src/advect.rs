use crate::boundary::BoundaryMode;
use crate::field::{CellValue, Field2, Interpolation};
use crate::grid::Grid2;
use crate::Vec2;

/// Axis-aligned rectangle in normalized coordinates whose cells are pinned
/// during a step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrozenRegion {
    min: (f32, f32),
    max: (f32, f32),
}

impl FrozenRegion {
    /// Builds a region from two opposite corners in any order, clipped to
    /// the unit square.
    pub fn from_corners(a: (f32, f32), b: (f32, f32)) -> Self {
        let clip = |v: f32| v.clamp(0.0, 1.0);
        Self {
            min: (clip(a.0.min(b.0)), clip(a.1.min(b.1))),
            max: (clip(a.0.max(b.0)), clip(a.1.max(b.1))),
        }
    }

    pub fn min(&self) -> (f32, f32) {
        self.min
    }

    pub fn max(&self) -> (f32, f32) {
        self.max
    }

    pub fn contains(&self, pos: (f32, f32)) -> bool {
        pos.0 >= self.min.0 && pos.0 <= self.max.0 && pos.1 >= self.min.1 && pos.1 <= self.max.1
    }

    pub fn contains_cell(&self, grid: Grid2, x: usize, y: usize) -> bool {
        self.contains(grid.cell_center(x, y))
    }

    pub fn is_empty(&self) -> bool {
        self.min.0 >= self.max.0 || self.min.1 >= self.max.1
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdvectParams {
    pub dt: f32,
    pub mode: BoundaryMode,
    pub interpolation: Interpolation,
    pub dissipation: f32,
}

impl AdvectParams {
    fn decay(&self) -> f32 {
        1.0 / (1.0 + self.dissipation * self.dt)
    }
}

/// Semi-Lagrangian transport of `source` through `velocity` into `out`.
///
/// Each cell traces back along the velocity stored at its own center and
/// samples `source` there. Frozen cells copy their previous value.
pub fn advect_into<T: CellValue>(
    out: &mut Field2<T>,
    source: &Field2<T>,
    velocity: &Field2<Vec2>,
    params: AdvectParams,
    frozen: Option<FrozenRegion>,
) {
    out.assert_same_grid(source);
    assert_eq!(out.grid(), velocity.grid(), "velocity grid mismatch");
    let grid = source.grid();
    let decay = params.decay();
    out.fill_with_index(|x, y| {
        if frozen.is_some_and(|region| region.contains_cell(grid, x, y)) {
            return source.get(x, y);
        }
        let (px, py) = grid.cell_center(x, y);
        let u = velocity.get(x, y);
        let back = (px - params.dt * u.x, py - params.dt * u.y);
        source
            .sample(back, params.mode, params.interpolation)
            .scale(decay)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rgba;

    fn assert_close(a: f32, b: f32, tol: f32) {
        assert!(
            (a - b).abs() <= tol,
            "expected {a} to be within {tol} of {b}"
        );
    }

    fn params(dt: f32) -> AdvectParams {
        AdvectParams {
            dt,
            mode: BoundaryMode::Clamp,
            interpolation: Interpolation::Bilinear,
            dissipation: 0.0,
        }
    }

    #[test]
    fn constant_field_is_preserved() {
        let grid = Grid2::new(16, 16).unwrap();
        let dye = Field2::new(grid, Rgba::new(0.2, 0.4, 0.6, 1.0));
        let velocity = Field2::from_fn(grid, |x, y| Vec2::new(x as f32 * 0.1, -(y as f32) * 0.05));
        let mut out = Field2::new(grid, Rgba::transparent());
        advect_into(&mut out, &dye, &velocity, params(0.1), None);
        assert_eq!(out, dye);
    }

    #[test]
    fn uniform_flow_shifts_by_whole_cells() {
        let grid = Grid2::new(8, 1).unwrap();
        let field = Field2::from_fn(grid, |x, _y| x as f32);
        let velocity = Field2::new(grid, Vec2::new(1.0 / 8.0, 0.0));
        let mut out = Field2::new(grid, 0.0);
        advect_into(&mut out, &field, &velocity, params(2.0), None);
        assert_close(out.get(5, 0), 3.0, 1e-4);
        assert_close(out.get(1, 0), 0.0, 1e-4);
    }

    #[test]
    fn nearest_interpolation_picks_source_cell() {
        let grid = Grid2::new(8, 1).unwrap();
        let field = Field2::from_fn(grid, |x, _y| x as f32);
        let velocity = Field2::new(grid, Vec2::new(0.7 / 8.0, 0.0));
        let mut out = Field2::new(grid, 0.0);
        let mut p = params(1.0);
        p.interpolation = Interpolation::Nearest;
        advect_into(&mut out, &field, &velocity, p, None);
        assert_close(out.get(4, 0), 3.0, 1e-6);
    }

    #[test]
    fn dissipation_divides_sampled_value() {
        let grid = Grid2::new(4, 4).unwrap();
        let field = Field2::new(grid, 3.0_f32);
        let velocity = Field2::new(grid, Vec2::zero());
        let mut out = Field2::new(grid, 0.0);
        let mut p = params(0.5);
        p.dissipation = 2.0;
        advect_into(&mut out, &field, &velocity, p, None);
        assert_close(out.get(1, 2), 1.5, 1e-6);
    }

    #[test]
    fn frozen_cells_copy_previous_value() {
        let grid = Grid2::new(8, 8).unwrap();
        let field = Field2::from_fn(grid, |x, y| (x * 8 + y) as f32);
        let velocity = Field2::new(grid, Vec2::new(0.3, 0.2));
        let region = FrozenRegion::from_corners((0.5, 0.5), (0.0, 0.0));
        let mut out = Field2::new(grid, 0.0);
        advect_into(&mut out, &field, &velocity, params(0.25), Some(region));
        for y in 0..8 {
            for x in 0..8 {
                if region.contains_cell(grid, x, y) {
                    assert_eq!(out.get(x, y), field.get(x, y));
                }
            }
        }
        assert_ne!(out.get(7, 7), field.get(7, 7));
    }

    #[test]
    fn region_corners_are_normalized() {
        let region = FrozenRegion::from_corners((0.9, -0.2), (0.1, 0.6));
        assert_eq!(region.min(), (0.1, 0.0));
        assert_eq!(region.max(), (0.9, 0.6));
        assert!(region.contains((0.5, 0.3)));
        assert!(!region.contains((0.95, 0.3)));
        assert!(FrozenRegion::from_corners((0.4, 0.4), (0.4, 0.9)).is_empty());
    }
}
