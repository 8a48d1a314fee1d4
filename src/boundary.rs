use serde::{Deserialize, Serialize};

/// Edge behavior for taps that fall outside the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryMode {
    /// Repeat the nearest edge cell.
    Clamp,
    /// Periodic domain.
    Wrap,
    /// Mirror across the edge and negate the component normal to it, so no
    /// flow crosses the wall.
    ReflectNegate,
}

impl BoundaryMode {
    /// Maps an axis index into `0..n`, returning whether the value was
    /// mirrored an odd number of times.
    pub fn resolve_axis(self, i: i32, n: usize) -> (usize, bool) {
        let n_i = n as i32;
        match self {
            BoundaryMode::Clamp => (i.clamp(0, n_i - 1) as usize, false),
            BoundaryMode::Wrap => (i.rem_euclid(n_i) as usize, false),
            BoundaryMode::ReflectNegate => {
                let flipped = i.div_euclid(n_i) % 2 != 0;
                let r = i.rem_euclid(n_i);
                if flipped {
                    ((n_i - 1 - r) as usize, true)
                } else {
                    (r as usize, false)
                }
            }
        }
    }

    /// Brings a continuous cell-space coordinate close enough to `0..n` that
    /// integer taps around it cannot overflow. Taps around the result resolve
    /// to the same cells as taps around `g`; infinities land on the nearest
    /// edge and NaN on cell 0.
    pub fn fold_coordinate(self, g: f32, n: usize) -> f32 {
        let n_f = n as f32;
        if (-2.0..=n_f + 1.0).contains(&g) {
            return g;
        }
        if g.is_nan() {
            return 0.0;
        }
        match self {
            BoundaryMode::Wrap if g.is_finite() => g.rem_euclid(n_f),
            BoundaryMode::ReflectNegate if g.is_finite() => g.rem_euclid(2.0 * n_f),
            _ => g.clamp(-1.0, n_f),
        }
    }

    /// Pressure boundary that makes the projection gradient the transpose of
    /// the divergence taken with velocity sampled under `self`.
    pub fn pressure_boundary(self) -> PressureBoundary {
        match self {
            BoundaryMode::Wrap => PressureBoundary::Wrap,
            BoundaryMode::ReflectNegate => PressureBoundary::Mirror,
            BoundaryMode::Clamp => PressureBoundary::OddMirror,
        }
    }
}

/// Edge behavior of the pressure taps in the Jacobi solve and the gradient.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PressureBoundary {
    Wrap,
    /// Mirror across the edge, value unchanged.
    Mirror,
    /// Mirror across the edge and negate.
    OddMirror,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Velocity,
    Scalar,
    Dye,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryPolicy {
    /// Also fixes the pressure boundary; see [`BoundaryMode::pressure_boundary`].
    pub velocity: BoundaryMode,
    /// Curl taps in vorticity confinement.
    pub scalar: BoundaryMode,
    pub dye: BoundaryMode,
}

impl BoundaryPolicy {
    /// Solid walls around the domain.
    pub const fn walls() -> Self {
        Self {
            velocity: BoundaryMode::ReflectNegate,
            scalar: BoundaryMode::Clamp,
            dye: BoundaryMode::Clamp,
        }
    }

    /// Every field wraps around.
    pub const fn periodic() -> Self {
        Self {
            velocity: BoundaryMode::Wrap,
            scalar: BoundaryMode::Wrap,
            dye: BoundaryMode::Wrap,
        }
    }

    pub fn mode_for(&self, kind: FieldKind) -> BoundaryMode {
        match kind {
            FieldKind::Velocity => self.velocity,
            FieldKind::Scalar => self.scalar,
            FieldKind::Dye => self.dye,
        }
    }
}

impl Default for BoundaryPolicy {
    fn default() -> Self {
        Self::walls()
    }
}
