//! Velocity integration: advection, optional vorticity confinement, and the
//! pressure projection that restores incompressibility.
//!
//! Every stage reads the current buffers and writes a separate output buffer
//! in full before anything else looks at it, so a stage is a barrier over
//! the whole grid.

use crate::advect::{advect_into, AdvectParams, FrozenRegion};
use crate::boundary::{BoundaryMode, FieldKind, PressureBoundary};
use crate::config::SimConfig;
use crate::field::{Field2, Interpolation};
use crate::grid::Grid2;
use crate::ping_pong::PingPong;
use crate::Vec2;

/// Per-component bound on the confinement force.
pub const CONFINEMENT_FORCE_LIMIT: f32 = 1000.0;
/// Gain applied to the confinement force when it is added to velocity.
pub const CONFINEMENT_SCALE: f32 = 2.5;
const NORMAL_EPS: f32 = 1e-5;

/// Velocity state and scratch fields owned by the simulation.
#[derive(Clone, Debug)]
pub struct VelocityWorkspace {
    pub velocity: PingPong<Vec2>,
    /// Last solved pressure. Seeds the next solve only with warm start on.
    pub pressure: PingPong<f32>,
    pub divergence: Field2<f32>,
    pub curl: Field2<f32>,
}

impl VelocityWorkspace {
    pub fn new(grid: Grid2) -> Self {
        Self {
            velocity: PingPong::new(grid, Vec2::zero()),
            pressure: PingPong::new(grid, 0.0),
            divergence: Field2::new(grid, 0.0),
            curl: Field2::new(grid, 0.0),
        }
    }

    pub fn clear(&mut self) {
        self.velocity.fill(Vec2::zero());
        self.pressure.fill(0.0);
    }
}

/// Everything the stages need, resolved once from the config at the top of
/// a step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VelocitySettings {
    pub dt: f32,
    pub density: f32,
    pub cell_size: f32,
    pub jacobi_iterations: usize,
    pub curl_strength: f32,
    pub dissipation: f32,
    pub interpolation: Interpolation,
    pub velocity_mode: BoundaryMode,
    /// Taps of the curl magnitude in confinement.
    pub scalar_mode: BoundaryMode,
    pub pressure_boundary: PressureBoundary,
    pub vorticity: bool,
    pub pressure: bool,
    pub warm_start: bool,
}

impl VelocitySettings {
    pub fn from_config(config: &SimConfig, grid: Grid2, dt: f32) -> Self {
        let velocity_mode = config.boundaries.mode_for(FieldKind::Velocity);
        Self {
            dt,
            density: config.density,
            cell_size: grid.cell_size(),
            jacobi_iterations: config.jacobi_iterations,
            curl_strength: config.curl_strength,
            dissipation: config.velocity_dissipation,
            interpolation: config.interpolation,
            velocity_mode,
            scalar_mode: config.boundaries.mode_for(FieldKind::Scalar),
            pressure_boundary: velocity_mode.pressure_boundary(),
            vorticity: config.vorticity,
            pressure: config.pressure,
            warm_start: config.pressure_warm_start,
        }
    }

    /// Scale from raw central differences of velocity to the Poisson source term.
    fn divergence_coefficient(&self) -> f32 {
        -2.0 * self.cell_size * self.density / self.dt
    }

    fn gradient_factor(&self) -> f32 {
        self.dt / (2.0 * self.density * self.cell_size)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VelocityStage {
    Advect,
    Curl,
    Confine,
    Divergence,
    Relax { iterations: usize },
    Project,
}

/// Ordered stages for one step. The sequence is linear; disabled features
/// are simply absent.
pub fn plan(settings: &VelocitySettings) -> Vec<VelocityStage> {
    let mut stages = vec![VelocityStage::Advect];
    if settings.vorticity {
        stages.push(VelocityStage::Curl);
        stages.push(VelocityStage::Confine);
    }
    if settings.pressure && settings.jacobi_iterations > 0 {
        stages.push(VelocityStage::Divergence);
        stages.push(VelocityStage::Relax {
            iterations: settings.jacobi_iterations,
        });
        stages.push(VelocityStage::Project);
    }
    stages
}

pub fn integrate(
    workspace: &mut VelocityWorkspace,
    settings: &VelocitySettings,
    frozen: Option<FrozenRegion>,
) {
    if !(settings.dt > 0.0) {
        return;
    }
    for stage in plan(settings) {
        log::trace!("velocity stage {:?}", stage);
        run_stage(workspace, stage, settings, frozen);
    }
}

pub fn run_stage(
    workspace: &mut VelocityWorkspace,
    stage: VelocityStage,
    settings: &VelocitySettings,
    frozen: Option<FrozenRegion>,
) {
    match stage {
        VelocityStage::Advect => {
            let params = AdvectParams {
                dt: settings.dt,
                mode: settings.velocity_mode,
                interpolation: settings.interpolation,
                dissipation: settings.dissipation,
            };
            let (prev, next) = workspace.velocity.split();
            advect_into(next, prev, prev, params, frozen);
            workspace.velocity.swap();
        }
        VelocityStage::Curl => {
            curl_into(
                &mut workspace.curl,
                workspace.velocity.current(),
                settings.velocity_mode,
            );
        }
        VelocityStage::Confine => {
            let (prev, next) = workspace.velocity.split();
            confine_into(next, prev, &workspace.curl, settings, frozen);
            workspace.velocity.swap();
        }
        VelocityStage::Divergence => {
            divergence_into(
                &mut workspace.divergence,
                workspace.velocity.current(),
                settings.velocity_mode,
                settings.divergence_coefficient(),
            );
        }
        VelocityStage::Relax { iterations } => {
            if !settings.warm_start {
                workspace.pressure.fill(0.0);
            }
            relax_pressure(
                &mut workspace.pressure,
                &workspace.divergence,
                iterations,
                settings.pressure_boundary,
            );
        }
        VelocityStage::Project => {
            let (prev, next) = workspace.velocity.split();
            project_into(
                next,
                prev,
                workspace.pressure.current(),
                settings.gradient_factor(),
                settings.pressure_boundary,
                frozen,
            );
            workspace.velocity.swap();
        }
    }
}

fn central_differences(velocity: &Field2<Vec2>, x: usize, y: usize, mode: BoundaryMode) -> (Vec2, Vec2) {
    let xi = x as i32;
    let yi = y as i32;
    let d_dx = velocity
        .sample_cell(xi + 1, yi, mode)
        .sub(velocity.sample_cell(xi - 1, yi, mode));
    let d_dy = velocity
        .sample_cell(xi, yi + 1, mode)
        .sub(velocity.sample_cell(xi, yi - 1, mode));
    (d_dx, d_dy)
}

/// `0.5 * (Δx v - Δy u)` over one-cell central differences.
pub fn curl_into(out: &mut Field2<f32>, velocity: &Field2<Vec2>, mode: BoundaryMode) {
    out.fill_with_index(|x, y| {
        let (d_dx, d_dy) = central_differences(velocity, x, y, mode);
        0.5 * (d_dx.y - d_dy.x)
    });
}

fn confine_into(
    out: &mut Field2<Vec2>,
    velocity: &Field2<Vec2>,
    curl: &Field2<f32>,
    settings: &VelocitySettings,
    frozen: Option<FrozenRegion>,
) {
    let grid = velocity.grid();
    let mode = settings.scalar_mode;
    let gain = settings.dt * CONFINEMENT_SCALE;
    out.fill_with_index(|x, y| {
        let value = velocity.get(x, y);
        if frozen.is_some_and(|region| region.contains_cell(grid, x, y)) {
            return value;
        }
        let xi = x as i32;
        let yi = y as i32;
        let abs_at = |cx: i32, cy: i32| curl.sample_cell(cx, cy, mode).abs();
        let grad = Vec2::new(
            0.5 * (abs_at(xi + 1, yi) - abs_at(xi - 1, yi)),
            0.5 * (abs_at(xi, yi + 1) - abs_at(xi, yi - 1)),
        );
        let normal = grad.scale(1.0 / (grad.length() + NORMAL_EPS));
        let force = normal
            .perp()
            .scale(settings.curl_strength * curl.get(x, y))
            .clamp_components(CONFINEMENT_FORCE_LIMIT);
        value.add(force.scale(gain))
    });
}

/// Poisson source term: `coefficient * (Δx u + Δy v)`. Taps past a wall
/// follow `mode`; with `ReflectNegate` the missing neighbor's normal
/// component is the negated center value.
pub fn divergence_into(
    out: &mut Field2<f32>,
    velocity: &Field2<Vec2>,
    mode: BoundaryMode,
    coefficient: f32,
) {
    out.fill_with_index(|x, y| {
        let (d_dx, d_dy) = central_differences(velocity, x, y, mode);
        coefficient * (d_dx.x + d_dy.y)
    });
}

/// Pressure at a signed cell index. With the boundary paired to the velocity
/// mode, the one-cell gradient below is the exact transpose of
/// `divergence_into`, and the stride-2 stencil is their product, edge cells
/// included.
fn pressure_at(pressure: &Field2<f32>, x: i32, y: i32, boundary: PressureBoundary) -> f32 {
    match boundary {
        PressureBoundary::Wrap => pressure.sample_cell(x, y, BoundaryMode::Wrap),
        PressureBoundary::Mirror => pressure.sample_cell(x, y, BoundaryMode::ReflectNegate),
        PressureBoundary::OddMirror => {
            let tap = pressure.grid().resolve(x, y, BoundaryMode::ReflectNegate);
            let value = pressure.get(tap.x, tap.y);
            if tap.flip_x != tap.flip_y {
                -value
            } else {
                value
            }
        }
    }
}

/// Fixed number of Jacobi sweeps over the stride-2 Laplacian, ping-ponging
/// the pressure buffers. No convergence test.
pub fn relax_pressure(
    pressure: &mut PingPong<f32>,
    divergence: &Field2<f32>,
    iterations: usize,
    boundary: PressureBoundary,
) {
    for _ in 0..iterations {
        let (prev, next) = pressure.split();
        next.fill_with_index(|x, y| {
            let xi = x as i32;
            let yi = y as i32;
            0.25 * (divergence.get(x, y)
                + pressure_at(prev, xi + 2, yi, boundary)
                + pressure_at(prev, xi - 2, yi, boundary)
                + pressure_at(prev, xi, yi + 2, boundary)
                + pressure_at(prev, xi, yi - 2, boundary))
        });
        pressure.swap();
    }
}

fn project_into(
    out: &mut Field2<Vec2>,
    velocity: &Field2<Vec2>,
    pressure: &Field2<f32>,
    factor: f32,
    boundary: PressureBoundary,
    frozen: Option<FrozenRegion>,
) {
    let grid = velocity.grid();
    out.fill_with_index(|x, y| {
        let value = velocity.get(x, y);
        if frozen.is_some_and(|region| region.contains_cell(grid, x, y)) {
            return value;
        }
        let xi = x as i32;
        let yi = y as i32;
        let grad = Vec2::new(
            pressure_at(pressure, xi + 1, yi, boundary) - pressure_at(pressure, xi - 1, yi, boundary),
            pressure_at(pressure, xi, yi + 1, boundary) - pressure_at(pressure, xi, yi - 1, boundary),
        );
        value.sub(grad.scale(factor))
    });
}

/// Mean of `|Δx u + Δy v|` over the grid, in raw central differences.
pub fn mean_abs_divergence(velocity: &Field2<Vec2>, mode: BoundaryMode) -> f32 {
    let mut scratch = Field2::new(velocity.grid(), 0.0);
    divergence_into(&mut scratch, velocity, mode, 1.0);
    scratch.mean_abs()
}
