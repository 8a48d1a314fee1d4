use crate::advect::FrozenRegion;
use crate::config::SimConfig;
use crate::dye::advect_dye;
use crate::error::SimError;
use crate::field::Field2;
use crate::grid::Grid2;
use crate::ping_pong::{FieldHandle, PingPong};
use crate::splat::{apply_splat, SplatTarget};
use crate::velocity::{integrate, mean_abs_divergence, VelocitySettings, VelocityWorkspace};
use crate::{Rgba, Vec2};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepStats {
    pub max_speed: f32,
    pub mean_abs_divergence: f32,
    /// Sum of the color channels over the grid.
    pub dye_mass: f32,
}

/// Owns every field and the frozen region, and runs the solver one tick at
/// a time.
///
/// Splats and `step` must not interleave: inject everything for a frame,
/// then step (or the other way round).
#[derive(Clone, Debug)]
pub struct Simulation {
    grid: Grid2,
    workspace: VelocityWorkspace,
    dye: PingPong<Rgba>,
    frozen: Option<FrozenRegion>,
}

impl Simulation {
    pub fn new(width: usize, height: usize, config: &SimConfig) -> Result<Self, SimError> {
        let grid = Grid2::new(width, height)?;
        config.validate()?;
        log::debug!("creating {}x{} marbling simulation", width, height);
        Ok(Self {
            grid,
            workspace: VelocityWorkspace::new(grid),
            dye: PingPong::new(grid, config.background),
            frozen: None,
        })
    }

    pub fn grid(&self) -> Grid2 {
        self.grid
    }

    /// Current dye buffer, for presentation.
    pub fn dye(&self) -> &Field2<Rgba> {
        self.dye.current()
    }

    pub fn velocity(&self) -> &Field2<Vec2> {
        self.workspace.velocity.current()
    }

    pub fn pressure(&self) -> &Field2<f32> {
        self.workspace.pressure.current()
    }

    pub fn dye_handle(&self) -> FieldHandle {
        self.dye.handle()
    }

    pub fn velocity_handle(&self) -> FieldHandle {
        self.workspace.velocity.handle()
    }

    pub fn frozen_region(&self) -> Option<FrozenRegion> {
        self.frozen
    }

    pub fn set_frozen_region(&mut self, region: Option<FrozenRegion>) {
        match region {
            Some(region) => log::debug!(
                "freezing region {:?}..{:?}",
                region.min(),
                region.max()
            ),
            None => log::debug!("clearing frozen region"),
        }
        self.frozen = region.filter(|region| !region.is_empty());
    }

    fn active_frozen(&self, config: &SimConfig) -> Option<FrozenRegion> {
        if config.freeze_enabled {
            self.frozen
        } else {
            None
        }
    }

    /// Clamps a measured frame time and steps with it. Returns the simulated dt.
    pub fn advance(&mut self, config: &SimConfig, measured: f32) -> f32 {
        let dt = config.frame_dt(measured);
        self.step(config, dt);
        dt
    }

    /// One tick: integrate velocity, then carry the dye through the
    /// projected field. `dt` is expected to be clamped already; see
    /// [`SimConfig::frame_dt`].
    pub fn step(&mut self, config: &SimConfig, dt: f32) {
        if !config.animate || !config.advect {
            return;
        }
        if dt == 0.0 {
            log::trace!("zero dt, nothing to integrate");
            return;
        }
        if !(dt > 0.0 && dt.is_finite()) {
            log::warn!("skipping step with dt {dt}");
            return;
        }
        let frozen = self.active_frozen(config);
        let settings = VelocitySettings::from_config(config, self.grid, dt);
        integrate(&mut self.workspace, &settings, frozen);
        advect_dye(
            &mut self.dye,
            self.workspace.velocity.current(),
            config,
            dt,
            frozen,
        );
    }

    pub fn inject_color_splat(&mut self, center: (f32, f32), delta: Rgba, radius: f32) {
        apply_splat(self.dye.current_mut(), center, delta, radius);
    }

    pub fn inject_velocity_splat(&mut self, center: (f32, f32), delta: Vec2, radius: f32) {
        apply_splat(self.workspace.velocity.current_mut(), center, delta, radius);
    }

    /// Zeroes velocity, paints the background, and clears the frozen region.
    pub fn reset(&mut self, config: &SimConfig) {
        log::debug!("resetting simulation");
        self.workspace.clear();
        self.dye.fill(config.background);
        self.frozen = None;
    }

    /// Stops all motion but keeps the dye where it is.
    pub fn suspend_velocity(&mut self) {
        self.workspace.clear();
    }

    pub fn stats(&self, config: &SimConfig) -> StepStats {
        let velocity = self.velocity();
        StepStats {
            max_speed: velocity.max_magnitude(),
            mean_abs_divergence: mean_abs_divergence(velocity, config.boundaries.velocity),
            dye_mass: self.dye().sum_with(|c| c.r + c.g + c.b),
        }
    }

    #[cfg(test)]
    fn poison_back_buffers(&mut self) {
        self.workspace.velocity.back_mut().fill(Vec2::new(f32::NAN, f32::NAN));
        self.workspace.pressure.back_mut().fill(f32::NAN);
        self.workspace.divergence.fill(f32::NAN);
        self.workspace.curl.fill(f32::NAN);
        self.dye.back_mut().fill(Rgba::new(f32::NAN, f32::NAN, f32::NAN, f32::NAN));
    }
}

impl SplatTarget for Simulation {
    fn color_splat(&mut self, center: (f32, f32), delta: Rgba, radius: f32) {
        self.inject_color_splat(center, delta, radius);
    }

    fn velocity_splat(&mut self, center: (f32, f32), delta: Vec2, radius: f32) {
        self.inject_velocity_splat(center, delta, radius);
    }
}
