use crate::boundary::BoundaryPolicy;
use crate::error::ConfigError;
use crate::field::Interpolation;
use crate::Rgba;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Brush settings used when turning input gestures into splats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Brush {
    /// Dye deposited by each color splat.
    pub color: Rgba,
    /// Only push velocity, leave the dye alone.
    pub velocity_only: bool,
    /// Gain from a normalized drag vector to injected velocity.
    pub velocity_scale: f32,
    /// Splats created by one random scatter.
    pub random_amount: usize,
    pub random_color: bool,
    pub random_direction: bool,
    /// Range of streak lengths, in cells, drawn for each scattered splash.
    pub streak_min: usize,
    pub streak_max: usize,
    /// Cells between consecutive splats along a streak.
    pub streak_step: usize,
    pub rake_rows: usize,
    pub rake_columns: usize,
    /// Normalized distance between neighboring rake tines.
    pub rake_spacing: f32,
    pub tap_count: usize,
    /// Maximum normalized offset of a tap from the pointer.
    pub tap_jitter: f32,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color: Rgba::from_rgb8(145, 40, 200, 510.0),
            velocity_only: false,
            velocity_scale: 10.0,
            random_amount: 5,
            random_color: false,
            random_direction: true,
            streak_min: 4,
            streak_max: 40,
            streak_step: 2,
            rake_rows: 1,
            rake_columns: 5,
            rake_spacing: 0.1,
            tap_count: 6,
            tap_jitter: 0.03,
        }
    }
}

/// Solver settings. Passed by reference into every step and injection call
/// and read fresh each time, so edits take effect on the next call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Master switch; when off `step` does nothing.
    pub animate: bool,
    /// Run velocity integration and dye advection.
    pub advect: bool,
    pub vorticity: bool,
    pub pressure: bool,
    /// Seed each Jacobi solve with the previous step's pressure instead of
    /// zero. Converges faster on slowly changing flow, but a stale field can
    /// raise divergence when few iterations run.
    pub pressure_warm_start: bool,
    /// Honor the frozen region if one is set.
    pub freeze_enabled: bool,

    pub density: f32,
    /// Upper bound on the step rate; frame times are clamped to `1 / target_fps`.
    pub target_fps: f32,
    /// Multiplier from wall-clock seconds to simulated seconds.
    pub timescale: f32,
    pub jacobi_iterations: usize,
    pub curl_strength: f32,
    pub velocity_dissipation: f32,
    pub dye_dissipation: f32,
    /// Gaussian width used by brush splats, in squared normalized units.
    pub splat_radius: f32,
    pub interpolation: Interpolation,
    pub boundaries: BoundaryPolicy,
    /// Dye color after a reset.
    pub background: Rgba,
    pub brush: Brush,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            animate: true,
            advect: true,
            vorticity: false,
            pressure: true,
            pressure_warm_start: false,
            freeze_enabled: true,
            density: 1.0,
            target_fps: 60.0,
            timescale: 1.0,
            jacobi_iterations: 20,
            curl_strength: 0.35,
            velocity_dissipation: 0.0,
            dye_dissipation: 0.0,
            splat_radius: 0.001,
            interpolation: Interpolation::Bilinear,
            boundaries: BoundaryPolicy::walls(),
            background: Rgba::transparent(),
            brush: Brush::default(),
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn require_finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite, got {value}")))
    }
}

impl SimConfig {
    pub fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = ron::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a RON file; missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&contents)?;
        log::debug!("loaded simulation config from {:?}", path);
        Ok(config)
    }

    pub fn to_ron_string(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("density", self.density),
            ("target_fps", self.target_fps),
            ("timescale", self.timescale),
            ("curl_strength", self.curl_strength),
            ("velocity_dissipation", self.velocity_dissipation),
            ("dye_dissipation", self.dye_dissipation),
            ("splat_radius", self.splat_radius),
            ("brush.velocity_scale", self.brush.velocity_scale),
            ("brush.rake_spacing", self.brush.rake_spacing),
            ("brush.tap_jitter", self.brush.tap_jitter),
        ] {
            require_finite(field, value)?;
        }
        if self.density <= 0.0 {
            return Err(invalid("density", "must be positive"));
        }
        if self.target_fps <= 0.0 {
            return Err(invalid("target_fps", "must be positive"));
        }
        if self.timescale < 0.0 {
            return Err(invalid("timescale", "must not be negative"));
        }
        if self.velocity_dissipation < 0.0 {
            return Err(invalid("velocity_dissipation", "must not be negative"));
        }
        if self.dye_dissipation < 0.0 {
            return Err(invalid("dye_dissipation", "must not be negative"));
        }
        if self.splat_radius <= 0.0 {
            return Err(invalid("splat_radius", "must be positive"));
        }
        if self.brush.streak_step == 0 {
            return Err(invalid("brush.streak_step", "must be at least 1"));
        }
        if self.brush.streak_min > self.brush.streak_max {
            return Err(invalid("brush.streak_min", "must not exceed brush.streak_max"));
        }
        if self.pressure && self.jacobi_iterations == 0 {
            return Err(invalid(
                "jacobi_iterations",
                "must be at least 1 while pressure projection is enabled",
            ));
        }
        Ok(())
    }

    /// Simulated timestep for a measured frame time. Long stalls are clamped
    /// to one target frame so the explicit scheme stays stable.
    pub fn frame_dt(&self, measured: f32) -> f32 {
        if !measured.is_finite() || measured <= 0.0 {
            return 0.0;
        }
        measured.min(1.0 / self.target_fps) * self.timescale
    }
}
