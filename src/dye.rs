use crate::advect::{advect_into, AdvectParams, FrozenRegion};
use crate::boundary::FieldKind;
use crate::config::SimConfig;
use crate::field::Field2;
use crate::ping_pong::PingPong;
use crate::{Rgba, Vec2};

/// Carries the visible color through the projected velocity field.
pub fn advect_dye(
    dye: &mut PingPong<Rgba>,
    velocity: &Field2<Vec2>,
    config: &SimConfig,
    dt: f32,
    frozen: Option<FrozenRegion>,
) {
    if !(dt > 0.0) {
        return;
    }
    let params = AdvectParams {
        dt,
        mode: config.boundaries.mode_for(FieldKind::Dye),
        interpolation: config.interpolation,
        dissipation: config.dye_dissipation,
    };
    let (prev, next) = dye.split();
    advect_into(next, prev, velocity, params, frozen);
    dye.swap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Grid2;

    #[test]
    fn dye_follows_velocity_and_dissipates() {
        let grid = Grid2::new(8, 1).unwrap();
        let mut dye = PingPong::new(grid, Rgba::transparent());
        dye.current_mut().set(2, 0, Rgba::new(1.0, 0.5, 0.0, 1.0));
        let velocity = Field2::new(grid, Vec2::new(1.0 / 8.0, 0.0));
        let config = SimConfig {
            dye_dissipation: 1.0,
            ..SimConfig::default()
        };
        advect_dye(&mut dye, &velocity, &config, 1.0, None);
        let moved = dye.current().get(3, 0);
        assert!((moved.r - 0.5).abs() < 1e-5);
        assert!((moved.g - 0.25).abs() < 1e-5);
        assert_eq!(dye.current().get(2, 0), Rgba::transparent());
    }

    #[test]
    fn zero_dt_leaves_buffers_alone() {
        let grid = Grid2::new(4, 4).unwrap();
        let mut dye = PingPong::new(grid, Rgba::new(0.1, 0.2, 0.3, 0.0));
        let handle = dye.handle();
        let velocity = Field2::new(grid, Vec2::new(0.5, 0.5));
        advect_dye(&mut dye, &velocity, &SimConfig::default(), 0.0, None);
        assert_eq!(dye.handle(), handle);
    }
}
