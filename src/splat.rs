//! Impulse injection: Gaussian splats and the compound brush patterns built
//! from them.

use crate::config::Brush;
use crate::field::{CellValue, Field2};
use crate::{Rgba, Vec2};
use rand::Rng;

/// Margin kept between random scatter centers and the domain edge.
const SCATTER_MARGIN: f32 = 0.05;
/// Drag range, in cells, for randomly directed scatter splats.
const SCATTER_DRAG_CELLS: f32 = 4.0;
/// Random brush channels are drawn from `1..255` and divided by this gain.
const RANDOM_COLOR_GAIN: f32 = 637.5;

/// Adds `delta * exp(-d² / radius)` to every cell, where `d` is the
/// normalized distance from the cell center to `center`.
///
/// The sum runs over the whole grid; only the falloff limits the footprint,
/// so `radius` has to stay small relative to the domain. A non-positive or
/// non-finite radius is ignored.
pub fn apply_splat<T: CellValue>(field: &mut Field2<T>, center: (f32, f32), delta: T, radius: f32) {
    if !(radius > 0.0 && radius.is_finite()) {
        log::warn!("ignoring splat with radius {radius}");
        return;
    }
    let grid = field.grid();
    field.update_with_index(|x, y, value| {
        let (px, py) = grid.cell_center(x, y);
        let dx = center.0 - px;
        let dy = center.1 - py;
        value.add(delta.scale((-(dx * dx + dy * dy) / radius).exp()))
    });
}

/// Something splats can be applied to. The simulation routes these to its
/// live buffers; tests can record them.
pub trait SplatTarget {
    fn color_splat(&mut self, center: (f32, f32), delta: Rgba, radius: f32);
    fn velocity_splat(&mut self, center: (f32, f32), delta: Vec2, radius: f32);
}

/// Single drag stroke: pushes velocity along `drag` and, unless the brush is
/// velocity-only, deposits the brush color.
pub fn stroke<S: SplatTarget + ?Sized>(
    target: &mut S,
    brush: &Brush,
    center: (f32, f32),
    drag: Vec2,
    radius: f32,
) {
    stroke_with_color(target, brush, center, drag, brush.color, radius);
}

fn stroke_with_color<S: SplatTarget + ?Sized>(
    target: &mut S,
    brush: &Brush,
    center: (f32, f32),
    drag: Vec2,
    color: Rgba,
    radius: f32,
) {
    target.velocity_splat(center, drag.scale(brush.velocity_scale), radius);
    if !brush.velocity_only {
        target.color_splat(center, color, radius);
    }
}

/// Lattice of `rake_rows × rake_columns` strokes centered on `center`,
/// spaced `rake_spacing` apart.
pub fn rake<S: SplatTarget + ?Sized>(
    target: &mut S,
    brush: &Brush,
    center: (f32, f32),
    drag: Vec2,
    radius: f32,
) {
    let rows = brush.rake_rows.max(1);
    let columns = brush.rake_columns.max(1);
    let offset = |i: usize, n: usize| (i as f32 - (n - 1) as f32 * 0.5) * brush.rake_spacing;
    for row in 0..rows {
        for column in 0..columns {
            let pos = (center.0 + offset(column, columns), center.1 + offset(row, rows));
            stroke(target, brush, pos, drag, radius);
        }
    }
}

fn random_start<R: Rng>(rng: &mut R, reach: f32) -> f32 {
    let upper = 1.0 - SCATTER_MARGIN - reach;
    if upper > SCATTER_MARGIN {
        rng.random_range(SCATTER_MARGIN..upper)
    } else {
        SCATTER_MARGIN
    }
}

/// `count` random splashes. Each splash is a diagonal streak of strokes from
/// a random start, `streak_min..streak_max` cells long with one stroke every
/// `streak_step` cells, sharing one color and one drag. Colors and
/// directions are random when the brush asks for it; otherwise the brush
/// color is used and no velocity is imparted.
pub fn random_scatter<S: SplatTarget + ?Sized, R: Rng>(
    target: &mut S,
    brush: &Brush,
    rng: &mut R,
    count: usize,
    cell_size: f32,
    radius: f32,
) {
    for _ in 0..count {
        let color = if brush.random_color {
            Rgba::from_rgb8(
                rng.random_range(1..255),
                rng.random_range(1..255),
                rng.random_range(1..255),
                RANDOM_COLOR_GAIN,
            )
        } else {
            brush.color
        };
        let length = if brush.streak_max > brush.streak_min {
            rng.random_range(brush.streak_min..brush.streak_max)
        } else {
            brush.streak_min
        }
        .max(1);
        let step = brush.streak_step.max(1);
        let reach = ((length - 1) / step * step) as f32 * cell_size;
        let start = (random_start(rng, reach), random_start(rng, reach));
        let drag = if brush.random_direction {
            let span = SCATTER_DRAG_CELLS * cell_size;
            Vec2::new(rng.random_range(-span..span), rng.random_range(-span..span))
        } else {
            Vec2::zero()
        };
        for offset in (0..length).step_by(step) {
            let along = offset as f32 * cell_size;
            let center = (start.0 + along, start.1 + along);
            stroke_with_color(target, brush, center, drag, color, radius);
        }
    }
}

/// `count` strokes jittered uniformly within `tap_jitter` of `center`.
pub fn tap<S: SplatTarget + ?Sized, R: Rng>(
    target: &mut S,
    brush: &Brush,
    rng: &mut R,
    center: (f32, f32),
    count: usize,
    radius: f32,
) {
    let jitter = brush.tap_jitter.abs();
    for _ in 0..count {
        let offset = if jitter > 0.0 {
            (rng.random_range(-jitter..jitter), rng.random_range(-jitter..jitter))
        } else {
            (0.0, 0.0)
        };
        let pos = (center.0 + offset.0, center.1 + offset.1);
        stroke(target, brush, pos, Vec2::zero(), radius);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Grid2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_close(a: f32, b: f32, tol: f32) {
        assert!(
            (a - b).abs() <= tol,
            "expected {a} to be within {tol} of {b}"
        );
    }

    #[derive(Default)]
    struct Recorder {
        colors: Vec<((f32, f32), Rgba)>,
        velocities: Vec<((f32, f32), Vec2)>,
    }

    impl SplatTarget for Recorder {
        fn color_splat(&mut self, center: (f32, f32), delta: Rgba, _radius: f32) {
            self.colors.push((center, delta));
        }

        fn velocity_splat(&mut self, center: (f32, f32), delta: Vec2, _radius: f32) {
            self.velocities.push((center, delta));
        }
    }

    #[test]
    fn splat_peaks_at_center_and_decays() {
        let grid = Grid2::new(65, 65).unwrap();
        let mut field = Field2::new(grid, 0.0_f32);
        apply_splat(&mut field, (0.5, 0.5), 1.0, 0.01);
        assert_close(field.get(32, 32), 1.0, 1e-6);
        assert!(field.get(32, 40) < field.get(32, 34));
        assert!(field.get(0, 32) < 1e-6);
    }

    #[test]
    fn splat_is_additive() {
        let grid = Grid2::new(9, 9).unwrap();
        let mut field = Field2::new(grid, Vec2::new(1.0, 1.0));
        apply_splat(&mut field, (0.5, 0.5), Vec2::new(2.0, -1.0), 0.05);
        let center = field.get(4, 4);
        assert_close(center.x, 3.0, 1e-5);
        assert_close(center.y, 0.0, 1e-5);
    }

    #[test]
    fn degenerate_radius_is_ignored() {
        let grid = Grid2::new(4, 4).unwrap();
        let mut field = Field2::new(grid, 0.5_f32);
        let before = field.clone();
        apply_splat(&mut field, (0.5, 0.5), 1.0, 0.0);
        apply_splat(&mut field, (0.5, 0.5), 1.0, f32::NAN);
        assert_eq!(field, before);
    }

    #[test]
    fn stroke_respects_velocity_only() {
        let mut brush = Brush::default();
        brush.velocity_scale = 10.0;
        let mut recorder = Recorder::default();
        stroke(&mut recorder, &brush, (0.2, 0.3), Vec2::new(0.5, 0.0), 0.001);
        assert_eq!(recorder.colors.len(), 1);
        assert_eq!(recorder.velocities[0].1, Vec2::new(5.0, 0.0));

        brush.velocity_only = true;
        let mut recorder = Recorder::default();
        stroke(&mut recorder, &brush, (0.2, 0.3), Vec2::new(0.5, 0.0), 0.001);
        assert!(recorder.colors.is_empty());
        assert_eq!(recorder.velocities.len(), 1);
    }

    #[test]
    fn rake_lays_out_centered_lattice() {
        let brush = Brush {
            rake_rows: 2,
            rake_columns: 3,
            rake_spacing: 0.1,
            ..Brush::default()
        };
        let mut recorder = Recorder::default();
        rake(&mut recorder, &brush, (0.5, 0.5), Vec2::zero(), 0.001);
        assert_eq!(recorder.velocities.len(), 6);
        let xs: Vec<f32> = recorder.colors.iter().take(3).map(|(c, _)| c.0).collect();
        assert_close(xs[0], 0.4, 1e-6);
        assert_close(xs[1], 0.5, 1e-6);
        assert_close(xs[2], 0.6, 1e-6);
        assert_close(recorder.colors[0].0 .1, 0.45, 1e-6);
        assert_close(recorder.colors[5].0 .1, 0.55, 1e-6);
    }

    #[test]
    fn random_scatter_stays_inside_margin() {
        let brush = Brush {
            random_color: true,
            random_direction: true,
            ..Brush::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let mut recorder = Recorder::default();
        random_scatter(&mut recorder, &brush, &mut rng, 25, 1.0 / 64.0, 0.001);
        assert!(recorder.colors.len() >= 25);
        assert_eq!(recorder.colors.len(), recorder.velocities.len());
        for (center, color) in &recorder.colors {
            assert!(center.0 >= SCATTER_MARGIN && center.0 < 1.0 - SCATTER_MARGIN);
            assert!(center.1 >= SCATTER_MARGIN && center.1 < 1.0 - SCATTER_MARGIN);
            assert!(color.r > 0.0 && color.r < 0.4);
        }
        let span = SCATTER_DRAG_CELLS / 64.0 * brush.velocity_scale;
        for (_, delta) in &recorder.velocities {
            assert!(delta.x.abs() <= span && delta.y.abs() <= span);
        }
    }

    #[test]
    fn random_scatter_without_direction_uses_brush_color() {
        let brush = Brush {
            random_direction: false,
            ..Brush::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let mut recorder = Recorder::default();
        random_scatter(&mut recorder, &brush, &mut rng, 4, 1.0 / 32.0, 0.001);
        assert!(recorder.colors.iter().all(|(_, c)| *c == brush.color));
        assert!(recorder.velocities.iter().all(|(_, v)| *v == Vec2::zero()));
    }

    #[test]
    fn random_scatter_lays_diagonal_streaks() {
        let brush = Brush {
            random_color: true,
            streak_min: 6,
            streak_max: 6,
            streak_step: 2,
            ..Brush::default()
        };
        let cell = 1.0 / 32.0;
        let mut rng = StdRng::seed_from_u64(19);
        let mut recorder = Recorder::default();
        random_scatter(&mut recorder, &brush, &mut rng, 4, cell, 0.001);
        assert_eq!(recorder.velocities.len(), 12);
        assert_eq!(recorder.colors.len(), 12);
        for (colors, velocities) in recorder.colors.chunks(3).zip(recorder.velocities.chunks(3)) {
            let (start, color) = colors[0];
            for (i, (center, c)) in colors.iter().enumerate() {
                assert_eq!(*c, color);
                assert_close(center.0, start.0 + 2.0 * cell * i as f32, 1e-6);
                assert_close(center.1, start.1 + 2.0 * cell * i as f32, 1e-6);
                assert!(center.0 < 1.0 - SCATTER_MARGIN && center.1 < 1.0 - SCATTER_MARGIN);
            }
            assert!(velocities.iter().all(|(_, v)| *v == velocities[0].1));
        }
    }

    #[test]
    fn streak_lengths_follow_brush_range() {
        let brush = Brush {
            streak_min: 4,
            streak_max: 40,
            streak_step: 2,
            ..Brush::default()
        };
        let mut rng = StdRng::seed_from_u64(23);
        let mut recorder = Recorder::default();
        random_scatter(&mut recorder, &brush, &mut rng, 1, 1.0 / 256.0, 0.001);
        let strokes = recorder.velocities.len();
        assert!((2..=20).contains(&strokes), "{strokes} strokes");
    }

    #[test]
    fn tap_jitters_around_point() {
        let brush = Brush {
            tap_jitter: 0.02,
            ..Brush::default()
        };
        let mut rng = StdRng::seed_from_u64(11);
        let mut recorder = Recorder::default();
        tap(&mut recorder, &brush, &mut rng, (0.3, 0.7), 5, 0.001);
        assert_eq!(recorder.colors.len(), 5);
        for (center, _) in &recorder.colors {
            assert!((center.0 - 0.3).abs() <= 0.02);
            assert!((center.1 - 0.7).abs() <= 0.02);
        }
    }
}
