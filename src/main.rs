use anyhow::{Context, Result};
use marbling_sim::{splat, FrozenRegion, SimConfig, Simulation, Vec2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::f32::consts::TAU;
use std::time::Instant;

const GRID_WIDTH: usize = 256;
const GRID_HEIGHT: usize = 256;
const FRAMES: usize = 600;
const STROKE_FRAMES: usize = 120;
const REPORT_EVERY: usize = 60;

fn load_config() -> Result<SimConfig> {
    match std::env::args().nth(1) {
        Some(path) => SimConfig::load(&path).with_context(|| format!("loading config {path}")),
        None => Ok(SimConfig::default()),
    }
}

/// Pointer position of the scripted circular drag at `frame`.
fn drag_position(frame: usize) -> (f32, f32) {
    let angle = frame as f32 / STROKE_FRAMES as f32 * TAU;
    (0.5 + 0.25 * angle.cos(), 0.5 + 0.25 * angle.sin())
}

fn main() -> Result<()> {
    env_logger::init();
    let config = load_config()?;
    let mut sim = Simulation::new(GRID_WIDTH, GRID_HEIGHT, &config)?;
    let mut rng = StdRng::seed_from_u64(0x6d61_7262);
    let brush = &config.brush;
    let radius = config.splat_radius;
    let cell_size = sim.grid().cell_size();

    splat::random_scatter(&mut sim, brush, &mut rng, brush.random_amount, cell_size, radius);
    splat::rake(&mut sim, brush, (0.5, 0.2), Vec2::new(0.0, 0.01), radius);
    splat::tap(&mut sim, brush, &mut rng, (0.8, 0.8), brush.tap_count, radius);

    let frame_time = 1.0 / config.target_fps;
    let started = Instant::now();
    let mut previous = drag_position(0);
    for frame in 0..FRAMES {
        if frame < STROKE_FRAMES {
            let pos = drag_position(frame + 1);
            let drag = Vec2::new(pos.0 - previous.0, pos.1 - previous.1);
            splat::stroke(&mut sim, brush, pos, drag, radius);
            previous = pos;
        }
        if frame == FRAMES / 2 {
            sim.set_frozen_region(Some(FrozenRegion::from_corners((0.1, 0.1), (0.35, 0.35))));
        }
        sim.advance(&config, frame_time);
        if (frame + 1) % REPORT_EVERY == 0 {
            let stats = sim.stats(&config);
            log::info!(
                "frame {:>4}: max speed {:.4}, mean |div| {:.3e}, dye mass {:.2}",
                frame + 1,
                stats.max_speed,
                stats.mean_abs_divergence,
                stats.dye_mass
            );
        }
    }
    let elapsed = started.elapsed();
    let stats = sim.stats(&config);
    println!(
        "{} frames on {}x{} in {:.2?} ({:.2} ms/frame), final max speed {:.4}",
        FRAMES,
        GRID_WIDTH,
        GRID_HEIGHT,
        elapsed,
        elapsed.as_secs_f64() * 1000.0 / FRAMES as f64,
        stats.max_speed
    );
    Ok(())
}
