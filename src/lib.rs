mod advect;
mod boundary;
mod color;
mod config;
mod dye;
mod error;
mod field;
mod grid;
mod ping_pong;
mod sim;
pub mod splat;
mod vec2;
pub mod velocity;

pub use advect::{advect_into, AdvectParams, FrozenRegion};
pub use boundary::{BoundaryMode, BoundaryPolicy, FieldKind, PressureBoundary};
pub use color::Rgba;
pub use config::{Brush, SimConfig};
pub use dye::advect_dye;
pub use error::{ConfigError, SimError};
pub use field::{CellValue, Field2, Interpolation};
pub use grid::{Grid2, ResolvedTap};
pub use ping_pong::{FieldHandle, PingPong};
pub use sim::{Simulation, StepStats};
pub use splat::{apply_splat, SplatTarget};
pub use vec2::Vec2;
pub use velocity::{VelocitySettings, VelocityStage, VelocityWorkspace};
