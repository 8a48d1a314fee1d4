use crate::boundary::BoundaryMode;
use crate::grid::Grid2;
use crate::{Rgba, Vec2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

const PAR_THRESHOLD_DEFAULT: usize = 65_536;
const PAR_MIN_WORK_PER_THREAD: usize = 4096;

fn parallel_threshold() -> usize {
    static THRESHOLD: OnceLock<usize> = OnceLock::new();
    *THRESHOLD.get_or_init(|| {
        std::env::var("MARBLING_PAR_THRESHOLD")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(PAR_THRESHOLD_DEFAULT)
    })
}

fn should_parallel(len: usize) -> bool {
    if len < parallel_threshold() {
        return false;
    }
    let threads = rayon::current_num_threads().max(1);
    len / threads >= PAR_MIN_WORK_PER_THREAD
}

/// Value stored in one grid cell.
pub trait CellValue: Copy + Send + Sync + PartialEq + fmt::Debug {
    fn zero() -> Self;
    fn add(self, other: Self) -> Self;
    fn sub(self, other: Self) -> Self;
    fn scale(self, s: f32) -> Self;
    fn magnitude(self) -> f32;

    /// Negates the components normal to the mirrored axes. Values without a
    /// direction are unchanged.
    fn reflect(self, _flip_x: bool, _flip_y: bool) -> Self {
        self
    }

    fn lerp(self, other: Self, t: f32) -> Self {
        self.add(other.sub(self).scale(t))
    }
}

impl CellValue for f32 {
    fn zero() -> Self {
        0.0
    }

    fn add(self, other: Self) -> Self {
        self + other
    }

    fn sub(self, other: Self) -> Self {
        self - other
    }

    fn scale(self, s: f32) -> Self {
        self * s
    }

    fn magnitude(self) -> f32 {
        self.abs()
    }
}

impl CellValue for Vec2 {
    fn zero() -> Self {
        Vec2::zero()
    }

    fn add(self, other: Self) -> Self {
        Vec2::add(self, other)
    }

    fn sub(self, other: Self) -> Self {
        Vec2::sub(self, other)
    }

    fn scale(self, s: f32) -> Self {
        Vec2::scale(self, s)
    }

    fn magnitude(self) -> f32 {
        self.length()
    }

    fn reflect(self, flip_x: bool, flip_y: bool) -> Self {
        Vec2::new(
            if flip_x { -self.x } else { self.x },
            if flip_y { -self.y } else { self.y },
        )
    }
}

impl CellValue for Rgba {
    fn zero() -> Self {
        Rgba::transparent()
    }

    fn add(self, other: Self) -> Self {
        Rgba::add(self, other)
    }

    fn sub(self, other: Self) -> Self {
        Rgba::sub(self, other)
    }

    fn scale(self, s: f32) -> Self {
        Rgba::scale(self, s)
    }

    fn magnitude(self) -> f32 {
        self.max_channel()
    }
}

/// Resampling used when a stage reads a field at a fractional position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
}

fn fill_indexed<T: CellValue>(
    data: &mut [T],
    width: usize,
    parallel: bool,
    f: impl Fn(usize, usize, T) -> T + Sync,
) {
    if parallel {
        data.par_iter_mut().enumerate().for_each(|(i, value)| {
            let x = i % width;
            let y = i / width;
            *value = f(x, y, *value);
        });
    } else {
        for (i, value) in data.iter_mut().enumerate() {
            let x = i % width;
            let y = i / width;
            *value = f(x, y, *value);
        }
    }
}

/// One buffer of cell values over a [`Grid2`], row-major.
#[derive(Clone, PartialEq)]
pub struct Field2<T> {
    grid: Grid2,
    data: Vec<T>,
}

impl<T> fmt::Debug for Field2<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field2")
            .field("grid", &self.grid)
            .field("cells", &self.data.len())
            .finish()
    }
}

impl<T: CellValue> Field2<T> {
    pub fn new(grid: Grid2, fill: T) -> Self {
        let data = vec![fill; grid.size()];
        Self { grid, data }
    }

    pub fn from_fn(grid: Grid2, f: impl Fn(usize, usize) -> T + Sync) -> Self {
        let mut field = Self::new(grid, T::zero());
        field.fill_with_index(f);
        field
    }

    pub fn grid(&self) -> Grid2 {
        self.grid
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[self.grid.idx(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let i = self.grid.idx(x, y);
        self.data[i] = value;
    }

    /// Reads a cell by signed index, resolving out-of-range taps through `mode`.
    pub fn sample_cell(&self, x: i32, y: i32, mode: BoundaryMode) -> T {
        let tap = self.grid.resolve(x, y, mode);
        self.get(tap.x, tap.y).reflect(tap.flip_x, tap.flip_y)
    }

    /// Reads the field at a normalized position.
    pub fn sample(&self, pos: (f32, f32), mode: BoundaryMode, interpolation: Interpolation) -> T {
        match interpolation {
            Interpolation::Nearest => self.sample_nearest(pos, mode),
            Interpolation::Bilinear => self.sample_linear(pos, mode),
        }
    }

    fn folded_cell_space(&self, pos: (f32, f32), mode: BoundaryMode) -> (f32, f32) {
        let (gx, gy) = self.grid.to_cell_space(pos);
        (
            mode.fold_coordinate(gx, self.grid.width()),
            mode.fold_coordinate(gy, self.grid.height()),
        )
    }

    pub fn sample_nearest(&self, pos: (f32, f32), mode: BoundaryMode) -> T {
        let (gx, gy) = self.folded_cell_space(pos, mode);
        let x = (gx + 0.5).floor() as i32;
        let y = (gy + 0.5).floor() as i32;
        self.sample_cell(x, y, mode)
    }

    pub fn sample_linear(&self, pos: (f32, f32), mode: BoundaryMode) -> T {
        let (gx, gy) = self.folded_cell_space(pos, mode);
        let x0 = gx.floor() as i32;
        let y0 = gy.floor() as i32;
        let x1 = x0 + 1;
        let y1 = y0 + 1;
        let sx = gx - x0 as f32;
        let sy = gy - y0 as f32;
        let v00 = self.sample_cell(x0, y0, mode);
        let v10 = self.sample_cell(x1, y0, mode);
        let v01 = self.sample_cell(x0, y1, mode);
        let v11 = self.sample_cell(x1, y1, mode);
        let vx0 = v00.lerp(v10, sx);
        let vx1 = v01.lerp(v11, sx);
        vx0.lerp(vx1, sy)
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Overwrites every cell with `f(x, y)`. Cells are independent, so large
    /// grids are split across the rayon pool.
    pub fn fill_with_index(&mut self, f: impl Fn(usize, usize) -> T + Sync) {
        let parallel = should_parallel(self.data.len());
        fill_indexed(&mut self.data, self.grid.width(), parallel, |x, y, _| f(x, y));
    }

    pub fn update_with_index(&mut self, f: impl Fn(usize, usize, T) -> T + Sync) {
        let parallel = should_parallel(self.data.len());
        fill_indexed(&mut self.data, self.grid.width(), parallel, f);
    }

    pub fn sum_with(&self, f: impl Fn(T) -> f32 + Sync + Send) -> f32 {
        if should_parallel(self.data.len()) {
            self.data.par_iter().map(|value| f(*value)).sum()
        } else {
            self.data.iter().map(|value| f(*value)).sum()
        }
    }

    pub fn max_magnitude(&self) -> f32 {
        if should_parallel(self.data.len()) {
            self.data
                .par_iter()
                .map(|value| value.magnitude())
                .reduce(|| 0.0_f32, f32::max)
        } else {
            self.data
                .iter()
                .map(|value| value.magnitude())
                .fold(0.0_f32, f32::max)
        }
    }

    pub fn assert_same_grid(&self, other: &Self) {
        assert_eq!(self.grid, other.grid, "field grid mismatch");
    }
}

impl Field2<f32> {
    pub fn mean_abs(&self) -> f32 {
        self.sum_with(f32::abs) / self.data.len() as f32
    }
}
