use crate::field::{CellValue, Field2};
use crate::grid::Grid2;

/// Identifies which buffer of a [`PingPong`] is current and how many swaps
/// produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldHandle {
    pub slot: u8,
    pub generation: u64,
}

/// A field with two storage slots. Readers only ever see the current slot;
/// stages write the back slot and then [`swap`](Self::swap).
#[derive(Clone, Debug)]
pub struct PingPong<T> {
    buffers: [Field2<T>; 2],
    current: usize,
    generation: u64,
}

impl<T: CellValue> PingPong<T> {
    pub fn new(grid: Grid2, fill: T) -> Self {
        Self {
            buffers: [Field2::new(grid, fill), Field2::new(grid, fill)],
            current: 0,
            generation: 0,
        }
    }

    pub fn grid(&self) -> Grid2 {
        self.buffers[0].grid()
    }

    pub fn current(&self) -> &Field2<T> {
        &self.buffers[self.current]
    }

    /// Live buffer for in-place edits between steps (splats, resets).
    pub fn current_mut(&mut self) -> &mut Field2<T> {
        &mut self.buffers[self.current]
    }

    pub fn back_mut(&mut self) -> &mut Field2<T> {
        &mut self.buffers[1 - self.current]
    }

    /// Borrows the current slot for reading and the back slot for writing.
    pub fn split(&mut self) -> (&Field2<T>, &mut Field2<T>) {
        let (first, second) = self.buffers.split_at_mut(1);
        if self.current == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        }
    }

    pub fn swap(&mut self) {
        self.current = 1 - self.current;
        self.generation += 1;
    }

    pub fn handle(&self) -> FieldHandle {
        FieldHandle {
            slot: self.current as u8,
            generation: self.generation,
        }
    }

    /// Fills the current slot. The back slot is left alone; every stage
    /// overwrites it fully before it becomes current.
    pub fn fill(&mut self, value: T) {
        self.current_mut().fill(value);
    }
}
