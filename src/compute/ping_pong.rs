//! Double-buffered simulation grid.

use crate::core::error::Error;
use crate::core::types::Result;

/// Square grid with a `read` buffer holding the last completed step and a
/// `write` buffer used as scratch by the next dispatch.
///
/// Kernels never see a single buffer that is both input and output: they
/// take `(read, write)` from [`SimGrid::read_write`], fill `write`, and the
/// caller then calls [`SimGrid::swap`].
#[derive(Clone, Debug)]
pub struct SimGrid<T> {
    resolution: u32,
    read: Vec<T>,
    write: Vec<T>,
}

impl<T: Copy + Default> SimGrid<T> {
    /// Allocate both buffers, zero (default) filled.
    pub fn new(resolution: u32) -> Result<Self> {
        if resolution == 0 {
            return Err(Error::config("simulation grid resolution must be non-zero"));
        }
        let len = (resolution as usize) * (resolution as usize);
        Ok(Self {
            resolution,
            read: vec![T::default(); len],
            write: vec![T::default(); len],
        })
    }

    /// Seed both buffers with `value` so a read before any write is defined.
    pub fn initialize(&mut self, value: T) {
        self.read.fill(value);
        self.write.fill(value);
    }

    /// Seed both buffers with the same per-cell data.
    pub fn initialize_from(&mut self, data: &[T]) -> Result<()> {
        if data.len() != self.read.len() {
            return Err(Error::config(format!(
                "grid seed has {} cells, expected {}",
                data.len(),
                self.read.len()
            )));
        }
        self.read.copy_from_slice(data);
        self.write.copy_from_slice(data);
        Ok(())
    }

    /// Exchange the roles of the two buffers. O(1), never copies.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.read, &mut self.write);
    }

    /// Output of the most recently completed step.
    pub fn read(&self) -> &[T] {
        &self.read
    }

    /// Scratch buffer for the next dispatch.
    pub fn write(&mut self) -> &mut [T] {
        &mut self.write
    }

    /// Bind both buffers for a dispatch that reads its own previous state.
    pub fn read_write(&mut self) -> (&[T], &mut [T]) {
        (&self.read, &mut self.write)
    }

    /// Cells per side
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Row-major index of cell `(x, y)`
    pub fn index(&self, x: u32, y: u32) -> usize {
        (x + y * self.resolution) as usize
    }

    /// Value of cell `(x, y)` in the read buffer
    pub fn get(&self, x: u32, y: u32) -> T {
        self.read[self.index(x, y)]
    }
}
