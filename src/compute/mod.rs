//! Data-parallel compute primitives.
//!
//! Every simulation or generation pass is expressed as a dispatch: one
//! logical thread per output element, reading from bound inputs and writing
//! only its own output slot. Dispatches run on the rayon thread pool and
//! complete before the caller issues the next one.

pub mod append;
pub mod dispatch;
pub mod ping_pong;
pub mod texture;

pub use append::AppendBuffer;
pub use dispatch::{dispatch_1d, dispatch_2d, GROUP_SIZE};
pub use ping_pong::SimGrid;
pub use texture::Texture2D;

use std::ops::{Add, Mul, Sub};

/// Element type of a grid or texture that supports linear filtering.
pub trait Cell:
    Copy + Default + Send + Sync + Add<Output = Self> + Sub<Output = Self> + Mul<f32, Output = Self>
{
}

impl<T> Cell for T where
    T: Copy + Default + Send + Sync + Add<Output = T> + Sub<Output = T> + Mul<f32, Output = T>
{
}
