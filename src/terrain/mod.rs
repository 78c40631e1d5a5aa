//! Procedural heightmap terrain

pub mod buffer;
pub mod generator;

pub use buffer::TerrainBuffer;
pub use generator::{TerrainConfig, TerrainGenerator, TerrainTexel};
