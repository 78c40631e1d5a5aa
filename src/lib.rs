//! Meadow - grid-based wind simulation driving procedural grass

pub mod core;
pub mod math;
pub mod compute;
pub mod fluid;
pub mod wind;
pub mod terrain;
pub mod render;
pub mod grass;
pub mod scene;
