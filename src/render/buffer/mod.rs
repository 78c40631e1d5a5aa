//! GPU buffer management

pub mod camera_buffer;
pub mod grass_buffer;

pub use camera_buffer::{CameraBuffer, CameraUniform};
pub use grass_buffer::GrassDrawBuffers;
