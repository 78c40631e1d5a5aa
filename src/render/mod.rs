//! Renderer integration: frame inputs, depth, and the grass draw

pub mod buffer;
pub mod context;
pub mod depth;
pub mod draw;
pub mod frame;

pub use buffer::{CameraBuffer, GrassDrawBuffers};
pub use context::GpuContext;
pub use depth::DepthBuffer;
pub use draw::{GrassMesh, IndirectDrawEmitter};
pub use frame::FrameContext;
