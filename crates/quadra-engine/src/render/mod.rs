//! Rendering subsystem.
//!
//! Flow per frame:
//! - `Renderer` clears the target to the scene color
//! - each `ProgramProxy`, in registration order, puts its program in use and
//!   lets its `RenderStrategy` draw the matching scene bucket
//! - the backend finishes the frame
//!
//! Convention:
//! - node geometry is in pixels (top-left origin, +Y down), relative to the
//!   node's translation
//! - vertex shaders compute `clip = projection · camera · transform · (p, 1)`

pub mod backend;
mod program;
mod renderer;
mod shader;
pub mod strategy;

pub use backend::{
    BufferId, Command, DrawCall, FrameStatus, HeadlessBackend, ProgramId, RenderBackend,
    TextureId, Uniform, VertexStream, WgpuBackend,
};
pub use program::{
    default_programs, ProgramDescriptor, ProgramProxy, COLOR_FRAGMENT_SHADER, COLOR_VERTEX_SHADER,
    TEXTURE_FRAGMENT_SHADER, TEXTURE_VERTEX_SHADER,
};
pub use renderer::{RenderError, Renderer};
pub use shader::{validate_program, ShaderError, ShaderStage, FRAGMENT_ENTRY, VERTEX_ENTRY};
pub use strategy::{ColorStrategy, RenderStrategy, TextureStrategy};
