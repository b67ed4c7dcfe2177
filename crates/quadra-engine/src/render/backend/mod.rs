//! Rendering-context capability.
//!
//! Strategies and the renderer only talk to the GPU through [`RenderBackend`].
//! Two implementations ship with the crate:
//! - [`WgpuBackend`]: draws into a window surface
//! - [`HeadlessBackend`]: records every call, no GPU required

mod gpu;
mod headless;

pub use gpu::WgpuBackend;
pub use headless::{Command, DrawCall, HeadlessBackend};

use crate::assets::ImageHandle;
use crate::coords::{ColorRgba, Matrix3x3, Viewport};
use crate::scene::NodeKind;

use super::shader::ShaderError;

/// Handle to a compiled and linked program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProgramId(pub(crate) u32);

/// Handle to a vertex buffer of `f32` pairs.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BufferId(pub(crate) u32);

/// Handle to an uploaded RGBA8 texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureId(pub(crate) u32);

/// Uniform values consumed by the bundled programs.
///
/// A value stays set until overwritten, so per-pass values (projection,
/// camera) only need to be set once before the pass's draws.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Uniform {
    Projection(Matrix3x3),
    Camera(Matrix3x3),
    Transform(Matrix3x3),
    Color(ColorRgba),
}

/// Vertex attribute streams.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VertexStream {
    /// `vec2` positions, shader location 0.
    Position,
    /// `vec2` texture coordinates, shader location 1.
    TexCoord,
}

/// Outcome of [`RenderBackend::finish_frame`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameStatus {
    /// The frame reached the target.
    Presented,
    /// Nothing was presented this tick (transient surface error, no scene).
    Skipped,
    /// The target is gone for good; the host should shut down.
    Fatal,
}

/// Drawing operations needed by the render strategies.
///
/// Calls follow a simple state-machine model: `use_program`, uniforms and
/// bindings persist until replaced, and `draw_triangles` draws with whatever
/// is currently bound. A frame is `clear`, any number of draws, then
/// `finish_frame`.
pub trait RenderBackend {
    /// Current drawable size in pixels.
    fn surface_size(&self) -> Viewport;

    /// Compiles and links a program for `kind` from vertex and fragment sources.
    fn create_program(
        &mut self,
        kind: NodeKind,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramId, ShaderError>;

    fn release_program(&mut self, program: ProgramId);

    /// Creates a vertex buffer initialized with `data`.
    fn create_buffer(&mut self, data: &[f32]) -> BufferId;

    /// Replaces the contents of `buffer`. `data` must not be longer than the
    /// data the buffer was created with.
    fn write_buffer(&mut self, buffer: BufferId, data: &[f32]);

    fn release_buffer(&mut self, buffer: BufferId);

    fn create_texture(&mut self, image: &ImageHandle) -> TextureId;

    fn release_texture(&mut self, texture: TextureId);

    /// Starts a frame: the target is cleared to `color` and draws are limited
    /// to `viewport`.
    fn clear(&mut self, color: ColorRgba, viewport: Viewport);

    fn use_program(&mut self, program: ProgramId);

    fn set_uniform(&mut self, uniform: Uniform);

    fn bind_vertex_buffer(&mut self, stream: VertexStream, buffer: BufferId);

    fn bind_texture(&mut self, texture: TextureId);

    /// Draws `vertex_count` vertices as a triangle list.
    fn draw_triangles(&mut self, vertex_count: u32);

    /// Ends the frame started by `clear`.
    fn finish_frame(&mut self) -> FrameStatus;
}
