use std::collections::HashMap;

use crate::assets::ImageHandle;
use crate::coords::{ColorRgba, Matrix3x3, Viewport};
use crate::render::shader::{self, ShaderError};
use crate::scene::NodeKind;

use super::{BufferId, FrameStatus, ProgramId, RenderBackend, TextureId, Uniform, VertexStream};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateProgram(ProgramId, NodeKind),
    ReleaseProgram(ProgramId),
    CreateBuffer(BufferId),
    WriteBuffer(BufferId),
    ReleaseBuffer(BufferId),
    CreateTexture(TextureId),
    ReleaseTexture(TextureId),
    Clear(ColorRgba, Viewport),
    UseProgram(ProgramId),
    SetUniform(Uniform),
    BindVertexBuffer(VertexStream, BufferId),
    BindTexture(TextureId),
    Draw(u32),
    FinishFrame,
}

/// Bound state captured at a draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub program: Option<ProgramId>,
    pub position: Option<BufferId>,
    pub tex_coord: Option<BufferId>,
    pub texture: Option<TextureId>,
    pub projection: Matrix3x3,
    pub camera: Matrix3x3,
    pub transform: Matrix3x3,
    pub color: ColorRgba,
    pub vertex_count: u32,
}

/// Backend that records calls instead of drawing.
///
/// Programs are validated exactly like the GPU backend validates them, so
/// shader errors surface the same way. Buffer contents and textures are kept
/// so callers can inspect what would have been uploaded.
#[derive(Debug)]
pub struct HeadlessBackend {
    size: Viewport,
    next_id: u32,
    commands: Vec<Command>,
    programs: HashMap<ProgramId, NodeKind>,
    buffers: HashMap<BufferId, Vec<f32>>,
    textures: HashMap<TextureId, ImageHandle>,
    frames: u64,
}

impl HeadlessBackend {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Viewport::new(width, height),
            next_id: 1,
            commands: Vec::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            frames: 0,
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.size = Viewport::new(width, height);
    }

    /// Every call recorded since creation (or the last [`Self::take_commands`]).
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Replays the recorded calls and returns the state seen by each draw.
    pub fn draw_calls(&self) -> Vec<DrawCall> {
        let mut state = DrawCall {
            program: None,
            position: None,
            tex_coord: None,
            texture: None,
            projection: Matrix3x3::IDENTITY,
            camera: Matrix3x3::IDENTITY,
            transform: Matrix3x3::IDENTITY,
            color: ColorRgba::black(),
            vertex_count: 0,
        };
        let mut draws = Vec::new();

        for cmd in &self.commands {
            match cmd {
                Command::UseProgram(p) => state.program = Some(*p),
                Command::SetUniform(Uniform::Projection(m)) => state.projection = *m,
                Command::SetUniform(Uniform::Camera(m)) => state.camera = *m,
                Command::SetUniform(Uniform::Transform(m)) => state.transform = *m,
                Command::SetUniform(Uniform::Color(c)) => state.color = *c,
                Command::BindVertexBuffer(VertexStream::Position, b) => state.position = Some(*b),
                Command::BindVertexBuffer(VertexStream::TexCoord, b) => state.tex_coord = Some(*b),
                Command::BindTexture(t) => state.texture = Some(*t),
                Command::Draw(count) => {
                    state.vertex_count = *count;
                    draws.push(state.clone());
                }
                _ => {}
            }
        }

        draws
    }

    /// Number of `Command`s matching `pred`.
    pub fn count(&self, pred: impl Fn(&Command) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    pub fn buffer_data(&self, buffer: BufferId) -> Option<&[f32]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    pub fn texture_image(&self, texture: TextureId) -> Option<&ImageHandle> {
        self.textures.get(&texture)
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Frames completed with `finish_frame`.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn alloc(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

impl RenderBackend for HeadlessBackend {
    fn surface_size(&self) -> Viewport {
        self.size
    }

    fn create_program(
        &mut self,
        kind: NodeKind,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramId, ShaderError> {
        shader::validate_program(kind, vertex_source, fragment_source)?;

        let id = ProgramId(self.alloc());
        self.programs.insert(id, kind);
        self.commands.push(Command::CreateProgram(id, kind));
        Ok(id)
    }

    fn release_program(&mut self, program: ProgramId) {
        if self.programs.remove(&program).is_none() {
            log::warn!("release of unknown program {program:?}");
        }
        self.commands.push(Command::ReleaseProgram(program));
    }

    fn create_buffer(&mut self, data: &[f32]) -> BufferId {
        let id = BufferId(self.alloc());
        self.buffers.insert(id, data.to_vec());
        self.commands.push(Command::CreateBuffer(id));
        id
    }

    fn write_buffer(&mut self, buffer: BufferId, data: &[f32]) {
        match self.buffers.get_mut(&buffer) {
            Some(stored) => {
                let n = data.len().min(stored.len());
                stored[..n].copy_from_slice(&data[..n]);
            }
            None => log::warn!("write to unknown buffer {buffer:?}"),
        }
        self.commands.push(Command::WriteBuffer(buffer));
    }

    fn release_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(&buffer).is_none() {
            log::warn!("release of unknown buffer {buffer:?}");
        }
        self.commands.push(Command::ReleaseBuffer(buffer));
    }

    fn create_texture(&mut self, image: &ImageHandle) -> TextureId {
        let id = TextureId(self.alloc());
        self.textures.insert(id, image.clone());
        self.commands.push(Command::CreateTexture(id));
        id
    }

    fn release_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture).is_none() {
            log::warn!("release of unknown texture {texture:?}");
        }
        self.commands.push(Command::ReleaseTexture(texture));
    }

    fn clear(&mut self, color: ColorRgba, viewport: Viewport) {
        self.commands.push(Command::Clear(color, viewport));
    }

    fn use_program(&mut self, program: ProgramId) {
        self.commands.push(Command::UseProgram(program));
    }

    fn set_uniform(&mut self, uniform: Uniform) {
        self.commands.push(Command::SetUniform(uniform));
    }

    fn bind_vertex_buffer(&mut self, stream: VertexStream, buffer: BufferId) {
        self.commands.push(Command::BindVertexBuffer(stream, buffer));
    }

    fn bind_texture(&mut self, texture: TextureId) {
        self.commands.push(Command::BindTexture(texture));
    }

    fn draw_triangles(&mut self, vertex_count: u32) {
        self.commands.push(Command::Draw(vertex_count));
    }

    fn finish_frame(&mut self) -> FrameStatus {
        self.frames += 1;
        self.commands.push(Command::FinishFrame);
        FrameStatus::Presented
    }
}
