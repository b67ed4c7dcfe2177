use std::borrow::Cow;

use crate::scene::{NodeKind, Scene};

use super::backend::{ProgramId, RenderBackend};
use super::strategy::RenderStrategy;

pub const COLOR_VERTEX_SHADER: &str = include_str!("shaders/color.vert.wgsl");
pub const COLOR_FRAGMENT_SHADER: &str = include_str!("shaders/color.frag.wgsl");
pub const TEXTURE_VERTEX_SHADER: &str = include_str!("shaders/texture.vert.wgsl");
pub const TEXTURE_FRAGMENT_SHADER: &str = include_str!("shaders/texture.frag.wgsl");

/// Input for building one [`ProgramProxy`].
///
/// The program's kind is the strategy's kind.
#[derive(Debug)]
pub struct ProgramDescriptor {
    pub strategy: RenderStrategy,
    pub vertex_source: Cow<'static, str>,
    pub fragment_source: Cow<'static, str>,
}

impl ProgramDescriptor {
    pub fn new(
        strategy: RenderStrategy,
        vertex_source: impl Into<Cow<'static, str>>,
        fragment_source: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            strategy,
            vertex_source: vertex_source.into(),
            fragment_source: fragment_source.into(),
        }
    }

    /// Bundled flat-color program.
    pub fn color() -> Self {
        Self::new(RenderStrategy::color(), COLOR_VERTEX_SHADER, COLOR_FRAGMENT_SHADER)
    }

    /// Bundled image program.
    pub fn texture() -> Self {
        Self::new(
            RenderStrategy::texture(),
            TEXTURE_VERTEX_SHADER,
            TEXTURE_FRAGMENT_SHADER,
        )
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.strategy.kind()
    }
}

/// Bundled programs in draw order: colored quads first, then textured quads.
pub fn default_programs() -> Vec<ProgramDescriptor> {
    vec![ProgramDescriptor::color(), ProgramDescriptor::texture()]
}

/// A linked program bound to the strategy that draws its bucket.
#[derive(Debug)]
pub struct ProgramProxy {
    program: ProgramId,
    kind: NodeKind,
    strategy: RenderStrategy,
}

impl ProgramProxy {
    pub fn new(program: ProgramId, strategy: RenderStrategy) -> Self {
        Self {
            program,
            kind: strategy.kind(),
            strategy,
        }
    }

    #[inline]
    pub fn program(&self) -> ProgramId {
        self.program
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[inline]
    pub fn strategy(&self) -> &RenderStrategy {
        &self.strategy
    }

    /// Runs the strategy against `scene`. The program must already be in use.
    pub fn render<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, scene: &Scene) {
        self.strategy.render(backend, self.program, scene);
    }

    /// Releases strategy resources, then the program itself.
    pub fn release<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        self.strategy.release(backend);
        backend.release_program(self.program);
    }
}
