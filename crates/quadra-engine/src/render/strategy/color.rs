use crate::render::backend::{ProgramId, RenderBackend, Uniform, VertexStream};
use crate::scene::{NodeKind, Scene, VERTEX_COUNT};

use super::cache::ResourceCache;

/// Draws the `Color` bucket: one flat-colored quad per node.
///
/// Per pass: projection and camera uniforms.
/// Per node: position buffer, transform and color uniforms, 6 vertices.
#[derive(Debug, Default)]
pub struct ColorStrategy {
    cache: ResourceCache,
}

impl ColorStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        program: ProgramId,
        scene: &Scene,
    ) {
        let nodes = scene.viewport_nodes(NodeKind::Color);
        self.cache.sweep(backend, nodes);
        if nodes.is_empty() {
            return;
        }

        log::trace!("color pass: program {program:?}, {} nodes", nodes.len());

        backend.set_uniform(Uniform::Projection(*scene.projection_matrix()));
        backend.set_uniform(Uniform::Camera(*scene.camera_matrix()));

        for node in nodes {
            let buffer = self.cache.position_buffer(backend, node);
            backend.bind_vertex_buffer(VertexStream::Position, buffer);
            backend.set_uniform(Uniform::Transform(*node.local_matrix()));
            backend.set_uniform(Uniform::Color(node.color()));
            backend.draw_triangles(VERTEX_COUNT);
        }
    }

    /// Nodes currently holding GPU resources.
    pub fn cached_nodes(&self) -> usize {
        self.cache.len()
    }

    pub fn release<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        self.cache.clear(backend);
    }
}
