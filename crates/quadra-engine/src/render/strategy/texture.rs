use crate::render::backend::{BufferId, ProgramId, RenderBackend, Uniform, VertexStream};
use crate::scene::{NodeKind, Scene, GEOMETRY_LEN, VERTEX_COUNT};

use super::cache::ResourceCache;

/// Texture coordinates shared by every textured quad, in geometry vertex order.
pub const UNIT_TEX_COORDS: [f32; GEOMETRY_LEN] = [
    0.0, 0.0, //
    1.0, 0.0, //
    0.0, 1.0, //
    0.0, 1.0, //
    1.0, 0.0, //
    1.0, 1.0,
];

/// Draws the `Texture` bucket: one image-mapped quad per node.
///
/// A node without a texture is drawn with whatever texture is currently
/// bound; no bind is issued for it.
#[derive(Debug, Default)]
pub struct TextureStrategy {
    cache: ResourceCache,
    tex_coords: Option<BufferId>,
}

impl TextureStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        program: ProgramId,
        scene: &Scene,
    ) {
        let nodes = scene.viewport_nodes(NodeKind::Texture);
        self.cache.sweep(backend, nodes);
        if nodes.is_empty() {
            return;
        }

        log::trace!("texture pass: program {program:?}, {} nodes", nodes.len());

        let tex_coords = *self
            .tex_coords
            .get_or_insert_with(|| backend.create_buffer(&UNIT_TEX_COORDS));

        backend.set_uniform(Uniform::Projection(*scene.projection_matrix()));
        backend.set_uniform(Uniform::Camera(*scene.camera_matrix()));

        for node in nodes {
            let buffer = self.cache.position_buffer(backend, node);
            backend.bind_vertex_buffer(VertexStream::Position, buffer);
            backend.bind_vertex_buffer(VertexStream::TexCoord, tex_coords);

            match self.cache.texture(backend, node) {
                Some(texture) => backend.bind_texture(texture),
                None => log::trace!("node {:?} has no texture; drawing with current binding", node.id()),
            }

            backend.set_uniform(Uniform::Transform(*node.local_matrix()));
            backend.draw_triangles(VERTEX_COUNT);
        }
    }

    /// Nodes currently holding GPU resources.
    pub fn cached_nodes(&self) -> usize {
        self.cache.len()
    }

    pub fn release<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        self.cache.clear(backend);
        if let Some(buffer) = self.tex_coords.take() {
            backend.release_buffer(buffer);
        }
    }
}
