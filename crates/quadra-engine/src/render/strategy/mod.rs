//! Per-kind drawing strategies.
//!
//! Responsibilities:
//! - read one scene bucket and issue its draws in bucket order
//! - own the per-node GPU resources of that bucket

mod cache;
mod color;
mod texture;

pub use cache::ResourceCache;
pub use color::ColorStrategy;
pub use texture::{TextureStrategy, UNIT_TEX_COORDS};

use crate::scene::{NodeKind, Scene};

use super::backend::{ProgramId, RenderBackend};

/// Closed set of strategies, one per [`NodeKind`].
#[derive(Debug)]
pub enum RenderStrategy {
    Color(ColorStrategy),
    Texture(TextureStrategy),
}

impl RenderStrategy {
    pub fn color() -> Self {
        RenderStrategy::Color(ColorStrategy::new())
    }

    pub fn texture() -> Self {
        RenderStrategy::Texture(TextureStrategy::new())
    }

    /// Strategy drawing the bucket for `kind`.
    pub fn for_kind(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Color => Self::color(),
            NodeKind::Texture => Self::texture(),
        }
    }

    /// Bucket this strategy draws.
    pub fn kind(&self) -> NodeKind {
        match self {
            RenderStrategy::Color(_) => NodeKind::Color,
            RenderStrategy::Texture(_) => NodeKind::Texture,
        }
    }

    /// Issues every draw for this strategy's bucket of `scene`.
    ///
    /// Expects `program` to be in use already.
    pub fn render<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        program: ProgramId,
        scene: &Scene,
    ) {
        match self {
            RenderStrategy::Color(s) => s.render(backend, program, scene),
            RenderStrategy::Texture(s) => s.render(backend, program, scene),
        }
    }

    pub fn cached_nodes(&self) -> usize {
        match self {
            RenderStrategy::Color(s) => s.cached_nodes(),
            RenderStrategy::Texture(s) => s.cached_nodes(),
        }
    }

    /// Releases every GPU resource the strategy owns.
    pub fn release<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        match self {
            RenderStrategy::Color(s) => s.release(backend),
            RenderStrategy::Texture(s) => s.release(backend),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ImageHandle;
    use crate::coords::{ColorRgba, Matrix3x3, Vec2};
    use crate::render::backend::{Command, HeadlessBackend, Uniform, VertexStream};
    use crate::scene::{Node, VERTEX_COUNT};

    const PROGRAM: ProgramId = ProgramId(99);

    fn scene() -> Scene {
        Scene::new(800.0, 600.0)
    }

    fn textured(image: Option<ImageHandle>) -> Node {
        let mut n = Node::new(Vec2::new(50.0, 50.0));
        if let Some(image) = image {
            n.set_texture(image);
        }
        n.set_kind(NodeKind::Texture);
        n
    }

    // ── dispatch ──────────────────────────────────────────────────────────

    #[test]
    fn kind_matches_variant() {
        for kind in NodeKind::ALL {
            assert_eq!(RenderStrategy::for_kind(kind).kind(), kind);
        }
    }

    #[test]
    fn strategy_ignores_other_buckets() {
        let mut backend = HeadlessBackend::default();
        let mut scene = scene();
        scene.insert_node(textured(None));

        RenderStrategy::color().render(&mut backend, PROGRAM, &scene);

        assert!(backend.commands().is_empty());
    }

    // ── color ─────────────────────────────────────────────────────────────

    #[test]
    fn color_draws_each_node_in_bucket_order() {
        let mut backend = HeadlessBackend::default();
        let mut scene = scene();
        let red = ColorRgba::new(1.0, 0.0, 0.0, 1.0);
        let blue = ColorRgba::new(0.0, 0.0, 1.0, 1.0);
        let a = Node::new(Vec2::new(50.0, 50.0))
            .with_position(Vec2::new(50.0, 50.0))
            .with_color(red);
        let b = Node::new(Vec2::new(10.0, 10.0))
            .with_position(Vec2::new(200.0, 100.0))
            .with_color(blue);
        scene.insert_node(a);
        scene.insert_node(b);

        let mut strategy = RenderStrategy::color();
        strategy.render(&mut backend, PROGRAM, &scene);

        let draws = backend.draw_calls();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].color, red);
        assert_eq!(draws[1].color, blue);
        assert_eq!(
            draws[0].transform,
            Matrix3x3::from_translation(Vec2::new(50.0, 50.0))
        );
        assert_eq!(draws[0].projection, *scene.projection_matrix());
        assert_eq!(draws[0].camera, Matrix3x3::IDENTITY);
        assert!(draws.iter().all(|d| d.vertex_count == VERTEX_COUNT));
        assert!(draws.iter().all(|d| d.texture.is_none() && d.tex_coord.is_none()));

        let first = draws[0].position.unwrap();
        assert_eq!(
            backend.buffer_data(first),
            Some(&[0.0, 0.0, 50.0, 0.0, 0.0, 50.0, 0.0, 50.0, 50.0, 0.0, 50.0, 50.0][..])
        );
    }

    #[test]
    fn projection_and_camera_set_once_per_pass() {
        let mut backend = HeadlessBackend::default();
        let mut scene = scene();
        for _ in 0..3 {
            scene.insert_node(Node::new(Vec2::new(5.0, 5.0)));
        }

        RenderStrategy::color().render(&mut backend, PROGRAM, &scene);

        let projections = backend.count(|c| matches!(c, Command::SetUniform(Uniform::Projection(_))));
        let transforms = backend.count(|c| matches!(c, Command::SetUniform(Uniform::Transform(_))));
        assert_eq!(projections, 1);
        assert_eq!(transforms, 3);
    }

    #[test]
    fn buffers_reused_across_frames_and_released_after_removal() {
        let mut backend = HeadlessBackend::default();
        let mut scene = scene();
        let node = Node::new(Vec2::new(50.0, 50.0));
        let id = node.id();
        scene.insert_node(node);

        let mut strategy = RenderStrategy::color();
        for _ in 0..5 {
            strategy.render(&mut backend, PROGRAM, &scene);
        }
        assert_eq!(backend.count(|c| matches!(c, Command::CreateBuffer(_))), 1);
        assert_eq!(strategy.cached_nodes(), 1);

        assert!(scene.remove_node(id));
        strategy.render(&mut backend, PROGRAM, &scene);

        assert_eq!(backend.count(|c| matches!(c, Command::ReleaseBuffer(_))), 1);
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(strategy.cached_nodes(), 0);
    }

    #[test]
    fn empty_bucket_issues_no_draws() {
        let mut backend = HeadlessBackend::default();
        RenderStrategy::color().render(&mut backend, PROGRAM, &scene());
        RenderStrategy::texture().render(&mut backend, PROGRAM, &scene());
        assert!(backend.draw_calls().is_empty());
    }

    // ── texture ───────────────────────────────────────────────────────────

    #[test]
    fn texture_binds_image_and_shared_tex_coords() {
        let mut backend = HeadlessBackend::default();
        let mut scene = scene();
        let image = ImageHandle::solid("sleeve", 2, 2, [9; 4]);
        scene.insert_node(textured(Some(image.clone())));
        scene.insert_node(textured(Some(image.clone())));

        let mut strategy = RenderStrategy::texture();
        strategy.render(&mut backend, PROGRAM, &scene);

        let draws = backend.draw_calls();
        assert_eq!(draws.len(), 2);

        let uv = draws[0].tex_coord.unwrap();
        assert_eq!(draws[1].tex_coord, Some(uv));
        assert_eq!(backend.buffer_data(uv), Some(&UNIT_TEX_COORDS[..]));

        for d in &draws {
            let texture = d.texture.unwrap();
            assert_eq!(backend.texture_image(texture), Some(&image));
        }
        assert_ne!(draws[0].texture, draws[1].texture);
    }

    #[test]
    fn node_without_texture_issues_no_bind() {
        let mut backend = HeadlessBackend::default();
        let mut scene = scene();
        scene.insert_node(textured(None));

        RenderStrategy::texture().render(&mut backend, PROGRAM, &scene);

        assert_eq!(backend.count(|c| matches!(c, Command::BindTexture(_))), 0);
        assert_eq!(backend.count(|c| matches!(c, Command::Draw(_))), 1);
        assert_eq!(
            backend.count(|c| matches!(c, Command::BindVertexBuffer(VertexStream::TexCoord, _))),
            1
        );
    }

    #[test]
    fn untextured_node_keeps_previous_binding() {
        let mut backend = HeadlessBackend::default();
        let mut scene = scene();
        scene.insert_node(textured(Some(ImageHandle::solid("t", 1, 1, [9; 4]))));
        scene.insert_node(textured(None));

        RenderStrategy::texture().render(&mut backend, PROGRAM, &scene);

        let draws = backend.draw_calls();
        assert_eq!(draws.len(), 2);
        assert!(draws[0].texture.is_some());
        assert_eq!(draws[1].texture, draws[0].texture);
    }

    #[test]
    fn texture_uploaded_once_across_frames() {
        let mut backend = HeadlessBackend::default();
        let mut scene = scene();
        scene.insert_node(textured(Some(ImageHandle::solid("t", 1, 1, [0; 4]))));

        let mut strategy = RenderStrategy::texture();
        for _ in 0..3 {
            strategy.render(&mut backend, PROGRAM, &scene);
        }

        assert_eq!(backend.count(|c| matches!(c, Command::CreateTexture(_))), 1);
        assert_eq!(backend.count(|c| matches!(c, Command::BindTexture(_))), 3);
    }

    #[test]
    fn release_frees_shared_and_node_resources() {
        let mut backend = HeadlessBackend::default();
        let mut scene = scene();
        scene.insert_node(textured(Some(ImageHandle::solid("t", 1, 1, [0; 4]))));

        let mut strategy = RenderStrategy::texture();
        strategy.render(&mut backend, PROGRAM, &scene);
        assert_eq!(backend.live_buffers(), 2);

        strategy.release(&mut backend);

        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(backend.live_textures(), 0);
    }
}
