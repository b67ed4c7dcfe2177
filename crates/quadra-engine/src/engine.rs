use crate::render::{FrameStatus, ProgramDescriptor, RenderBackend, Renderer};
use crate::scene::Scene;

/// Top-level context: scenes, the renderer and the backend it draws with.
///
/// Built once by the host with [`Engine::new`]; there is no global instance.
/// The host calls [`Engine::render`] once per frame tick.
pub struct Engine<B: RenderBackend> {
    scenes: Vec<Scene>,
    active_scene: usize,
    renderer: Renderer,
    backend: B,
}

impl<B: RenderBackend> Engine<B> {
    /// Builds the renderer's programs on `backend`.
    ///
    /// A program that fails to build leaves the engine with an empty renderer
    /// (see [`Renderer::new`]); frames are still cleared.
    pub fn new(mut backend: B, descriptors: Vec<ProgramDescriptor>) -> Self {
        let renderer = Renderer::new(&mut backend, descriptors);
        log::debug!("engine ready with {} programs", renderer.proxies().len());

        Self {
            scenes: Vec::new(),
            active_scene: 0,
            renderer,
            backend,
        }
    }

    /// Adds a scene and returns its index. The first scene becomes active.
    pub fn insert_scene(&mut self, scene: Scene) -> usize {
        self.scenes.push(scene);
        self.scenes.len() - 1
    }

    pub fn active_scene(&self) -> Option<&Scene> {
        self.scenes.get(self.active_scene)
    }

    pub fn active_scene_mut(&mut self) -> Option<&mut Scene> {
        self.scenes.get_mut(self.active_scene)
    }

    /// Selects the scene drawn by [`Engine::render`]. Returns `false` for an
    /// unknown index and keeps the current selection.
    pub fn set_active_scene(&mut self, index: usize) -> bool {
        if index >= self.scenes.len() {
            return false;
        }
        self.active_scene = index;
        true
    }

    pub fn active_scene_index(&self) -> usize {
        self.active_scene
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Draws the active scene.
    pub fn render(&mut self) -> FrameStatus {
        match self.scenes.get(self.active_scene) {
            Some(scene) => self.renderer.render(&mut self.backend, scene),
            None => {
                log::trace!("no active scene; frame skipped");
                FrameStatus::Skipped
            }
        }
    }

    /// Releases every GPU resource the renderer holds and returns the backend.
    pub fn into_backend(mut self) -> B {
        self.renderer.release(&mut self.backend);
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{ColorRgba, Vec2};
    use crate::render::{default_programs, Command, HeadlessBackend, RenderStrategy};
    use crate::render::{COLOR_VERTEX_SHADER, TEXTURE_FRAGMENT_SHADER};
    use crate::scene::{Node, NodeKind};

    fn engine() -> Engine<HeadlessBackend> {
        Engine::new(HeadlessBackend::new(800.0, 600.0), default_programs())
    }

    // ── scenes ────────────────────────────────────────────────────────────

    #[test]
    fn first_scene_is_active() {
        let mut engine = engine();
        assert!(engine.active_scene().is_none());

        let first = engine.insert_scene(Scene::new(800.0, 600.0));
        let second = engine.insert_scene(Scene::new(100.0, 100.0));

        assert_eq!((first, second), (0, 1));
        assert_eq!(engine.active_scene_index(), 0);
        assert_eq!(engine.scene_count(), 2);
    }

    #[test]
    fn set_active_scene_rejects_unknown_index() {
        let mut engine = engine();
        engine.insert_scene(Scene::new(10.0, 10.0));
        engine.insert_scene(Scene::new(20.0, 20.0));

        assert!(engine.set_active_scene(1));
        assert!(!engine.set_active_scene(7));
        assert_eq!(engine.active_scene_index(), 1);
        assert_eq!(engine.active_scene().unwrap().viewport().width, 20.0);
    }

    #[test]
    fn render_without_scene_is_noop() {
        let mut engine = engine();
        engine.backend_mut().take_commands();

        assert_eq!(engine.render(), FrameStatus::Skipped);
        assert!(engine.backend().commands().is_empty());
    }

    // ── frames ────────────────────────────────────────────────────────────

    #[test]
    fn red_quad_frame() {
        let mut engine = engine();
        engine.insert_scene(Scene::new(800.0, 600.0));
        let red = ColorRgba::new(1.0, 0.0, 0.0, 1.0);
        engine.active_scene_mut().unwrap().insert_node(
            Node::new(Vec2::new(50.0, 50.0))
                .with_position(Vec2::new(50.0, 50.0))
                .with_color(red),
        );

        assert_eq!(engine.render(), FrameStatus::Presented);

        let backend = engine.backend();
        let draws = backend.draw_calls();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].color, red);
        assert_eq!(draws[0].transform.translation(), Vec2::new(50.0, 50.0));
        assert_eq!(
            backend.buffer_data(draws[0].position.unwrap()),
            Some(&[0.0, 0.0, 50.0, 0.0, 0.0, 50.0, 0.0, 50.0, 50.0, 0.0, 50.0, 50.0][..])
        );
        assert!(backend
            .commands()
            .iter()
            .any(|c| *c == Command::Clear(crate::scene::DEFAULT_SCENE_COLOR, backend.surface_size())));
    }

    #[test]
    fn swap_to_texture_moves_draw_between_programs() {
        let mut engine = engine();
        engine.insert_scene(Scene::new(800.0, 600.0));
        let node = Node::new(Vec2::new(50.0, 50.0));
        let id = node.id();
        engine.active_scene_mut().unwrap().insert_node(node);
        engine.render();

        let scene = engine.active_scene_mut().unwrap();
        let mut node = scene.take_node(id).unwrap();
        node.set_texture(crate::assets::ImageHandle::solid("t", 2, 2, [0, 255, 0, 255]));
        node.set_kind(NodeKind::Texture);
        scene.insert_node(node);

        engine.backend_mut().take_commands();
        engine.render();

        let texture_program = engine.renderer().proxies()[1].program();
        let draws = engine.backend().draw_calls();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].program, Some(texture_program));
        assert!(draws[0].texture.is_some());

        // the color strategy dropped its buffer for the moved node
        assert_eq!(
            engine
                .backend()
                .count(|c| matches!(c, Command::ReleaseBuffer(_))),
            1
        );
    }

    #[test]
    fn failed_program_build_still_clears() {
        let descriptors = vec![crate::render::ProgramDescriptor::new(
            RenderStrategy::color(),
            COLOR_VERTEX_SHADER,
            TEXTURE_FRAGMENT_SHADER,
        )];
        let mut engine = Engine::new(HeadlessBackend::default(), descriptors);
        engine.insert_scene(Scene::new(800.0, 600.0));
        engine
            .active_scene_mut()
            .unwrap()
            .insert_node(Node::new(Vec2::new(5.0, 5.0)));

        assert!(engine.renderer().is_empty());
        assert_eq!(engine.render(), FrameStatus::Presented);
        assert!(engine.backend().draw_calls().is_empty());
    }

    #[test]
    fn into_backend_releases_everything() {
        let mut engine = engine();
        engine.insert_scene(Scene::new(800.0, 600.0));
        engine
            .active_scene_mut()
            .unwrap()
            .insert_node(Node::new(Vec2::new(5.0, 5.0)));
        engine.render();

        let backend = engine.into_backend();
        assert_eq!(backend.live_programs(), 0);
        assert_eq!(backend.live_buffers(), 0);
    }
}
