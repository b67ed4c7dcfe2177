use quadra_engine::assets::ImageHandle;
use quadra_engine::coords::{ColorRgba, Vec2};
use quadra_engine::core::AppControl;
use quadra_engine::input::{InputEvent, InputFrame, Key, KeyState, MouseButton, MouseButtonState};
use quadra_engine::scene::{Node, NodeId, NodeKind, Scene};

/// Edge length of placed quads, in logical pixels.
pub const QUAD_SIZE: f32 = 50.0;

/// Longest index that can be typed.
const MAX_INDEX_DIGITS: usize = 9;

const PALETTE: [ColorRgba; 5] = [
    ColorRgba::new(0.4, 0.1, 1.0, 1.0),
    ColorRgba::new(0.95, 0.3, 0.25, 1.0),
    ColorRgba::new(0.2, 0.75, 0.4, 1.0),
    ColorRgba::new(0.15, 0.5, 0.95, 1.0),
    ColorRgba::new(1.0, 0.75, 0.1, 1.0),
];

/// Interactive editing of one scene.
///
/// Left click places a quad at the pointer. Digit keys type the index of a
/// COLOR node (`Backspace` edits it) and `T` moves that node to the TEXTURE
/// bucket, starting a fresh index. `Delete` removes the last node and
/// `Escape` exits.
#[derive(Debug, Default)]
pub struct Canvas {
    next_color: usize,
    picked: usize,
    index_entry: String,
    texture: Option<ImageHandle>,
}

impl Canvas {
    pub fn new(texture: Option<ImageHandle>) -> Self {
        Self {
            texture,
            ..Self::default()
        }
    }

    /// Index into the COLOR bucket that `T` applies to.
    pub fn picked(&self) -> usize {
        self.picked
    }

    /// Inserts a row of starting quads.
    pub fn seed(&mut self, scene: &mut Scene) {
        for i in 0..3 {
            let x = 50.0 + i as f32 * (QUAD_SIZE * 2.0);
            self.place_quad(scene, Vec2::new(x, 50.0));
        }
    }

    /// Places a quad with its top-left corner at `at`, in the next palette color.
    pub fn place_quad(&mut self, scene: &mut Scene, at: Vec2) -> NodeId {
        let color = PALETTE[self.next_color % PALETTE.len()];
        self.next_color = self.next_color.wrapping_add(1);

        let node = Node::new(Vec2::new(QUAD_SIZE, QUAD_SIZE))
            .with_position(at)
            .with_color(color);
        let id = node.id();
        scene.insert_node(node);
        log::debug!("placed quad {} at ({}, {})", id.get(), at.x, at.y);
        id
    }

    pub fn pick(&mut self, index: usize) {
        self.picked = index;
        log::info!("picked color node #{index}");
    }

    /// Appends a digit to the typed index and picks the result.
    pub fn push_digit(&mut self, digit: u8) {
        if self.index_entry.len() >= MAX_INDEX_DIGITS {
            log::warn!("index is limited to {MAX_INDEX_DIGITS} digits");
            return;
        }
        self.index_entry.push(char::from(b'0' + digit));
        self.pick_entry();
    }

    /// Drops the last typed digit.
    pub fn pop_digit(&mut self) {
        if self.index_entry.pop().is_some() {
            self.pick_entry();
        }
    }

    fn pick_entry(&mut self) {
        // Only ASCII digits are ever pushed, so parsing fails only when empty.
        let index = self.index_entry.parse().unwrap_or(0);
        self.pick(index);
    }

    /// Moves the picked COLOR node to the TEXTURE bucket, carrying the loaded image.
    ///
    /// Returns `None` without touching the scene when no image was loaded or
    /// the index is out of range. Either way the next digit starts a new index.
    pub fn texture_picked(&mut self, scene: &mut Scene) -> Option<NodeId> {
        self.index_entry.clear();

        let Some(image) = self.texture.clone() else {
            log::warn!("no texture loaded; pass --texture <path>");
            return None;
        };

        let Some(id) = scene
            .viewport_nodes(NodeKind::Color)
            .get(self.picked)
            .map(Node::id)
        else {
            log::warn!("no color node at index {}", self.picked);
            return None;
        };

        let mut node = scene.take_node(id)?;
        node.set_texture(image);
        node.set_kind(NodeKind::Texture);
        scene.insert_node(node);
        log::info!("node {} now drawn with texture", id.get());
        Some(id)
    }

    /// Removes the node drawn last.
    pub fn remove_last(&mut self, scene: &mut Scene) -> Option<NodeId> {
        let id = scene.nodes().last().map(Node::id)?;
        scene.remove_node(id);
        log::debug!("removed node {}", id.get());
        Some(id)
    }

    /// Applies this frame's input to `scene`, in arrival order.
    pub fn apply_input(&mut self, scene: &mut Scene, input: &InputFrame) -> AppControl {
        for ev in &input.events {
            match ev {
                InputEvent::PointerButton(b)
                    if b.button == MouseButton::Left && b.state == MouseButtonState::Pressed =>
                {
                    self.place_quad(scene, Vec2::new(b.x, b.y));
                }

                InputEvent::Key {
                    key,
                    state: KeyState::Pressed,
                    repeat: false,
                    ..
                } => match key {
                    Key::Escape => return AppControl::Exit,
                    Key::T => {
                        self.texture_picked(scene);
                    }
                    Key::Delete => {
                        self.remove_last(scene);
                    }
                    Key::Backspace => self.pop_digit(),
                    other => {
                        if let Some(digit) = other.digit() {
                            self.push_digit(digit);
                        }
                    }
                },

                _ => {}
            }
        }

        AppControl::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadra_engine::input::{InputState, Modifiers, PointerButtonEvent};

    fn scene() -> Scene {
        Scene::new(800.0, 600.0)
    }

    fn texture() -> ImageHandle {
        ImageHandle::solid("rukav", 4, 4, [200, 120, 40, 255])
    }

    fn frame(events: Vec<InputEvent>) -> InputFrame {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        for ev in events {
            state.apply_event(&mut frame, ev);
        }
        frame
    }

    fn key(key: Key) -> InputEvent {
        InputEvent::Key {
            key,
            state: KeyState::Pressed,
            modifiers: Modifiers::default(),
            repeat: false,
        }
    }

    fn left_click(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerButton(PointerButtonEvent {
            button: MouseButton::Left,
            state: MouseButtonState::Pressed,
            x,
            y,
            modifiers: Modifiers::default(),
        })
    }

    // ── placement ─────────────────────────────────────────────────────────

    #[test]
    fn seed_places_three_color_quads() {
        let mut canvas = Canvas::default();
        let mut scene = scene();
        canvas.seed(&mut scene);

        let nodes = scene.viewport_nodes(NodeKind::Color);
        assert_eq!(nodes.len(), 3);
        assert!(nodes.iter().all(|n| n.size() == Vec2::new(QUAD_SIZE, QUAD_SIZE)));
    }

    #[test]
    fn colors_cycle_through_palette() {
        let mut canvas = Canvas::default();
        let mut scene = scene();
        for i in 0..=PALETTE.len() {
            canvas.place_quad(&mut scene, Vec2::new(i as f32, 0.0));
        }

        let colors: Vec<_> = scene.nodes().map(Node::color).collect();
        assert_eq!(colors[0], PALETTE[0]);
        assert_eq!(colors[1], PALETTE[1]);
        assert_eq!(colors[PALETTE.len()], PALETTE[0]);
    }

    #[test]
    fn click_places_quad_at_pointer() {
        let mut canvas = Canvas::default();
        let mut scene = scene();

        let control = canvas.apply_input(&mut scene, &frame(vec![left_click(120.0, 80.0)]));

        assert_eq!(control, AppControl::Continue);
        let node = scene.nodes().next().unwrap();
        assert_eq!(node.local_matrix().translation(), Vec2::new(120.0, 80.0));
    }

    // ── texturing ─────────────────────────────────────────────────────────

    #[test]
    fn t_moves_picked_node_to_texture_bucket() {
        let mut canvas = Canvas::new(Some(texture()));
        let mut scene = scene();
        canvas.seed(&mut scene);
        let second = scene.viewport_nodes(NodeKind::Color)[1].id();

        canvas.apply_input(&mut scene, &frame(vec![key(Key::Digit1), key(Key::T)]));

        assert_eq!(canvas.picked(), 1);
        assert_eq!(scene.viewport_nodes(NodeKind::Color).len(), 2);
        let textured = scene.viewport_nodes(NodeKind::Texture);
        assert_eq!(textured.len(), 1);
        assert_eq!(textured[0].id(), second);
        assert_eq!(textured[0].texture().map(ImageHandle::name), Some("rukav"));
    }

    #[test]
    fn texturing_without_image_leaves_scene_alone() {
        let mut canvas = Canvas::default();
        let mut scene = scene();
        canvas.seed(&mut scene);

        assert_eq!(canvas.texture_picked(&mut scene), None);
        assert_eq!(scene.viewport_nodes(NodeKind::Color).len(), 3);
    }

    #[test]
    fn out_of_range_pick_is_ignored() {
        let mut canvas = Canvas::new(Some(texture()));
        let mut scene = scene();
        canvas.seed(&mut scene);
        canvas.pick(9);

        assert_eq!(canvas.texture_picked(&mut scene), None);
        assert!(scene.viewport_nodes(NodeKind::Texture).is_empty());
    }

    #[test]
    fn digits_accumulate_into_multi_digit_index() {
        let mut canvas = Canvas::new(Some(texture()));
        let mut scene = scene();
        for i in 0..12 {
            canvas.place_quad(&mut scene, Vec2::new(i as f32 * 10.0, 0.0));
        }
        let eleventh = scene.viewport_nodes(NodeKind::Color)[11].id();

        canvas.apply_input(
            &mut scene,
            &frame(vec![key(Key::Digit1), key(Key::Digit1), key(Key::T)]),
        );

        assert_eq!(scene.viewport_nodes(NodeKind::Texture)[0].id(), eleventh);
    }

    #[test]
    fn backspace_edits_index_and_t_starts_a_new_one() {
        let mut canvas = Canvas::default();
        let mut scene = scene();
        canvas.seed(&mut scene);

        canvas.apply_input(
            &mut scene,
            &frame(vec![key(Key::Digit2), key(Key::Digit7), key(Key::Backspace)]),
        );
        assert_eq!(canvas.picked(), 2);
        assert_eq!(scene.node_count(), 3);

        let mut canvas = Canvas::new(Some(texture()));
        canvas.apply_input(
            &mut scene,
            &frame(vec![key(Key::Digit1), key(Key::T), key(Key::Digit0)]),
        );
        assert_eq!(canvas.picked(), 0);
    }

    #[test]
    fn repeated_keys_are_ignored() {
        let mut canvas = Canvas::default();
        let mut scene = scene();
        canvas.seed(&mut scene);

        let held = InputEvent::Key {
            key: Key::Delete,
            state: KeyState::Pressed,
            modifiers: Modifiers::default(),
            repeat: true,
        };
        canvas.apply_input(&mut scene, &frame(vec![held]));

        assert_eq!(scene.node_count(), 3);
    }

    // ── removal / exit ────────────────────────────────────────────────────

    #[test]
    fn delete_removes_last_drawn_node() {
        let mut canvas = Canvas::new(Some(texture()));
        let mut scene = scene();
        canvas.seed(&mut scene);
        let textured = canvas.texture_picked(&mut scene).unwrap();

        canvas.apply_input(&mut scene, &frame(vec![key(Key::Delete)]));

        assert_eq!(scene.node_count(), 2);
        assert!(!scene.contains(textured));
    }

    #[test]
    fn delete_on_empty_scene_is_noop() {
        let mut canvas = Canvas::default();
        let mut scene = scene();
        assert_eq!(canvas.remove_last(&mut scene), None);
    }

    #[test]
    fn escape_exits() {
        let mut canvas = Canvas::default();
        let mut scene = scene();
        assert_eq!(
            canvas.apply_input(&mut scene, &frame(vec![key(Key::Escape)])),
            AppControl::Exit
        );
    }
}
