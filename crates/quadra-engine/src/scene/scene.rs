use crate::coords::{ColorRgba, Matrix3x3, Viewport};

use super::{Node, NodeId, NodeKind};

/// Default scene background.
pub const DEFAULT_SCENE_COLOR: ColorRgba = ColorRgba::new(0.9, 0.9, 0.9, 1.0);

/// Owns nodes, partitioned into one ordered bucket per [`NodeKind`].
///
/// Ordering rules:
/// - within a bucket, insertion order is draw order
/// - a node is in exactly one bucket: the one matching its kind
///
/// The scene also carries the view transforms shared by every node:
/// an orthographic projection derived from the viewport and a camera matrix.
#[derive(Debug)]
pub struct Scene {
    color: ColorRgba,
    buckets: [Vec<Node>; NodeKind::COUNT],
    viewport: Viewport,
    projection: Matrix3x3,
    camera: Matrix3x3,
}

impl Scene {
    /// Creates an empty scene for a `width × height` pixel target.
    pub fn new(width: f32, height: f32) -> Self {
        let viewport = Viewport::new(width, height);
        if !viewport.is_valid() {
            log::warn!("scene viewport {width}x{height} is degenerate; clamping to 1px");
        }

        Self {
            color: DEFAULT_SCENE_COLOR,
            buckets: Default::default(),
            viewport,
            projection: Matrix3x3::orthographic(viewport),
            camera: Matrix3x3::IDENTITY,
        }
    }

    #[inline]
    pub fn color(&self) -> ColorRgba {
        self.color
    }

    #[inline]
    pub fn set_color(&mut self, color: ColorRgba) {
        self.color = color;
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Re-derives the projection for a resized target.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Viewport::new(width, height);
        self.projection = Matrix3x3::orthographic(self.viewport);
    }

    #[inline]
    pub fn projection_matrix(&self) -> &Matrix3x3 {
        &self.projection
    }

    #[inline]
    pub fn camera_matrix(&self) -> &Matrix3x3 {
        &self.camera
    }

    // ── nodes ─────────────────────────────────────────────────────────────

    /// Appends `node` to the bucket for its kind. Always succeeds.
    pub fn insert_node(&mut self, node: Node) -> bool {
        log::trace!("insert node {:?} into {}", node.id(), node.kind());
        self.buckets[node.kind().index()].push(node);
        true
    }

    /// Removes and drops the node with `id`.
    ///
    /// Returns `false` without touching any bucket when the node is absent.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        self.take_node(id).is_some()
    }

    /// Detaches the node with `id` and hands ownership back to the caller.
    pub fn take_node(&mut self, id: NodeId) -> Option<Node> {
        let (bucket, index) = self.locate(id)?;
        Some(self.buckets[bucket].remove(index))
    }

    /// Moves a node to the end of the bucket for `kind`.
    ///
    /// Returns `false` when the node is absent. Setting the kind it already
    /// has still moves it to the end of its bucket.
    pub fn set_node_kind(&mut self, id: NodeId, kind: NodeKind) -> bool {
        let Some(mut node) = self.take_node(id) else {
            return false;
        };
        node.set_kind(kind);
        self.insert_node(node)
    }

    /// Mutates a node in place.
    ///
    /// If `f` changes the node's kind, the node is moved to the end of its new
    /// bucket before this returns.
    pub fn update_node<R>(&mut self, id: NodeId, f: impl FnOnce(&mut Node) -> R) -> Option<R> {
        let (bucket, index) = self.locate(id)?;
        let node = &mut self.buckets[bucket][index];
        let result = f(node);

        if node.kind().index() != bucket {
            let node = self.buckets[bucket].remove(index);
            self.insert_node(node);
        }

        Some(result)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.locate(id).map(|(b, i)| &self.buckets[b][i])
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.locate(id).is_some()
    }

    /// Live bucket for `kind`, in draw order.
    #[inline]
    pub fn viewport_nodes(&self, kind: NodeKind) -> &[Node] {
        &self.buckets[kind.index()]
    }

    /// All nodes, bucket by bucket in [`NodeKind::ALL`] order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.buckets.iter().flatten()
    }

    pub fn node_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    fn locate(&self, id: NodeId) -> Option<(usize, usize)> {
        self.buckets.iter().enumerate().find_map(|(b, nodes)| {
            nodes.iter().position(|n| n.id() == id).map(|i| (b, i))
        })
    }
}
