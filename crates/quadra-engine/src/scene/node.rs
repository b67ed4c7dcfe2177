use core::sync::atomic::{AtomicU64, Ordering};

use crate::assets::ImageHandle;
use crate::coords::{ColorRgba, Matrix3x3, Vec2};

use super::NodeKind;

/// Number of floats in a node's geometry: two triangles, six 2D points.
pub const GEOMETRY_LEN: usize = 12;

/// Vertices drawn per node.
pub const VERTEX_COUNT: u32 = (GEOMETRY_LEN / 2) as u32;

/// Default node fill.
pub const DEFAULT_NODE_COLOR: ColorRgba = ColorRgba::new(0.4, 0.1, 1.0, 1.0);

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique node identity.
///
/// Scenes find nodes by id; two nodes with equal fields are still distinct.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// How geometry is derived from the bounding box.
///
/// Geometry is uploaded in a frame relative to the node, and the local matrix
/// is applied again on the GPU. The two modes only agree while the matrix has
/// no rotation or scale.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum GeometryMode {
    /// Transformed corners minus the matrix translation.
    ///
    /// Under rotation/scale the linear part ends up applied twice on screen.
    #[default]
    TranslationRelative,
    /// Untransformed rectangle `[0,0]–[w,h]`; the GPU applies the full matrix once.
    LocalRect,
}

/// Drawable rectangle.
///
/// Derived state (`bounding_box`, `geometry`) is kept in sync by every setter
/// that changes size or transform. Not `Clone`: a node's id is its identity.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    size: Vec2,
    local_matrix: Matrix3x3,
    bounding_box: [Vec2; 4],
    geometry: [f32; GEOMETRY_LEN],
    color: ColorRgba,
    texture: Option<ImageHandle>,
    kind: NodeKind,
    geometry_mode: GeometryMode,

    geometry_revision: u64,
    texture_revision: u64,
}

impl Node {
    /// Creates a node of `size` at the origin with the default color.
    pub fn new(size: Vec2) -> Self {
        let mut node = Self {
            id: NodeId::next(),
            size,
            local_matrix: Matrix3x3::IDENTITY,
            bounding_box: [Vec2::zero(); 4],
            geometry: [0.0; GEOMETRY_LEN],
            color: DEFAULT_NODE_COLOR,
            texture: None,
            kind: NodeKind::Color,
            geometry_mode: GeometryMode::default(),
            geometry_revision: 0,
            texture_revision: 0,
        };
        node.refresh();
        node
    }

    /// Places the node's top-left corner at `pos`.
    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.set_position(pos);
        self
    }

    pub fn with_color(mut self, color: ColorRgba) -> Self {
        self.color = color;
        self
    }

    pub fn with_geometry_mode(mut self, mode: GeometryMode) -> Self {
        self.set_geometry_mode(mode);
        self
    }

    // ── accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    #[inline]
    pub fn local_matrix(&self) -> &Matrix3x3 {
        &self.local_matrix
    }

    #[inline]
    pub fn bounding_box(&self) -> &[Vec2; 4] {
        &self.bounding_box
    }

    /// Two triangles `(bb0, bb1, bb3)`, `(bb3, bb1, bb2)` flattened to 12 floats.
    #[inline]
    pub fn geometry(&self) -> &[f32; GEOMETRY_LEN] {
        &self.geometry
    }

    #[inline]
    pub fn color(&self) -> ColorRgba {
        self.color
    }

    #[inline]
    pub fn texture(&self) -> Option<&ImageHandle> {
        self.texture.as_ref()
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[inline]
    pub fn geometry_mode(&self) -> GeometryMode {
        self.geometry_mode
    }

    /// Bumped whenever `geometry` changes.
    #[inline]
    pub fn geometry_revision(&self) -> u64 {
        self.geometry_revision
    }

    /// Bumped whenever the texture is attached, replaced or cleared.
    #[inline]
    pub fn texture_revision(&self) -> u64 {
        self.texture_revision
    }

    // ── mutation ──────────────────────────────────────────────────────────

    /// Resizes the node and recomputes bounding box and geometry.
    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
        self.refresh();
    }

    /// Replaces the local transform and recomputes bounding box and geometry.
    pub fn set_local_matrix(&mut self, m: Matrix3x3) {
        self.local_matrix = m;
        self.refresh();
    }

    /// Moves the node, keeping the linear part of its transform.
    pub fn set_position(&mut self, pos: Vec2) {
        self.local_matrix.set_translation(pos);
        self.refresh();
    }

    pub fn set_geometry_mode(&mut self, mode: GeometryMode) {
        self.geometry_mode = mode;
        self.refresh();
    }

    #[inline]
    pub fn set_color(&mut self, color: ColorRgba) {
        self.color = color;
    }

    /// Attaches an image. Moving the node into the texture bucket is a separate step.
    pub fn set_texture(&mut self, image: ImageHandle) {
        self.texture = Some(image);
        self.texture_revision += 1;
    }

    pub fn clear_texture(&mut self) -> Option<ImageHandle> {
        let prev = self.texture.take();
        if prev.is_some() {
            self.texture_revision += 1;
        }
        prev
    }

    /// Changes the tag only; the owning scene performs the bucket move.
    #[inline]
    pub fn set_kind(&mut self, kind: NodeKind) {
        self.kind = kind;
    }

    /// Stores `m·(0,0)`, `m·(w,0)`, `m·(w,h)`, `m·(0,h)` in that order.
    pub fn update_bounding_box(&mut self, size: Vec2, m: &Matrix3x3) -> &mut Self {
        self.bounding_box[0].set(0.0, 0.0);
        self.bounding_box[1].set(size.x, 0.0);
        self.bounding_box[2].set(size.x, size.y);
        self.bounding_box[3].set(0.0, size.y);

        for corner in &mut self.bounding_box {
            *corner = corner.apply_matrix(m);
        }
        self
    }

    /// Rebuilds geometry from `bb` according to the node's geometry mode.
    pub fn update_geometry(&mut self, bb: &[Vec2; 4], m: &Matrix3x3) -> &mut Self {
        let corners = match self.geometry_mode {
            GeometryMode::TranslationRelative => {
                let t = m.translation();
                [bb[0] - t, bb[1] - t, bb[2] - t, bb[3] - t]
            }
            GeometryMode::LocalRect => local_rect(self.size),
        };

        let order = [corners[0], corners[1], corners[3], corners[3], corners[1], corners[2]];
        for (i, p) in order.iter().enumerate() {
            self.geometry[i * 2] = p.x;
            self.geometry[i * 2 + 1] = p.y;
        }

        self.geometry_revision += 1;
        self
    }

    fn refresh(&mut self) {
        let m = self.local_matrix;
        self.update_bounding_box(self.size, &m);
        let bb = self.bounding_box;
        self.update_geometry(&bb, &m);
    }
}

fn local_rect(size: Vec2) -> [Vec2; 4] {
    [
        Vec2::new(0.0, 0.0),
        Vec2::new(size.x, 0.0),
        Vec2::new(size.x, size.y),
        Vec2::new(0.0, size.y),
    ]
}
