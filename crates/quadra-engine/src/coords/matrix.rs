use super::{Vec2, Viewport};

/// 2D affine transform stored as a column-major 3×3 matrix.
///
/// Element layout:
///
/// ```text
/// | e0 e3 e6 |     linear part:  e0 e1 (column 0), e3 e4 (column 1)
/// | e1 e4 e7 |     translation:  e6 e7
/// | e2 e5 e8 |     e2 e5 e8 stay (0, 0, 1) for affine transforms
/// ```
///
/// Composition rule: a point `p` in a node's local frame lands at `M·p` in
/// pixel space. Shaders compute `clip = P · C · M · (p, 1)` where `P` is the
/// scene projection and `C` the camera. Matrix products are only formed on the
/// GPU; the CPU side never multiplies or inverts matrices.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Matrix3x3 {
    pub elements: [f32; 9],
}

impl Matrix3x3 {
    pub const IDENTITY: Self = Self {
        elements: [
            1.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, //
            0.0, 0.0, 1.0,
        ],
    };

    #[inline]
    pub const fn from_elements(elements: [f32; 9]) -> Self {
        Self { elements }
    }

    #[inline]
    pub const fn from_translation(t: Vec2) -> Self {
        Self::from_linear_translation([[1.0, 0.0], [0.0, 1.0]], t)
    }

    /// Builds a transform from linear columns and a translation.
    #[inline]
    pub const fn from_linear_translation(linear: [[f32; 2]; 2], t: Vec2) -> Self {
        Self {
            elements: [
                linear[0][0], linear[0][1], 0.0, //
                linear[1][0], linear[1][1], 0.0, //
                t.x, t.y, 1.0,
            ],
        }
    }

    /// Counter-clockwise rotation in radians (on screen, with +Y down, it turns clockwise).
    #[inline]
    pub fn from_rotation_translation(radians: f32, t: Vec2) -> Self {
        let (s, c) = radians.sin_cos();
        Self::from_linear_translation([[c, s], [-s, c]], t)
    }

    #[inline]
    pub const fn from_scale_translation(scale: Vec2, t: Vec2) -> Self {
        Self::from_linear_translation([[scale.x, 0.0], [0.0, scale.y]], t)
    }

    /// Orthographic projection from pixels (top-left origin, +Y down) to clip space.
    ///
    /// Maps `(0, 0)` to `(-1, 1)` and `(width, height)` to `(1, -1)`.
    pub fn orthographic(viewport: Viewport) -> Self {
        let w = viewport.width.max(1.0);
        let h = viewport.height.max(1.0);
        Self {
            elements: [
                2.0 / w, 0.0, 0.0, //
                0.0, -2.0 / h, 0.0, //
                -1.0, 1.0, 1.0,
            ],
        }
    }

    /// Linear (rotation/scale/shear) part as two columns.
    #[inline]
    pub const fn linear(&self) -> [[f32; 2]; 2] {
        let e = &self.elements;
        [[e[0], e[1]], [e[3], e[4]]]
    }

    #[inline]
    pub const fn translation(&self) -> Vec2 {
        Vec2::new(self.elements[6], self.elements[7])
    }

    #[inline]
    pub fn set_translation(&mut self, t: Vec2) {
        self.elements[6] = t.x;
        self.elements[7] = t.y;
    }

    /// True when the linear part is the identity (pure translation).
    #[inline]
    pub fn is_translation_only(&self) -> bool {
        self.linear() == [[1.0, 0.0], [0.0, 1.0]]
    }

    /// Transforms `v`: `x' = e0*x + e3*y + e6`, `y' = e1*x + e4*y + e7`.
    #[inline]
    pub fn apply(&self, v: Vec2) -> Vec2 {
        let e = &self.elements;
        Vec2::new(
            e[0] * v.x + e[3] * v.y + e[6],
            e[1] * v.x + e[4] * v.y + e[7],
        )
    }

    /// Columns padded to `vec4`, the uniform layout of a WGSL `mat3x3<f32>`.
    #[inline]
    pub fn to_padded_columns(&self) -> [[f32; 4]; 3] {
        let e = &self.elements;
        [
            [e[0], e[1], e[2], 0.0],
            [e[3], e[4], e[5], 0.0],
            [e[6], e[7], e[8], 0.0],
        ]
    }
}

impl Default for Matrix3x3 {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}
