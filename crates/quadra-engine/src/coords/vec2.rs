use core::ops::{Add, Sub};

use super::Matrix3x3;

/// 2D point or vector in pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Overwrites both components, returning `self` for chaining.
    #[inline]
    pub fn set(&mut self, x: f32, y: f32) -> &mut Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Copies the components of `other` into `self`.
    #[inline]
    pub fn copy_from(&mut self, other: Vec2) -> &mut Self {
        self.x = other.x;
        self.y = other.y;
        self
    }

    /// Returns this point transformed by `m`.
    ///
    /// See [`Matrix3x3::apply`] for the convention.
    #[inline]
    pub fn apply_matrix(self, m: &Matrix3x3) -> Vec2 {
        m.apply(self)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    #[inline]
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}
