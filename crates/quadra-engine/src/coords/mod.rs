//! Coordinate and transform types shared by the scene model and renderers.
//!
//! Canonical CPU space:
//! - Pixels of the render target
//! - Origin top-left
//! - +X right, +Y down
//!
//! Renderers convert to clip space with the scene's projection matrix.

mod color;
mod matrix;
mod vec2;
mod viewport;

pub use color::ColorRgba;
pub use matrix::Matrix3x3;
pub use vec2::Vec2;
pub use viewport::Viewport;
