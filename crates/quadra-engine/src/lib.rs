//! quadra engine crate.
//!
//! A small 2D scene-graph renderer: scenes of textured or flat-colored quads,
//! drawn by one program per node kind through a [`render::RenderBackend`].
//! The window runtime, input and GPU device layers drive it on a desktop
//! surface; [`render::HeadlessBackend`] drives it in tests.

pub mod assets;
pub mod coords;
pub mod core;
pub mod device;
mod engine;
pub mod input;
pub mod logging;
pub mod render;
pub mod scene;
pub mod time;
pub mod window;

pub use engine::Engine;
