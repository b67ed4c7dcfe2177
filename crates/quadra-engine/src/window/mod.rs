//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the window, and hands the GPU context to the app.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
