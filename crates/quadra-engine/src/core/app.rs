use anyhow::Result;

use crate::device::Gpu;

use super::ctx::{FrameCtx, WindowCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`crate::window::Runtime`].
pub trait App {
    /// Called once, after the window exists, with the GPU context bound to it.
    ///
    /// An error stops the event loop and is returned from `Runtime::run`.
    fn on_start(&mut self, gpu: Gpu) -> Result<()>;

    /// Called when the drawable size or scale factor changed.
    fn on_resize(&mut self, window: &WindowCtx<'_>) {
        let _ = window;
    }

    /// Called once per redraw.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;
}
