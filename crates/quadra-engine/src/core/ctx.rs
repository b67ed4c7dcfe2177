use winit::dpi::{LogicalSize, PhysicalSize};
use winit::window::{Window, WindowId};

use crate::input::{InputFrame, InputState};
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

/// Window handle and metadata for the current callback.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Drawable size in physical pixels.
    pub fn physical_size(&self) -> PhysicalSize<u32> {
        self.window.inner_size()
    }

    /// Window size as `(width, height)` in logical pixels.
    pub fn logical_size(&self) -> (f32, f32) {
        let logical: LogicalSize<f64> = self.physical_size().to_logical(self.window.scale_factor());
        (logical.width as f32, logical.height as f32)
    }
}

/// Per-frame context passed to `core::App::on_frame`.
pub struct FrameCtx<'a> {
    pub window: WindowCtx<'a>,
    pub input: &'a InputState,
    pub input_frame: &'a InputFrame,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}
