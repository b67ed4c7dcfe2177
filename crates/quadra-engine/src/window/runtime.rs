use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::input::platform::winit::translate_window_event;
use crate::input::{InputFrame, InputState};
use crate::time::FrameClock;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "quadra".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
        }
    }
}

/// Runtime handle passed to the application.
///
/// Commands are buffered and applied after the current callback returns.
#[derive(Debug, Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.commands.push(Command::SetTitle(title.into()));
    }

    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }
}

#[derive(Debug, PartialEq)]
enum Command {
    SetTitle(String),
    Exit,
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window and drives `app` until it exits or the window closes.
    ///
    /// Returns the error that stopped startup, if any.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.startup_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct WindowEntry {
    window: Arc<Window>,
    input_state: InputState,
    input_frame: InputFrame,
    clock: FrameClock,
}

impl WindowEntry {
    fn ctx(&self) -> WindowCtx<'_> {
        WindowCtx {
            id: self.window.id(),
            window: &self.window,
        }
    }
}

struct AppState<A: App> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    exit_requested: bool,
    startup_error: Option<anyhow::Error>,
}

impl<A: App> AppState<A> {
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            exit_requested: false,
            startup_error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let gpu = pollster::block_on(Gpu::new(Arc::clone(&window), self.gpu_init.clone()))
            .context("GPU initialization failed")?;
        log::info!("using adapter {:?}", gpu.adapter_info().name);

        self.app.on_start(gpu).context("application failed to start")?;

        window.request_redraw();
        self.entry = Some(WindowEntry {
            window,
            input_state: InputState::default(),
            input_frame: InputFrame::default(),
            clock: FrameClock::default(),
        });
        Ok(())
    }

    fn apply_commands(&mut self, ctx: RuntimeCtx) {
        for cmd in ctx.commands {
            match cmd {
                Command::SetTitle(title) => {
                    if let Some(entry) = &self.entry {
                        entry.window.set_title(&title);
                    }
                }
                Command::Exit => self.exit_requested = true,
            }
        }
    }

    fn redraw(&mut self) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        let mut runtime = RuntimeCtx::default();
        let time = entry.clock.tick();
        let control = {
            let mut ctx = FrameCtx {
                window: WindowCtx {
                    id: entry.window.id(),
                    window: &entry.window,
                },
                input: &entry.input_state,
                input_frame: &entry.input_frame,
                time,
                runtime: &mut runtime,
            };
            self.app.on_frame(&mut ctx)
        };

        // Per-frame deltas are consumed by exactly one frame.
        entry.input_frame.clear();

        if control == AppControl::Exit {
            runtime.exit();
        }
        self.apply_commands(runtime);
    }
}

impl<A: App> ApplicationHandler for AppState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(entry) = self.entry.as_mut() {
            entry.clock.reset();
            entry.window.request_redraw();
            return;
        }

        if let Err(e) = self.start(event_loop) {
            log::error!("startup failed: {e:#}");
            self.startup_error = Some(e);
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Continuous redraw.
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(entry) = &self.entry {
            entry.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        if entry.window.id() != window_id {
            return;
        }

        if let Some(ev) =
            translate_window_event(entry.window.scale_factor(), &entry.input_state, &event)
        {
            entry.input_state.apply_event(&mut entry.input_frame, ev);
        }

        match event {
            WindowEvent::CloseRequested => {
                log::debug!("close requested");
                self.exit_requested = true;
            }

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.app.on_resize(&entry.ctx());
                entry.window.request_redraw();
            }

            WindowEvent::RedrawRequested => self.redraw(),

            _ => {}
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_ctx_buffers_commands_in_order() {
        let mut ctx = RuntimeCtx::default();
        ctx.set_title("quadra (3 nodes)");
        ctx.exit();

        assert_eq!(
            ctx.commands,
            vec![Command::SetTitle("quadra (3 nodes)".into()), Command::Exit]
        );
    }

    #[test]
    fn default_window_is_titled() {
        let config = RuntimeConfig::default();
        assert_eq!(config.title, "quadra");
        assert_eq!(config.initial_size, LogicalSize::new(800.0, 600.0));
    }
}
