use anyhow::Result;
use quadra_engine::Engine;
use quadra_engine::assets::ImageHandle;
use quadra_engine::core::{App, AppControl, FrameCtx, WindowCtx};
use quadra_engine::device::Gpu;
use quadra_engine::render::{FrameStatus, RenderBackend, WgpuBackend, default_programs};
use quadra_engine::scene::Scene;

use crate::canvas::Canvas;

/// Seconds between frame-rate log lines.
const FPS_LOG_INTERVAL: f32 = 5.0;

/// Window application: one scene edited through [`Canvas`], drawn by the engine.
pub struct Studio {
    canvas: Canvas,
    engine: Option<Engine<WgpuBackend>>,
    node_count: Option<usize>,
    fps_elapsed: f32,
    fps_frames: u32,
}

impl Studio {
    pub fn new(texture: Option<ImageHandle>) -> Self {
        Self {
            canvas: Canvas::new(texture),
            engine: None,
            node_count: None,
            fps_elapsed: 0.0,
            fps_frames: 0,
        }
    }

    /// The engine built by `on_start`. The runtime only delivers resizes and
    /// frames after a successful start, so a missing engine is a bug.
    fn started<B: RenderBackend>(engine: &mut Option<Engine<B>>) -> &mut Engine<B> {
        engine.as_mut().expect("engine used before App::on_start")
    }

    fn log_frame_rate(&mut self, dt: f32) {
        self.fps_elapsed += dt;
        self.fps_frames += 1;
        if self.fps_elapsed >= FPS_LOG_INTERVAL {
            log::debug!("{:.1} fps", self.fps_frames as f32 / self.fps_elapsed);
            self.fps_elapsed = 0.0;
            self.fps_frames = 0;
        }
    }
}

impl App for Studio {
    fn on_start(&mut self, gpu: Gpu) -> Result<()> {
        let window = gpu.window();
        let logical = window.inner_size().to_logical::<f32>(window.scale_factor());

        let mut engine = Engine::new(WgpuBackend::new(gpu), default_programs());
        if engine.renderer().is_empty() {
            log::warn!("no programs built; frames will only be cleared");
        }

        let mut scene = Scene::new(logical.width, logical.height);
        self.canvas.seed(&mut scene);
        engine.insert_scene(scene);

        self.engine = Some(engine);
        Ok(())
    }

    fn on_resize(&mut self, window: &WindowCtx<'_>) {
        let engine = Self::started(&mut self.engine);
        engine.backend_mut().resize(window.physical_size());
        let (w, h) = window.logical_size();
        if let Some(scene) = engine.active_scene_mut() {
            scene.set_viewport(w, h);
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        self.log_frame_rate(ctx.time.dt);

        let engine = Self::started(&mut self.engine);
        let Some(scene) = engine.active_scene_mut() else {
            return AppControl::Continue;
        };

        if self.canvas.apply_input(scene, ctx.input_frame) == AppControl::Exit {
            return AppControl::Exit;
        }

        let count = scene.node_count();
        if self.node_count != Some(count) {
            self.node_count = Some(count);
            ctx.runtime.set_title(format!("quadra ({count} nodes)"));
        }

        match engine.render() {
            FrameStatus::Fatal => {
                log::error!("surface lost for good, exiting");
                AppControl::Exit
            }
            FrameStatus::Presented | FrameStatus::Skipped => AppControl::Continue,
        }
    }
}
