//! Window, event loop and the application state machine.
//!
//! The window and GPU are created in `resumed`. Textures stream in on worker
//! threads while the title shows progress; once the bundle lands the scene and
//! renderer are built and the frame loop starts.

use std::sync::Arc;
use std::time::Instant;

use orrery_assets::{BundleTask, HttpByteSource, standard_requests};
use orrery_config::Config;
use orrery_data::{ExoplanetDataLoader, LoadOptions};
use orrery_render::{RenderContext, SceneRenderer, SurfaceError, init_render_context_blocking};
use orrery_scene::{SceneComposer, Settings};
use tracing::{debug, error, info, instrument};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowAttributes, WindowId};

use crate::controls::{self, ControlOutcome};
use crate::frame_loop::FrameLoop;

/// Pixel-delta wheel events are divided by this to get zoom steps.
const PIXELS_PER_ZOOM_STEP: f32 = 50.0;

pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
}

/// Window title while textures are loading.
pub fn loading_title(base: &str, progress: f32) -> String {
    let percent = (progress.clamp(0.0, 1.0) * 100.0).round() as u32;
    format!("{base} (loading textures {percent}%)")
}

/// Logical size from a physical size and scale factor.
pub fn logical_size(size: PhysicalSize<u32>, scale_factor: f64) -> (f32, f32) {
    let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
    (
        (size.width as f64 / scale) as f32,
        (size.height as f64 / scale) as f32,
    )
}

/// Mouse-wheel delta as zoom steps; positive zooms in.
pub fn wheel_steps(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_ZOOM_STEP,
    }
}

/// Everything that exists once loading has finished.
struct Running {
    scene: SceneComposer,
    renderer: SceneRenderer,
}

#[derive(Debug, Default)]
struct PointerState {
    dragging: bool,
    last: Option<(f64, f64)>,
}

pub struct App {
    config: Config,
    seed: u64,
    window: Option<Arc<Window>>,
    gpu: Option<RenderContext>,
    loading: Option<BundleTask>,
    running: Option<Running>,
    frame_loop: FrameLoop,
    pointer: PointerState,
    last_progress: Option<u32>,
}

impl App {
    pub fn new(config: Config, seed: u64) -> Self {
        let frame_loop = FrameLoop::new(config.debug.frame_stats_interval_secs);
        Self {
            config,
            seed,
            window: None,
            gpu: None,
            loading: None,
            running: None,
            frame_loop,
            pointer: PointerState::default(),
            last_progress: None,
        }
    }

    fn data_loader(&self) -> (ExoplanetDataLoader, LoadOptions) {
        let loader = ExoplanetDataLoader::from_config(&self.config.data);
        let options = LoadOptions {
            limit: self.config.data.archive_limit,
            fallback_only: self.config.data.offline,
        };
        (loader, options)
    }

    /// Poll the texture bundle. Builds the scene once it is complete.
    fn poll_loading(&mut self) {
        let Some(task) = &mut self.loading else {
            return;
        };
        let Some(bundle) = task.poll() else {
            let percent = (task.progress() * 100.0).round() as u32;
            if self.last_progress != Some(percent) {
                self.last_progress = Some(percent);
                if let Some(window) = &self.window {
                    window.set_title(&loading_title(&self.config.window.title, task.progress()));
                }
            }
            return;
        };
        self.loading = None;
        info!(textures = bundle.len(), "texture bundle ready");

        let (Some(window), Some(gpu)) = (&self.window, &self.gpu) else {
            return;
        };
        let options = &self.config.scene;
        let mut scene =
            SceneComposer::build(options, Settings::from_options(options), bundle, self.seed);
        let (width, height) = logical_size(window.inner_size(), window.scale_factor());
        scene.resize(width, height, window.scale_factor() as f32);

        let renderer = SceneRenderer::new(&gpu.device, &gpu.queue, gpu.surface_format, &scene);
        window.set_title(&self.config.window.title);

        if self.config.scene.real_data_auto_load {
            let (loader, load_options) = self.data_loader();
            scene.begin_reload(loader, load_options);
        }
        self.running = Some(Running { scene, renderer });
        self.frame_loop.start(Instant::now());
    }

    /// Run one frame. Returns false when the app should exit.
    fn redraw(&mut self) -> bool {
        let (Some(gpu), Some(running)) = (&self.gpu, &mut self.running) else {
            return true;
        };
        let mut result = Ok(());
        self.frame_loop.tick(
            Instant::now(),
            running,
            |running, delta| {
                running.scene.update(delta);
                if let Some(summary) = running.scene.take_reload_summary() {
                    controls::report_reload(&summary);
                }
            },
            |running| {
                running
                    .renderer
                    .sync(&gpu.device, &gpu.queue, &mut running.scene);
                result = running.renderer.render(gpu);
            },
        );
        match result {
            Ok(()) => true,
            Err(SurfaceError::Timeout) => {
                debug!("Surface timeout, skipping frame");
                true
            }
            Err(e) => {
                error!("Render failed: {e}");
                false
            }
        }
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        let Some(window) = &self.window else {
            return;
        };
        if let Some(gpu) = &mut self.gpu {
            gpu.resize(size.width, size.height);
        }
        if let Some(running) = &mut self.running {
            let scale_factor = window.scale_factor();
            let (width, height) = logical_size(size, scale_factor);
            running.scene.resize(width, height, scale_factor as f32);
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        info!("Shutting down");
        self.frame_loop.dispose();
        if let (Some(gpu), Some(running)) = (&self.gpu, &mut self.running) {
            running.scene.dispose();
            running
                .renderer
                .sync(&gpu.device, &gpu.queue, &mut running.scene);
            debug!(objects = running.renderer.object_count(), "GPU objects released");
        }
        self.running = None;
        event_loop.exit();
    }

    fn handle_cursor(&mut self, x: f64, y: f64) {
        let previous = self.pointer.last.replace((x, y));
        if !self.pointer.dragging {
            return;
        }
        let (Some(running), Some((px, py))) = (&mut self.running, previous) else {
            return;
        };
        let height = running.scene.viewport().logical_height;
        running
            .scene
            .controls_mut()
            .rotate_by_pixels((x - px) as f32, (y - py) as f32, height);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = match event_loop.create_window(window_attributes_from_config(&self.config)) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Window creation failed: {e}");
                event_loop.exit();
                return;
            }
        };

        match init_render_context_blocking(window.clone(), self.config.window.vsync) {
            Ok(ctx) => {
                info!(
                    adapter = %ctx.adapter.get_info().name,
                    format = ?ctx.surface_format,
                    "GPU initialized"
                );
                self.gpu = Some(ctx);
            }
            Err(e) => {
                error!("GPU initialization failed: {e}");
                event_loop.exit();
                return;
            }
        }

        let source = Arc::new(HttpByteSource::from_config(&self.config.assets));
        let requests = standard_requests(&self.config.scene.texture_quality);
        info!(count = requests.len(), quality = %self.config.scene.texture_quality, "loading textures");
        self.loading = Some(BundleTask::spawn(source, requests));
        window.set_title(&loading_title(&self.config.window.title, 0.0));
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(size) => self.resize(size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    self.resize(size);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                let Some(action) = controls::action_for_key(code) else {
                    return;
                };
                let Some(running) = &mut self.running else {
                    if action == controls::ControlAction::Quit {
                        self.shutdown(event_loop);
                    }
                    return;
                };
                match controls::apply(action, &mut running.scene) {
                    ControlOutcome::Handled => {}
                    ControlOutcome::Reload => {
                        let (loader, options) = self.data_loader();
                        if let Some(running) = &mut self.running {
                            running.scene.begin_reload(loader, options);
                        }
                    }
                    ControlOutcome::Quit => self.shutdown(event_loop),
                }
            }
            WindowEvent::CursorMoved { position, .. } => self.handle_cursor(position.x, position.y),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.pointer.dragging = state == ElementState::Pressed;
                if let Some(running) = &mut self.running {
                    running.scene.controls_mut().set_dragging(self.pointer.dragging);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(running) = &mut self.running {
                    running.scene.controls_mut().zoom(wheel_steps(delta));
                }
            }
            WindowEvent::RedrawRequested => {
                self.poll_loading();
                if !self.redraw() {
                    self.shutdown(event_loop);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Create the event loop and run the viewer until the window closes.
#[instrument(skip(config))]
pub fn run(config: Config, seed: u64) -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, seed);
    event_loop.run_app(&mut app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn test_window_attributes_use_config() {
        let mut config = Config::default();
        config.window.title = "Orrery Test".to_string();
        let attrs = window_attributes_from_config(&config);
        assert_eq!(attrs.title, "Orrery Test");
    }

    #[test]
    fn test_loading_title_rounds_and_clamps() {
        assert_eq!(loading_title("Orrery", 0.0), "Orrery (loading textures 0%)");
        assert_eq!(loading_title("Orrery", 0.456), "Orrery (loading textures 46%)");
        assert_eq!(loading_title("Orrery", 1.7), "Orrery (loading textures 100%)");
    }

    #[test]
    fn test_logical_size_divides_by_scale() {
        let (w, h) = logical_size(PhysicalSize::new(2560, 1440), 2.0);
        assert_eq!((w, h), (1280.0, 720.0));
        let (w, _) = logical_size(PhysicalSize::new(800, 600), 0.0);
        assert_eq!(w, 800.0);
    }

    #[test]
    fn test_wheel_steps() {
        assert_eq!(wheel_steps(MouseScrollDelta::LineDelta(0.0, 2.0)), 2.0);
        let pixel = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -100.0));
        assert_eq!(wheel_steps(pixel), -2.0);
    }

    #[test]
    fn test_new_app_is_idle() {
        let app = App::new(Config::default(), 7);
        assert!(!app.frame_loop.is_running());
        assert!(app.running.is_none());
        let (_, options) = app.data_loader();
        assert_eq!(options.limit, app.config.data.archive_limit);
        assert_eq!(options.fallback_only, app.config.data.offline);
    }
}
