//! Windowed driver: winit event loop, frame clock, hands and renderer.
//!
//! Each redraw reads the newest hand snapshot, steps the simulation once and
//! draws the result. Keyboard:
//!
//! | Key | Action |
//! |---|---|
//! | `1`-`6` | Built-in templates in table order |
//! | `C` | Next palette color |
//! | `Space` | Pause / resume |
//! | `Escape` | Quit |
//!
//! The mouse wheel zooms the camera.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::{MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::KeyCode,
    window::{Window, WindowId},
};

use crate::config::Config;
use crate::error::SimulationError;
use crate::gpu::{Camera, FrameInput, GpuState};
use crate::hand::{HandFeed, HandState};
use crate::input::Input;
use crate::shapes;
use crate::simulation::Simulation;
use crate::time::FrameClock;

const TITLE_REFRESH: Duration = Duration::from_millis(500);
const TEMPLATE_KEYS: [KeyCode; 6] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
];

/// Where hand snapshots come from.
#[derive(Debug)]
pub enum HandInput {
    /// Mouse-driven hands, see [`Input::pointer_hands`].
    Pointer,
    /// A tracker running on its own thread.
    Feed(HandFeed),
}

impl HandInput {
    fn latest(&mut self, input: &Input) -> HandState {
        match self {
            HandInput::Pointer => input.pointer_hands(),
            HandInput::Feed(feed) => feed.latest(),
        }
    }

    fn stop(&mut self) {
        if let HandInput::Feed(feed) = self {
            feed.stop();
        }
    }
}

pub struct App {
    config: Config,
    simulation: Simulation,
    hands: HandInput,
    input: Input,
    clock: FrameClock,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    last_title: Instant,
    hands_in_view: usize,
    error: Option<SimulationError>,
}

impl App {
    pub fn new(config: Config, simulation: Simulation, hands: HandInput) -> Self {
        Self {
            clock: FrameClock::new(config.max_delta),
            config,
            simulation,
            hands,
            input: Input::new(),
            window: None,
            gpu_state: None,
            last_title: Instant::now(),
            hands_in_view: 0,
            error: None,
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), SimulationError> {
        let window_attrs = Window::default_attributes()
            .with_title("Nebula")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let size = window.inner_size();
        self.input.set_window_size(size.width, size.height);
        self.window = Some(window.clone());

        let camera = Camera::new(self.config.camera_distance, self.config.fov_degrees);
        let count = self.simulation.field().len() as u32;
        match pollster::block_on(GpuState::new(window, count, camera)) {
            Ok(gpu_state) => self.gpu_state = Some(gpu_state),
            Err(e) => error!(error = %e, "GPU unavailable; simulation continues without rendering"),
        }
        Ok(())
    }

    fn handle_keys(&mut self, event_loop: &ActiveEventLoop) {
        if self.input.key_pressed(KeyCode::Escape) {
            event_loop.exit();
            return;
        }
        if self.input.key_pressed(KeyCode::Space) {
            self.clock.toggle_pause();
            info!(paused = self.clock.is_paused(), "Toggled pause");
        }
        if self.input.key_pressed(KeyCode::KeyC) {
            let color = self.simulation.cycle_color();
            info!(%color, "Changed color");
        }
        let selected = TEMPLATE_KEYS.iter().position(|key| self.input.key_pressed(*key));
        let template = selected.and_then(|i| shapes::builtin_templates().into_iter().nth(i));
        if let Some(template) = template {
            self.simulation.set_template(template);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.handle_keys(event_loop);
        self.input.begin_frame();

        let dt = self.clock.tick();
        let hands = self.hands.latest(&self.input);
        self.hands_in_view = hands.detected_count();
        self.simulation.step(dt, &hands);

        if let Some(gpu_state) = &mut self.gpu_state {
            let sim = &self.simulation;
            let frame = FrameInput {
                positions: sim.field().as_flat(),
                rotation: sim.rotation(),
                color: sim.color(),
                point_size: self.config.point_size,
            };
            match gpu_state.render(frame) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    gpu_state.reconfigure()
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    error!("GPU out of memory; exiting");
                    event_loop.exit();
                }
                Err(e) => warn!(error = %e, "Render error"),
            }
        }

        self.update_title();
    }

    fn update_title(&mut self) {
        if self.last_title.elapsed() < TITLE_REFRESH {
            return;
        }
        self.last_title = Instant::now();
        if let Some(window) = &self.window {
            let paused = if self.clock.is_paused() { " (paused)" } else { "" };
            window.set_title(&format!(
                "Nebula - {} - {} hand(s) - {:.0} FPS{paused}",
                self.simulation.template().name(),
                self.hands_in_view,
                self.clock.fps()
            ));
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window(event_loop) {
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                self.input.set_window_size(physical_size.width, physical_size.height);
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                if let Some(gpu_state) = &mut self.gpu_state {
                    let distance = gpu_state.camera.distance - scroll * 2.0;
                    gpu_state.camera.distance = distance.clamp(5.0, 120.0);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        info!("Shutting down");
        self.hands.stop();
        self.gpu_state = None;
        self.window = None;
    }
}

/// Open a window and run until it closes.
pub fn run(
    config: Config,
    simulation: Simulation,
    hands: HandInput,
) -> Result<(), SimulationError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, simulation, hands);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
