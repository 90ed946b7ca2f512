use crate::input::{PointerAction, PointerTracker};
use std::sync::Arc;
use tearline_render::{RenderContext, RenderError, StageRenderer};
use tearline_runtime::{FrameClock, Interaction};
use tearline_sequencer::{CardAnimation, FsAssetLoader, SessionConfig};
use tracing::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

pub struct PlayerApp {
    session: CardAnimation,
    clock: FrameClock,
    pointer: PointerTracker,

    window: Option<Arc<Window>>,
    render_context: Option<RenderContext>,
    renderer: Option<StageRenderer>,

    fullscreen: bool,
    reported_failure: bool,
}

impl PlayerApp {
    pub fn new(config: SessionConfig, fullscreen: bool) -> Self {
        let session = CardAnimation::start(config, Arc::new(FsAssetLoader));
        Self {
            session,
            clock: FrameClock::new(),
            pointer: PointerTracker::new(1.0),
            window: None,
            render_context: None,
            renderer: None,
            fullscreen,
            reported_failure: false,
        }
    }

    fn initialize(&mut self, event_loop: &ActiveEventLoop) {
        let window_attrs = Window::default_attributes()
            .with_title("Tearline")
            .with_inner_size(LogicalSize::new(1280.0, 720.0));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        if self.fullscreen {
            window.set_fullscreen(Some(winit::window::Fullscreen::Borderless(None)));
        }

        self.pointer.set_scale_factor(window.scale_factor());
        self.resize_session(window.inner_size());
        self.window = Some(window.clone());

        // Without a GPU the session still runs; it just never draws
        match pollster::block_on(RenderContext::new(window)) {
            Ok(context) => {
                let capacity = self.session.sunburst().capacity();
                self.renderer = Some(StageRenderer::new(&context, capacity));
                self.render_context = Some(context);
            }
            Err(e) => error!("Rendering disabled: {}", e),
        }
    }

    fn resize_session(&mut self, size: PhysicalSize<u32>) {
        let scale = self.pointer.scale_factor();
        let logical: LogicalSize<f64> = size.to_logical(scale);
        self.session
            .resize(logical.width as f32, logical.height as f32, scale as f32);
    }

    fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    fn apply_pointer(&mut self, action: PointerAction) {
        let now = self.now_ms();
        match action {
            PointerAction::Move { x, y } => self.session.pointer_move(x, y, now),
            PointerAction::Leave => self.session.pointer_leave(now),
            PointerAction::Press { touch } => {
                let kind = if touch {
                    Interaction::TouchStart
                } else {
                    Interaction::MouseDown
                };
                if self.session.interaction(kind) {
                    info!("Playback started by user gesture");
                }
            }
            // Counts as the Click gesture too
            PointerAction::Click { x, y } => self.session.click(x, y, now),
        }
    }

    fn replay(&mut self) {
        info!("Replaying");
        self.session.reset();
        if let Some(renderer) = &mut self.renderer {
            renderer.reset();
        }
    }

    fn tick(&mut self) {
        self.clock.tick();
        let now = self.now_ms();

        if let Err(e) = self.session.frame(now) {
            error!("Frame update failed: {}", e);
        }

        if let Some(reason) = self.session.failure() {
            if !self.reported_failure {
                self.reported_failure = true;
                error!("Session stopped: {}", reason);
            }
        }
    }

    fn render(&mut self) {
        let (Some(context), Some(renderer)) = (&mut self.render_context, &mut self.renderer) else {
            return;
        };

        let now = self.clock.now_ms();
        match renderer.render(context, &mut self.session, now) {
            Ok(()) => {}
            Err(RenderError::SurfaceError(e)) => warn!("Skipped frame: {}", e),
            Err(e) => error!("Render error: {}", e),
        }
    }
}

impl ApplicationHandler for PlayerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            self.initialize(event_loop);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.session.shutdown();
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(context) = &mut self.render_context {
                    context.resize(new_size);
                }
                self.resize_session(new_size);
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                debug!("Scale factor changed to {}", scale_factor);
                self.pointer.set_scale_factor(scale_factor);
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    self.resize_session(size);
                }
            }

            WindowEvent::Focused(true) => {
                self.session.interaction(Interaction::Focus);
            }

            WindowEvent::CursorMoved { position, .. } => {
                let action = self.pointer.cursor_moved((position.x, position.y));
                self.apply_pointer(action);
            }

            WindowEvent::CursorLeft { .. } => {
                let action = self.pointer.cursor_left();
                self.apply_pointer(action);
            }

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(action) = self.pointer.button(state == ElementState::Pressed) {
                    self.apply_pointer(action);
                }
            }

            WindowEvent::Touch(touch) => {
                for action in self
                    .pointer
                    .touch(touch.phase, (touch.location.x, touch.location.y))
                {
                    self.apply_pointer(action);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                let PhysicalKey::Code(key_code) = event.physical_key else {
                    return;
                };
                match key_code {
                    KeyCode::Escape => {
                        self.session.shutdown();
                        event_loop.exit();
                    }
                    KeyCode::KeyR => self.replay(),
                    KeyCode::KeyT => {
                        let now = self.now_ms();
                        self.session.trigger_tear(now);
                    }
                    KeyCode::F11 => {
                        if let Some(window) = &self.window {
                            if window.fullscreen().is_some() {
                                window.set_fullscreen(None);
                            } else {
                                window.set_fullscreen(Some(
                                    winit::window::Fullscreen::Borderless(None),
                                ));
                            }
                        }
                    }
                    _ => {}
                }
            }

            WindowEvent::RedrawRequested => {
                self.tick();
                self.render();
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
