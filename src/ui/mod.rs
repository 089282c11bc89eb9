use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

use softbuffer::Surface;

use crate::error::ViewerError;
use crate::ui::state::{TrayButton, ViewerState, tray_contains, tray_hit};
use crate::view::{ZOOM_MAX, ZOOM_MIN};

pub mod render;
pub mod state;

const ZOOM_STEP: f32 = 0.1;
/// Keyboard pan step in viewport pixels at zoom 1.0.
const PAN_STEP: f32 = 30.0;

// ---------------------------------------------------------------------------
// Application handler (winit 0.30 style)
// ---------------------------------------------------------------------------

pub struct App {
    pub state: ViewerState,
    pub window: Option<Arc<Window>>,
    pub context: Option<softbuffer::Context<Arc<Window>>>,
    pub surface: Option<Surface<Arc<Window>, Arc<Window>>>,
}

impl App {
    pub fn new(state: ViewerState) -> Self {
        Self {
            state,
            window: None,
            context: None,
            surface: None,
        }
    }

    fn request_redraw(&self) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }

    fn refresh_title(&self) {
        if let Some(ref window) = self.window {
            window.set_title(&self.state.title());
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = Window::default_attributes()
            .with_title(self.state.title())
            .with_inner_size(LogicalSize::new(1280u32, 720u32));
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));
        let context = softbuffer::Context::new(Arc::clone(&window)).expect("create context");
        let surface = Surface::new(&context, Arc::clone(&window)).expect("create surface");

        window.request_redraw();
        self.window = Some(window);
        self.context = Some(context);
        self.surface = Some(surface);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(PhysicalSize { width, height }) => {
                let w = width.max(1);
                let h = height.max(1);
                self.state.viewport = (w, h);
                if let Some(ref mut surface) = self.surface {
                    let resized = surface.resize(
                        std::num::NonZeroU32::new(w).unwrap(),
                        std::num::NonZeroU32::new(h).unwrap(),
                    );
                    if resized.is_err() {
                        log::error!("{}", ViewerError::Allocation { width: w, height: h });
                        event_loop.exit();
                        return;
                    }
                }
                self.state.sched.request_redraw();
                self.request_redraw();
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                self.state.shift_down = modifiers.state().shift_key();
                self.state.ctrl_down = modifiers.state().control_key();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let pressed = event.state == ElementState::Pressed;
                let now = Instant::now();
                let state = &mut self.state;

                match &event.logical_key {
                    Key::Named(NamedKey::Escape) if pressed => {
                        event_loop.exit();
                        return;
                    }
                    Key::Named(NamedKey::ArrowRight) if pressed => {
                        if state.ctrl_down {
                            state.view.step_pan(-PAN_STEP / state.view.zoom, 0.0);
                            state.view.touch(now);
                            state.sched.request_redraw();
                        } else {
                            state.navigate(1, now);
                            self.refresh_title();
                        }
                    }
                    Key::Named(NamedKey::ArrowLeft) if pressed => {
                        if state.ctrl_down {
                            state.view.step_pan(PAN_STEP / state.view.zoom, 0.0);
                            state.view.touch(now);
                            state.sched.request_redraw();
                        } else {
                            state.navigate(-1, now);
                            self.refresh_title();
                        }
                    }
                    Key::Named(NamedKey::ArrowUp) if pressed && state.ctrl_down => {
                        state.view.step_pan(0.0, PAN_STEP / state.view.zoom);
                        state.view.touch(now);
                        state.sched.request_redraw();
                    }
                    Key::Named(NamedKey::ArrowDown) if pressed && state.ctrl_down => {
                        state.view.step_pan(0.0, -PAN_STEP / state.view.zoom);
                        state.view.touch(now);
                        state.sched.request_redraw();
                    }
                    Key::Character(s) => match s.as_str() {
                        "q" if pressed => {
                            event_loop.exit();
                            return;
                        }
                        "i" if pressed && !event.repeat => {
                            state.show_info = !state.show_info;
                            state.sched.request_redraw();
                        }
                        // Discrete steps repeat with the key; the flags keep
                        // the scheduler ticking and the fast path selected.
                        "+" | "=" => {
                            state.view.zooming_in = pressed;
                            if pressed {
                                state.view.step_zoom(ZOOM_STEP);
                                state.view.touch(now);
                                state.sched.request_redraw();
                            }
                        }
                        "-" => {
                            state.view.zooming_out = pressed;
                            if pressed {
                                state.view.step_zoom(-ZOOM_STEP);
                                state.view.touch(now);
                                state.sched.request_redraw();
                            }
                        }
                        _ => {}
                    },
                    _ => {}
                }

                if self.state.sched.redraw_pending() {
                    self.request_redraw();
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if button != MouseButton::Left {
                    return;
                }
                let now = Instant::now();
                let pressed = state == ElementState::Pressed;
                let (mx, my) = self.state.mouse_pos;

                if pressed {
                    if tray_contains(self.state.viewport, mx, my) {
                        match tray_hit(self.state.viewport, mx, my) {
                            Some(TrayButton::Prev) => {
                                self.state.navigate(-1, now);
                                self.refresh_title();
                            }
                            Some(TrayButton::Next) => {
                                self.state.navigate(1, now);
                                self.refresh_title();
                            }
                            Some(TrayButton::Info) => {
                                self.state.show_info = !self.state.show_info;
                                self.state.sched.request_redraw();
                            }
                            None => {}
                        }
                    } else {
                        self.state.view.is_panning = true;
                        self.state.view.touch(now);
                    }
                } else {
                    self.state.view.is_panning = false;
                    // The debounce deadline now owes one quality repaint.
                    self.state.view.touch(now);
                    self.state.sched.request_redraw();
                }

                if self.state.sched.redraw_pending() {
                    self.request_redraw();
                }
            }

            WindowEvent::CursorMoved {
                position: PhysicalPosition { x, y },
                ..
            } => {
                let now = Instant::now();
                let near_bottom = |my: f64| my > self.state.viewport.1 as f64 * 0.75;
                let crossed_tray_zone = near_bottom(self.state.mouse_pos.1) != near_bottom(y);

                if self.state.view.is_panning {
                    let dx = (x - self.state.mouse_pos.0) as f32;
                    let dy = (y - self.state.mouse_pos.1) as f32;
                    self.state.view.step_pan(dx, dy);
                    self.state.view.touch(now);
                    self.state.sched.request_redraw();
                } else if crossed_tray_zone {
                    self.state.sched.request_redraw();
                }
                self.state.mouse_pos = (x, y);

                if self.state.sched.redraw_pending() {
                    self.request_redraw();
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let now = Instant::now();
                let (dx, dy) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (x * 40.0, y * 40.0),
                    MouseScrollDelta::PixelDelta(PhysicalPosition { x, y }) => {
                        (x as f32, y as f32)
                    }
                };

                if self.state.shift_down {
                    let view = &mut self.state.view;
                    view.zoom = if dy > 0.0 {
                        (view.zoom * 1.1).min(ZOOM_MAX)
                    } else {
                        (view.zoom * 0.9).max(ZOOM_MIN)
                    };
                } else {
                    self.state.view.step_pan(dx, dy);
                }
                self.state.view.touch(now);
                self.state.sched.request_redraw();
                self.request_redraw();
            }

            WindowEvent::PinchGesture { delta, phase, .. } => {
                let now = Instant::now();
                match phase {
                    TouchPhase::Started => {
                        self.state.view.begin_pinch();
                        self.state.pinch_scale = 1.0;
                    }
                    TouchPhase::Moved => {
                        self.state.pinch_scale *= 1.0 + delta as f32;
                        let scale = self.state.pinch_scale;
                        self.state.view.pinch(scale);
                        self.state.view.touch(now);
                        self.state.sched.request_redraw();
                    }
                    TouchPhase::Ended | TouchPhase::Cancelled => {
                        // Convergence rubber-bands back to the clamped target.
                        self.state.view.touch(now);
                        self.state.sched.request_redraw();
                    }
                }
                if self.state.sched.redraw_pending() {
                    self.request_redraw();
                }
            }

            WindowEvent::RedrawRequested => {
                if !self.state.sched.begin_frame() {
                    return;
                }
                let window = self.window.as_ref().unwrap();
                let now = Instant::now();
                let mode = self.state.tick(now);

                if let Some(ref mut surface) = self.surface {
                    let size = window.inner_size();
                    let fb_w = size.width.max(1);
                    let fb_h = size.height.max(1);
                    match surface.buffer_mut() {
                        Ok(mut buffer) => {
                            self.state.render(&mut buffer, fb_w, fb_h, mode);
                            let _ = buffer.present();
                        }
                        Err(_) => {
                            log::error!(
                                "{}",
                                ViewerError::Allocation {
                                    width: fb_w,
                                    height: fb_h
                                }
                            );
                            event_loop.exit();
                            return;
                        }
                    }
                }

                self.state.last_mode = mode;
                self.state.sched.frame_presented();
            }

            _ => {}
        }
    }

    /// The single blocking wait: sleep for the minimum of the animation,
    /// convergence, and debounce deadlines, or indefinitely when idle.
    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(ref window) = self.window else {
            return;
        };
        let now = Instant::now();
        let state = &self.state;

        let due = state.sched.redraw_due(&state.view, false);
        let next_frame = state.time_to_next_frame(now);
        let debounce = state.debounce_remaining(now);

        match state.sched.wait_timeout(due, next_frame, debounce) {
            Some(timeout) if timeout.is_zero() => {
                window.request_redraw();
                event_loop.set_control_flow(ControlFlow::Wait);
            }
            Some(timeout) => {
                event_loop.set_control_flow(ControlFlow::WaitUntil(now + timeout));
            }
            None => {
                event_loop.set_control_flow(ControlFlow::Wait);
            }
        }
    }
}
