use std::num::NonZeroU32;
use std::sync::Arc;

use instant::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{DeviceEvent, DeviceId, ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId, WindowLevel};

use crate::host::WinitHost;
use crate::pet::descriptor::{frame_index, PetState};
use crate::pet::PetController;
use crate::sprite::{PixelFrame, Rect, SpriteRenderer, SpriteSheet};
use crate::Args;

/// Target simulation tick rate (seconds per tick).
const TICK_RATE: f64 = 1.0 / 60.0;
/// Max accumulated time before we clamp (prevents spiral of death).
const MAX_ACCUMULATOR: f64 = 0.25;
/// Logical window edge length in pixels.
const WINDOW_SIZE: f64 = 100.0;
/// Surface clear color (0RGB).
const BACKGROUND: u32 = 0x00_1A1A22;

/// Physical edge length of the pet window at a display scale factor.
fn physical_window_size(scale_factor: f64) -> u32 {
    (WINDOW_SIZE * scale_factor).round().max(1.0) as u32
}

/// Top-level application state. The loop mediates between the controller and
/// the renderer: per tick, state update strictly precedes descriptor
/// computation, which strictly precedes drawing.
struct App {
    args: Args,
    window: Option<Arc<Window>>,
    host: Option<WinitHost>,
    context: Option<softbuffer::Context<Arc<Window>>>,
    surface: Option<softbuffer::Surface<Arc<Window>, Arc<Window>>>,

    controller: PetController,
    renderer: SpriteRenderer,
    rng: fastrand::Rng,

    // Fixed timestep
    last_frame_time: Option<Instant>,
    accumulator: f64,
    tick_count: u64,
}

impl App {
    fn new(args: Args) -> Self {
        let rng = match args.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self {
            args,
            window: None,
            host: None,
            context: None,
            surface: None,
            controller: PetController::new(),
            renderer: SpriteRenderer::new(),
            rng,
            last_frame_time: None,
            accumulator: 0.0,
            tick_count: 0,
        }
    }

    /// Run fixed-timestep simulation ticks.
    fn run_fixed_update(&mut self, dt: f64) {
        self.accumulator += dt;

        if self.accumulator > MAX_ACCUMULATOR {
            self.accumulator = MAX_ACCUMULATOR;
        }

        while self.accumulator >= TICK_RATE {
            if let Some(host) = &self.host {
                self.controller.update(host, &mut self.rng);
            }
            self.accumulator -= TICK_RATE;
            self.tick_count += 1;
        }
    }

    /// Blit the current frame into the softbuffer surface and present it.
    fn render_frame(&mut self) {
        let (Some(window), Some(surface)) = (&self.window, &mut self.surface) else {
            return;
        };
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return;
        }

        let frame_idx = frame_index(self.tick_count, self.controller.state());
        let desc = self.controller.render_descriptor(frame_idx);

        let mut buffer = match surface.buffer_mut() {
            Ok(buffer) => buffer,
            Err(e) => {
                log::warn!("surface buffer unavailable, dropping frame: {e}");
                return;
            }
        };
        let mut frame = PixelFrame::new(&mut buffer, size.width, size.height);
        frame.clear(BACKGROUND);
        // Destination is the full physical surface, so one surface pixel is
        // one screen pixel at any display scale factor.
        self.renderer.draw(
            &mut frame,
            &desc,
            Rect::new(0, 0, size.width, size.height),
        );

        if let Err(e) = buffer.present() {
            log::warn!("present failed: {e}");
        }
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        let Some(surface) = &mut self.surface else {
            return;
        };
        let (Some(w), Some(h)) = (NonZeroU32::new(width), NonZeroU32::new(height)) else {
            return;
        };
        if let Err(e) = surface.resize(w, h) {
            log::warn!("surface resize to {width}x{height} failed: {e}");
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title("shiro")
            .with_decorations(false)
            .with_resizable(false)
            .with_window_level(WindowLevel::AlwaysOnTop)
            .with_inner_size(LogicalSize::new(WINDOW_SIZE, WINDOW_SIZE));

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .expect("failed to create window"),
        );

        let size = window.inner_size();
        log::info!(
            "pet window created: {}x{} physical (scale factor {})",
            size.width,
            size.height,
            window.scale_factor()
        );

        let context = softbuffer::Context::new(window.clone())
            .expect("failed to create softbuffer context");
        let surface = softbuffer::Surface::new(&context, window.clone())
            .expect("failed to create softbuffer surface");
        self.context = Some(context);
        self.surface = Some(surface);
        self.resize_surface(size.width, size.height);

        let host = WinitHost::new(window.clone());
        self.controller.init(&host, &mut self.rng);
        self.host = Some(host);

        match SpriteSheet::from_path(&self.args.sprite) {
            Ok(sheet) => self.renderer.set_sheet(sheet),
            // The pet still wanders; rendering stays a no-op.
            Err(e) => log::error!(
                "sprite sheet {} unusable: {e}",
                self.args.sprite.display()
            ),
        }

        event_loop.set_control_flow(ControlFlow::Poll);
        self.window = Some(window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(w) = &self.window {
            w.request_redraw();
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
                log::info!("close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.resize_surface(new_size.width, new_size.height);
            }
            WindowEvent::ScaleFactorChanged {
                scale_factor,
                mut inner_size_writer,
            } => {
                // A follow-up Resized is platform-dependent, so re-size the
                // surface here as well to keep one surface pixel per screen
                // pixel at the new density.
                let edge = physical_window_size(scale_factor);
                if let Err(e) = inner_size_writer.request_inner_size(PhysicalSize::new(edge, edge))
                {
                    log::warn!("inner size request after scale change failed: {e}");
                }
                self.resize_surface(edge, edge);
                log::debug!("scale factor changed to {scale_factor}, window {edge}x{edge}");
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(host) = &self.host {
                    match state {
                        ElementState::Pressed => self.controller.start_drag(host),
                        ElementState::Released => {
                            self.controller.end_drag(host, &mut self.rng)
                        }
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                if let Some(last) = self.last_frame_time {
                    let dt = now.duration_since(last).as_secs_f64();
                    self.run_fixed_update(dt);
                }
                self.last_frame_time = Some(now);

                self.render_frame();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        // The window system performs the interactive drag (modal move loop
        // on Windows, compositor-driven move on X11/Wayland) and usually
        // consumes the matching MouseInput release, so a raw device-level
        // release is the reliable end-of-gesture signal. The only button
        // held during a drag is the one that started it, so any release
        // while dragged ends it; end_drag is a no-op otherwise.
        if let DeviceEvent::Button {
            state: ElementState::Released,
            ..
        } = event
        {
            if self.controller.state() == PetState::Dragged {
                if let Some(host) = &self.host {
                    self.controller.end_drag(host, &mut self.rng);
                }
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Drop presentation resources; no timers or polls are scheduled, so
        // nothing else needs cancelling.
        self.surface = None;
        self.context = None;
        log::info!("shut down after {} ticks", self.tick_count);
    }
}

/// Entry point — create event loop and run.
pub fn run(args: Args) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(args);
    event_loop.run_app(&mut app)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_tracks_display_scale() {
        assert_eq!(physical_window_size(1.0), 100);
        assert_eq!(physical_window_size(1.25), 125);
        assert_eq!(physical_window_size(1.5), 150);
        assert_eq!(physical_window_size(2.0), 200);
        // degenerate scale never produces a zero-sized surface
        assert_eq!(physical_window_size(0.001), 1);
    }
}
