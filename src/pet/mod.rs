pub mod descriptor;
pub mod rng;

use glam::Vec2;

use crate::host::WindowHost;
use descriptor::{row_and_flip, PetState, RenderDescriptor};
use rng::RandomSource;

/// Chance that an expiring idle re-rolls into another idle.
const IDLE_STAY_CHANCE: f64 = 0.3;
/// Idle duration range in ticks.
const IDLE_DURATION_MIN: f64 = 180.0;
const IDLE_DURATION_SPAN: f64 = 300.0;
/// Walk duration range in ticks.
const WALK_DURATION_MIN: f64 = 120.0;
const WALK_DURATION_SPAN: f64 = 240.0;
/// Walk speed range in pixels/tick.
const WALK_SPEED_MIN: f64 = 0.5;
const WALK_SPEED_SPAN: f64 = 3.0;

/// Owns the pet's state, position, velocity and timers; decides transitions;
/// integrates movement; asks the host to move the window.
///
/// Positions are window top-left corners in physical screen pixels. While
/// walking, `0 <= x <= screen_w - window_w` (and the same for y) holds after
/// every update. While dragged the host owns the position and the invariant
/// is suspended; we resync once at drag-end rather than polling mid-drag.
pub struct PetController {
    state: PetState,
    position: Vec2,
    velocity: Vec2,
    tick_count: u32,
    state_duration: u32,
    screen: Vec2,
    window: Vec2,
    flip: bool,
    initialized: bool,
}

impl PetController {
    pub fn new() -> Self {
        Self {
            state: PetState::Idle,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            tick_count: 0,
            state_duration: 0,
            screen: Vec2::ZERO,
            window: Vec2::ZERO,
            flip: false,
            initialized: false,
        }
    }

    /// Fetch screen/window geometry and the starting position from the host.
    /// On failure the controller stays uninitialized and `update` is a
    /// permanent no-op until the process restarts.
    pub fn init<H: WindowHost, R: RandomSource>(&mut self, host: &H, rng: &mut R) {
        let (screen_w, screen_h) = match host.screen_size() {
            Ok(size) => size,
            Err(e) => {
                log::error!("pet init failed, screen size unavailable: {e}");
                return;
            }
        };
        let (window_w, window_h) = host.window_size();
        let (x, y) = match host.position() {
            Ok(pos) => pos,
            Err(e) => {
                log::error!("pet init failed, window position unavailable: {e}");
                return;
            }
        };

        self.screen = Vec2::new(screen_w as f32, screen_h as f32);
        self.window = Vec2::new(window_w as f32, window_h as f32);
        self.position = Vec2::new(x as f32, y as f32);
        self.initialized = true;
        self.set_random_idle(rng);
        log::info!(
            "pet initialized: screen {screen_w}x{screen_h}, window {window_w}x{window_h}, at ({x}, {y})"
        );
    }

    pub fn state(&self) -> PetState {
        self.state
    }

    pub fn initialized(&self) -> bool {
        self.initialized
    }

    /// One simulation tick. State update happens here; the driving loop
    /// computes the render descriptor afterwards.
    pub fn update<H: WindowHost, R: RandomSource>(&mut self, host: &H, rng: &mut R) {
        if !self.initialized {
            return;
        }
        self.tick_count += 1;

        match self.state {
            PetState::Idle => self.tick_idle(rng),
            PetState::Walk => self.tick_walk(host, rng),
            // Host owns the position while dragging; nothing to do until
            // drag-end resyncs it.
            PetState::Dragged => {}
        }
    }

    /// Sheet row and mirror flag for the current tick.
    pub fn render_descriptor(&mut self, frame: u32) -> RenderDescriptor {
        let (row, flip) = row_and_flip(self.state, self.velocity, self.flip);
        self.flip = flip;
        RenderDescriptor { row, frame, flip }
    }

    /// Suspend autonomy and hand cursor tracking to the host.
    pub fn start_drag<H: WindowHost>(&mut self, host: &H) {
        if self.state == PetState::Dragged {
            return;
        }
        self.switch_state(PetState::Dragged, 0);
        self.velocity = Vec2::ZERO;
        if let Err(e) = host.begin_drag() {
            log::warn!("interactive drag request failed: {e}");
        }
        log::debug!("drag started");
    }

    /// Resync position from the host and go back to idling. Safe to call
    /// redundantly: a no-op unless currently dragged.
    pub fn end_drag<H: WindowHost, R: RandomSource>(&mut self, host: &H, rng: &mut R) {
        if self.state != PetState::Dragged {
            return;
        }
        match host.position() {
            Ok((x, y)) => self.position = Vec2::new(x as f32, y as f32),
            // Stale cached position is the best we have; keep it.
            Err(e) => log::warn!("post-drag position fetch failed: {e}"),
        }
        self.set_random_idle(rng);
        log::debug!(
            "drag ended at ({:.0}, {:.0})",
            self.position.x,
            self.position.y
        );
    }

    fn tick_idle<R: RandomSource>(&mut self, rng: &mut R) {
        if self.tick_count <= self.state_duration {
            return;
        }
        if rng.next_f64() < IDLE_STAY_CHANCE {
            self.set_random_idle(rng);
        } else {
            let angle = rng.next_f64() * std::f64::consts::TAU;
            let speed = WALK_SPEED_MIN + rng.next_f64() * WALK_SPEED_SPAN;
            self.velocity = Vec2::new(
                (speed * angle.cos()) as f32,
                (speed * angle.sin()) as f32,
            );
            let duration = WALK_DURATION_MIN + rng.next_f64() * WALK_DURATION_SPAN;
            self.switch_state(PetState::Walk, duration as u32);
            log::debug!(
                "walking: v=({:.2}, {:.2}) for {} ticks",
                self.velocity.x,
                self.velocity.y,
                self.state_duration
            );
        }
    }

    fn tick_walk<H: WindowHost, R: RandomSource>(&mut self, host: &H, rng: &mut R) {
        self.position += self.velocity;

        // Elastic reflection, each axis independently: clamp the offending
        // coordinate and negate that velocity component only.
        let max = self.screen - self.window;
        if self.position.x < 0.0 {
            self.position.x = 0.0;
            self.velocity.x = -self.velocity.x;
        } else if self.position.x > max.x {
            self.position.x = max.x;
            self.velocity.x = -self.velocity.x;
        }
        if self.position.y < 0.0 {
            self.position.y = 0.0;
            self.velocity.y = -self.velocity.y;
        } else if self.position.y > max.y {
            self.position.y = max.y;
            self.velocity.y = -self.velocity.y;
        }

        // Expiry check comes before the host write; an expiring tick issues
        // no reposition.
        if self.tick_count > self.state_duration {
            self.velocity = Vec2::ZERO;
            self.set_random_idle(rng);
            return;
        }

        // Fire-and-forget. Our own position stays authoritative whether or
        // not the host honors the request.
        if let Err(e) = host.set_position(
            self.position.x.round() as i32,
            self.position.y.round() as i32,
        ) {
            log::warn!("window reposition failed: {e}");
        }
    }

    fn set_random_idle<R: RandomSource>(&mut self, rng: &mut R) {
        let duration = IDLE_DURATION_MIN + rng.next_f64() * IDLE_DURATION_SPAN;
        self.switch_state(PetState::Idle, duration as u32);
    }

    fn switch_state(&mut self, state: PetState, duration: u32) {
        self.state = state;
        self.state_duration = duration;
        self.tick_count = 0;
    }
}
