use glam::Vec2;

/// Behavior state of the pet. Exactly one is active at a time.
///
/// "Back" (viewed from behind while climbing) is not a state — it is a
/// render variant of `Walk` derived from the vertical velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetState {
    Idle,
    Walk,
    Dragged,
}

/// Sprite-sheet row assignments. Row 3 is unused in the shipped sheet.
pub const ROW_WALK: u32 = 0;
pub const ROW_IDLE: u32 = 1;
pub const ROW_DRAGGED: u32 = 2;
pub const ROW_BACK: u32 = 4;

/// Upward velocity threshold below which a walking pet shows its back row.
const BACK_VY_THRESHOLD: f32 = -0.1;

/// Ticks per animation frame while idle (slow cycle).
const IDLE_FRAME_TICKS: u64 = 60;
/// Ticks per animation frame in every moving state.
const WALK_FRAME_TICKS: u64 = 30;

/// Which sub-image to draw this tick and whether to mirror it.
/// Assembled fresh every tick; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderDescriptor {
    pub row: u32,
    pub frame: u32,
    pub flip: bool,
}

/// Map `(state, velocity)` to a sheet row and mirror flag.
///
/// `prev_flip` is retained when `vx == 0` so the pet keeps facing the way it
/// was last moving.
pub fn row_and_flip(state: PetState, velocity: Vec2, prev_flip: bool) -> (u32, bool) {
    match state {
        PetState::Dragged => (ROW_DRAGGED, false),
        PetState::Idle => (ROW_IDLE, false),
        PetState::Walk => {
            let row = if velocity.y < BACK_VY_THRESHOLD {
                ROW_BACK
            } else {
                ROW_WALK
            };
            let flip = if velocity.x < 0.0 {
                true
            } else if velocity.x > 0.0 {
                false
            } else {
                prev_flip
            };
            (row, flip)
        }
    }
}

/// Animation frame for the current tick counter.
///
/// Deterministic time cycling: idle runs the slow cycle, everything else the
/// fast one. The counter advances once per simulation tick.
pub fn frame_index(ticks: u64, state: PetState) -> u32 {
    let speed = match state {
        PetState::Idle => IDLE_FRAME_TICKS,
        _ => WALK_FRAME_TICKS,
    };
    ((ticks / speed) % crate::sprite::COLS as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dragged_and_idle_rows_never_flip() {
        let (row, flip) = row_and_flip(PetState::Dragged, Vec2::new(-3.0, 0.0), true);
        assert_eq!(row, ROW_DRAGGED);
        assert!(!flip);

        let (row, flip) = row_and_flip(PetState::Idle, Vec2::new(-3.0, 0.0), true);
        assert_eq!(row, ROW_IDLE);
        assert!(!flip);
    }

    #[test]
    fn walk_flips_exactly_when_moving_left() {
        let (_, flip) = row_and_flip(PetState::Walk, Vec2::new(-0.01, 0.0), false);
        assert!(flip);
        let (_, flip) = row_and_flip(PetState::Walk, Vec2::new(0.01, 0.0), true);
        assert!(!flip);
    }

    #[test]
    fn walk_retains_prior_flip_when_vx_is_zero() {
        let (_, flip) = row_and_flip(PetState::Walk, Vec2::new(0.0, 1.0), true);
        assert!(flip);
        let (_, flip) = row_and_flip(PetState::Walk, Vec2::new(0.0, 1.0), false);
        assert!(!flip);
    }

    #[test]
    fn back_row_requires_sufficient_upward_velocity() {
        let (row, _) = row_and_flip(PetState::Walk, Vec2::new(1.0, -0.2), false);
        assert_eq!(row, ROW_BACK);
        // -0.1 exactly is not "sufficiently upward"
        let (row, _) = row_and_flip(PetState::Walk, Vec2::new(1.0, -0.1), false);
        assert_eq!(row, ROW_WALK);
        let (row, _) = row_and_flip(PetState::Walk, Vec2::new(1.0, 0.5), false);
        assert_eq!(row, ROW_WALK);
    }

    #[test]
    fn walk_frames_cycle_in_blocks_of_thirty() {
        let mut seq = Vec::new();
        for t in 0..90u64 {
            seq.push(frame_index(t, PetState::Walk));
        }
        for (t, frame) in seq.iter().enumerate() {
            assert_eq!(*frame, (t as u32) / 30, "tick {t}");
        }
        // wraps back to frame 0
        assert_eq!(frame_index(90, PetState::Walk), 0);
    }

    #[test]
    fn idle_frames_cycle_slower() {
        assert_eq!(frame_index(0, PetState::Idle), 0);
        assert_eq!(frame_index(59, PetState::Idle), 0);
        assert_eq!(frame_index(60, PetState::Idle), 1);
        assert_eq!(frame_index(120, PetState::Idle), 2);
        assert_eq!(frame_index(180, PetState::Idle), 0);
    }
}
