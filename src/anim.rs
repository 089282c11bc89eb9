use std::time::{Duration, Instant};

use crate::cache::CacheEntry;

/// Substituted when a frame declares no usable delay.
pub const DEFAULT_FRAME_DELAY_MS: u64 = 100;

// ---------------------------------------------------------------------------
// Animation clock
// ---------------------------------------------------------------------------

/// Playback position within the displayed entry. Reset on every navigation.
pub struct AnimationState {
    pub frame: usize,
    pub last_advance: Instant,
}

impl AnimationState {
    pub fn new(now: Instant) -> Self {
        Self {
            frame: 0,
            last_advance: now,
        }
    }

    pub fn reset(&mut self, now: Instant) {
        self.frame = 0;
        self.last_advance = now;
    }
}

fn frame_delay(entry: &CacheEntry, frame: usize) -> Duration {
    let d = entry.delays[frame % entry.delays.len()];
    if d <= 0 {
        Duration::from_millis(DEFAULT_FRAME_DELAY_MS)
    } else {
        Duration::from_millis(d as u64)
    }
}

/// Advance the frame index once if the current frame's delay has elapsed,
/// wrapping modulo the frame count. Returns true when the displayed frame
/// changed (a redraw is due).
pub fn advance(entry: &CacheEntry, state: &mut AnimationState, now: Instant) -> bool {
    if entry.frames.len() <= 1 {
        return false;
    }
    let delay = frame_delay(entry, state.frame);
    if now.duration_since(state.last_advance) >= delay {
        state.frame = (state.frame + 1) % entry.frames.len();
        state.last_advance = now;
        true
    } else {
        false
    }
}

/// Time until the next frame deadline, or None for static entries. Feeds the
/// scheduler's wait-timeout computation.
pub fn time_to_next(entry: &CacheEntry, state: &AnimationState, now: Instant) -> Option<Duration> {
    if entry.frames.len() <= 1 {
        return None;
    }
    let delay = frame_delay(entry, state.frame);
    Some(delay.saturating_sub(now.duration_since(state.last_advance)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(delays: Vec<i32>) -> CacheEntry {
        CacheEntry {
            frames: delays.iter().map(|_| vec![0u8; 4]).collect(),
            delays,
            metadata: Vec::new(),
            width: 1,
            height: 1,
            file_size: 0,
        }
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn static_entries_never_advance() {
        let e = entry(vec![0]);
        let t0 = Instant::now();
        let mut state = AnimationState::new(t0);

        assert!(!advance(&e, &mut state, t0 + ms(10_000)));
        assert_eq!(state.frame, 0);
        assert_eq!(time_to_next(&e, &state, t0), None);
    }

    #[test]
    fn advances_at_declared_delays_and_wraps() {
        let e = entry(vec![50, 100, 150]);
        let t0 = Instant::now();
        let mut state = AnimationState::new(t0);

        assert!(!advance(&e, &mut state, t0 + ms(49)));
        assert_eq!(state.frame, 0);

        assert!(advance(&e, &mut state, t0 + ms(50)));
        assert_eq!(state.frame, 1);

        let t1 = t0 + ms(50);
        assert!(!advance(&e, &mut state, t1 + ms(99)));
        assert!(advance(&e, &mut state, t1 + ms(100)));
        assert_eq!(state.frame, 2);

        let t2 = t1 + ms(100);
        assert!(advance(&e, &mut state, t2 + ms(150)));
        assert_eq!(state.frame, 0, "wraps back to the first frame");
    }

    #[test]
    fn missing_delay_defaults_to_100ms() {
        let e = entry(vec![0, -20]);
        let t0 = Instant::now();
        let mut state = AnimationState::new(t0);

        assert!(!advance(&e, &mut state, t0 + ms(99)));
        assert!(advance(&e, &mut state, t0 + ms(100)));
        assert_eq!(state.frame, 1);
    }

    #[test]
    fn reports_remaining_time_to_deadline() {
        let e = entry(vec![50, 100]);
        let t0 = Instant::now();
        let state = AnimationState::new(t0);

        assert_eq!(time_to_next(&e, &state, t0 + ms(30)), Some(ms(20)));
        // Past the deadline the remaining time clamps to zero.
        assert_eq!(time_to_next(&e, &state, t0 + ms(80)), Some(ms(0)));
    }
}
