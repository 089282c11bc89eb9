use std::time::{Duration, Instant};

use crate::view::ViewState;

/// How long after the last interaction the fast render path stays selected,
/// so the first frame after input settles is the quality one.
pub const INTERACTION_DEBOUNCE: Duration = Duration::from_millis(100);

/// Render fidelity for one frame: cheap filtering while interacting,
/// higher-cost resampling once the view is at rest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    Fast,
    Quality,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Tracks the redraw pipeline (one outstanding frame at a time) and computes
/// the wait timeout for the next event poll from the union of deadlines.
pub struct RenderScheduler {
    pending: bool,
    in_flight: bool,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self {
            pending: false,
            in_flight: false,
        }
    }

    /// Ask for a repaint; coalesces with any request already pending.
    pub fn request_redraw(&mut self) {
        self.pending = true;
    }

    pub fn redraw_pending(&self) -> bool {
        self.pending
    }

    /// Try to start composing. Refused while a composed frame is still
    /// awaiting its present acknowledgment.
    pub fn begin_frame(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.pending = false;
        self.in_flight = true;
        true
    }

    /// The display collaborator consumed the frame.
    pub fn frame_presented(&mut self) {
        self.in_flight = false;
    }

    /// Whether anything requires a repaint right now.
    pub fn redraw_due(&self, view: &ViewState, frame_advanced: bool) -> bool {
        self.pending
            || frame_advanced
            || view.is_animating
            || view.zooming_in
            || view.zooming_out
    }

    /// Fast while the user is interacting or within the debounce window.
    pub fn render_mode(&self, view: &ViewState, now: Instant) -> RenderMode {
        let interacting =
            view.zooming_in || view.zooming_out || view.is_panning || view.is_animating;
        if interacting || now.duration_since(view.last_interaction_time) < INTERACTION_DEBOUNCE {
            RenderMode::Fast
        } else {
            RenderMode::Quality
        }
    }

    /// Minimum over the active deadline sources: zero when a redraw is
    /// already due, else the sooner of the next animation frame and the
    /// debounce expiry (the pending quality repaint), else block until the
    /// next external event.
    pub fn wait_timeout(
        &self,
        due: bool,
        next_frame: Option<Duration>,
        debounce: Option<Duration>,
    ) -> Option<Duration> {
        if due {
            return Some(Duration::ZERO);
        }
        match (next_frame, debounce) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn settled_view(now: Instant) -> ViewState {
        let mut view = ViewState::new(now);
        view.last_interaction_time = now - Duration::from_secs(10);
        view
    }

    #[test]
    fn fast_path_holds_through_the_debounce_window() {
        let now = Instant::now();
        let sched = RenderScheduler::new();
        let mut view = settled_view(now);
        view.touch(now);

        assert_eq!(
            sched.render_mode(&view, now + Duration::from_millis(50)),
            RenderMode::Fast,
            "within 100ms of the interaction"
        );
        assert_eq!(
            sched.render_mode(&view, now + Duration::from_millis(150)),
            RenderMode::Quality
        );
    }

    #[test]
    fn interaction_flags_force_the_fast_path() {
        let now = Instant::now();
        let sched = RenderScheduler::new();

        let mut view = settled_view(now);
        view.is_panning = true;
        assert_eq!(sched.render_mode(&view, now), RenderMode::Fast);

        let mut view = settled_view(now);
        view.is_animating = true;
        assert_eq!(sched.render_mode(&view, now), RenderMode::Fast);
    }

    #[test]
    fn redraw_due_unions_its_sources() {
        let now = Instant::now();
        let mut sched = RenderScheduler::new();
        let mut view = settled_view(now);

        assert!(!sched.redraw_due(&view, false));
        assert!(sched.redraw_due(&view, true), "animation frame crossed");

        view.zooming_in = true;
        assert!(sched.redraw_due(&view, false));
        view.zooming_in = false;

        sched.request_redraw();
        assert!(sched.redraw_due(&view, false));
    }

    #[test]
    fn timeout_is_the_minimum_deadline() {
        let sched = RenderScheduler::new();
        let frame = Some(Duration::from_millis(40));
        let debounce = Some(Duration::from_millis(25));

        assert_eq!(
            sched.wait_timeout(true, frame, debounce),
            Some(Duration::ZERO),
            "an already-due redraw wins"
        );
        assert_eq!(sched.wait_timeout(false, frame, debounce), debounce);
        assert_eq!(sched.wait_timeout(false, frame, None), frame);
        assert_eq!(sched.wait_timeout(false, None, debounce), debounce);
        assert_eq!(sched.wait_timeout(false, None, None), None, "block for input");
    }

    #[test]
    fn one_outstanding_frame_at_a_time() {
        let mut sched = RenderScheduler::new();

        sched.request_redraw();
        assert!(sched.begin_frame());
        assert!(!sched.redraw_pending(), "consumed by composition");
        assert!(!sched.begin_frame(), "previous present not acknowledged");

        // A request arriving mid-flight survives the acknowledgment.
        sched.request_redraw();
        sched.frame_presented();
        assert!(sched.redraw_pending());
        assert!(sched.begin_frame());
    }
}
