use std::time::Instant;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const ZOOM_MIN: f32 = 0.05;
pub const ZOOM_MAX: f32 = 10.0;
/// Wider clamp applied at the input layer so an active pinch can overshoot
/// and rubber-band back to the target range.
pub const ZOOM_HARD_MIN: f32 = 0.03;
pub const ZOOM_HARD_MAX: f32 = 15.0;

/// Fraction of the remaining distance covered per tick.
const CONVERGE_RATE: f32 = 0.15;
const ZOOM_EPSILON: f32 = 0.001;
const PAN_EPSILON: f32 = 0.1;
/// Pixels of the image guaranteed to stay on screen while panning.
const PAN_MARGIN: f32 = 50.0;

// ---------------------------------------------------------------------------
// View state
// ---------------------------------------------------------------------------

/// Zoom and pan with spring-convergence toward clamped targets. The live
/// `zoom`/`pan` values are what gets drawn; `step` pulls them toward targets
/// recomputed from the hard bounds and the viewport each tick.
pub struct ViewState {
    pub zoom: f32,
    pub target_zoom: f32,
    pub pan_x: f32,
    pub pan_y: f32,
    pub target_pan_x: f32,
    pub target_pan_y: f32,
    /// Zoom at the moment the current pinch gesture began.
    pub base_zoom: f32,
    pub is_panning: bool,
    pub zooming_in: bool,
    pub zooming_out: bool,
    pub is_animating: bool,
    pub last_interaction_time: Instant,
}

impl ViewState {
    pub fn new(now: Instant) -> Self {
        Self {
            zoom: 1.0,
            target_zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            target_pan_x: 0.0,
            target_pan_y: 0.0,
            base_zoom: 1.0,
            is_panning: false,
            zooming_in: false,
            zooming_out: false,
            is_animating: false,
            last_interaction_time: now,
        }
    }

    /// Record a user-driven mutation; drives the render-fidelity debounce.
    pub fn touch(&mut self, now: Instant) {
        self.last_interaction_time = now;
    }

    pub fn reset_pan(&mut self) {
        self.pan_x = 0.0;
        self.pan_y = 0.0;
        self.target_pan_x = 0.0;
        self.target_pan_y = 0.0;
    }

    /// Discrete keyboard zoom step: mutates directly, no convergence.
    pub fn step_zoom(&mut self, delta: f32) {
        self.zoom = (self.zoom + delta).clamp(ZOOM_MIN, ZOOM_MAX);
    }

    /// Discrete keyboard pan step (viewport pixels), no convergence.
    pub fn step_pan(&mut self, dx: f32, dy: f32) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    pub fn begin_pinch(&mut self) {
        self.base_zoom = self.zoom;
    }

    /// Scale relative to the gesture baseline, clamped only to the hard
    /// bounds; convergence snaps back once the gesture ends.
    pub fn pinch(&mut self, scale: f32) {
        self.zoom = (self.base_zoom * scale).clamp(ZOOM_HARD_MIN, ZOOM_HARD_MAX);
    }

    /// One scheduler tick: derive clamped targets, then move each live value
    /// 15% of the way there. `image` is the intrinsic size of the displayed
    /// entry, if one is decoded. Returns true while any field is still
    /// converging.
    pub fn step(&mut self, image: Option<(u32, u32)>, viewport: (u32, u32)) -> bool {
        self.target_zoom = self.zoom.clamp(ZOOM_MIN, ZOOM_MAX);
        let zoom_settled = converge(&mut self.zoom, self.target_zoom, ZOOM_EPSILON);

        let (vw, vh) = (viewport.0 as f32, viewport.1 as f32);
        let (dw, dh) = image
            .map(|(w, h)| displayed_size(w as f32, h as f32, vw, vh, self.zoom))
            .unwrap_or((0.0, 0.0));
        self.target_pan_x = pan_target(self.pan_x, dw, vw);
        self.target_pan_y = pan_target(self.pan_y, dh, vh);
        let x_settled = converge(&mut self.pan_x, self.target_pan_x, PAN_EPSILON);
        let y_settled = converge(&mut self.pan_y, self.target_pan_y, PAN_EPSILON);

        self.is_animating = !(zoom_settled && x_settled && y_settled);
        self.is_animating
    }
}

/// First-order low-pass toward `target`; snaps and reports settled once the
/// residual drops below `epsilon`.
fn converge(value: &mut f32, target: f32, epsilon: f32) -> bool {
    let residual = target - *value;
    if residual.abs() < epsilon {
        *value = target;
        true
    } else {
        *value += residual * CONVERGE_RATE;
        false
    }
}

/// On-screen size of the image: aspect-fit into the viewport, then zoomed.
pub fn displayed_size(iw: f32, ih: f32, vw: f32, vh: f32, zoom: f32) -> (f32, f32) {
    if iw <= 0.0 || ih <= 0.0 || vh <= 0.0 {
        return (0.0, 0.0);
    }
    let window_aspect = vw / vh;
    let image_aspect = iw / ih;
    if window_aspect > image_aspect {
        let h = vh * zoom;
        (h * image_aspect, h)
    } else {
        let w = vw * zoom;
        (w, w / image_aspect)
    }
}

/// An image smaller than the viewport re-centers; a larger one may pan up to
/// the point where `PAN_MARGIN` pixels of it remain on screen.
fn pan_target(pan: f32, displayed: f32, viewport: f32) -> f32 {
    if displayed <= viewport {
        0.0
    } else {
        let limit = (viewport + displayed) / 2.0 - PAN_MARGIN;
        pan.clamp(-limit, limit)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
