use std::time::{Duration, Instant};

use crate::anim::{self, AnimationState};
use crate::cache::ImageCache;
use crate::sched::{INTERACTION_DEBOUNCE, RenderMode, RenderScheduler};
use crate::ui::render::{BG_COLOR, blit_bilinear, blit_nearest, draw_text, fill_rect, rgb};
use crate::view::{self, ViewState};

// ---------------------------------------------------------------------------
// Button tray geometry
// ---------------------------------------------------------------------------

const TRAY_BTN: i32 = 40;
const TRAY_SPACING: i32 = 20;
const TRAY_W: i32 = 3 * TRAY_BTN + 4 * TRAY_SPACING;
const TRAY_H: i32 = TRAY_BTN + 20;
const TRAY_BOTTOM_GAP: i32 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrayButton {
    Prev,
    Info,
    Next,
}

fn tray_origin(viewport: (u32, u32)) -> (i32, i32) {
    (
        (viewport.0 as i32 - TRAY_W) / 2,
        viewport.1 as i32 - TRAY_H - TRAY_BOTTOM_GAP,
    )
}

/// Whether the point falls anywhere on the tray (clicks there never pan).
pub fn tray_contains(viewport: (u32, u32), x: f64, y: f64) -> bool {
    let (tx, ty) = tray_origin(viewport);
    let (x, y) = (x as i32, y as i32);
    x >= tx && x < tx + TRAY_W && y >= ty && y < ty + TRAY_H
}

/// Hit-test the three tray buttons.
pub fn tray_hit(viewport: (u32, u32), x: f64, y: f64) -> Option<TrayButton> {
    if !tray_contains(viewport, x, y) {
        return None;
    }
    let (tx, ty) = tray_origin(viewport);
    let (x, y) = (x as i32, y as i32);
    let by = ty + 10;
    if y < by || y >= by + TRAY_BTN {
        return None;
    }
    for (i, button) in [TrayButton::Prev, TrayButton::Info, TrayButton::Next]
        .into_iter()
        .enumerate()
    {
        let bx = tx + TRAY_SPACING + i as i32 * (TRAY_BTN + TRAY_SPACING);
        if x >= bx && x < bx + TRAY_BTN {
            return Some(button);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Viewer state
// ---------------------------------------------------------------------------

/// Everything the event loop owns: the cache, the view transform, the
/// animation clock position, and the scheduler.
pub struct ViewerState {
    pub cache: ImageCache,
    pub view: ViewState,
    pub anim: AnimationState,
    pub sched: RenderScheduler,
    pub show_info: bool,
    pub viewport: (u32, u32),
    pub mouse_pos: (f64, f64),
    pub pinch_scale: f32,
    pub shift_down: bool,
    pub ctrl_down: bool,
    /// Fidelity of the most recently presented frame; a Fast frame with no
    /// interaction left means a quality repaint is still owed.
    pub last_mode: RenderMode,
}

impl ViewerState {
    /// Decodes the starting window before the first frame so the initial
    /// redraw has pixels to show.
    pub fn new(mut cache: ImageCache, start: usize) -> Self {
        let now = Instant::now();
        cache.load(start);
        Self {
            cache,
            view: ViewState::new(now),
            anim: AnimationState::new(now),
            sched: RenderScheduler::new(),
            show_info: false,
            viewport: (1280, 720),
            mouse_pos: (0.0, 0.0),
            pinch_scale: 1.0,
            shift_down: false,
            ctrl_down: false,
            last_mode: RenderMode::Quality,
        }
    }

    /// Move `delta` images forward or back, wrapping around the directory.
    pub fn navigate(&mut self, delta: i64, now: Instant) {
        let len = self.cache.len();
        if len == 0 {
            return;
        }
        let next = (self.cache.current_index() as i64 + delta).rem_euclid(len as i64) as usize;
        self.view.reset_pan();
        self.cache.load(next);
        self.anim.reset(now);
        self.view.touch(now);
        self.sched.request_redraw();
    }

    pub fn title(&self) -> String {
        match self.cache.path(self.cache.current_index()) {
            Some(path) => format!(
                "glance - {}",
                path.file_name().unwrap_or_default().to_string_lossy()
            ),
            None => "glance".to_string(),
        }
    }

    /// Remaining time until the displayed entry's next animation frame.
    pub fn time_to_next_frame(&self, now: Instant) -> Option<Duration> {
        self.cache
            .get(self.cache.current_index())
            .and_then(|entry| anim::time_to_next(entry, &self.anim, now))
    }

    /// Remaining time until the debounce window closes, while a quality
    /// repaint is still owed after the last interaction.
    pub fn debounce_remaining(&self, now: Instant) -> Option<Duration> {
        let interacting = self.view.is_panning
            || self.view.zooming_in
            || self.view.zooming_out
            || self.view.is_animating;
        if self.last_mode == RenderMode::Fast && !interacting {
            Some(
                INTERACTION_DEBOUNCE
                    .saturating_sub(now.duration_since(self.view.last_interaction_time)),
            )
        } else {
            None
        }
    }

    /// Per-frame logic, run once per composition: advance the animation
    /// clock, converge the view transform, pick the render fidelity.
    pub fn tick(&mut self, now: Instant) -> RenderMode {
        let current = self.cache.current_index();
        if let Some(entry) = self.cache.get(current) {
            anim::advance(entry, &mut self.anim, now);
        }
        let image = self.cache.get(current).map(|e| (e.width, e.height));
        self.view.step(image, self.viewport);
        self.sched.render_mode(&self.view, now)
    }

    fn tray_visible(&self) -> bool {
        self.mouse_pos.1 > self.viewport.1 as f64 * 0.75
            && !(self.view.zooming_in || self.view.zooming_out || self.view.is_panning)
    }

    /// Paint into the softbuffer framebuffer. A missing cache entry (decode
    /// failure) leaves the background blank; navigation stays functional.
    pub fn render(&self, frame: &mut [u32], fb_w: u32, fb_h: u32, mode: RenderMode) {
        frame.fill(rgb(BG_COLOR[0], BG_COLOR[1], BG_COLOR[2]));

        let (vw, vh) = (fb_w as f32, fb_h as f32);
        let index = self.cache.current_index();

        if let Some(entry) = self.cache.get(index) {
            let (dw, dh) = view::displayed_size(
                entry.width as f32,
                entry.height as f32,
                vw,
                vh,
                self.view.zoom,
            );
            let scale = if entry.width > 0 {
                dw / entry.width as f32
            } else {
                0.0
            };
            let x0 = (vw - dw) / 2.0 + self.view.pan_x;
            let y0 = (vh - dh) / 2.0 + self.view.pan_y;
            let pixels = &entry.frames[self.anim.frame % entry.frames.len()];

            match mode {
                RenderMode::Fast => blit_nearest(
                    frame, fb_w, fb_h, pixels, entry.width, entry.height, x0, y0, scale,
                ),
                RenderMode::Quality => blit_bilinear(
                    frame, fb_w, fb_h, pixels, entry.width, entry.height, x0, y0, scale,
                ),
            }

            if self.show_info {
                self.draw_info(frame, fb_w, fb_h);
            }
        }

        if self.tray_visible() {
            draw_tray(frame, fb_w, fb_h);
        }
    }

    fn draw_info(&self, frame: &mut [u32], fb_w: u32, fb_h: u32) {
        let index = self.cache.current_index();
        let Some(entry) = self.cache.get(index) else {
            return;
        };

        let mut lines = Vec::new();
        if let Some(path) = self.cache.path(index) {
            lines.push(path.display().to_string());
        }
        lines.push(format!("Res: {}x{}", entry.width, entry.height));
        lines.push(format!(
            "Size: {:.2} MB",
            entry.file_size as f64 / (1024.0 * 1024.0)
        ));
        lines.push(format!(
            "Zoom: {:.2}x | Index: {}/{}",
            self.view.zoom,
            index + 1,
            self.cache.len()
        ));
        lines.extend(entry.metadata.iter().cloned());

        let text_scale = 2u32;
        let line_h = (7 * text_scale + 6) as i32;
        let max_len = lines.iter().map(|l| l.len()).max().unwrap_or(0) as u32;
        let bg_w = max_len * 6 * text_scale + 20;
        let bg_h = lines.len() as u32 * line_h as u32 + 12;

        fill_rect(frame, fb_w, fb_h, 10, 10, bg_w, bg_h, (0, 0, 0, 153));
        for (i, line) in lines.iter().enumerate() {
            draw_text(
                frame,
                fb_w,
                fb_h,
                line,
                20,
                16 + i as i32 * line_h,
                text_scale,
                (230, 230, 230, 255),
            );
        }
    }
}

fn draw_tray(frame: &mut [u32], fb_w: u32, fb_h: u32) {
    let (tx, ty) = tray_origin((fb_w, fb_h));
    fill_rect(
        frame,
        fb_w,
        fb_h,
        tx,
        ty,
        TRAY_W as u32,
        TRAY_H as u32,
        (26, 26, 26, 178),
    );

    let white = (255, 255, 255, 255);
    for (i, label) in ["<", "i", ">"].into_iter().enumerate() {
        let bx = tx + TRAY_SPACING + i as i32 * (TRAY_BTN + TRAY_SPACING);
        // Center the 20x28 glyph inside the 40x40 button.
        draw_text(frame, fb_w, fb_h, label, bx + 10, ty + 16, 4, white);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::NoMetadata;
    use image::{Rgba, RgbaImage};

    fn state_with(count: usize, start: usize, dir: &std::path::Path) -> ViewerState {
        let mut paths = Vec::new();
        for i in 0..count {
            let path = dir.join(format!("img{i:02}.png"));
            RgbaImage::from_pixel(2, 2, Rgba([i as u8, 0, 0, 255]))
                .save(&path)
                .unwrap();
            paths.push(path);
        }
        ViewerState::new(ImageCache::new(paths, Box::new(NoMetadata)), start)
    }

    #[test]
    fn navigation_wraps_both_ways() {
        let tmp = tempfile::tempdir().unwrap();
        let mut state = state_with(3, 0, tmp.path());
        let now = Instant::now();

        state.navigate(-1, now);
        assert_eq!(state.cache.current_index(), 2);

        state.navigate(1, now);
        assert_eq!(state.cache.current_index(), 0);
    }

    #[test]
    fn navigation_resets_animation_and_requests_a_redraw() {
        let tmp = tempfile::tempdir().unwrap();
        let mut state = state_with(3, 0, tmp.path());
        state.anim.frame = 5;

        state.navigate(1, Instant::now());
        assert_eq!(state.anim.frame, 0);
        assert!(state.sched.redraw_pending());
    }

    #[test]
    fn tray_hit_maps_buttons_left_to_right() {
        let viewport = (1000u32, 700u32);
        // Tray spans x 400..600, buttons at y 630..670.
        assert_eq!(tray_hit(viewport, 430.0, 650.0), Some(TrayButton::Prev));
        assert_eq!(tray_hit(viewport, 490.0, 650.0), Some(TrayButton::Info));
        assert_eq!(tray_hit(viewport, 550.0, 650.0), Some(TrayButton::Next));
        // Between two buttons: on the tray but no action.
        assert_eq!(tray_hit(viewport, 465.0, 650.0), None);
        assert!(tray_contains(viewport, 465.0, 650.0));
        // Outside the tray entirely.
        assert_eq!(tray_hit(viewport, 100.0, 650.0), None);
        assert!(!tray_contains(viewport, 100.0, 650.0));
    }
}
