//! # Window System
//!
//! A desktop [`Stage`] on a `minifb` window, composited with [`Compositor`].
//!
//! The mouse is sampled every [`SAMPLE_INTERVAL`] while a tick is being paced,
//! so a press and release that both land inside one tick still arrive as a
//! Down/Up pair at the next poll. Closing the window or pressing Escape is Quit.

use crate::config::PlayerConfig;
use crate::errors::PlayerError;
use crate::input::{InputEvent, PointerEvent, PointerKind};
use crate::scheduler::TickRate;
use crate::stage::{Screen, Stage};
use crate::systems::assets::FontSet;
use crate::systems::renderer::Compositor;
use crate::types::{Point, TextSize, Viewport};
use minifb::{Key, MouseButton, MouseMode, Window, WindowOptions};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Mouse sampling period inside a paced tick.
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(2);

/// Turns successive button/position samples into pointer edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct MouseLatch {
    down: bool,
    last_pos: Option<Point>,
}

impl MouseLatch {
    /// `pos` is `None` while the cursor is outside the window; the last known
    /// position stands in for it.
    pub fn sample(
        &mut self,
        down: bool,
        pos: Option<Point>,
        at: Duration,
    ) -> Option<PointerEvent> {
        let pos = pos.or(self.last_pos);
        let kind = match (self.down, down, pos) {
            (false, true, Some(_)) => Some(PointerKind::Down),
            (true, true, Some(p)) if Some(p) != self.last_pos => Some(PointerKind::Move),
            (true, false, Some(_)) => Some(PointerKind::Up),
            _ => None,
        };
        self.down = down && pos.is_some();
        self.last_pos = pos;
        Some(PointerEvent {
            kind: kind?,
            pos: pos?,
            at,
        })
    }

    pub fn is_down(&self) -> bool {
        self.down
    }
}

pub struct WindowStage {
    window: Window,
    compositor: Compositor,
    buffer: Vec<u32>,
    epoch: Instant,
    next_tick: Instant,
    latch: MouseLatch,
    pending: Vec<InputEvent>,
}

impl std::fmt::Debug for WindowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowStage")
            .field("viewport", &self.compositor.viewport())
            .field("mouse_down", &self.latch.is_down())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl WindowStage {
    pub fn open(title: &str, config: &PlayerConfig, fonts: FontSet) -> Result<Self, PlayerError> {
        let viewport = config.viewport;
        let mut window = Window::new(
            title,
            viewport.width as usize,
            viewport.height as usize,
            WindowOptions {
                borderless: config.borderless,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| PlayerError::Display(e.to_string()))?;
        // Pacing is done in `pace`.
        window.set_target_fps(0);

        let compositor = Compositor::new(viewport, fonts)?;
        info!(width = viewport.width, height = viewport.height, "Window opened");
        let now = Instant::now();
        Ok(Self {
            window,
            compositor,
            buffer: vec![0; viewport.width as usize * viewport.height as usize],
            epoch: now,
            next_tick: now,
            latch: MouseLatch::default(),
            pending: Vec::new(),
        })
    }

    /// Queues the edge, if any, between the previous sample and now.
    fn sample_mouse(&mut self) {
        let pos = self.window.get_mouse_pos(MouseMode::Discard).map(Point::from);
        let down = self.window.get_mouse_down(MouseButton::Left);
        if let Some(event) = self.latch.sample(down, pos, self.epoch.elapsed()) {
            trace!(kind = ?event.kind, "Pointer sampled");
            self.pending.push(event.into());
        }
    }
}

impl Stage for WindowStage {
    fn viewport(&self) -> Viewport {
        self.compositor.viewport()
    }

    fn poll_events(&mut self) -> Result<Vec<InputEvent>, PlayerError> {
        if !self.window.is_open() || self.window.is_key_down(Key::Escape) {
            debug!("Quit requested from window");
            self.pending.clear();
            return Ok(vec![InputEvent::Quit]);
        }
        self.sample_mouse();
        Ok(std::mem::take(&mut self.pending))
    }

    fn draw(&mut self, screen: &Screen<'_>) -> Result<(), PlayerError> {
        self.compositor.render(screen)?;
        self.compositor.read_argb(&mut self.buffer)?;
        let viewport = self.compositor.viewport();
        self.window
            .update_with_buffer(
                &self.buffer,
                viewport.width as usize,
                viewport.height as usize,
            )
            .map_err(|e| PlayerError::Display(e.to_string()))
    }

    fn pace(&mut self, rate: TickRate) {
        let interval = rate.interval();
        let now = Instant::now();
        // Fall behind by at most one tick.
        if self.next_tick + interval < now {
            self.next_tick = now;
        } else {
            self.next_tick += interval;
        }
        loop {
            let now = Instant::now();
            if now >= self.next_tick {
                break;
            }
            std::thread::sleep((self.next_tick - now).min(SAMPLE_INTERVAL));
            self.window.update();
            self.sample_mouse();
        }
    }

    fn measure_text(&self, text: &str, size: TextSize) -> (f32, f32) {
        self.compositor.measure_text(text, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn press_and_release_between_polls_yield_both_edges() {
        let mut latch = MouseLatch::default();
        let p = Point::new(40.0, 30.0);
        let down = latch.sample(true, Some(p), ms(2)).unwrap();
        let up = latch.sample(false, Some(p), ms(4)).unwrap();
        assert_eq!((down.kind, down.at), (PointerKind::Down, ms(2)));
        assert_eq!((up.kind, up.at), (PointerKind::Up, ms(4)));
        assert!(!latch.is_down());
    }

    #[test]
    fn idle_and_stationary_samples_are_silent() {
        let mut latch = MouseLatch::default();
        let p = Point::new(10.0, 10.0);
        assert!(latch.sample(false, Some(p), ms(0)).is_none());
        assert!(latch.sample(false, Some(Point::new(20.0, 10.0)), ms(2)).is_none());
        latch.sample(true, Some(p), ms(4)).unwrap();
        assert!(latch.sample(true, Some(p), ms(6)).is_none());
    }

    #[test]
    fn drag_reports_moves_and_keeps_last_position_off_window() {
        let mut latch = MouseLatch::default();
        latch.sample(true, Some(Point::new(0.0, 0.0)), ms(0)).unwrap();
        let moved = latch.sample(true, Some(Point::new(5.0, 0.0)), ms(2)).unwrap();
        assert_eq!(moved.kind, PointerKind::Move);
        assert_eq!(moved.pos, Point::new(5.0, 0.0));

        let up = latch.sample(false, None, ms(4)).unwrap();
        assert_eq!(up.kind, PointerKind::Up);
        assert_eq!(up.pos, Point::new(5.0, 0.0));
    }

    #[test]
    fn press_before_the_cursor_enters_is_ignored() {
        let mut latch = MouseLatch::default();
        assert!(latch.sample(true, None, ms(0)).is_none());
        assert!(!latch.is_down());
    }
}
