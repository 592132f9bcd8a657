//! Raw input events delivered by a [`Stage`](crate::stage::Stage).

use crate::types::Point;
use std::time::Duration;

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
}

/// A pointer sample. `at` is measured from an arbitrary per-stage origin; only
/// differences between two events are meaningful.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub pos: Point,
    pub at: Duration,
}

impl PointerEvent {
    pub fn down(pos: impl Into<Point>, at_ms: u64) -> Self {
        Self::new(PointerKind::Down, pos, at_ms)
    }

    pub fn moved(pos: impl Into<Point>, at_ms: u64) -> Self {
        Self::new(PointerKind::Move, pos, at_ms)
    }

    pub fn up(pos: impl Into<Point>, at_ms: u64) -> Self {
        Self::new(PointerKind::Up, pos, at_ms)
    }

    fn new(kind: PointerKind, pos: impl Into<Point>, at_ms: u64) -> Self {
        Self {
            kind,
            pos: pos.into(),
            at: Duration::from_millis(at_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Pointer(PointerEvent),
    /// Window closed (or escape pressed). Accepted in every state.
    Quit,
}

impl From<PointerEvent> for InputEvent {
    fn from(event: PointerEvent) -> Self {
        Self::Pointer(event)
    }
}
