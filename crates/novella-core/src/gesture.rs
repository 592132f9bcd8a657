//! # Gesture Module
//!
//! Swipe detection over pointer trails.
//!
//! ## Responsibilities
//! - **Trail Tracking**: Records press → move* → release strokes.
//! - **Classification**: One direction → predicate table shared by every chapter.
//!
//! ## Key Types
//! - `Direction`: The swipe a trigger asks for.
//! - `GestureDetector`: Stateful stroke tracker.
//! - `Stroke`: A completed press-to-release drag.

use crate::input::{PointerEvent, PointerKind};
use crate::types::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::trace;

/// Minimum travel along the requested axis, in pixels.
pub const DEFAULT_SWIPE_THRESHOLD: f32 = 100.0;
/// Strokes must complete strictly faster than this.
pub const DEFAULT_SWIPE_ALLOWED_TIME: Duration = Duration::from_millis(1000);
/// Off-axis tolerance for the strict single-axis swipes. Independent of the threshold.
pub const LATERAL_TOLERANCE: f32 = 50.0;

/// Predicate over `(dx, dy, threshold)`.
pub type SwipeRule = fn(f32, f32, f32) -> bool;

/// A swipe direction requested by a trigger.
///
/// Unknown tags are preserved as `Unrecognized` and never match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Direction {
    Right,
    RightUp,
    Left,
    Up,
    Down,
    LeftDown,
    Unrecognized(String),
}

impl Direction {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "right" => Self::Right,
            "right_up" => Self::RightUp,
            "left" => Self::Left,
            "up" => Self::Up,
            "down" => Self::Down,
            "left_down" => Self::LeftDown,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Right => "right",
            Self::RightUp => "right_up",
            Self::Left => "left",
            Self::Up => "up",
            Self::Down => "down",
            Self::LeftDown => "left_down",
            Self::Unrecognized(tag) => tag.as_str(),
        }
    }

    /// The classification predicate for this direction, if any.
    pub fn rule(&self) -> Option<SwipeRule> {
        let rule: SwipeRule = match self {
            Self::Right => |dx: f32, dy: f32, t: f32| dx > t && dy.abs() < t,
            Self::RightUp => |dx: f32, dy: f32, t: f32| dx > t && dy < -t,
            Self::Left => |dx: f32, dy: f32, t: f32| dx < -t && dy.abs() < LATERAL_TOLERANCE,
            Self::Up => |dx: f32, dy: f32, t: f32| dy < -t && dx.abs() < LATERAL_TOLERANCE,
            Self::Down => |dx: f32, dy: f32, t: f32| dy > t && dx.abs() < LATERAL_TOLERANCE,
            Self::LeftDown => |dx: f32, dy: f32, t: f32| dx < -t && dy > t,
            Self::Unrecognized(_) => return None,
        };
        Some(rule)
    }

    /// Prompt shown while waiting for this swipe when the trigger has no override.
    pub fn default_prompt(&self) -> &'static str {
        match self {
            Self::Right => "请向右滑动",
            Self::RightUp => "请向右上滑动",
            Self::Left => "请向左滑动",
            Self::Up => "请向上滑动",
            Self::Down => "请向下滑动",
            Self::LeftDown => "请向左下滑动",
            Self::Unrecognized(_) => "请滑动",
        }
    }
}

impl From<String> for Direction {
    fn from(tag: String) -> Self {
        Self::parse(&tag)
    }
}

impl From<Direction> for String {
    fn from(direction: Direction) -> Self {
        direction.as_str().to_string()
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Swipe thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeConfig {
    pub threshold: f32,
    pub allowed_time: Duration,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SWIPE_THRESHOLD,
            allowed_time: DEFAULT_SWIPE_ALLOWED_TIME,
        }
    }
}

/// Classifies a completed drag. Pure in its arguments.
pub fn classify(
    direction: &Direction,
    start: Point,
    end: Point,
    elapsed: Duration,
    config: &SwipeConfig,
) -> bool {
    if elapsed >= config.allowed_time {
        return false;
    }
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    direction
        .rule()
        .is_some_and(|rule| rule(dx, dy, config.threshold))
}

/// A completed press-to-release drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub start: Point,
    pub end: Point,
    pub elapsed: Duration,
}

impl Stroke {
    pub fn matches(&self, direction: &Direction, config: &SwipeConfig) -> bool {
        classify(direction, self.start, self.end, self.elapsed, config)
    }
}

/// Tracks a single live pointer trail.
#[derive(Debug, Clone, Default)]
pub struct GestureDetector {
    config: SwipeConfig,
    start: Option<(Point, Duration)>,
    trail: Vec<Point>,
}

impl GestureDetector {
    pub fn new(config: SwipeConfig) -> Self {
        Self {
            config,
            start: None,
            trail: Vec::new(),
        }
    }

    pub fn config(&self) -> &SwipeConfig {
        &self.config
    }

    /// Points recorded since the last press.
    pub fn trail(&self) -> &[Point] {
        &self.trail
    }

    pub fn is_pressed(&self) -> bool {
        self.start.is_some()
    }

    /// Drops any stroke in progress.
    pub fn reset(&mut self) {
        self.start = None;
        self.trail.clear();
    }

    /// Feeds one pointer event. Returns the completed stroke on release.
    ///
    /// Moves and releases without an active press are ignored.
    pub fn track(&mut self, event: &PointerEvent) -> Option<Stroke> {
        match event.kind {
            PointerKind::Down => {
                self.start = Some((event.pos, event.at));
                self.trail.clear();
                self.trail.push(event.pos);
                None
            }
            PointerKind::Move => {
                if self.start.is_some() {
                    self.trail.push(event.pos);
                }
                None
            }
            PointerKind::Up => {
                let (start, started_at) = self.start.take()?;
                self.trail.clear();
                Some(Stroke {
                    start,
                    end: event.pos,
                    elapsed: event.at.saturating_sub(started_at),
                })
            }
        }
    }

    /// Feeds one pointer event and classifies the stroke against `target` on release.
    pub fn on_pointer_event(&mut self, event: &PointerEvent, target: &Direction) -> Option<bool> {
        let stroke = self.track(event)?;
        let matched = stroke.matches(target, &self.config);
        trace!(
            target = %target,
            dx = stroke.end.x - stroke.start.x,
            dy = stroke.end.y - stroke.start.y,
            elapsed_ms = stroke.elapsed.as_millis() as u64,
            matched,
            "Swipe classified"
        );
        Some(matched)
    }
}
