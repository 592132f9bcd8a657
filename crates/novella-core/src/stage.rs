//! # Stage Module
//!
//! The display and input surface every phase draws to and polls from.
//!
//! ## Key Types
//! - `Stage`: Window + input + compositor seam, faked in tests.
//! - `Screen`: Everything needed to draw one refresh.
//! - `Card`: Full-screen text between scenes.

use crate::errors::PlayerError;
use crate::input::InputEvent;
use crate::presenter::DisplayFrame;
use crate::scheduler::TickRate;
use crate::types::{Point, Rect, TextSize, Viewport};
use serde::{Deserialize, Serialize};

/// How a [`Card`] arranges its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardLayout {
    /// Title at a third of the height, subtitle at half.
    #[default]
    Banner,
    /// Title alone at half height.
    Centered,
    /// Title and subtitle as large vertical columns hanging from the top quarter.
    Vertical,
}

/// A black full-screen card that waits for a click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(default)]
    pub layout: CardLayout,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Small line near the bottom edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl Card {
    pub fn banner(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            layout: CardLayout::Banner,
            title: title.into(),
            subtitle: Some(subtitle.into()),
            hint: None,
        }
    }

    pub fn centered(title: impl Into<String>) -> Self {
        Self {
            layout: CardLayout::Centered,
            title: title.into(),
            subtitle: None,
            hint: None,
        }
    }

    pub fn vertical(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            layout: CardLayout::Vertical,
            title: title.into(),
            subtitle: Some(subtitle.into()),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// A choice label and its hit box.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceTarget {
    pub label: String,
    pub rect: Rect,
}

/// One refresh worth of drawing instructions.
#[derive(Debug, Clone, Copy)]
pub enum Screen<'a> {
    Playing {
        frame: &'a DisplayFrame,
    },
    /// Trigger wait over the last frame.
    Frozen {
        frame: Option<&'a DisplayFrame>,
        trail: &'a [Point],
        prompt: &'a str,
    },
    Choice {
        frame: Option<&'a DisplayFrame>,
        targets: &'a [ChoiceTarget],
    },
    Card {
        card: &'a Card,
    },
}

impl Screen<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::Playing { .. } => "playing",
            Screen::Frozen { .. } => "frozen",
            Screen::Choice { .. } => "choice",
            Screen::Card { .. } => "card",
        }
    }
}

/// Display, input and pacing for the player.
///
/// The viewport is fixed for the lifetime of the stage.
pub trait Stage {
    fn viewport(&self) -> Viewport;

    /// Drains input received since the last call.
    fn poll_events(&mut self) -> Result<Vec<InputEvent>, PlayerError>;

    fn draw(&mut self, screen: &Screen<'_>) -> Result<(), PlayerError>;

    /// Sleeps until the next tick at `rate`.
    fn pace(&mut self, rate: TickRate);

    /// Rendered `(width, height)` of `text` at `size`.
    fn measure_text(&self, text: &str, size: TextSize) -> (f32, f32);
}
