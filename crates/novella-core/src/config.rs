//! Player settings shared by the driver, the compositor and the window.

use crate::gesture::SwipeConfig;
use crate::scheduler::TickRate;
use crate::types::Viewport;

/// Default font, resolved through the asset loader.
pub const DEFAULT_FONT: &str = "simhei.ttf";

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    pub viewport: Viewport,
    pub swipe: SwipeConfig,
    /// Pace of frozen, choice and card screens.
    pub ui_rate: TickRate,
    pub font: String,
    pub font_large: f32,
    pub font_small: f32,
    pub borderless: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            swipe: SwipeConfig::default(),
            ui_rate: TickRate::UI,
            font: DEFAULT_FONT.to_string(),
            font_large: 48.0,
            font_small: 24.0,
            borderless: false,
        }
    }
}
