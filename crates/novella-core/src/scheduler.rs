//! # Scheduler Module
//!
//! The single cooperative loop behind playback and every wait state.
//!
//! Each tick drains input, hands pointer events to the active [`Phase`], lets
//! the phase draw, then paces to the phase's rate. A phase ends when one of
//! its hooks returns an output. Quit ends every phase with [`PlayerError::Quit`].

use crate::errors::PlayerError;
use crate::input::{InputEvent, PointerEvent};
use crate::stage::Stage;
use std::time::Duration;

/// Refresh rate of a phase, in ticks per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickRate(pub f64);

impl TickRate {
    /// Rate of frozen and idle screens.
    pub const UI: TickRate = TickRate(60.0);

    pub fn interval(&self) -> Duration {
        if self.0.is_finite() && self.0 > 0.0 {
            Duration::from_secs_f64(1.0 / self.0)
        } else {
            Duration::ZERO
        }
    }
}

/// One state of the loop with its exit condition.
pub trait Phase {
    type Output;

    fn rate(&self) -> TickRate;

    /// Sees each pointer event in arrival order. Returning an output ends the phase
    /// and drops the rest of the batch.
    fn on_event(&mut self, _event: &PointerEvent) -> Result<Option<Self::Output>, PlayerError> {
        Ok(None)
    }

    /// Runs once per tick after input; draws the screen and may end the phase.
    fn on_tick(&mut self, stage: &mut dyn Stage) -> Result<Option<Self::Output>, PlayerError>;
}

/// Drives `phase` until it produces an output.
pub fn run_phase<P: Phase>(stage: &mut dyn Stage, phase: &mut P) -> Result<P::Output, PlayerError> {
    loop {
        for event in stage.poll_events()? {
            match event {
                InputEvent::Quit => return Err(PlayerError::Quit),
                InputEvent::Pointer(pointer) => {
                    if let Some(output) = phase.on_event(&pointer)? {
                        return Ok(output);
                    }
                }
            }
        }
        if let Some(output) = phase.on_tick(stage)? {
            return Ok(output);
        }
        stage.pace(phase.rate());
    }
}

/// Discards pending input, still honouring a queued quit.
pub fn drain_input(stage: &mut dyn Stage) -> Result<(), PlayerError> {
    if stage
        .poll_events()?
        .iter()
        .any(|e| matches!(e, InputEvent::Quit))
    {
        return Err(PlayerError::Quit);
    }
    Ok(())
}
