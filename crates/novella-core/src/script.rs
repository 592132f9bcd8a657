//! # Scene Script Module
//!
//! Declarative description of one video/audio segment and its interaction triggers.
//!
//! ## Responsibilities
//! - **Validation**: Trigger lists are sorted and de-duplicated at construction.
//! - **Resolution**: Cues authored in seconds become frame indices once the video rate is known.
//! - **Planning**: Swipe and pause triggers merge into a single ascending `TriggerPlan`.

use crate::errors::PlayerError;
use crate::gesture::Direction;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::VecDeque;
use tracing::warn;

/// When a trigger fires, either as an absolute frame index or as seconds into the clip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    Frame(u64),
    Seconds(f64),
}

impl Cue {
    /// Frame index for this cue at the given rate. Seconds are floored.
    pub fn resolve(&self, rate: f64) -> u64 {
        match *self {
            Cue::Frame(n) => n,
            Cue::Seconds(s) => (s * rate).floor().max(0.0) as u64,
        }
    }

    fn same_unit(&self, other: &Cue) -> bool {
        matches!(
            (self, other),
            (Cue::Frame(_), Cue::Frame(_)) | (Cue::Seconds(_), Cue::Seconds(_))
        )
    }

    fn cmp_same_unit(&self, other: &Cue) -> Ordering {
        match (self, other) {
            (Cue::Frame(a), Cue::Frame(b)) => a.cmp(b),
            (Cue::Seconds(a), Cue::Seconds(b)) => a.total_cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Freeze and wait for a swipe in `direction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwipeTrigger {
    pub at: Cue,
    pub direction: Direction,
    /// Replaces the direction's default prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl SwipeTrigger {
    pub fn prompt(&self) -> &str {
        self.prompt
            .as_deref()
            .unwrap_or_else(|| self.direction.default_prompt())
    }
}

/// Freeze and wait for any click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauseTrigger {
    pub at: Cue,
    pub prompt: String,
}

/// Serialized shape of a [`SceneScript`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SceneScriptDef {
    video: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    swipes: Vec<SwipeTrigger>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pauses: Vec<PauseTrigger>,
}

/// An immutable, validated scene: one video, an optional audio track and its triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SceneScriptDef", into = "SceneScriptDef")]
pub struct SceneScript {
    video: String,
    audio: Option<String>,
    swipes: Vec<SwipeTrigger>,
    pauses: Vec<PauseTrigger>,
}

impl SceneScript {
    /// Validates and sorts the trigger lists.
    ///
    /// Rejects a list that mixes frame and seconds cues or names the same cue twice.
    pub fn new(
        video: impl Into<String>,
        audio: Option<String>,
        mut swipes: Vec<SwipeTrigger>,
        mut pauses: Vec<PauseTrigger>,
    ) -> Result<Self, PlayerError> {
        let video = video.into();
        sort_unique(&video, "swipe", &mut swipes, |t| &t.at)?;
        sort_unique(&video, "pause", &mut pauses, |t| &t.at)?;

        for trigger in &swipes {
            if trigger.direction.rule().is_none() {
                warn!(
                    video = %video,
                    direction = %trigger.direction,
                    "Swipe trigger uses an unknown direction and can never be satisfied"
                );
            }
        }

        Ok(Self {
            video,
            audio,
            swipes,
            pauses,
        })
    }

    pub fn builder(video: impl Into<String>) -> SceneScriptBuilder {
        SceneScriptBuilder {
            video: video.into(),
            audio: None,
            swipes: Vec::new(),
            pauses: Vec::new(),
        }
    }

    pub fn video(&self) -> &str {
        &self.video
    }

    pub fn audio(&self) -> Option<&str> {
        self.audio.as_deref()
    }

    pub fn swipes(&self) -> &[SwipeTrigger] {
        &self.swipes
    }

    pub fn pauses(&self) -> &[PauseTrigger] {
        &self.pauses
    }

    /// Resolves every cue at `rate` and merges both lists into one plan.
    pub fn plan(&self, rate: f64) -> Result<TriggerPlan, PlayerError> {
        let swipes: Vec<Trigger> = self
            .swipes
            .iter()
            .map(|t| Trigger {
                frame: t.at.resolve(rate),
                action: TriggerAction::Swipe {
                    direction: t.direction.clone(),
                    prompt: t.prompt().to_string(),
                },
            })
            .collect();
        let pauses: Vec<Trigger> = self
            .pauses
            .iter()
            .map(|t| Trigger {
                frame: t.at.resolve(rate),
                action: TriggerAction::Click {
                    prompt: t.prompt.clone(),
                },
            })
            .collect();

        for (kind, list) in [("swipe", &swipes), ("pause", &pauses)] {
            if let Some(pair) = list.windows(2).find(|w| w[0].frame >= w[1].frame) {
                return Err(PlayerError::InvalidScript(format!(
                    "{}: {} triggers collapse onto frame {} at {:.3} fps",
                    self.video, kind, pair[1].frame, rate
                )));
            }
        }

        // Stable sort keeps a swipe ahead of a pause sharing its frame.
        let mut merged: Vec<Trigger> = swipes.into_iter().chain(pauses).collect();
        merged.sort_by_key(|t| t.frame);
        Ok(TriggerPlan {
            pending: merged.into(),
        })
    }
}

fn sort_unique<T>(
    video: &str,
    kind: &str,
    list: &mut [T],
    cue: impl Fn(&T) -> &Cue,
) -> Result<(), PlayerError> {
    if let Some(first) = list.first().map(&cue) {
        if list.iter().any(|t| !cue(t).same_unit(first)) {
            return Err(PlayerError::InvalidScript(format!(
                "{video}: {kind} triggers mix frame and seconds cues"
            )));
        }
    }
    list.sort_by(|a, b| cue(a).cmp_same_unit(cue(b)));
    if let Some(pair) = list
        .windows(2)
        .find(|w| cue(&w[0]).cmp_same_unit(cue(&w[1])) == Ordering::Equal)
    {
        return Err(PlayerError::InvalidScript(format!(
            "{video}: two {kind} triggers share cue {:?}",
            cue(&pair[0])
        )));
    }
    Ok(())
}

impl TryFrom<SceneScriptDef> for SceneScript {
    type Error = PlayerError;

    fn try_from(def: SceneScriptDef) -> Result<Self, Self::Error> {
        SceneScript::new(def.video, def.audio, def.swipes, def.pauses)
    }
}

impl From<SceneScript> for SceneScriptDef {
    fn from(script: SceneScript) -> Self {
        Self {
            video: script.video,
            audio: script.audio,
            swipes: script.swipes,
            pauses: script.pauses,
        }
    }
}

/// Fluent construction of a [`SceneScript`], validated on [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct SceneScriptBuilder {
    video: String,
    audio: Option<String>,
    swipes: Vec<SwipeTrigger>,
    pauses: Vec<PauseTrigger>,
}

impl SceneScriptBuilder {
    pub fn audio(mut self, audio: impl Into<String>) -> Self {
        self.audio = Some(audio.into());
        self
    }

    pub fn swipe(mut self, at: Cue, direction: Direction) -> Self {
        self.swipes.push(SwipeTrigger {
            at,
            direction,
            prompt: None,
        });
        self
    }

    pub fn swipe_with_prompt(
        mut self,
        at: Cue,
        direction: Direction,
        prompt: impl Into<String>,
    ) -> Self {
        self.swipes.push(SwipeTrigger {
            at,
            direction,
            prompt: Some(prompt.into()),
        });
        self
    }

    pub fn pause(mut self, at: Cue, prompt: impl Into<String>) -> Self {
        self.pauses.push(PauseTrigger {
            at,
            prompt: prompt.into(),
        });
        self
    }

    pub fn build(self) -> Result<SceneScript, PlayerError> {
        SceneScript::new(self.video, self.audio, self.swipes, self.pauses)
    }
}

/// What the driver waits for when a trigger fires.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerAction {
    Swipe { direction: Direction, prompt: String },
    Click { prompt: String },
}

/// A trigger resolved to a concrete frame index.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub frame: u64,
    pub action: TriggerAction,
}

/// Ascending queue of resolved triggers for one playback session.
#[derive(Debug, Clone, Default)]
pub struct TriggerPlan {
    pending: VecDeque<Trigger>,
}

impl TriggerPlan {
    /// Pops the next trigger if it fires on exactly `frame`.
    pub fn take_due(&mut self, frame: u64) -> Option<Trigger> {
        if self.pending.front()?.frame == frame {
            self.pending.pop_front()
        } else {
            None
        }
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn frames(&self) -> Vec<u64> {
        self.pending.iter().map(|t| t.frame).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_cues_floor_at_rate() {
        assert_eq!(Cue::Seconds(24.0).resolve(29.97), 719);
        assert_eq!(Cue::Seconds(6.0).resolve(30.0), 180);
        assert_eq!(Cue::Frame(42).resolve(60.0), 42);
    }

    #[test]
    fn swipe_runs_before_pause_on_the_same_frame() {
        let script = SceneScript::builder("a.mp4")
            .pause(Cue::Frame(10), "click")
            .swipe(Cue::Frame(10), Direction::Up)
            .build()
            .unwrap();
        let mut plan = script.plan(30.0).unwrap();
        assert!(matches!(
            plan.take_due(10).unwrap().action,
            TriggerAction::Swipe { .. }
        ));
        assert!(matches!(
            plan.take_due(10).unwrap().action,
            TriggerAction::Click { .. }
        ));
        assert!(plan.take_due(10).is_none());
    }
}
