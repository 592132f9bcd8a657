//! # Narrative Module
//!
//! The story as a tree of scenes, cards, choices and endings, and the walker
//! that plays it through a [`PlaybackDriver`].
//!
//! ## Key Types
//! - `NarrativeNode`: One node of the tree. Serialised tagged by `kind`.
//! - `NarrativeReport`: Sessions played, choices made and the ending reached.

use crate::driver::{PlaybackDriver, SessionReport};
use crate::errors::PlayerError;
use crate::input::{PointerEvent, PointerKind};
use crate::presenter::DisplayFrame;
use crate::scheduler::{drain_input, run_phase, Phase, TickRate};
use crate::script::SceneScript;
use crate::stage::{Card, ChoiceTarget, Screen, Stage};
use crate::types::{Point, Rect, TextSize, Viewport};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Vertical centre of the first choice.
pub const CHOICE_TOP: f32 = 200.0;
/// Distance between consecutive choice centres.
pub const CHOICE_SPACING: f32 = 150.0;
/// Most options a choice may offer.
pub const MAX_CHOICES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NarrativeNode {
    Scene {
        script: SceneScript,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next: Option<Box<NarrativeNode>>,
    },
    Card {
        card: Card,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next: Option<Box<NarrativeNode>>,
    },
    Choice {
        prompts: Vec<String>,
        branches: Vec<NarrativeNode>,
    },
    Terminal {
        title: String,
        subtitle: String,
    },
}

impl NarrativeNode {
    pub fn scene(script: SceneScript, next: Option<NarrativeNode>) -> Self {
        Self::Scene {
            script,
            next: next.map(Box::new),
        }
    }

    pub fn card(card: Card, next: Option<NarrativeNode>) -> Self {
        Self::Card {
            card,
            next: next.map(Box::new),
        }
    }

    pub fn terminal(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self::Terminal {
            title: title.into(),
            subtitle: subtitle.into(),
        }
    }

    /// Builds a choice from `(prompt, branch)` pairs.
    pub fn choice<S: Into<String>>(options: Vec<(S, NarrativeNode)>) -> Self {
        let (prompts, branches): (Vec<String>, Vec<NarrativeNode>) = options
            .into_iter()
            .map(|(p, b)| (p.into(), b))
            .unzip();
        Self::Choice { prompts, branches }
    }

    /// Chains scenes in order, ending in `tail`.
    pub fn sequence(scenes: Vec<SceneScript>, tail: NarrativeNode) -> Self {
        scenes
            .into_iter()
            .rev()
            .fold(tail, |next, script| Self::scene(script, Some(next)))
    }

    /// Checks every choice in the tree: one prompt per branch, between one and three options.
    pub fn validate(&self) -> Result<(), PlayerError> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Self::Scene { next, .. } | Self::Card { next, .. } => {
                    stack.extend(next.as_deref());
                }
                Self::Choice { prompts, branches } => {
                    if prompts.len() != branches.len() {
                        return Err(PlayerError::InvalidStory(format!(
                            "choice has {} prompts but {} branches",
                            prompts.len(),
                            branches.len()
                        )));
                    }
                    if prompts.is_empty() || prompts.len() > MAX_CHOICES {
                        return Err(PlayerError::InvalidStory(format!(
                            "choice must offer 1 to {} options, found {}",
                            MAX_CHOICES,
                            prompts.len()
                        )));
                    }
                    stack.extend(branches.iter());
                }
                Self::Terminal { .. } => {}
            }
        }
        Ok(())
    }

    /// Every scene script in the tree, depth first.
    pub fn scenes(&self) -> Vec<&SceneScript> {
        let mut scenes = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Self::Scene { script, next } => {
                    scenes.push(script);
                    stack.extend(next.as_deref());
                }
                Self::Card { next, .. } => stack.extend(next.as_deref()),
                Self::Choice { branches, .. } => stack.extend(branches.iter().rev()),
                Self::Terminal { .. } => {}
            }
        }
        scenes
    }

    /// The scene reached first when walking from this node.
    pub fn first_scene(&self) -> Option<&SceneScript> {
        let mut node = self;
        loop {
            match node {
                Self::Scene { script, .. } => return Some(script),
                Self::Card { next, .. } => node = next.as_deref()?,
                Self::Choice { branches, .. } => node = branches.first()?,
                Self::Terminal { .. } => return None,
            }
        }
    }
}

/// Lays out choice labels top to bottom, centred horizontally.
pub fn layout_choices(
    prompts: &[String],
    viewport: Viewport,
    measure: impl Fn(&str) -> (f32, f32),
) -> Vec<ChoiceTarget> {
    let center_x = (viewport.width / 2) as f32;
    prompts
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let (w, h) = measure(label);
            ChoiceTarget {
                label: label.clone(),
                rect: Rect::centered_at(
                    Point::new(center_x, CHOICE_TOP + i as f32 * CHOICE_SPACING),
                    w,
                    h,
                ),
            }
        })
        .collect()
}

/// Index of the target containing `pos`, if any.
pub fn hit_test(targets: &[ChoiceTarget], pos: Point) -> Option<usize> {
    targets.iter().position(|t| t.rect.contains(pos))
}

/// What a full story run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NarrativeReport {
    pub sessions: Vec<SessionReport>,
    /// Branch index taken at each choice, in order.
    pub choices: Vec<usize>,
    pub cards_shown: usize,
    /// Subtitle of the terminal node reached.
    pub ending: Option<String>,
}

/// Walks the tree from `root` until a terminal node or a dead end.
///
/// The whole tree is validated before anything is shown.
#[instrument(level = "info", skip_all)]
pub fn run(
    driver: &mut PlaybackDriver,
    root: &NarrativeNode,
) -> Result<NarrativeReport, PlayerError> {
    root.validate()?;
    let mut report = NarrativeReport::default();
    let mut node = Some(root);

    while let Some(current) = node {
        node = match current {
            NarrativeNode::Scene { script, next } => {
                report.sessions.push(driver.play(script)?);
                next.as_deref()
            }
            NarrativeNode::Card { card, next } => {
                show_card(driver, card)?;
                report.cards_shown += 1;
                next.as_deref()
            }
            NarrativeNode::Choice { prompts, branches } => {
                let picked = choose(driver, prompts)?;
                info!(choice = %prompts[picked], index = picked, "Choice made");
                report.choices.push(picked);
                branches.get(picked)
            }
            NarrativeNode::Terminal { title, subtitle } => {
                show_card(driver, &Card::banner(title.as_str(), subtitle.as_str()))?;
                info!(title = %title, subtitle = %subtitle, "Ending reached");
                report.ending = Some(subtitle.clone());
                None
            }
        };
    }
    Ok(report)
}

/// Shows `prompts` over the last frame and returns the index of the one pressed.
pub fn choose(driver: &mut PlaybackDriver, prompts: &[String]) -> Result<usize, PlayerError> {
    let rate = driver.ui_rate();
    let frame = driver.last_frame().cloned();
    let stage = driver.stage_mut();
    let targets = layout_choices(prompts, stage.viewport(), |text| {
        stage.measure_text(text, TextSize::Large)
    });

    drain_input(stage)?;
    run_phase(
        stage,
        &mut ChoicePhase {
            frame: frame.as_ref(),
            targets: &targets,
            rate,
        },
    )
}

/// Shows `card` until any press.
pub fn show_card(driver: &mut PlaybackDriver, card: &Card) -> Result<(), PlayerError> {
    let rate = driver.ui_rate();
    run_phase(driver.stage_mut(), &mut CardPhase { card, rate })
}

struct ChoicePhase<'a> {
    frame: Option<&'a DisplayFrame>,
    targets: &'a [ChoiceTarget],
    rate: TickRate,
}

impl Phase for ChoicePhase<'_> {
    type Output = usize;

    fn rate(&self) -> TickRate {
        self.rate
    }

    fn on_event(&mut self, event: &PointerEvent) -> Result<Option<usize>, PlayerError> {
        if event.kind != PointerKind::Down {
            return Ok(None);
        }
        Ok(hit_test(self.targets, event.pos))
    }

    fn on_tick(&mut self, stage: &mut dyn Stage) -> Result<Option<usize>, PlayerError> {
        stage.draw(&Screen::Choice {
            frame: self.frame,
            targets: self.targets,
        })?;
        Ok(None)
    }
}

struct CardPhase<'a> {
    card: &'a Card,
    rate: TickRate,
}

impl Phase for CardPhase<'_> {
    type Output = ();

    fn rate(&self) -> TickRate {
        self.rate
    }

    fn on_event(&mut self, event: &PointerEvent) -> Result<Option<()>, PlayerError> {
        Ok((event.kind == PointerKind::Down).then_some(()))
    }

    fn on_tick(&mut self, stage: &mut dyn Stage) -> Result<Option<()>, PlayerError> {
        stage.draw(&Screen::Card { card: self.card })?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(text: &str) -> (f32, f32) {
        (text.chars().count() as f32 * 48.0, 48.0)
    }

    #[test]
    fn three_choices_do_not_overlap() {
        let prompts: Vec<String> = ["不再联系", "表达转学", "隐瞒转学"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let targets = layout_choices(&prompts, Viewport::new(1280, 720), fixed);
        assert_eq!(targets[1].rect.center(), Point::new(640.0, 350.0));
        for pair in targets.windows(2) {
            assert!(!pair[0].rect.intersects(&pair[1].rect));
        }
        assert_eq!(hit_test(&targets, Point::new(640.0, 350.0)), Some(1));
        assert_eq!(hit_test(&targets, Point::new(640.0, 275.0)), None);
    }

    #[test]
    fn mismatched_choice_is_rejected() {
        let node = NarrativeNode::Choice {
            prompts: vec!["a".into(), "b".into()],
            branches: vec![NarrativeNode::terminal("t", "s")],
        };
        assert!(matches!(node.validate(), Err(PlayerError::InvalidStory(_))));
    }
}
