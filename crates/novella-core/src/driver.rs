//! # Playback Driver
//!
//! Runs one [`SceneScript`] against the injected frame source, presenter,
//! audio channel, gesture detector and stage.
//!
//! ## States
//! `Idle → Loading → Playing → {SwipeWait, ClickWait} → Playing → … → Finished`
//!
//! A load failure goes straight to `Finished { failed: true }`. Quit unwinds
//! from any state as [`PlayerError::Quit`] after stopping audio.

use crate::audio::AudioChannel;
use crate::config::PlayerConfig;
use crate::errors::PlayerError;
use crate::gesture::{Direction, GestureDetector};
use crate::input::PointerEvent;
use crate::presenter::{DisplayFrame, Presenter};
use crate::scheduler::{run_phase, Phase, TickRate};
use crate::script::{SceneScript, Trigger, TriggerAction, TriggerPlan};
use crate::stage::{Screen, Stage};
use crate::video_wrapper::{FrameSource, VideoOpener};
use crate::AssetLoader;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Playing,
    SwipeWait,
    ClickWait,
    Finished {
        failed: bool,
    },
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Loading => f.write_str("loading"),
            Self::Playing => f.write_str("playing"),
            Self::SwipeWait => f.write_str("swipe_wait"),
            Self::ClickWait => f.write_str("click_wait"),
            Self::Finished { failed: false } => f.write_str("finished"),
            Self::Finished { failed: true } => f.write_str("finished(failed)"),
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// Reached end of stream.
    Completed,
    /// Could not open the video or resolve its triggers.
    LoadFailed(String),
    /// The frame source failed mid-stream.
    Interrupted(String),
}

impl SessionOutcome {
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Completed)
    }
}

/// Summary of one playback session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub video: String,
    pub frames_presented: u64,
    /// Triggers in firing order.
    pub triggers: Vec<Trigger>,
    pub outcome: SessionOutcome,
}

/// Owns the session context and every collaborator of a playback session.
pub struct PlaybackDriver {
    stage: Box<dyn Stage>,
    audio: Box<dyn AudioChannel>,
    opener: Box<dyn VideoOpener>,
    loader: Arc<dyn AssetLoader>,
    presenter: Presenter,
    detector: GestureDetector,
    state: PlaybackState,
    ui_rate: TickRate,
}

impl fmt::Debug for PlaybackDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackDriver")
            .field("state", &self.state)
            .field("viewport", &self.presenter.viewport())
            .finish()
    }
}

impl PlaybackDriver {
    /// The viewport is read from `stage` once and kept for every session.
    pub fn new(
        config: &PlayerConfig,
        stage: Box<dyn Stage>,
        audio: Box<dyn AudioChannel>,
        opener: Box<dyn VideoOpener>,
        loader: Arc<dyn AssetLoader>,
    ) -> Self {
        let presenter = Presenter::new(stage.viewport());
        Self {
            stage,
            audio,
            opener,
            loader,
            presenter,
            detector: GestureDetector::new(config.swipe),
            state: PlaybackState::Idle,
            ui_rate: config.ui_rate,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn ui_rate(&self) -> TickRate {
        self.ui_rate
    }

    pub fn stage_mut(&mut self) -> &mut dyn Stage {
        self.stage.as_mut()
    }

    /// Last frame of the most recent session, for screens drawn over it.
    pub fn last_frame(&self) -> Option<&DisplayFrame> {
        self.presenter.last_frame()
    }

    fn transition(&mut self, to: PlaybackState) {
        debug!(from = %self.state, to = %to, "Playback state");
        self.state = to;
    }

    /// Plays `script` to its end.
    ///
    /// Only [`PlayerError::Quit`] and stage failures are returned as errors;
    /// media failures end the session with a failed outcome.
    #[instrument(level = "info", skip_all, fields(video = script.video()))]
    pub fn play(&mut self, script: &SceneScript) -> Result<SessionReport, PlayerError> {
        self.transition(PlaybackState::Idle);
        let mut report = SessionReport {
            video: script.video().to_string(),
            frames_presented: 0,
            triggers: Vec::new(),
            outcome: SessionOutcome::Completed,
        };

        let result = self.run_session(script, &mut report);
        self.audio.stop();
        self.detector.reset();

        match result {
            Ok(()) => {
                let failed = report.outcome.is_failure();
                self.transition(PlaybackState::Finished { failed });
                info!(
                    frames = report.frames_presented,
                    triggers = report.triggers.len(),
                    failed,
                    "Scene finished"
                );
                Ok(report)
            }
            Err(e) => {
                self.transition(PlaybackState::Finished { failed: !e.is_quit() });
                Err(e)
            }
        }
    }

    fn run_session(
        &mut self,
        script: &SceneScript,
        report: &mut SessionReport,
    ) -> Result<(), PlayerError> {
        self.transition(PlaybackState::Loading);

        // The previous scene's last frame stays cached until a new video opens.
        let (mut source, mut plan) = match self.load(script) {
            Ok(loaded) => loaded,
            Err(e) => {
                error!("Failed to load scene: {}", e);
                report.outcome = SessionOutcome::LoadFailed(e.to_string());
                return Ok(());
            }
        };
        self.presenter.clear();

        if let Some(audio) = script.audio() {
            let path = self.loader.resolve(audio);
            if let Err(e) = self.audio.load_and_play(&path) {
                warn!("Continuing without audio: {}", e);
            }
        }

        self.transition(PlaybackState::Playing);
        let rate = TickRate(source.rate());
        let mut next_index = 0u64;

        loop {
            let mut playing = PlayingPhase {
                source: source.as_mut(),
                presenter: &mut self.presenter,
                plan: &mut plan,
                next_index: &mut next_index,
                presented: &mut report.frames_presented,
                rate,
            };
            let trigger = match run_phase(self.stage.as_mut(), &mut playing)? {
                PlayingEnd::EndOfStream => {
                    debug!(frames = report.frames_presented, "End of stream");
                    return Ok(());
                }
                PlayingEnd::SourceFailed(reason) => {
                    error!("Video stopped early: {}", reason);
                    report.outcome = SessionOutcome::Interrupted(reason);
                    return Ok(());
                }
                PlayingEnd::Trigger(trigger) => trigger,
            };

            // A swipe and a pause may share a frame; both wait before the next frame.
            let frame = trigger.frame;
            let mut due = Some(trigger);
            while let Some(trigger) = due {
                self.wait_for(&trigger)?;
                report.triggers.push(trigger);
                due = plan.take_due(frame);
            }
            self.transition(PlaybackState::Playing);
        }
    }

    fn load(
        &mut self,
        script: &SceneScript,
    ) -> Result<(Box<dyn FrameSource>, TriggerPlan), PlayerError> {
        let path = self.loader.resolve(script.video());
        let source = self.opener.open(&path)?;
        let plan = script.plan(source.rate())?;
        debug!(
            rate = source.rate(),
            triggers = ?plan.frames(),
            "Scene loaded"
        );
        Ok((source, plan))
    }

    /// Freezes on the last frame until the trigger's input arrives.
    fn wait_for(&mut self, trigger: &Trigger) -> Result<(), PlayerError> {
        let paused = self.audio.is_playing();
        if paused {
            self.audio.pause();
        }
        self.detector.reset();

        match &trigger.action {
            TriggerAction::Swipe { direction, prompt } => {
                info!(frame = trigger.frame, direction = %direction, "Swipe trigger");
                self.transition(PlaybackState::SwipeWait);
                let mut phase = FrozenPhase {
                    detector: &mut self.detector,
                    frame: self.presenter.last_frame(),
                    prompt,
                    wanted: Some(direction),
                    rate: self.ui_rate,
                };
                run_phase(self.stage.as_mut(), &mut phase)?;
            }
            TriggerAction::Click { prompt } => {
                info!(frame = trigger.frame, prompt = %prompt, "Pause trigger");
                self.transition(PlaybackState::ClickWait);
                let mut phase = FrozenPhase {
                    detector: &mut self.detector,
                    frame: self.presenter.last_frame(),
                    prompt,
                    wanted: None,
                    rate: self.ui_rate,
                };
                run_phase(self.stage.as_mut(), &mut phase)?;
            }
        }

        self.detector.reset();
        if paused {
            self.audio.resume();
        }
        Ok(())
    }
}

enum PlayingEnd {
    EndOfStream,
    SourceFailed(String),
    Trigger(Trigger),
}

/// Presents one frame per tick at the video rate.
struct PlayingPhase<'a> {
    source: &'a mut dyn FrameSource,
    presenter: &'a mut Presenter,
    plan: &'a mut TriggerPlan,
    next_index: &'a mut u64,
    presented: &'a mut u64,
    rate: TickRate,
}

impl Phase for PlayingPhase<'_> {
    type Output = PlayingEnd;

    fn rate(&self) -> TickRate {
        self.rate
    }

    fn on_tick(&mut self, stage: &mut dyn Stage) -> Result<Option<PlayingEnd>, PlayerError> {
        let raw = match self.source.next_frame() {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(Some(PlayingEnd::EndOfStream)),
            Err(e) => return Ok(Some(PlayingEnd::SourceFailed(e.to_string()))),
        };

        let index = *self.next_index;
        let frame = self.presenter.present(&raw, index);
        stage.draw(&Screen::Playing { frame })?;
        *self.presented += 1;
        *self.next_index += 1;

        Ok(self.plan.take_due(index).map(PlayingEnd::Trigger))
    }
}

/// Swipe-wait (`wanted` set) or click-wait over the cached frame.
struct FrozenPhase<'a> {
    detector: &'a mut GestureDetector,
    frame: Option<&'a DisplayFrame>,
    prompt: &'a str,
    wanted: Option<&'a Direction>,
    rate: TickRate,
}

impl Phase for FrozenPhase<'_> {
    type Output = ();

    fn rate(&self) -> TickRate {
        self.rate
    }

    fn on_event(&mut self, event: &PointerEvent) -> Result<Option<()>, PlayerError> {
        let done = match self.wanted {
            Some(direction) => self.detector.on_pointer_event(event, direction) == Some(true),
            None => self.detector.track(event).is_some(),
        };
        Ok(done.then_some(()))
    }

    fn on_tick(&mut self, stage: &mut dyn Stage) -> Result<Option<()>, PlayerError> {
        stage.draw(&Screen::Frozen {
            frame: self.frame,
            trail: self.detector.trail(),
            prompt: self.prompt,
        })?;
        Ok(None)
    }
}
