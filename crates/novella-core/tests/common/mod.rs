//! Test doubles shared by the integration tests.
//!
//! - `RecordingStage`: records every screen and hands out one scripted input
//!   batch each time an interactive screen is drawn.
//! - `SyntheticOpener`: solid-colour clips of a fixed length, keyed by path,
//!   optionally failing after some frames.
//! - `RecordingAudio`: logs the commands the driver issues; can refuse loads.
#![allow(dead_code)]

use novella_core::audio::AudioChannel;
use novella_core::input::{InputEvent, PointerEvent};
use novella_core::scheduler::TickRate;
use novella_core::stage::{Screen, Stage};
use novella_core::types::{Point, Rect, TextSize, Viewport};
use novella_core::video_wrapper::{FrameSource, RawFrame, VideoOpener};
use novella_core::{AssetLoader, PlaybackDriver, PlayerConfig, PlayerError};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}

/// Owned summary of one drawn [`Screen`].
#[derive(Debug, Clone, PartialEq)]
pub enum Drawn {
    Playing { frame: u64 },
    Frozen { frame: Option<u64>, prompt: String, trail: usize },
    Choice { frame: Option<u64>, labels: Vec<String>, rects: Vec<Rect> },
    Card { title: String },
}

impl Drawn {
    pub fn is_interactive(&self) -> bool {
        !matches!(self, Drawn::Playing { .. })
    }
}

#[derive(Debug, Default)]
pub struct StageLog {
    pub draws: Vec<Drawn>,
    pub paced: Vec<TickRate>,
}

impl StageLog {
    /// Indices of every `Playing` draw, in order.
    pub fn played_frames(&self) -> Vec<u64> {
        self.draws
            .iter()
            .filter_map(|d| match d {
                Drawn::Playing { frame } => Some(*frame),
                _ => None,
            })
            .collect()
    }

    /// Draws with consecutive duplicates collapsed, e.g. many `Frozen` ticks into one.
    pub fn screens(&self) -> Vec<Drawn> {
        let mut out: Vec<Drawn> = Vec::new();
        for draw in &self.draws {
            let same = match (out.last(), draw) {
                (Some(Drawn::Frozen { prompt: a, .. }), Drawn::Frozen { prompt: b, .. }) => a == b,
                (Some(last), _) => last == draw,
                (None, _) => false,
            };
            if !same {
                out.push(draw.clone());
            }
        }
        out
    }
}

/// A headless stage fed from scripted input batches.
///
/// Each interactive draw (frozen, choice, card) arms the stage; the next poll
/// delivers one batch. With no batches left the armed poll returns `Quit`.
pub struct RecordingStage {
    viewport: Viewport,
    batches: VecDeque<Vec<InputEvent>>,
    armed: bool,
    pub log: Rc<RefCell<StageLog>>,
}

impl RecordingStage {
    pub fn new(batches: Vec<Vec<InputEvent>>) -> Self {
        Self {
            viewport: Viewport::new(1280, 720),
            batches: batches.into(),
            armed: false,
            log: Rc::default(),
        }
    }
}

impl Stage for RecordingStage {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn poll_events(&mut self) -> Result<Vec<InputEvent>, PlayerError> {
        if !self.armed {
            return Ok(Vec::new());
        }
        self.armed = false;
        Ok(self.batches.pop_front().unwrap_or_else(|| vec![InputEvent::Quit]))
    }

    fn draw(&mut self, screen: &Screen<'_>) -> Result<(), PlayerError> {
        let drawn = match screen {
            Screen::Playing { frame } => Drawn::Playing {
                frame: frame.frame_index,
            },
            Screen::Frozen {
                frame,
                trail,
                prompt,
            } => Drawn::Frozen {
                frame: frame.map(|f| f.frame_index),
                prompt: prompt.to_string(),
                trail: trail.len(),
            },
            Screen::Choice { frame, targets } => Drawn::Choice {
                frame: frame.map(|f| f.frame_index),
                labels: targets.iter().map(|t| t.label.clone()).collect(),
                rects: targets.iter().map(|t| t.rect).collect(),
            },
            Screen::Card { card } => Drawn::Card {
                title: card.title.clone(),
            },
        };
        self.armed = drawn.is_interactive();
        self.log.borrow_mut().draws.push(drawn);
        Ok(())
    }

    fn pace(&mut self, rate: TickRate) {
        self.log.borrow_mut().paced.push(rate);
    }

    /// One em per character: 48 px large, 24 px small.
    fn measure_text(&self, text: &str, size: TextSize) -> (f32, f32) {
        let em = match size {
            TextSize::Large => 48.0,
            TextSize::Small => 24.0,
        };
        (text.chars().count() as f32 * em, em)
    }
}

/// A complete press, drag and release.
pub fn swipe(from: (f32, f32), to: (f32, f32), ms: u64) -> Vec<InputEvent> {
    let mid = ((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0);
    vec![
        PointerEvent::down(from, 0).into(),
        PointerEvent::moved(mid, ms / 2).into(),
        PointerEvent::up(to, ms).into(),
    ]
}

pub fn click(at: (f32, f32)) -> Vec<InputEvent> {
    vec![PointerEvent::down(at, 0).into(), PointerEvent::up(at, 80).into()]
}

/// Press only; enough for choice and card screens.
pub fn press(at: (f32, f32)) -> Vec<InputEvent> {
    vec![PointerEvent::down(at, 0).into()]
}

pub fn center_of(rect: Rect) -> (f32, f32) {
    let Point { x, y } = rect.center();
    (x, y)
}

struct SyntheticSource {
    rate: f64,
    remaining: u64,
    fails: bool,
}

impl FrameSource for SyntheticSource {
    fn rate(&self) -> f64 {
        self.rate
    }

    fn frame_size(&self) -> (u32, u32) {
        (4, 3)
    }

    fn next_frame(&mut self) -> Result<Option<RawFrame>, PlayerError> {
        if self.remaining == 0 {
            if self.fails {
                return Err(PlayerError::Anyhow(anyhow::anyhow!("corrupt packet")));
            }
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(RawFrame::solid(4, 3, [30, 60, 90])))
    }
}

#[derive(Debug, Clone, Copy)]
struct Clip {
    frames: u64,
    rate: f64,
    fails: bool,
}

/// Opens clips registered by path; anything else is missing.
#[derive(Debug, Default, Clone)]
pub struct SyntheticOpener {
    clips: HashMap<PathBuf, Clip>,
}

impl SyntheticOpener {
    pub fn with(mut self, path: &str, frames: u64, rate: f64) -> Self {
        let clip = Clip {
            frames,
            rate,
            fails: false,
        };
        self.clips.insert(PathBuf::from(path), clip);
        self
    }

    /// A clip that decodes `frames` frames and then errors instead of ending.
    pub fn with_failure(mut self, path: &str, frames: u64, rate: f64) -> Self {
        let clip = Clip {
            frames,
            rate,
            fails: true,
        };
        self.clips.insert(PathBuf::from(path), clip);
        self
    }
}

impl VideoOpener for SyntheticOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, PlayerError> {
        let clip = self
            .clips
            .get(path)
            .copied()
            .ok_or_else(|| PlayerError::AssetNotFound(path.to_path_buf()))?;
        Ok(Box::new(SyntheticSource {
            rate: clip.rate,
            remaining: clip.frames,
            fails: clip.fails,
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioCall {
    Load(PathBuf),
    Pause,
    Resume,
    Stop,
}

/// Records the call sequence; accepts every load unless built with [`RecordingAudio::failing`].
#[derive(Debug, Default)]
pub struct RecordingAudio {
    playing: bool,
    fail_loads: bool,
    pub calls: Rc<RefCell<Vec<AudioCall>>>,
}

impl RecordingAudio {
    /// Every load reports the track as missing and nothing plays.
    pub fn failing() -> Self {
        Self {
            fail_loads: true,
            ..Self::default()
        }
    }
}

impl AudioChannel for RecordingAudio {
    fn load_and_play(&mut self, path: &Path) -> Result<(), PlayerError> {
        self.calls.borrow_mut().push(AudioCall::Load(path.to_path_buf()));
        if self.fail_loads {
            return Err(PlayerError::AssetNotFound(path.to_path_buf()));
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.calls.borrow_mut().push(AudioCall::Pause);
        self.playing = false;
    }

    fn resume(&mut self) {
        self.calls.borrow_mut().push(AudioCall::Resume);
        self.playing = true;
    }

    fn stop(&mut self) {
        self.calls.borrow_mut().push(AudioCall::Stop);
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Leaves logical paths untouched.
#[derive(Debug, Default)]
pub struct TestLoader;

impl AssetLoader for TestLoader {
    fn resolve(&self, logical: &str) -> PathBuf {
        PathBuf::from(logical)
    }
}

/// Everything a test needs to drive and then inspect a player.
pub struct Harness {
    pub driver: PlaybackDriver,
    pub log: Rc<RefCell<StageLog>>,
    pub audio: Rc<RefCell<Vec<AudioCall>>>,
}

pub fn harness(opener: SyntheticOpener, batches: Vec<Vec<InputEvent>>) -> Harness {
    harness_with_audio(opener, batches, RecordingAudio::default())
}

pub fn harness_with_audio(
    opener: SyntheticOpener,
    batches: Vec<Vec<InputEvent>>,
    audio: RecordingAudio,
) -> Harness {
    init_tracing();
    let stage = RecordingStage::new(batches);
    let log = stage.log.clone();
    let calls = audio.calls.clone();
    let driver = PlaybackDriver::new(
        &PlayerConfig::default(),
        Box::new(stage),
        Box::new(audio),
        Box::new(opener),
        Arc::new(TestLoader),
    );
    Harness {
        driver,
        log,
        audio: calls,
    }
}
