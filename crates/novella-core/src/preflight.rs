//! Startup checks and the asset report behind `novella check`.

use crate::audio::read_audio_info;
use crate::errors::PlayerError;
use crate::story::Story;
use crate::video_wrapper::VideoOpener;
use crate::AssetLoader;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

/// Fails with `AssetNotFound` when the font or the first scene's audio is missing.
#[instrument(level = "info", skip(story, loader))]
pub fn preflight(story: &Story, loader: &dyn AssetLoader, font: &str) -> Result<(), PlayerError> {
    let font_path = loader.resolve(font);
    if !font_path.is_file() {
        return Err(PlayerError::AssetNotFound(font_path));
    }
    if let Some(audio) = story.primary_audio() {
        let audio_path = loader.resolve(audio);
        if !audio_path.is_file() {
            return Err(PlayerError::AssetNotFound(audio_path));
        }
    }
    info!("Preflight passed");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Font,
    Video,
    Audio,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Font => "font",
            Self::Video => "video",
            Self::Audio => "audio",
        })
    }
}

/// Result of checking one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetCheck {
    pub kind: AssetKind,
    pub logical: String,
    pub resolved: PathBuf,
    /// Human-readable details on success, the error otherwise.
    pub status: Result<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckReport {
    pub entries: Vec<AssetCheck>,
}

impl CheckReport {
    pub fn failures(&self) -> impl Iterator<Item = &AssetCheck> {
        self.entries.iter().filter(|e| e.status.is_err())
    }

    pub fn is_ok(&self) -> bool {
        self.failures().next().is_none()
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            let (mark, detail) = match &entry.status {
                Ok(detail) => ("ok  ", detail),
                Err(detail) => ("FAIL", detail),
            };
            writeln!(
                f,
                "[{}] {:<5} {} -> {}: {}",
                mark,
                entry.kind,
                entry.logical,
                entry.resolved.display(),
                detail
            )?;
        }
        let failed = self.failures().count();
        write!(f, "{} assets checked, {} failed", self.entries.len(), failed)
    }
}

/// Opens every video and reads the stream info of every audio file the story references.
///
/// Scenes shared between branches are checked once.
#[instrument(level = "info", skip_all)]
pub fn check(
    story: &Story,
    loader: &dyn AssetLoader,
    opener: &dyn VideoOpener,
    font: &str,
) -> CheckReport {
    let mut report = CheckReport::default();
    let mut seen = std::collections::HashSet::new();

    let font_path = loader.resolve(font);
    report.entries.push(AssetCheck {
        kind: AssetKind::Font,
        logical: font.to_string(),
        status: if font_path.is_file() {
            Ok("present".to_string())
        } else {
            Err(PlayerError::AssetNotFound(font_path.clone()).to_string())
        },
        resolved: font_path,
    });

    for script in story.root.scenes() {
        if seen.insert(script.video().to_string()) {
            let resolved = loader.resolve(script.video());
            let status = opener
                .open(&resolved)
                .map(|source| {
                    let (w, h) = source.frame_size();
                    format!("{}x{} @ {:.3} fps", w, h, source.rate())
                })
                .map_err(|e| e.to_string());
            report.entries.push(AssetCheck {
                kind: AssetKind::Video,
                logical: script.video().to_string(),
                resolved,
                status,
            });
        }

        if let Some(audio) = script.audio() {
            if seen.insert(audio.to_string()) {
                let resolved = loader.resolve(audio);
                let status = read_audio_info(&resolved)
                    .map(|info| {
                        let mut detail = info.codec;
                        if let Some(rate) = info.sample_rate {
                            detail.push_str(&format!(", {} Hz", rate));
                        }
                        if let Some(channels) = info.channels {
                            detail.push_str(&format!(", {} ch", channels));
                        }
                        if let Some(secs) = info.duration_secs {
                            detail.push_str(&format!(", {:.1} s", secs));
                        }
                        detail
                    })
                    .map_err(|e| e.to_string());
                report.entries.push(AssetCheck {
                    kind: AssetKind::Audio,
                    logical: audio.to_string(),
                    resolved,
                    status,
                });
            }
        }
    }

    for failure in report.failures() {
        warn!(kind = %failure.kind, asset = %failure.logical, "Asset check failed");
    }
    report
}
