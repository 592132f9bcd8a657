//! # Audio Module
//!
//! Single-track background audio that follows the playback driver.
//!
//! ## Responsibilities
//! - **Playback**: One track at a time, started per scene and paused at every trigger.
//! - **Degradation**: Missing devices or undecodable files never stop video playback.
//! - **Probing**: Format inspection for the `check` command.
//!
//! ## Key Types
//! - `AudioChannel`: The commands the driver issues.
//! - `RodioChannel`: Output-device backed channel.
//! - `SilentChannel`: Accepts every command and plays nothing.

use crate::errors::PlayerError;
use anyhow::Context;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info, instrument, warn};

/// Commands the playback driver issues. Position is never queried.
pub trait AudioChannel {
    /// Stops the current track and starts `path` from the beginning.
    fn load_and_play(&mut self, path: &Path) -> Result<(), PlayerError>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    /// True while a track is loaded and not paused.
    fn is_playing(&self) -> bool;
}

/// Plays through the default output device.
pub struct RodioChannel {
    stream: OutputStream,
    sink: Option<Sink>,
}

impl std::fmt::Debug for RodioChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioChannel")
            .field("loaded", &self.sink.is_some())
            .finish()
    }
}

impl RodioChannel {
    pub fn open_default() -> Result<Self, PlayerError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .context("No audio output device")
            .map_err(PlayerError::Anyhow)?;
        stream.log_on_drop(false);
        Ok(Self { stream, sink: None })
    }
}

impl AudioChannel for RodioChannel {
    #[instrument(level = "debug", skip(self), fields(path = %path.display()))]
    fn load_and_play(&mut self, path: &Path) -> Result<(), PlayerError> {
        self.stop();
        if !path.is_file() {
            return Err(PlayerError::AssetNotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;
        let source =
            Decoder::new(BufReader::new(file)).map_err(|e| PlayerError::decode_init(path, e))?;
        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(source);
        sink.play();
        self.sink = Some(sink);
        debug!("Audio track started");
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn resume(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn is_playing(&self) -> bool {
        self.sink
            .as_ref()
            .is_some_and(|sink| !sink.is_paused() && !sink.empty())
    }
}

/// Stand-in when no output device exists. Still reports missing files.
#[derive(Debug, Default)]
pub struct SilentChannel {
    loaded: bool,
    paused: bool,
}

impl AudioChannel for SilentChannel {
    fn load_and_play(&mut self, path: &Path) -> Result<(), PlayerError> {
        if !path.is_file() {
            self.loaded = false;
            return Err(PlayerError::AssetNotFound(path.to_path_buf()));
        }
        self.loaded = true;
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn stop(&mut self) {
        self.loaded = false;
    }

    fn is_playing(&self) -> bool {
        self.loaded && !self.paused
    }
}

/// The device channel, or a silent one when the device cannot be opened.
pub fn open_output() -> Box<dyn AudioChannel> {
    match RodioChannel::open_default() {
        Ok(channel) => {
            info!("Audio output ready");
            Box::new(channel)
        }
        Err(e) => {
            warn!("Audio disabled: {}", e);
            Box::new(SilentChannel::default())
        }
    }
}

/// Stream parameters reported by [`read_audio_info`].
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInfo {
    pub codec: String,
    pub sample_rate: Option<u32>,
    pub channels: Option<usize>,
    pub duration_secs: Option<f64>,
}

/// Reads container headers without decoding samples.
pub fn read_audio_info(path: &Path) -> Result<AudioInfo, PlayerError> {
    if !path.is_file() {
        return Err(PlayerError::AssetNotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| PlayerError::decode_init(path, e))?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| PlayerError::decode_init(path, "no audio track"))?;
    let params = &track.codec_params;

    let codec = symphonia::default::get_codecs()
        .get_codec(params.codec)
        .map(|d| d.short_name.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let duration_secs = match (params.n_frames, params.sample_rate) {
        (Some(frames), Some(rate)) if rate > 0 => Some(frames as f64 / rate as f64),
        _ => None,
    };

    Ok(AudioInfo {
        codec,
        sample_rate: params.sample_rate,
        channels: params.channels.map(|c| c.count()),
        duration_secs,
    })
}
