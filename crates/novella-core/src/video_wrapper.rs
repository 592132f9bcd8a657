// Conditional real or mock video decoding backend
use crate::errors::PlayerError;
use std::fmt;
use std::path::Path;

/// Rate used when the container reports zero or an unknown rate.
pub const FALLBACK_FRAME_RATE: f64 = 30.0;

/// Returns `reported` unless it is zero, negative or not finite.
pub fn effective_rate(reported: f64) -> f64 {
    if reported.is_finite() && reported > 0.0 {
        reported
    } else {
        FALLBACK_FRAME_RATE
    }
}

/// A decoded frame: tightly packed RGB, row-major, `width * height * 3` bytes.
#[derive(Clone, PartialEq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RawFrame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, PlayerError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(PlayerError::Anyhow(anyhow::anyhow!(
                "RGB frame {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A frame filled with one color.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            width,
            height,
            data,
        }
    }
}

impl fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Strictly forward, sequential frame stream.
pub trait FrameSource {
    /// Frames per second, already passed through [`effective_rate`].
    fn rate(&self) -> f64;
    /// `(width, height)` of decoded frames.
    fn frame_size(&self) -> (u32, u32);
    /// Next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<RawFrame>, PlayerError>;
}

/// Opens frame sources for resolved paths.
pub trait VideoOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, PlayerError>;
}

fn ensure_exists(path: &Path) -> Result<(), PlayerError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PlayerError::AssetNotFound(path.to_path_buf()))
    }
}

#[cfg(feature = "video-rs")]
mod real {
    use super::*;
    use std::sync::Once;
    use tracing::{debug, instrument, warn};

    static FFMPEG_INIT: Once = Once::new();

    /// Synchronous decoder on the calling thread. Every frame is delivered in order.
    pub struct SyncDecoder {
        decoder: video_rs::Decoder,
        rate: f64,
        size: (u32, u32),
        decoded: u64,
    }

    impl fmt::Debug for SyncDecoder {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("SyncDecoder")
                .field("rate", &self.rate)
                .field("size", &self.size)
                .field("decoded", &self.decoded)
                .finish()
        }
    }

    impl SyncDecoder {
        #[instrument(level = "debug", fields(path = %path.display()))]
        pub fn new(path: &Path) -> Result<Self, PlayerError> {
            ensure_exists(path)?;
            FFMPEG_INIT.call_once(|| {
                if let Err(e) = video_rs::init() {
                    warn!("ffmpeg initialisation reported: {}", e);
                }
            });

            let decoder = video_rs::Decoder::new(path.to_path_buf())
                .map_err(|e| PlayerError::decode_init(path, e))?;
            let rate = effective_rate(decoder.frame_rate() as f64);
            let size = decoder.size();
            debug!(rate, width = size.0, height = size.1, "Video opened");

            Ok(Self {
                decoder,
                rate,
                size,
                decoded: 0,
            })
        }
    }

    impl FrameSource for SyncDecoder {
        fn rate(&self) -> f64 {
            self.rate
        }

        fn frame_size(&self) -> (u32, u32) {
            self.size
        }

        fn next_frame(&mut self) -> Result<Option<RawFrame>, PlayerError> {
            match self.decoder.decode() {
                Ok((_time, frame)) => {
                    let shape = frame.shape().to_vec();
                    if shape.len() != 3 || shape[2] < 3 {
                        return Err(PlayerError::Anyhow(anyhow::anyhow!(
                            "Unexpected frame shape {:?}",
                            shape
                        )));
                    }
                    let (h, w, channels) = (shape[0], shape[1], shape[2]);
                    let (bytes, _) = frame.into_raw_vec_and_offset();
                    let data = if channels == 3 {
                        bytes
                    } else {
                        bytes
                            .chunks(channels)
                            .flat_map(|px| px[..3].iter().copied())
                            .collect()
                    };
                    self.decoded += 1;
                    RawFrame::new(w as u32, h as u32, data).map(Some)
                }
                Err(video_rs::Error::ReadExhausted) | Err(video_rs::Error::DecodeExhausted) => {
                    debug!(frames = self.decoded, "End of stream");
                    Ok(None)
                }
                Err(e) => {
                    warn!(frames = self.decoded, "Decoding stopped: {}", e);
                    Ok(None)
                }
            }
        }
    }

    /// Opens files with the ffmpeg-backed [`SyncDecoder`].
    #[derive(Debug, Default, Clone, Copy)]
    pub struct DecoderOpener;

    impl VideoOpener for DecoderOpener {
        fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, PlayerError> {
            Ok(Box::new(SyncDecoder::new(path)?))
        }
    }
}

#[cfg(feature = "video-rs")]
pub use real::*;

#[cfg(not(feature = "video-rs"))]
pub mod mock {
    use super::*;

    /// Length of every mock clip, in frames.
    pub const MOCK_FRAMES: u64 = 90;

    /// Emits a fixed number of dark grey frames for any existing file.
    #[derive(Debug)]
    pub struct SyncDecoder {
        emitted: u64,
    }

    impl SyncDecoder {
        pub fn new(path: &Path) -> Result<Self, PlayerError> {
            ensure_exists(path)?;
            Ok(Self { emitted: 0 })
        }
    }

    impl FrameSource for SyncDecoder {
        fn rate(&self) -> f64 {
            FALLBACK_FRAME_RATE
        }

        fn frame_size(&self) -> (u32, u32) {
            (16, 9)
        }

        fn next_frame(&mut self) -> Result<Option<RawFrame>, PlayerError> {
            if self.emitted >= MOCK_FRAMES {
                return Ok(None);
            }
            self.emitted += 1;
            Ok(Some(RawFrame::solid(16, 9, [32, 32, 32])))
        }
    }

    #[derive(Debug, Default, Clone, Copy)]
    pub struct DecoderOpener;

    impl VideoOpener for DecoderOpener {
        fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, PlayerError> {
            Ok(Box::new(SyncDecoder::new(path)?))
        }
    }
}

#[cfg(not(feature = "video-rs"))]
pub use mock::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_nan_rates_fall_back() {
        assert_eq!(effective_rate(0.0), 30.0);
        assert_eq!(effective_rate(f64::NAN), 30.0);
        assert_eq!(effective_rate(-5.0), 30.0);
        assert_eq!(effective_rate(23.976), 23.976);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = DecoderOpener
            .open(Path::new("definitely/not/here.mp4"))
            .err()
            .unwrap();
        assert!(matches!(err, PlayerError::AssetNotFound(_)));
    }

    #[test]
    fn raw_frame_checks_length() {
        assert!(RawFrame::new(2, 2, vec![0; 12]).is_ok());
        assert!(RawFrame::new(2, 2, vec![0; 11]).is_err());
    }
}
