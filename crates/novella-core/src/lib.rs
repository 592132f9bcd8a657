//! # Novella Core
//!
//! `novella-core` is the engine of an interactive visual-novel player: it plays
//! pre-rendered video clips with their audio tracks, freezes at scripted frames
//! until the viewer swipes or clicks, and branches the story on their choices.
//!
//! ## Core Features
//!
//! *   **Frame-Accurate Triggers**: Scene scripts freeze playback on exact frame indices.
//! *   **Gesture Detection**: One direction table classifies every swipe.
//! *   **Cooperative Scheduling**: Playback and every wait state share a single loop.
//! *   **Branching Narrative**: Stories are trees of scenes, cards and choices, loadable from JSON.
//! *   **Skia Compositing**: Frames, prompts and cards are rasterised with [Skia](https://skia.org/).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use novella_core::{story::Story, DefaultAssetLoader};
//!
//! let story = Story::built_in().unwrap();
//! let loader = DefaultAssetLoader::new(None);
//! novella_core::preflight::preflight(&story, &loader, "simhei.ttf").unwrap();
//! ```

/// Shared geometry and color types.
pub mod types;

pub mod errors;

/// Raw pointer and quit events.
pub mod input;

/// Swipe classification.
pub mod gesture;

/// Scene scripts and trigger resolution.
pub mod script;

/// Video decoding backends.
pub mod video_wrapper;

/// Frame orientation, placement and caching.
pub mod presenter;

/// Background audio playback and probing.
pub mod audio;

/// The cooperative loop shared by every state.
pub mod scheduler;

/// The display/input seam.
pub mod stage;

pub mod config;

/// The per-scene playback state machine.
pub mod driver;

/// The branching story tree and its walker.
pub mod narrative;

/// Story documents and the built-in story.
pub mod story;

/// Startup checks and asset reports.
pub mod preflight;

/// Compositor, window and font systems.
pub mod systems;

pub use config::PlayerConfig;
pub use driver::PlaybackDriver;
pub use errors::PlayerError;

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Environment variable naming the packaged asset root.
pub const ASSET_ROOT_ENV: &str = "NOVELLA_ASSET_ROOT";

/// A trait for abstracting file system access.
///
/// Story files name assets by logical, forward-slash paths (`res/intro.mp4`);
/// the loader decides where those live on disk.
pub trait AssetLoader: Send + Sync {
    /// Maps a logical path to the file that should be opened.
    ///
    /// Returns a concrete path even when nothing exists, so errors can name it.
    fn resolve(&self, logical: &str) -> PathBuf;

    /// Loads the raw bytes of an asset.
    fn load_bytes(&self, logical: &str) -> Result<Vec<u8>> {
        let path = self.resolve(logical);
        std::fs::read(&path).map_err(|e| {
            anyhow::anyhow!("Asset not found: {} ({}): {}", logical, path.display(), e)
        })
    }
}

/// Searches an explicit root, then the executable's directory, then the working directory.
#[derive(Debug, Clone, Default)]
pub struct DefaultAssetLoader {
    roots: Vec<PathBuf>,
}

impl DefaultAssetLoader {
    /// `root` wins over [`ASSET_ROOT_ENV`]; both win over the development locations.
    pub fn new(root: Option<PathBuf>) -> Self {
        let mut roots = Vec::new();
        if let Some(root) = root.or_else(|| std::env::var_os(ASSET_ROOT_ENV).map(PathBuf::from)) {
            roots.push(root);
        }
        if let Some(dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            roots.push(dir);
        }
        if let Ok(cwd) = std::env::current_dir() {
            roots.push(cwd);
        }
        Self { roots }
    }

    /// A loader over exactly these roots, in order.
    pub fn with_roots(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }
}

impl AssetLoader for DefaultAssetLoader {
    #[instrument(level = "trace", skip(self))]
    fn resolve(&self, logical: &str) -> PathBuf {
        let relative = Path::new(logical);
        if relative.is_absolute() {
            return relative.to_path_buf();
        }
        let candidates: Vec<PathBuf> = self.roots.iter().map(|r| r.join(relative)).collect();
        candidates
            .iter()
            .find(|p| p.is_file())
            .or_else(|| candidates.first())
            .cloned()
            .unwrap_or_else(|| relative.to_path_buf())
    }
}
