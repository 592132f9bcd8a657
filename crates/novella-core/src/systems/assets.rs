use crate::errors::PlayerError;
use crate::types::TextSize;
use crate::AssetLoader;
use skia_safe::{Data, Font, FontMgr};
use tracing::instrument;

/// The player's one typeface at its two sizes.
#[derive(Debug, Clone)]
pub struct FontSet {
    large: Font,
    small: Font,
}

impl FontSet {
    /// Loads the font through `loader`. A missing file is `AssetNotFound`.
    #[instrument(level = "debug", skip(loader))]
    pub fn load(
        loader: &dyn AssetLoader,
        logical: &str,
        large: f32,
        small: f32,
    ) -> Result<Self, PlayerError> {
        let path = loader.resolve(logical);
        if !path.is_file() {
            return Err(PlayerError::AssetNotFound(path));
        }
        let bytes = loader.load_bytes(logical)?;
        Self::from_bytes(&bytes, large, small)
            .ok_or_else(|| PlayerError::decode_init(path, "not a usable font file"))
    }

    pub fn from_bytes(bytes: &[u8], large: f32, small: f32) -> Option<Self> {
        let data = Data::new_copy(bytes);
        let typeface = FontMgr::new().new_from_data(&data, 0)?;
        Some(Self {
            large: Font::new(typeface.clone(), Some(large)),
            small: Font::new(typeface, Some(small)),
        })
    }

    /// A system sans-serif face, for when no font asset is needed to match exactly.
    pub fn system(large: f32, small: f32) -> Option<Self> {
        let font_mgr = FontMgr::default();
        let typeface = font_mgr
            .match_family_style("Sans Serif", skia_safe::FontStyle::normal())
            .or_else(|| font_mgr.legacy_make_typeface(None, skia_safe::FontStyle::normal()))?;
        Some(Self {
            large: Font::new(typeface.clone(), Some(large)),
            small: Font::new(typeface, Some(small)),
        })
    }

    pub fn font(&self, size: TextSize) -> &Font {
        match size {
            TextSize::Large => &self.large,
            TextSize::Small => &self.small,
        }
    }

    /// Height of one line at `size`: ascent plus descent.
    pub fn line_height(&self, size: TextSize) -> f32 {
        let (_, metrics) = self.font(size).metrics();
        metrics.descent - metrics.ascent
    }

    /// `(advance width, line height)` of `text`.
    pub fn measure(&self, text: &str, size: TextSize) -> (f32, f32) {
        let (advance, _) = self.font(size).measure_str(text, None);
        (advance, self.line_height(size))
    }
}
