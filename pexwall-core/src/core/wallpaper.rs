use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::request::PexelsPhoto;

/// Prefix that turns a Pexels photo id into a wallpaper id.
pub const WALLPAPER_ID_PREFIX: &str = "pexels-";

pub const MAX_SYNTHETIC_LIKES: u32 = 10_000;
pub const MAX_SYNTHETIC_DOWNLOADS: u32 = 50_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallpaper {
    pub id: String,
    pub title: String,
    /// Portrait rendition; the screens always lay images out full-bleed vertical.
    pub image_url: String,
    pub photographer: String,
    pub photographer_url: String,
    pub original_url: String,
    pub category: Option<String>,
    /// Cosmetic placeholder. Pexels exposes no engagement metrics, so this is
    /// a random draw made at normalization time, not a measured value.
    pub likes: Option<u32>,
    /// Cosmetic placeholder, see `likes`.
    pub downloads: Option<u32>,
}

impl Wallpaper {
    pub fn from_photo(photo: &PexelsPhoto, category: Option<&str>) -> Self {
        Self::from_photo_with_rng(photo, category, &mut rand::thread_rng())
    }

    pub fn from_photo_with_rng<R: Rng + ?Sized>(
        photo: &PexelsPhoto,
        category: Option<&str>,
        rng: &mut R,
    ) -> Self {
        let title = match photo.alt.as_deref().map(str::trim) {
            Some(alt) if !alt.is_empty() => alt.to_string(),
            _ => format!("Photo by {}", photo.photographer),
        };

        Self {
            id: wallpaper_id(photo.id),
            title,
            image_url: photo.src.portrait.clone(),
            photographer: photo.photographer.clone(),
            photographer_url: photo.photographer_url.clone(),
            original_url: photo.url.clone(),
            category: category.map(str::to_string),
            likes: Some(rng.gen_range(0..MAX_SYNTHETIC_LIKES)),
            downloads: Some(rng.gen_range(0..MAX_SYNTHETIC_DOWNLOADS)),
        }
    }
}

pub fn wallpaper_id(photo_id: u64) -> String {
    format!("{}{}", WALLPAPER_ID_PREFIX, photo_id)
}

/// Reverses `wallpaper_id`. Returns `None` for ids we could not have produced,
/// including non-canonical spellings such as `pexels-+12` or `pexels-012`.
pub fn photo_id_from_wallpaper_id(id: &str) -> Option<u64> {
    let tail = id.strip_prefix(WALLPAPER_ID_PREFIX)?;
    let photo_id: u64 = tail.parse().ok()?;
    (tail == photo_id.to_string()).then_some(photo_id)
}

/// One page of a feed, as handed to the screens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WallpaperPage {
    pub wallpapers: Vec<Wallpaper>,
    pub total_results: u64,
    /// Page number to request next; the gateway never follows it on its own.
    pub next_page: Option<u32>,
}

impl WallpaperPage {
    /// The degraded shape returned when a fetch fails. "Empty" here means
    /// "unknown", not "no more data".
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.wallpapers.is_empty()
    }
}
