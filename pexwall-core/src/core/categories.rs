use futures::future::join_all;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::core::cache::TtlCache;
use crate::core::clock::Clock;
use crate::core::context::with_timeout;
use crate::core::request::{Orientation, PexelsApi, PhotoRequest};
use crate::core::storage::Config;

pub const CATEGORIES_CACHE_KEY: &str = "categories";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Search terms sent upstream for this category.
    pub query: String,
    pub description: Option<String>,
    /// Cover image; empty until the registry resolves it.
    pub image_url: String,
}

impl Category {
    pub fn new(id: &str, name: &str, query: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            query: query.to_string(),
            description: Some(description.to_string()),
            image_url: String::new(),
        }
    }

    pub fn has_cover(&self) -> bool {
        !self.image_url.is_empty()
    }
}

/// The hand-authored category set. Never grows or shrinks at runtime.
pub fn default_catalog() -> Vec<Category> {
    vec![
        Category::new("nature", "Nature", "nature landscape", "Mountains, seas, forests and more"),
        Category::new("abstract", "Abstract", "abstract pattern", "Creative and abstract patterns"),
        Category::new("animals", "Animals", "animals wildlife", "Wildlife and cute animals"),
        Category::new("dark", "Dark", "dark moody", "Dark and mysterious wallpapers"),
        Category::new("minimal", "Minimal", "minimal simple", "Clean and minimal designs"),
        Category::new("space", "Space", "space galaxy", "Galaxies, stars and planets"),
        Category::new("architecture", "Architecture", "architecture building", "Impressive buildings and structures"),
        Category::new("city", "City", "city urban", "Cityscapes and streets"),
        Category::new("food", "Food", "food", "Delicious and tempting food"),
        Category::new("sport", "Sport", "sport", "Every kind of sporting activity"),
        Category::new("technology", "Technology", "technology", "Modern technology and gadgets"),
        Category::new("travel", "Travel", "travel destination", "Great travel routes and views"),
    ]
}

/// Serves the category catalog with cover images filled in.
///
/// Covers are looked up once per TTL window (24h by default). One failed
/// lookup only costs that category its cover: it gets the placeholder image
/// and the listing still succeeds.
pub struct CategoryRegistry {
    api: Arc<dyn PexelsApi>,
    catalog: Arc<Vec<Category>>,
    cache: TtlCache<Vec<Category>>,
    refresh_lock: tokio::sync::Mutex<()>,
    placeholder_image_url: String,
    timeout: Duration,
}

impl CategoryRegistry {
    pub fn new(
        api: Arc<dyn PexelsApi>,
        clock: Arc<dyn Clock>,
        catalog: Arc<Vec<Category>>,
        config: &Config,
    ) -> Self {
        Self {
            api,
            catalog,
            cache: TtlCache::new(config.category_ttl, clock),
            refresh_lock: tokio::sync::Mutex::new(()),
            placeholder_image_url: config.placeholder_image_url.clone(),
            timeout: config.request_timeout,
        }
    }

    /// Category definitions without covers. Never touches the network.
    pub fn catalog(&self) -> &[Category] {
        &self.catalog
    }

    pub fn definition(&self, id: &str) -> Option<&Category> {
        self.catalog.iter().find(|category| category.id == id)
    }

    pub async fn list_categories(&self) -> Vec<Category> {
        if let Some(entry) = self.cache.get(CATEGORIES_CACHE_KEY, 1) {
            return entry.value;
        }

        let _guard = self.refresh_lock.lock().await;
        // Someone else may have resolved the covers while we waited
        if let Some(entry) = self.cache.get(CATEGORIES_CACHE_KEY, 1) {
            return entry.value;
        }

        info!("list_categories: resolving covers for {} categories", self.catalog.len());
        let resolved = join_all(self.catalog.iter().cloned().map(|mut category| async move {
            if !category.has_cover() {
                category.image_url = self.resolve_cover(&category).await;
            }
            category
        }))
        .await;

        self.cache.put(CATEGORIES_CACHE_KEY, 1, resolved.clone());
        resolved
    }

    /// Looks `id` up in the resolved listing; never a separate upstream call.
    pub async fn get_category(&self, id: &str) -> Option<Category> {
        self.list_categories()
            .await
            .into_iter()
            .find(|category| category.id == id)
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    async fn resolve_cover(&self, category: &Category) -> String {
        let request = PhotoRequest::Search {
            query: category.query.clone(),
            page: 1,
            per_page: 1,
            orientation: Some(Orientation::Portrait),
        };

        match with_timeout(self.timeout, self.api.photos(&request)).await {
            Ok(response) => match response.photos.first() {
                Some(photo) if !photo.src.portrait.is_empty() => photo.src.portrait.clone(),
                _ => {
                    warn!("resolve_cover: no photo found for '{}', using placeholder", category.query);
                    self.placeholder_image_url.clone()
                }
            },
            Err(e) => {
                warn!("resolve_cover: photo search for '{}' failed: {}", category.query, e);
                self.placeholder_image_url.clone()
            }
        }
    }
}
