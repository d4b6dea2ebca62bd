// Long-lived service handed to the screens
use anyhow::Result;
use log::{debug, error, info};
use std::sync::Arc;

use crate::core::categories::{default_catalog, Category, CategoryRegistry};
use crate::core::clock::{Clock, SystemClock};
use crate::core::context::RequestContext;
use crate::core::error::{GatewayError, GatewayResult};
use crate::core::gateway::{FeedGateway, FeedKind};
use crate::core::request::{PexelsApi, PexelsClient};
use crate::core::storage::Config;
use crate::core::wallpaper::{Wallpaper, WallpaperPage};

/// Everything the screens need from the data layer.
///
/// Every method here degrades a failure to an empty page (or `None`) after
/// logging it, so the screens only ever see a valid data shape. Callers that
/// need to tell "empty" from "failed" go through [`WallpaperService::gateway`].
pub struct WallpaperService {
    gateway: FeedGateway,
    registry: CategoryRegistry,
}

impl WallpaperService {
    pub fn new(config: &Config) -> Result<Self> {
        let api = Arc::new(PexelsClient::new(config)?);
        Ok(Self::with_api(api, Arc::new(SystemClock), config))
    }

    pub fn with_api(api: Arc<dyn PexelsApi>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        let catalog = Arc::new(default_catalog());
        info!("WallpaperService: {} categories, page size {}", catalog.len(), config.per_page);
        Self {
            gateway: FeedGateway::new(Arc::clone(&api), Arc::clone(&clock), Arc::clone(&catalog), config),
            registry: CategoryRegistry::new(api, clock, catalog, config),
        }
    }

    pub fn gateway(&self) -> &FeedGateway {
        &self.gateway
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub async fn curated_photos(&self, page: u32) -> WallpaperPage {
        self.feed(&FeedKind::Popular, page, &RequestContext::new()).await
    }

    pub async fn new_photos(&self, page: u32) -> WallpaperPage {
        self.feed(&FeedKind::New, page, &RequestContext::new()).await
    }

    pub async fn trending_photos(&self, page: u32) -> WallpaperPage {
        self.feed(&FeedKind::Trending, page, &RequestContext::new()).await
    }

    pub async fn random_photos(&self, page: u32) -> WallpaperPage {
        self.feed(&FeedKind::Random, page, &RequestContext::new()).await
    }

    pub async fn photos_by_category(&self, category_id: &str, page: u32) -> WallpaperPage {
        let kind = FeedKind::Category(category_id.to_string());
        self.feed(&kind, page, &RequestContext::new()).await
    }

    pub async fn search_photos(&self, query: &str, page: u32) -> WallpaperPage {
        let kind = FeedKind::Search(query.to_string());
        self.feed(&kind, page, &RequestContext::new()).await
    }

    pub async fn feed(&self, kind: &FeedKind, page: u32, ctx: &RequestContext) -> WallpaperPage {
        let result = self.gateway.fetch(kind, page, ctx).await;
        degrade(kind, result)
    }

    /// Pull-to-refresh for `kind`: page 1, fresh from upstream.
    pub async fn refresh(&self, kind: &FeedKind, ctx: &RequestContext) -> WallpaperPage {
        let result = self.gateway.refresh(kind, ctx).await;
        degrade(kind, result)
    }

    pub async fn photo_by_id(&self, wallpaper_id: &str, ctx: &RequestContext) -> Option<Wallpaper> {
        match self.gateway.photo(wallpaper_id, ctx).await {
            Ok(found) => found,
            Err(GatewayError::Cancelled) => {
                debug!("photo_by_id: lookup of {} cancelled", wallpaper_id);
                None
            }
            Err(e) => {
                error!("photo_by_id: failed to load {}: {}", wallpaper_id, e);
                None
            }
        }
    }

    pub async fn categories(&self) -> Vec<Category> {
        self.registry.list_categories().await
    }

    pub async fn category(&self, category_id: &str) -> Option<Category> {
        self.registry.get_category(category_id).await
    }

    /// Drops every cached feed page. Category covers keep their own 24h cache.
    pub fn clear_cache(&self) {
        self.gateway.clear_cache();
    }
}

fn degrade(kind: &FeedKind, result: GatewayResult<WallpaperPage>) -> WallpaperPage {
    match result {
        Ok(page) => page,
        Err(GatewayError::Cancelled) => {
            debug!("feed {}: request cancelled", kind);
            WallpaperPage::empty()
        }
        Err(e) => {
            error!("feed {}: failed to load photos: {}", kind, e);
            WallpaperPage::empty()
        }
    }
}
