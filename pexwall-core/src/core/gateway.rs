use chrono::{DateTime, Datelike, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::core::cache::{CacheKey, TtlCache};
use crate::core::categories::Category;
use crate::core::clock::Clock;
use crate::core::context::{with_timeout, RequestContext};
use crate::core::error::{GatewayError, GatewayResult};
use crate::core::request::{PexelsApi, PexelsPhotosResponse, PhotoRequest};
use crate::core::storage::Config;
use crate::core::wallpaper::{photo_id_from_wallpaper_id, Wallpaper, WallpaperPage};

/// Pexels has no "newest" listing; a broad search is the closest thing.
pub const NEW_TERM: &str = "wallpaper";

pub const TRENDING_TERMS: [&str; 8] = [
    "nature",
    "abstract",
    "travel",
    "minimal",
    "technology",
    "architecture",
    "city",
    "landscape",
];

pub const RANDOM_TERMS: [&str; 10] = [
    "colorful", "pattern", "space", "vintage", "art", "beach", "mountain", "flowers", "sunset", "forest",
];

/// Same term all day (UTC), next one tomorrow.
pub fn trending_term(now: DateTime<Utc>) -> &'static str {
    TRENDING_TERMS[now.ordinal() as usize % TRENDING_TERMS.len()]
}

pub fn random_term<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    RANDOM_TERMS.choose(rng).copied().unwrap_or(RANDOM_TERMS[0])
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeedKind {
    /// Pexels curated listing.
    Popular,
    New,
    Trending,
    Random,
    /// Catalog category, by id.
    Category(String),
    /// Free-text search.
    Search(String),
}

impl FeedKind {
    pub fn cache_key(&self) -> String {
        match self {
            FeedKind::Popular => "popular".to_string(),
            FeedKind::New => "new".to_string(),
            FeedKind::Trending => "trending".to_string(),
            FeedKind::Random => "random".to_string(),
            FeedKind::Category(id) => format!("category-{}", id),
            FeedKind::Search(query) => format!("search-{}", query.trim().to_lowercase()),
        }
    }

    /// Value stamped into `Wallpaper::category` for results of this feed.
    pub fn tag(&self) -> String {
        match self {
            FeedKind::Category(id) => id.clone(),
            FeedKind::Search(query) => query.trim().to_lowercase(),
            _ => self.cache_key(),
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_key())
    }
}

impl FromStr for FeedKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popular" => Ok(FeedKind::Popular),
            "new" => Ok(FeedKind::New),
            "trending" => Ok(FeedKind::Trending),
            "random" => Ok(FeedKind::Random),
            _ => {
                if let Some(id) = s.strip_prefix("category-").filter(|id| !id.is_empty()) {
                    Ok(FeedKind::Category(id.to_string()))
                } else if let Some(query) = s.strip_prefix("search-").filter(|q| !q.trim().is_empty()) {
                    Ok(FeedKind::Search(query.to_string()))
                } else {
                    Err(GatewayError::InvalidRequest(format!("unknown feed kind '{}'", s)))
                }
            }
        }
    }
}

pub fn normalize_page(response: &PexelsPhotosResponse, page: u32, tag: Option<&str>) -> WallpaperPage {
    WallpaperPage {
        wallpapers: response
            .photos
            .iter()
            .map(|photo| Wallpaper::from_photo(photo, tag))
            .collect(),
        total_results: response.total_results,
        // u32::MAX has no successor to point at
        next_page: if response.has_next_page() { page.checked_add(1) } else { None },
    }
}

type SharedFetch = Shared<BoxFuture<'static, GatewayResult<WallpaperPage>>>;

/// An upstream call in progress and the number of callers awaiting it.
struct Flight {
    fetch: SharedFetch,
    waiters: usize,
}

type FlightTable = Mutex<HashMap<CacheKey, Flight>>;

fn lock_flights(table: &FlightTable) -> MutexGuard<'_, HashMap<CacheKey, Flight>> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One caller's stake in a flight. Dropping it releases the stake; the flight
/// leaves the table once it has finished or nobody is waiting any more, and
/// dropping the last handle on an unfinished flight drops the upstream call.
struct FlightWaiter<'a> {
    table: &'a FlightTable,
    slot: CacheKey,
    fetch: SharedFetch,
    finished: bool,
}

impl Drop for FlightWaiter<'_> {
    fn drop(&mut self) {
        let mut flights = lock_flights(self.table);
        let Some(flight) = flights.get_mut(&self.slot) else {
            return;
        };
        if !flight.fetch.ptr_eq(&self.fetch) {
            return;
        }
        flight.waiters = flight.waiters.saturating_sub(1);
        if self.finished || flight.waiters == 0 {
            flights.remove(&self.slot);
        }
    }
}

/// Turns `(feed kind, page)` into an upstream query, consulting the feed
/// cache first and coalescing concurrent misses on the same slot.
pub struct FeedGateway {
    api: Arc<dyn PexelsApi>,
    cache: Arc<TtlCache<WallpaperPage>>,
    clock: Arc<dyn Clock>,
    catalog: Arc<Vec<Category>>,
    per_page: u32,
    timeout: Duration,
    in_flight: FlightTable,
}

impl FeedGateway {
    pub fn new(
        api: Arc<dyn PexelsApi>,
        clock: Arc<dyn Clock>,
        catalog: Arc<Vec<Category>>,
        config: &Config,
    ) -> Self {
        Self {
            api,
            cache: Arc::new(TtlCache::new(config.feed_ttl, Arc::clone(&clock))),
            clock,
            catalog,
            per_page: config.per_page,
            timeout: config.request_timeout,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &TtlCache<WallpaperPage> {
        &self.cache
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// One page of `kind`. Pages start at 1; 0 is read as 1.
    pub async fn fetch(&self, kind: &FeedKind, page: u32, ctx: &RequestContext) -> GatewayResult<WallpaperPage> {
        let page = page.max(1);
        let key = kind.cache_key();
        if let Some(entry) = self.cache.get(&key, page) {
            return Ok(entry.value);
        }
        self.fetch_upstream(kind, key, page, ctx).await
    }

    /// Pull-to-refresh: refetch page 1 regardless of the cache, then store it.
    pub async fn refresh(&self, kind: &FeedKind, ctx: &RequestContext) -> GatewayResult<WallpaperPage> {
        self.fetch_upstream(kind, kind.cache_key(), 1, ctx).await
    }

    /// Single photo by wallpaper id (`pexels-<n>`). `Ok(None)` when the id is
    /// not one of ours or the upstream does not know the photo.
    pub async fn photo(&self, wallpaper_id: &str, ctx: &RequestContext) -> GatewayResult<Option<Wallpaper>> {
        let Some(photo_id) = photo_id_from_wallpaper_id(wallpaper_id) else {
            debug!("photo: '{}' is not a Pexels wallpaper id", wallpaper_id);
            return Ok(None);
        };

        let key = format!("photo-{}", photo_id);
        if let Some(entry) = self.cache.get(&key, 1) {
            if let Some(wallpaper) = entry.value.wallpapers.into_iter().next() {
                return Ok(Some(wallpaper));
            }
        }

        let api = Arc::clone(&self.api);
        let cache = Arc::clone(&self.cache);
        let timeout = self.timeout;
        let cache_key = key.clone();
        let lookup = async move {
            info!("photo: fetching Pexels photo {}", photo_id);
            match with_timeout(timeout, api.photo(photo_id)).await {
                Ok(photo) => {
                    let page = WallpaperPage {
                        wallpapers: vec![Wallpaper::from_photo(&photo, None)],
                        total_results: 1,
                        next_page: None,
                    };
                    cache.put(&cache_key, 1, page.clone());
                    Ok(page)
                }
                // not-found is an answer, but not one worth caching
                Err(e) if e.is_not_found() => Ok(WallpaperPage::empty()),
                Err(e) => Err(e),
            }
        }
        .boxed();

        let page = self.join_or_start(key, 1, ctx, lookup).await?;
        Ok(page.wallpapers.into_iter().next())
    }

    /// The concrete upstream request for `kind`/`page`. Random picks a new
    /// term on every call; trending depends only on the current UTC day.
    pub fn resolve_request(&self, kind: &FeedKind, page: u32) -> GatewayResult<PhotoRequest> {
        let per_page = self.per_page;
        let request = match kind {
            FeedKind::Popular => PhotoRequest::Curated { page, per_page },
            FeedKind::New => PhotoRequest::search(NEW_TERM, page, per_page),
            FeedKind::Trending => PhotoRequest::search(trending_term(self.clock.now()), page, per_page),
            FeedKind::Random => PhotoRequest::search(random_term(&mut rand::thread_rng()), page, per_page),
            FeedKind::Category(id) => {
                let category = self
                    .catalog
                    .iter()
                    .find(|category| &category.id == id)
                    .ok_or_else(|| GatewayError::UnknownCategory(id.clone()))?;
                PhotoRequest::search(category.query.clone(), page, per_page)
            }
            FeedKind::Search(query) => {
                let query = query.trim();
                if query.is_empty() {
                    return Err(GatewayError::InvalidRequest("empty search query".to_string()));
                }
                PhotoRequest::search(query, page, per_page)
            }
        };
        Ok(request)
    }

    async fn fetch_upstream(
        &self,
        kind: &FeedKind,
        key: String,
        page: u32,
        ctx: &RequestContext,
    ) -> GatewayResult<WallpaperPage> {
        let request = self.resolve_request(kind, page)?;
        let api = Arc::clone(&self.api);
        let cache = Arc::clone(&self.cache);
        let timeout = self.timeout;
        let tag = kind.tag();
        let cache_key = key.clone();

        let work = async move {
            info!("fetch: {} page {} via {}", cache_key, page, request.path());
            let response = with_timeout(timeout, api.photos(&request)).await?;
            let result = normalize_page(&response, page, Some(&tag));
            cache.put(&cache_key, page, result.clone());
            debug!(
                "fetch: {} page {} -> {} wallpapers of {}",
                cache_key,
                page,
                result.wallpapers.len(),
                result.total_results
            );
            Ok(result)
        }
        .boxed();

        self.join_or_start(key, page, ctx, work).await
    }

    async fn join_or_start(
        &self,
        key: String,
        page: u32,
        ctx: &RequestContext,
        work: BoxFuture<'static, GatewayResult<WallpaperPage>>,
    ) -> GatewayResult<WallpaperPage> {
        if ctx.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }

        let slot = (key, page);
        let mut waiter = {
            let mut flights = lock_flights(&self.in_flight);
            let flight = flights.entry(slot.clone()).or_insert_with(|| Flight {
                fetch: work.shared(),
                waiters: 0,
            });
            if flight.waiters > 0 {
                debug!("fetch: joining in-flight request for {} page {}", slot.0, slot.1);
            }
            flight.waiters += 1;
            FlightWaiter {
                table: &self.in_flight,
                fetch: flight.fetch.clone(),
                slot,
                finished: false,
            }
        };

        let result = ctx.run(waiter.fetch.clone()).await;
        // A cancelled caller only gives up its own stake in the flight
        waiter.finished = result != Err(GatewayError::Cancelled);
        result
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        lock_flights(&self.in_flight).len()
    }
}
