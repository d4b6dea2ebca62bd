//! Photo cache and fetch gateway over the Pexels API.
//!
//! UI callers hold one [`WallpaperService`]; it owns the feed cache, the
//! category registry and the upstream client.

// Module declarations
pub mod core;
pub mod services;

// Public API re-exports from core::exports
pub use crate::core::exports::{
    default_catalog,
    trending_term,
    CacheEntry,
    CancelHandle,
    Category,
    CategoryRegistry,
    Clock,
    Config,
    FeedGateway,
    FeedKind,
    GatewayError,
    GatewayResult,
    ManualClock,
    Orientation,
    PexelsApi,
    PexelsClient,
    PexelsPhoto,
    PexelsPhotosResponse,
    PhotoRequest,
    PhotoSrc,
    RequestContext,
    SystemClock,
    TtlCache,
    Wallpaper,
    WallpaperPage,
    NEW_TERM,
    RANDOM_TERMS,
    TRENDING_TERMS,
    WALLPAPER_ID_PREFIX,
};

pub use crate::services::WallpaperService;
