// Public API exports for pexwall-core

pub use crate::core::storage::Config;

pub use crate::core::cache::{CacheEntry, TtlCache};

pub use crate::core::categories::{default_catalog, Category, CategoryRegistry};

pub use crate::core::clock::{Clock, ManualClock, SystemClock};

pub use crate::core::context::{CancelHandle, RequestContext};

pub use crate::core::error::{GatewayError, GatewayResult};

pub use crate::core::gateway::{
    trending_term,
    FeedGateway,
    FeedKind,
    NEW_TERM,
    RANDOM_TERMS,
    TRENDING_TERMS,
};

pub use crate::core::request::{
    Orientation,
    PexelsApi,
    PexelsClient,
    PexelsPhoto,
    PexelsPhotosResponse,
    PhotoRequest,
    PhotoSrc,
};

pub use crate::core::wallpaper::{Wallpaper, WallpaperPage, WALLPAPER_ID_PREFIX};
