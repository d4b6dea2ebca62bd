use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use pexwall_core::{
    default_catalog, Config, FeedKind, GatewayError, GatewayResult, ManualClock, PexelsApi, PexelsPhoto,
    PexelsPhotosResponse, PhotoRequest, RequestContext, WallpaperService,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const PLACEHOLDER: &str = "https://picsum.photos/500/900";

/// Upstream that answers from a closure and counts calls.
struct ScriptedApi {
    calls: AtomicUsize,
    requests: Mutex<Vec<PhotoRequest>>,
    script: Box<dyn Fn(&PhotoRequest) -> GatewayResult<PexelsPhotosResponse> + Send + Sync>,
}

impl ScriptedApi {
    fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(&PhotoRequest) -> GatewayResult<PexelsPhotosResponse> + Send + Sync + 'static,
    {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            script: Box::new(script),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PexelsApi for ScriptedApi {
    async fn photos(&self, request: &PhotoRequest) -> GatewayResult<PexelsPhotosResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        (self.script)(request)
    }

    async fn photo(&self, id: u64) -> GatewayResult<PexelsPhoto> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(sample_photo(id))
    }
}

fn sample_photo(id: u64) -> PexelsPhoto {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "url": format!("https://www.pexels.com/photo/{}/", id),
        "photographer": "Kasper",
        "photographer_url": "https://www.pexels.com/@kasper",
        "src": {
            "original": format!("https://images.pexels.com/photos/{}/original.jpeg", id),
            "portrait": format!("https://images.pexels.com/photos/{}/portrait.jpeg", id)
        },
        "alt": ""
    }))
    .unwrap()
}

fn page_of(ids: &[u64], total: u64, next: bool) -> PexelsPhotosResponse {
    PexelsPhotosResponse {
        total_results: total,
        page: 1,
        per_page: 20,
        photos: ids.iter().map(|id| sample_photo(*id)).collect(),
        next_page: next.then(|| "https://api.pexels.com/v1/search/?page=2".to_string()),
        prev_page: None,
    }
}

fn service(api: Arc<ScriptedApi>) -> (Arc<ManualClock>, WallpaperService) {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 7, 14, 6, 30, 0).unwrap()));
    let service = WallpaperService::with_api(api, clock.clone(), &Config::with_api_key("integration"));
    (clock, service)
}

#[tokio::test]
async fn category_feed_pagination_scenario() {
    let api = ScriptedApi::new(|request| match request.page() {
        1 => Ok(page_of(&[1, 2], 40, true)),
        _ => Ok(page_of(&[3], 40, false)),
    });
    let (_clock, service) = service(api.clone());

    let first = service.photos_by_category("nature", 1).await;
    assert_eq!(first.total_results, 40);
    assert_eq!(first.next_page, Some(2));
    assert_eq!(first.wallpapers[0].title, "Photo by Kasper");

    let second = service.photos_by_category("nature", 2).await;
    assert_eq!(second.next_page, None);
    assert_eq!(api.calls(), 2);

    let sent = api.requests.lock().unwrap().clone();
    assert_eq!(sent[0], PhotoRequest::search("nature landscape", 1, 20));
}

#[tokio::test]
async fn cached_page_is_identical_until_ttl_expires() {
    let api = ScriptedApi::new(|_| Ok(page_of(&[10, 11, 12], 3, false)));
    let (clock, service) = service(api.clone());

    let first = service.trending_photos(1).await;
    clock.advance(Duration::minutes(29));
    let second = service.trending_photos(1).await;
    assert_eq!(first, second);
    assert_eq!(api.calls(), 1);

    clock.advance(Duration::minutes(1));
    let third = service.trending_photos(1).await;
    assert_eq!(api.calls(), 2);
    let ids = |page: &pexwall_core::WallpaperPage| page.wallpapers.iter().map(|w| w.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&first), ids(&third));
}

#[tokio::test]
async fn trending_term_rolls_over_at_midnight_utc() {
    let api = ScriptedApi::new(|_| Ok(page_of(&[1], 1, false)));
    let (clock, service) = service(api.clone());

    // 2025-07-14 is day 195 (index 3), 2025-07-15 is day 196 (index 4)
    clock.set(Utc.with_ymd_and_hms(2025, 7, 14, 23, 59, 59).unwrap());
    service.trending_photos(1).await;
    clock.set(Utc.with_ymd_and_hms(2025, 7, 15, 0, 0, 0).unwrap());
    service.clear_cache();
    service.trending_photos(1).await;

    let queries: Vec<String> = api
        .requests
        .lock()
        .unwrap()
        .iter()
        .filter_map(|request| match request {
            PhotoRequest::Search { query, .. } => Some(query.clone()),
            PhotoRequest::Curated { .. } => None,
        })
        .collect();
    assert_eq!(queries, vec!["minimal", "technology"]);
}

#[tokio::test]
async fn network_failure_never_escapes_the_service() {
    let api = ScriptedApi::new(|_| Err(GatewayError::Transport("dns error".to_string())));
    let (_clock, service) = service(api);

    for kind in [FeedKind::Popular, FeedKind::New, FeedKind::Trending, FeedKind::Random] {
        let page = service.feed(&kind, 1, &RequestContext::new()).await;
        assert!(page.wallpapers.is_empty());
        assert_eq!(page.total_results, 0);
        assert_eq!(page.next_page, None);
    }
}

#[tokio::test]
async fn typed_errors_are_available_through_the_gateway() {
    let api = ScriptedApi::new(|_| {
        Err(GatewayError::Http { status: 500, endpoint: "/v1/curated".to_string() })
    });
    let (_clock, service) = service(api);

    let result = service.gateway().fetch(&FeedKind::Popular, 1, &RequestContext::new()).await;
    assert_eq!(result, Err(GatewayError::Http { status: 500, endpoint: "/v1/curated".to_string() }));
}

#[tokio::test]
async fn one_failing_cover_keeps_the_registry_whole() {
    let api = ScriptedApi::new(|request| match request {
        PhotoRequest::Search { query, .. } if query == "food" => {
            Err(GatewayError::Transport("reset by peer".to_string()))
        }
        _ => Ok(page_of(&[99], 1, false)),
    });
    let (_clock, service) = service(api.clone());

    let categories = service.categories().await;
    assert_eq!(categories.len(), default_catalog().len());
    assert_eq!(categories.len(), 12);

    let food = categories.iter().find(|c| c.id == "food").unwrap();
    assert_eq!(food.image_url, PLACEHOLDER);
    let others_ok = categories
        .iter()
        .filter(|c| c.id != "food")
        .all(|c| c.image_url == "https://images.pexels.com/photos/99/portrait.jpeg");
    assert!(others_ok);

    let travel = service.category("travel").await.unwrap();
    assert_eq!(travel.query, "travel destination");
    assert!(service.category("nope").await.is_none());
    assert_eq!(api.calls(), 12);
}

#[tokio::test]
async fn photo_lookup_round_trips_the_id() {
    let api = ScriptedApi::new(|_| Ok(page_of(&[], 0, false)));
    let (_clock, service) = service(api.clone());

    let wallpaper = service.photo_by_id("pexels-31337", &RequestContext::new()).await.unwrap();
    assert_eq!(wallpaper.id, "pexels-31337");
    assert_eq!(wallpaper.image_url, "https://images.pexels.com/photos/31337/portrait.jpeg");

    service.photo_by_id("pexels-31337", &RequestContext::new()).await.unwrap();
    assert_eq!(api.calls(), 1);
}
