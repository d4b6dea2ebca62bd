// In-memory stand-in for the Pexels API used by the unit tests.
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::core::error::{GatewayError, GatewayResult};
use crate::core::request::{PexelsApi, PexelsPhoto, PexelsPhotosResponse, PhotoRequest, PhotoSrc};

pub const CURATED: &str = "<curated>";

pub fn photo(id: u64) -> PexelsPhoto {
    PexelsPhoto {
        id,
        width: 2000,
        height: 3000,
        url: format!("https://www.pexels.com/photo/{}/", id),
        photographer: format!("Photographer {}", id),
        photographer_url: format!("https://www.pexels.com/@p{}", id),
        photographer_id: id * 10,
        avg_color: None,
        src: PhotoSrc {
            original: format!("https://images.pexels.com/photos/{}/original.jpeg", id),
            large2x: format!("https://images.pexels.com/photos/{}/large2x.jpeg", id),
            portrait: format!("https://images.pexels.com/photos/{}/portrait.jpeg", id),
            ..PhotoSrc::default()
        },
        liked: false,
        alt: Some(format!("Photo number {}", id)),
    }
}

pub fn response(photos: Vec<PexelsPhoto>, total: u64, has_next: bool) -> PexelsPhotosResponse {
    PexelsPhotosResponse {
        total_results: total,
        page: 1,
        per_page: 20,
        photos,
        next_page: has_next.then(|| "https://api.pexels.com/v1/next".to_string()),
        prev_page: None,
    }
}

#[derive(Default)]
struct FakeState {
    // (query, Some(page)) answers one page, (query, None) answers any page
    listings: HashMap<(String, Option<u32>), GatewayResult<PexelsPhotosResponse>>,
    photos: HashMap<u64, PexelsPhoto>,
    fail_everything: Option<GatewayError>,
    delay: Option<Duration>,
    photo_requests: Vec<PhotoRequest>,
    photo_lookups: Vec<u64>,
}

#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn respond_to_query(&self, query: &str, photos: Vec<PexelsPhoto>, total: u64, has_next: bool) {
        self.state()
            .listings
            .insert((query.to_string(), None), Ok(response(photos, total, has_next)));
    }

    pub fn respond_to_page(&self, query: &str, page: u32, photos: Vec<PexelsPhoto>, total: u64, has_next: bool) {
        self.state()
            .listings
            .insert((query.to_string(), Some(page)), Ok(response(photos, total, has_next)));
    }

    pub fn fail_query(&self, query: &str, error: GatewayError) {
        self.state().listings.insert((query.to_string(), None), Err(error));
    }

    pub fn fail_everything(&self, error: GatewayError) {
        self.state().fail_everything = Some(error);
    }

    pub fn add_photo(&self, photo: PexelsPhoto) {
        self.state().photos.insert(photo.id, photo);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = Some(delay);
    }

    pub fn photo_requests(&self) -> Vec<PhotoRequest> {
        self.state().photo_requests.clone()
    }

    pub fn searched_queries(&self) -> Vec<String> {
        self.photo_requests()
            .into_iter()
            .filter_map(|request| match request {
                PhotoRequest::Search { query, .. } => Some(query),
                PhotoRequest::Curated { .. } => None,
            })
            .collect()
    }

    pub fn photo_lookups(&self) -> Vec<u64> {
        self.state().photo_lookups.clone()
    }

    pub fn call_count(&self) -> usize {
        let state = self.state();
        state.photo_requests.len() + state.photo_lookups.len()
    }

    async fn pause(&self) {
        let delay = self.state().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl PexelsApi for FakeApi {
    async fn photos(&self, request: &PhotoRequest) -> GatewayResult<PexelsPhotosResponse> {
        self.state().photo_requests.push(request.clone());
        self.pause().await;

        let state = self.state();
        if let Some(error) = &state.fail_everything {
            return Err(error.clone());
        }
        let query = match request {
            PhotoRequest::Curated { .. } => CURATED.to_string(),
            PhotoRequest::Search { query, .. } => query.clone(),
        };
        state
            .listings
            .get(&(query.clone(), Some(request.page())))
            .or_else(|| state.listings.get(&(query, None)))
            .cloned()
            .unwrap_or_else(|| Ok(response(Vec::new(), 0, false)))
    }

    async fn photo(&self, id: u64) -> GatewayResult<PexelsPhoto> {
        self.state().photo_lookups.push(id);
        self.pause().await;

        let state = self.state();
        if let Some(error) = &state.fail_everything {
            return Err(error.clone());
        }
        state.photos.get(&id).cloned().ok_or_else(|| GatewayError::Http {
            status: 404,
            endpoint: format!("/v1/photos/{}", id),
        })
    }
}
