use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::error::{GatewayError, GatewayResult};
use crate::core::storage::Config;

// Data structures for the Pexels API

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSrc {
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub large2x: String,
    #[serde(default)]
    pub large: String,
    #[serde(default)]
    pub medium: String,
    #[serde(default)]
    pub small: String,
    #[serde(default)]
    pub portrait: String,
    #[serde(default)]
    pub landscape: String,
    #[serde(default)]
    pub tiny: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PexelsPhoto {
    pub id: u64,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub photographer: String,
    #[serde(default)]
    pub photographer_url: String,
    #[serde(default)]
    pub photographer_id: u64,
    #[serde(default)]
    pub avg_color: Option<String>,
    #[serde(default)]
    pub src: PhotoSrc,
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PexelsPhotosResponse {
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub photos: Vec<PexelsPhoto>,
    /// Absolute URL of the next page; absent (or null) on the last page.
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub prev_page: Option<String>,
}

impl PexelsPhotosResponse {
    pub fn has_next_page(&self) -> bool {
        self.next_page.as_deref().map_or(false, |next| !next.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
        }
    }
}

/// A paged listing request against the Pexels API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoRequest {
    Curated {
        page: u32,
        per_page: u32,
    },
    Search {
        query: String,
        page: u32,
        per_page: u32,
        orientation: Option<Orientation>,
    },
}

impl PhotoRequest {
    pub fn search(query: impl Into<String>, page: u32, per_page: u32) -> Self {
        PhotoRequest::Search {
            query: query.into(),
            page,
            per_page,
            orientation: None,
        }
    }

    pub fn page(&self) -> u32 {
        match self {
            PhotoRequest::Curated { page, .. } | PhotoRequest::Search { page, .. } => *page,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            PhotoRequest::Curated { .. } => "/curated",
            PhotoRequest::Search { .. } => "/search",
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            PhotoRequest::Curated { page, per_page } => vec![
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ],
            PhotoRequest::Search { query, page, per_page, orientation } => {
                let mut pairs = vec![
                    ("query", query.clone()),
                    ("page", page.to_string()),
                    ("per_page", per_page.to_string()),
                ];
                if let Some(orientation) = orientation {
                    pairs.push(("orientation", orientation.as_str().to_string()));
                }
                pairs
            }
        }
    }

    pub fn url(&self, base_url: &str) -> GatewayResult<Url> {
        let endpoint = format!("{}{}", base_url.trim_end_matches('/'), self.path());
        Url::parse_with_params(&endpoint, self.query_pairs())
            .map_err(|e| GatewayError::InvalidRequest(format!("{}: {}", endpoint, e)))
    }
}

/// The upstream photo service. `PexelsClient` talks HTTP; tests swap in fakes.
#[async_trait]
pub trait PexelsApi: Send + Sync {
    async fn photos(&self, request: &PhotoRequest) -> GatewayResult<PexelsPhotosResponse>;

    async fn photo(&self, id: u64) -> GatewayResult<PexelsPhoto>;
}

pub struct PexelsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl PexelsClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("pexwall/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_http_client(http, config))
    }

    fn with_http_client(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout: config.request_timeout,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> GatewayResult<T> {
        let endpoint = url.path().to_string();
        info!("get_json: GET {}", url);

        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, &self.api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Http { status: status.as_u16(), endpoint });
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        debug!("get_json: {} answered with {} bytes", endpoint, body.len());
        serde_json::from_str(&body).map_err(|e| GatewayError::Decode(format!("{}: {}", endpoint, e)))
    }

    fn transport_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout(self.timeout)
        } else {
            GatewayError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl PexelsApi for PexelsClient {
    async fn photos(&self, request: &PhotoRequest) -> GatewayResult<PexelsPhotosResponse> {
        let url = request.url(&self.base_url)?;
        self.get_json(url).await
    }

    async fn photo(&self, id: u64) -> GatewayResult<PexelsPhoto> {
        let endpoint = format!("{}/photos/{}", self.base_url, id);
        let url = Url::parse(&endpoint)
            .map_err(|e| GatewayError::InvalidRequest(format!("{}: {}", endpoint, e)))?;
        self.get_json(url).await
    }
}
