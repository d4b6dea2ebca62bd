use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.pexels.com/v1";
pub const DEFAULT_PER_PAGE: u32 = 20;
/// Pexels refuses anything above this.
pub const MAX_PER_PAGE: u32 = 80;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_FEED_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_CATEGORY_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_PLACEHOLDER_IMAGE_URL: &str = "https://picsum.photos/500/900";

pub const API_KEY_VAR: &str = "PEXELS_API_KEY";
pub const BASE_URL_VAR: &str = "PEXELS_BASE_URL";
pub const PER_PAGE_VAR: &str = "PEXWALL_PER_PAGE";
pub const TIMEOUT_VAR: &str = "PEXWALL_TIMEOUT_SECS";

#[derive(Debug, Clone)]
pub struct Config {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub api_key: String,
    pub base_url: String,
    pub per_page: u32,
    pub request_timeout: Duration,
    pub feed_ttl: Duration,
    pub category_ttl: Duration,
    pub placeholder_image_url: String,
}

/// On-disk overrides, `<config_dir>/config.json`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    api_key: Option<String>,
    base_url: Option<String>,
    per_page: Option<u32>,
    request_timeout_secs: Option<u64>,
    feed_ttl_secs: Option<u64>,
    category_ttl_secs: Option<u64>,
    placeholder_image_url: Option<String>,
}

impl Config {
    /// Config with built-in defaults and the given key. No file or env lookup.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            config_dir: PathBuf::new(),
            config_file: PathBuf::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            per_page: DEFAULT_PER_PAGE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            feed_ttl: DEFAULT_FEED_TTL,
            category_ttl: DEFAULT_CATEGORY_TTL,
            placeholder_image_url: DEFAULT_PLACEHOLDER_IMAGE_URL.to_string(),
        }
    }

    /// Load from the platform config dir plus environment, failing fast when
    /// no API key can be found.
    pub fn load() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "pexwall", "pexwall")
            .context("Failed to get project directories")?;
        Self::load_from_dir(proj_dirs.config_dir(), |name| std::env::var(name).ok())
    }

    pub fn load_from_dir<F>(config_dir: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_file = config_dir.join("config.json");
        let settings = read_settings(&config_file)?;

        let mut config = Self::with_api_key(settings.api_key.unwrap_or_default());
        config.config_dir = config_dir.to_path_buf();
        config.config_file = config_file;

        if let Some(base_url) = settings.base_url {
            config.base_url = base_url;
        }
        if let Some(per_page) = settings.per_page {
            config.per_page = per_page;
        }
        if let Some(secs) = settings.request_timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = settings.feed_ttl_secs {
            config.feed_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = settings.category_ttl_secs {
            config.category_ttl = Duration::from_secs(secs);
        }
        if let Some(url) = settings.placeholder_image_url {
            config.placeholder_image_url = url;
        }

        // Environment wins over the file
        if let Some(key) = env(API_KEY_VAR) {
            config.api_key = key;
        }
        if let Some(base_url) = env(BASE_URL_VAR) {
            config.base_url = base_url;
        }
        if let Some(per_page) = env(PER_PAGE_VAR) {
            config.per_page = per_page
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number, got {:?}", PER_PAGE_VAR, per_page))?;
        }
        if let Some(secs) = env(TIMEOUT_VAR) {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of seconds, got {:?}", TIMEOUT_VAR, secs))?;
            config.request_timeout = Duration::from_secs(secs);
        }

        config.per_page = config.per_page.clamp(1, MAX_PER_PAGE);
        config.api_key = config.api_key.trim().to_string();
        if config.api_key.is_empty() {
            bail!(
                "Missing required setting {}: export it or add \"api_key\" to {}",
                API_KEY_VAR,
                config.config_file.display()
            );
        }

        log::info!(
            "Config loaded: base_url={}, per_page={}, timeout={:?}",
            config.base_url,
            config.per_page,
            config.request_timeout
        );
        Ok(config)
    }
}

fn read_settings(config_file: &Path) -> Result<FileSettings> {
    if !config_file.exists() {
        return Ok(FileSettings::default());
    }
    let content = fs::read_to_string(config_file)
        .with_context(|| format!("Failed to read {}", config_file.display()))?;
    if content.trim().is_empty() {
        return Ok(FileSettings::default());
    }
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", config_file.display()))
}
