// src/motion.rs
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::config::ReviewConfig;
use crate::timeline::Timestamp;

// --- CONSTANTS ---
const MOTION_PATH: &str = "review/activity/motion";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum MotionError {
    #[error("Invalid motion URL: {0}")]
    BadUrl(String),
    #[error("Motion request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Motion endpoint returned status {0}")]
    Status(u16),
}

// --- DATA STRUCTURES ---

/// One motion bucket as the review API reports it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MotionSample {
    pub start_time: Timestamp,
    #[serde(default)]
    pub motion: Option<f64>,
    #[serde(default)]
    pub audio: Option<f64>,
    pub camera: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MotionQuery {
    pub after: Timestamp,
    pub before: Timestamp,
    pub scale: u32,
    pub cameras: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct MotionKey {
    after: u64,
    before: u64,
    scale: u32,
    cameras: String,
}

impl MotionQuery {
    fn key(&self) -> MotionKey {
        MotionKey {
            after: self.after.to_bits(),
            before: self.before.to_bits(),
            scale: self.scale,
            cameras: self.cameras.clone(),
        }
    }
}

// --- LOOKUP ---

pub trait MotionLookup: Send + Sync {
    fn lookup<'a>(
        &'a self,
        query: &'a MotionQuery,
    ) -> BoxFuture<'a, Result<Vec<MotionSample>, MotionError>>;
}

/// Fetches motion activity from the review HTTP API.
#[derive(Clone, Debug)]
pub struct HttpMotionLookup {
    client: Client,
    base_url: String,
}

impl HttpMotionLookup {
    pub fn new(base_url: impl Into<String>) -> Result<Self, MotionError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &ReviewConfig) -> Result<Self, MotionError> {
        Self::new(config.api_base_url.clone())
    }

    pub fn request_url(&self, query: &MotionQuery) -> Result<reqwest::Url, MotionError> {
        let endpoint = format!("{}/{}", self.base_url.trim_end_matches('/'), MOTION_PATH);
        reqwest::Url::parse_with_params(
            &endpoint,
            &[
                ("before", query.before.to_string()),
                ("after", query.after.to_string()),
                ("scale", query.scale.to_string()),
                ("cameras", query.cameras.clone()),
            ],
        )
        .map_err(|e| MotionError::BadUrl(e.to_string()))
    }
}

impl MotionLookup for HttpMotionLookup {
    fn lookup<'a>(
        &'a self,
        query: &'a MotionQuery,
    ) -> BoxFuture<'a, Result<Vec<MotionSample>, MotionError>> {
        async move {
            let url = self.request_url(query)?;
            log::debug!("Fetching motion activity: {}", url);

            let response = self.client.get(url).send().await?;
            if !response.status().is_success() {
                return Err(MotionError::Status(response.status().as_u16()));
            }
            Ok(response.json::<Vec<MotionSample>>().await?)
        }
        .boxed()
    }
}

// --- OVERLAY CACHE ---

#[derive(Debug, Clone)]
enum Entry {
    Pending,
    Ready(Vec<MotionSample>),
    Failed,
}

/// Last known motion samples per query. A pending or failed lookup reads as
/// an empty list; nothing here ever waits on the network.
#[derive(Debug, Default)]
pub struct MotionOverlay {
    entries: HashMap<MotionKey, Entry>,
}

impl MotionOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self, query: &MotionQuery) -> &[MotionSample] {
        match self.entries.get(&query.key()) {
            Some(Entry::Ready(samples)) => samples.as_slice(),
            _ => &[],
        }
    }

    pub fn is_pending(&self, query: &MotionQuery) -> bool {
        matches!(self.entries.get(&query.key()), Some(Entry::Pending))
    }

    /// Marks `query` in flight. Returns false when a fetch is already running
    /// or a result is cached.
    pub fn begin(&mut self, query: &MotionQuery) -> bool {
        match self.entries.get(&query.key()) {
            Some(Entry::Pending) | Some(Entry::Ready(_)) => false,
            Some(Entry::Failed) | None => {
                self.entries.insert(query.key(), Entry::Pending);
                true
            }
        }
    }

    pub fn complete(
        &mut self,
        query: &MotionQuery,
        result: Result<Vec<MotionSample>, MotionError>,
    ) {
        let entry = match result {
            Ok(samples) => {
                log::debug!("Motion for {}: {} samples", query.cameras, samples.len());
                Entry::Ready(samples)
            }
            Err(e) => {
                log::warn!("Motion lookup for {} failed: {}", query.cameras, e);
                Entry::Failed
            }
        };
        self.entries.insert(query.key(), entry);
    }

    /// Drops the cached result so the next `begin` fetches again.
    pub fn invalidate(&mut self, query: &MotionQuery) {
        self.entries.remove(&query.key());
    }

    /// Fetches `query` through `lookup` unless cached or already in flight.
    pub async fn refresh<L>(&mut self, lookup: &L, query: &MotionQuery) -> &[MotionSample]
    where
        L: MotionLookup + ?Sized,
    {
        if self.begin(query) {
            let result = lookup.lookup(query).await;
            self.complete(query, result);
        }
        self.samples(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeLookup {
        calls: AtomicUsize,
        fail: bool,
    }

    impl MotionLookup for FakeLookup {
        fn lookup<'a>(
            &'a self,
            query: &'a MotionQuery,
        ) -> BoxFuture<'a, Result<Vec<MotionSample>, MotionError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = if self.fail {
                Err(MotionError::Status(500))
            } else {
                Ok(vec![MotionSample {
                    start_time: query.after,
                    motion: Some(12.0),
                    audio: None,
                    camera: query.cameras.clone(),
                }])
            };
            futures::future::ready(result).boxed()
        }
    }

    fn query() -> MotionQuery {
        MotionQuery {
            after: 0.0,
            before: 86_400.0,
            scale: 15,
            cameras: "front_door".to_string(),
        }
    }

    #[test]
    fn test_request_url_params() {
        let lookup = HttpMotionLookup::new("http://nvr.local:5000/api/").unwrap();
        let url = lookup.request_url(&query()).unwrap();
        assert_eq!(url.path(), "/api/review/activity/motion");
        assert_eq!(
            url.query(),
            Some("before=86400&after=0&scale=15&cameras=front_door")
        );
    }

    #[test]
    fn test_lookup_from_config() {
        let config = ReviewConfig {
            api_base_url: "http://10.0.0.2:5000/api".to_string(),
            ..ReviewConfig::default()
        };
        let lookup = HttpMotionLookup::from_config(&config).unwrap();
        let url = lookup.request_url(&query()).unwrap();
        assert_eq!(url.host_str(), Some("10.0.0.2"));
        assert_eq!(url.port(), Some(5000));
    }

    #[test]
    fn test_pending_reads_empty() {
        let mut overlay = MotionOverlay::new();
        assert!(overlay.begin(&query()));
        assert!(!overlay.begin(&query()));
        assert!(overlay.is_pending(&query()));
        assert!(overlay.samples(&query()).is_empty());
    }

    #[tokio::test]
    async fn test_refresh_caches_result() {
        let lookup = FakeLookup {
            calls: AtomicUsize::new(0),
            fail: false,
        };
        let mut overlay = MotionOverlay::new();

        assert_eq!(overlay.refresh(&lookup, &query()).await.len(), 1);
        assert_eq!(overlay.refresh(&lookup, &query()).await.len(), 1);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);

        overlay.invalidate(&query());
        overlay.refresh(&lookup, &query()).await;
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_degrades_to_empty_and_retries() {
        let lookup = FakeLookup {
            calls: AtomicUsize::new(0),
            fail: true,
        };
        let mut overlay = MotionOverlay::new();

        assert!(overlay.refresh(&lookup, &query()).await.is_empty());
        assert!(!overlay.is_pending(&query()));
        overlay.refresh(&lookup, &query()).await;
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 2);
    }
}
