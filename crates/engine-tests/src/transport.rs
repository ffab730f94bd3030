use async_trait::async_trait;
use connectors::{error::SourceError, http::transport::HttpTransport};
use serde_json::Value as JsonValue;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

#[derive(Default)]
struct Script {
    json: HashMap<String, JsonValue>,
    files: HashMap<String, PathBuf>,
    failures: HashMap<String, usize>,
    requests: Vec<String>,
}

/// An [`HttpTransport`] answering from canned bodies and fixture files.
///
/// Unknown URLs answer HTTP 404. Scripted failures answer HTTP 503 and are
/// consumed one per request. Each request is held open for the configured
/// latency so that overlapping requests can be counted.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<Script>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Marks one request as in flight until dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(current: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        InFlight(current)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(self, url: &str, body: JsonValue) -> Self {
        self.script.lock().unwrap().json.insert(url.to_string(), body);
        self
    }

    /// Serves `fixture` as the body of `url` for downloads.
    pub fn with_file(self, url: &str, fixture: &Path) -> Self {
        self.script
            .lock()
            .unwrap()
            .files
            .insert(url.to_string(), fixture.to_path_buf());
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// The next `times` requests to `url` fail with a transient error.
    pub fn fail(&self, url: &str, times: usize) {
        self.script.lock().unwrap().failures.insert(url.to_string(), times);
    }

    pub fn fail_always(&self, url: &str) {
        self.fail(url, usize::MAX);
    }

    pub fn requests(&self) -> Vec<String> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|u| *u == url).count()
    }

    /// Highest number of requests that were open at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn hold(&self) -> InFlight<'_> {
        let guard = InFlight::enter(&self.in_flight, &self.max_in_flight);
        if self.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.latency).await;
        }
        guard
    }

    fn record(&self, url: &str) -> Result<(), SourceError> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(url.to_string());
        if let Some(remaining) = script.failures.get_mut(url)
            && *remaining > 0
        {
            *remaining = remaining.saturating_sub(1);
            return Err(SourceError::Status {
                url: url.to_string(),
                status: 503,
            });
        }
        Ok(())
    }

    fn not_found(url: &str) -> SourceError {
        SourceError::Status {
            url: url.to_string(),
            status: 404,
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get_json(&self, url: &str, _timeout: Duration) -> Result<JsonValue, SourceError> {
        let _open = self.hold().await;
        self.record(url)?;
        let body = self.script.lock().unwrap().json.get(url).cloned();
        body.ok_or_else(|| Self::not_found(url))
    }

    async fn download(&self, url: &str, dest: &Path, _timeout: Duration) -> Result<u64, SourceError> {
        let _open = self.hold().await;
        self.record(url)?;
        let fixture = self.script.lock().unwrap().files.get(url).cloned();
        let fixture = fixture.ok_or_else(|| Self::not_found(url))?;
        tokio::fs::copy(&fixture, dest).await.map_err(|source| SourceError::Io {
            url: url.to_string(),
            source,
        })
    }
}
