//! Nullable content fetcher: scripted per-URL responses.

use async_trait::async_trait;
use dailyread_sources::{SourceError, SourceFetcher};
use dailyread_types::ContentSource;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Clone)]
enum Scripted {
    Body(Value),
    Status(u16),
}

/// Answers from a script keyed by URL. An unscripted URL is unreachable.
pub struct NullFetcher {
    script: Mutex<HashMap<String, Scripted>>,
    requested: Mutex<Vec<String>>,
}

impl NullFetcher {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(HashMap::new()),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Answer `url` with `body`.
    pub fn respond(&self, url: &str, body: Value) {
        self.script
            .lock()
            .unwrap()
            .insert(url.to_string(), Scripted::Body(body));
    }

    /// Answer `url` with a non-success status.
    pub fn fail(&self, url: &str, status: u16) {
        self.script
            .lock()
            .unwrap()
            .insert(url.to_string(), Scripted::Status(status));
    }

    /// URLs fetched so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl Default for NullFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceFetcher for NullFetcher {
    async fn fetch(&self, source: &ContentSource) -> Result<Value, SourceError> {
        self.requested.lock().unwrap().push(source.url.clone());
        let scripted = self.script.lock().unwrap().get(&source.url).cloned();
        match scripted {
            Some(Scripted::Body(body)) => Ok(body),
            Some(Scripted::Status(status)) => Err(SourceError::Status(status)),
            None => Err(SourceError::Unreachable(format!("no script for {}", source.url))),
        }
    }
}
