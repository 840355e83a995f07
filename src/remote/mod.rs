//! Remote store bridge.
//!
//! One URL holds one shared copy of the State Document. Push sends the whole
//! document; pull fetches it back. Neither operation returns an error: every
//! failure degrades to `false` or `None` so callers can stay local-only.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA};
use reqwest::{redirect, Client};
use serde_json::Value;

use crate::config::PushMode;
use crate::errors::AppError;
use crate::models::StateDocument;

/// Top-level keys that mark a payload as a State Document.
const RECOGNIZED_KEYS: [&str; 3] = ["config", "settings", "timetable"];

const MAX_REDIRECTS: usize = 10;

/// Best-effort push/pull against a remote document store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Send the full document. `true` means the request was delivered.
    async fn push(&self, url: &str, document: &StateDocument) -> bool;

    /// Fetch the document. `None` covers empty, invalid and unreachable remotes.
    async fn pull(&self, url: &str) -> Option<StateDocument>;
}

/// Parse a pulled body. A JSON string is decoded a second time before the
/// shape check.
pub fn parse_payload(body: &str) -> Option<StateDocument> {
    let mut value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Remote payload is not valid JSON: {}", e);
            return None;
        }
    };

    if let Value::String(inner) = &value {
        value = match serde_json::from_str(inner) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Remote payload was a string but not valid JSON: {}", e);
                return None;
            }
        };
    }

    validate_document(value)
}

/// Accept any object carrying at least one recognized top-level key, then read
/// it leniently: absent or mistyped fields take defaults.
pub fn validate_document(value: Value) -> Option<StateDocument> {
    let recognized = value.as_object().is_some_and(|object| {
        RECOGNIZED_KEYS
            .iter()
            .any(|key| object.get(*key).is_some_and(|v| !v.is_null()))
    });
    if !recognized {
        tracing::warn!("Remote payload failed validation: no recognized top-level key");
        return None;
    }

    Some(StateDocument::from_value_lenient(value))
}

/// reqwest-backed bridge to a script-style document endpoint.
#[derive(Clone)]
pub struct HttpRemoteStore {
    client: Client,
    push_mode: PushMode,
}

impl HttpRemoteStore {
    pub fn new(push_mode: PushMode, timeout: Option<Duration>) -> Result<Self, AppError> {
        let mut builder = Client::builder().redirect(redirect::Policy::limited(MAX_REDIRECTS));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, push_mode })
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn push(&self, url: &str, document: &StateDocument) -> bool {
        let body = match serde_json::to_string(document) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to serialize document for push: {}", e);
                return false;
            }
        };

        // Plain text avoids a preflight on endpoints that cannot answer one.
        let result = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "text/plain;charset=utf-8")
            .body(body)
            .send()
            .await;

        match result {
            Ok(response) => match self.push_mode {
                PushMode::FireAndForget => {
                    tracing::debug!("Remote push delivered (status {})", response.status());
                    true
                }
                PushMode::Verified => {
                    let ok = response.status().is_success();
                    if !ok {
                        tracing::warn!("Remote push rejected with status {}", response.status());
                    }
                    ok
                }
            },
            Err(e) => {
                tracing::warn!("Remote push failed: {}", e);
                false
            }
        }
    }

    async fn pull(&self, url: &str) -> Option<StateDocument> {
        let response = match self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-cache, no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Remote pull failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!("Remote pull returned status {}", response.status());
            return None;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to read remote pull body: {}", e);
                return None;
            }
        };

        let doc = parse_payload(&body)?;
        tracing::debug!("Remote document validated");
        Some(doc)
    }
}
