//! Tracking events and the sinks that deliver them.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::routing::PathClass;

/// One analytics call derived from a gated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingEvent {
    /// A protected API route was hit.
    ApiHit { path: String, at: DateTime<Utc> },
    /// A page (not an API route, not a sign-in page) was visited.
    PageVisit { path: String, at: DateTime<Utc> },
}

impl TrackingEvent {
    /// The event a request maps to, if any.
    ///
    /// Public API routes and auth pages are never tracked; the tracking
    /// endpoints themselves live under a public prefix.
    pub fn for_request(path: &str, class: &PathClass, at: DateTime<Utc>) -> Option<Self> {
        if class.is_protected_api() {
            Some(Self::ApiHit {
                path: path.to_string(),
                at,
            })
        } else if !class.is_api && !class.is_auth_page {
            Some(Self::PageVisit {
                path: path.to_string(),
                at,
            })
        } else {
            None
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::ApiHit { path, .. } | Self::PageVisit { path, .. } => path,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ApiHit { .. } => "api_hit",
            Self::PageVisit { .. } => "page_visit",
        }
    }
}

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("tracking request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("tracking sink unavailable: {0}")]
    Unavailable(String),
}

/// Where tracking events go.
#[async_trait]
pub trait TrackingSink: Send + Sync {
    async fn deliver(&self, event: &TrackingEvent) -> Result<(), TrackingError>;
}

#[derive(Debug, Serialize)]
struct VisitInfo<'a> {
    route: &'a str,
    time: String,
    hit: u32,
}

/// Delivers events to the visitor-tracking HTTP endpoints.
pub struct HttpTrackingSink {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTrackingSink {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TrackingError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

#[async_trait]
impl TrackingSink for HttpTrackingSink {
    async fn deliver(&self, event: &TrackingEvent) -> Result<(), TrackingError> {
        match event {
            TrackingEvent::ApiHit { .. } => {
                self.client
                    .get(self.url("/api/visitor/req"))
                    .send()
                    .await?
                    .error_for_status()?;
            }
            TrackingEvent::PageVisit { path, at } => {
                self.client
                    .get(self.url("/api/visitor/visit"))
                    .send()
                    .await?
                    .error_for_status()?;

                let info = VisitInfo {
                    route: path,
                    time: at.to_rfc3339_opts(SecondsFormat::Millis, true),
                    hit: 1,
                };
                self.client
                    .post(self.url("/api/visitor/info"))
                    .json(&info)
                    .send()
                    .await?
                    .error_for_status()?;
            }
        }
        Ok(())
    }
}
