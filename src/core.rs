//! Core domain types and service traits for content-dispatch
//!
//! This module defines the records the host hands us, the event body sent to
//! the repository-dispatch API, and the transport contract that carries it.

use crate::error::DispatchError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

/// A unit of publishable content as reported by the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub id: i64,
    pub name: String,
    /// The alias of the record's content type.
    #[serde(rename = "contentType")]
    pub content_type_alias: String,
    pub update_date: DateTime<Utc>,
}

impl ContentRecord {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        content_type_alias: impl Into<String>,
        update_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            content_type_alias: content_type_alias.into(),
            update_date,
        }
    }
}

/// The kind of change being announced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ContentEvent {
    #[serde(rename = "content_published")]
    Published,
    #[serde(rename = "content_unpublished")]
    Unpublished,
}

impl ContentEvent {
    /// The `event_type` label sent to the dispatch API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentEvent::Published => "content_published",
            ContentEvent::Unpublished => "content_unpublished",
        }
    }
}

impl fmt::Display for ContentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "content_published" | "published" => Ok(ContentEvent::Published),
            "content_unpublished" | "unpublished" => Ok(ContentEvent::Unpublished),
            other => Err(format!("unknown content event: {other}")),
        }
    }
}

/// The `client_payload` object of a dispatch body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientPayload {
    pub id: i64,
    pub name: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
    #[serde(rename = "updateDate")]
    pub update_date: DateTime<Utc>,
}

/// The JSON body of one repository-dispatch request.
///
/// Built fresh for every record and dropped once the request is sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeEvent {
    pub event_type: ContentEvent,
    pub client_payload: ClientPayload,
}

impl ChangeEvent {
    pub fn new(event_type: ContentEvent, record: &ContentRecord) -> Self {
        Self {
            event_type,
            client_payload: ClientPayload {
                id: record.id,
                name: record.name.clone(),
                content_type: record.content_type_alias.clone(),
                update_date: record.update_date,
            },
        }
    }
}

/// Notifications delivered by the host when content changes state.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    ContentPublished(Vec<ContentRecord>),
    ContentUnpublished(Vec<ContentRecord>),
}

impl Notification {
    pub fn event(&self) -> ContentEvent {
        match self {
            Notification::ContentPublished(_) => ContentEvent::Published,
            Notification::ContentUnpublished(_) => ContentEvent::Unpublished,
        }
    }

    pub fn into_records(self) -> Vec<ContentRecord> {
        match self {
            Notification::ContentPublished(records) | Notification::ContentUnpublished(records) => {
                records
            }
        }
    }
}

/// The header set of one request.
///
/// Read-only once built. Each request owns its own copy, so nothing set for
/// one dispatch can leak into another.
#[derive(Debug, Clone, Default)]
pub struct DispatchHeaders(HeaderMap);

impl DispatchHeaders {
    pub fn into_inner(self) -> HeaderMap {
        self.0
    }
}

impl From<HeaderMap> for DispatchHeaders {
    fn from(map: HeaderMap) -> Self {
        Self(map)
    }
}

impl Deref for DispatchHeaders {
    type Target = HeaderMap;

    fn deref(&self) -> &HeaderMap {
        &self.0
    }
}

/// A fully built request. Headers belong to this request alone.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub url: Url,
    pub headers: DispatchHeaders,
    pub event: ChangeEvent,
}

// =============================================================================
// Service Traits
// =============================================================================

/// Sends one dispatch request to the remote API.
#[async_trait]
pub trait DispatchTransport: Send + Sync {
    /// Sends the request and resolves once the response is known.
    ///
    /// # Returns
    /// * `Ok(())` on a 2xx response
    /// * `Err` for non-2xx statuses and network failures
    async fn send(&self, request: DispatchRequest) -> Result<(), DispatchError>;
}
