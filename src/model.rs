//! Data models for the events and comments service
//!
//! This module defines the stored records and the request/response shapes
//! of the HTTP API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::comments_tree::CommentNode;

/// Represents an event stored in the database
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EventRecord {
    /// Random identifier of the event (e.g., "k3J9xQ2mLp0a")
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    /// Calendar day the event takes place on
    pub event_date: NaiveDate,

    /// Timestamp when this event record was created
    pub created_at: DateTime<Utc>,

    /// `MMDDNN` code assigned when the event was created
    pub short_code: String,
}

/// Request payload for creating an event
///
/// # Example
/// ```json
/// {
///   "title": "Year-end Founders Mixer",
///   "event_date": "2024-12-19",
///   "location": "Seongsu",
///   "description": "Drinks and demos"
/// }
/// ```
#[derive(Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub event_date: NaiveDate,
    pub description: Option<String>,
    pub location: Option<String>,
}

/// Event as returned by the API, with its shareable short URL
///
/// # Example
/// ```json
/// {
///   "id": "k3J9xQ2mLp0a",
///   "title": "Year-end Founders Mixer",
///   "event_date": "2024-12-19",
///   "short_code": "121901",
///   "short_url": "http://localhost:8080/e/121901",
///   ...
/// }
/// ```
#[derive(Serialize)]
pub struct EventResponse {
    #[serde(flatten)]
    pub event: EventRecord,

    pub short_url: String,
}

/// Query parameters for listing events with pagination
///
/// # Example
/// Query string: `?page=2&limit=20`
#[derive(Deserialize)]
pub struct ListParams {
    /// Page number for pagination (starts from 1)
    /// Defaults to 1 if not provided
    pub page: Option<usize>,

    /// Number of items per page
    /// Defaults to 10 if not provided, maximum is 100
    pub limit: Option<usize>,
}

/// A comment on a post, stored flat
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub post_id: String,

    /// Comment this one replies to, `None` for a top-level comment
    #[serde(default)]
    pub parent_id: Option<String>,

    pub content: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
}

/// Request payload for commenting on a post
///
/// # Example
/// ```json
/// {
///   "author_id": "user_123",
///   "content": "See you there!",
///   "parent_id": "Qm2x9LkP0aZr"  // Optional
/// }
/// ```
#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub author_id: String,
    pub content: String,
    pub parent_id: Option<String>,
}

/// Comment thread of a post, nested for rendering
#[derive(Serialize)]
pub struct CommentThreadResponse {
    pub post_id: String,

    /// Number of comments stored for the post
    pub total: usize,

    /// Replies whose parent no longer exists, shown as top-level comments
    pub orphaned: usize,

    pub comments: Vec<CommentNode>,
}
