//! HTTP request handlers for the events and comments API
//!
//! This module implements:
//! - Creating events and assigning their short codes
//! - Redirecting short codes to event pages
//! - Listing, fetching and deleting events
//! - Storing post comments and serving them as a reply tree

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use serde_json::json;

use crate::database::{self, AppState};
use crate::error::AppError;
use crate::event_url;
use crate::model::{
    CommentThreadResponse, CreateCommentRequest, CreateEventRequest, EventResponse, ListParams,
};

/// Creates a new event
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Year-end Founders Mixer",
///   "event_date": "2024-12-19",
///   "location": "Seongsu"  // Optional
/// }
/// ```
///
/// # Response
///
/// - **201 Created** - Event stored, body carries `short_code` and `short_url`
/// - **422 Unprocessable Entity** - Empty title
pub async fn create_event(
    State(state): State<AppState>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::Validation("Event title must not be empty".to_string()));
    }

    let record = database::insert_event(
        &state.db,
        title,
        payload.description.filter(|d| !d.is_empty()),
        payload.location.filter(|l| !l.is_empty()),
        payload.event_date,
    )?;

    let response = EventResponse {
        short_url: state.short_url(&record.short_code),
        event: record,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Redirects a short code to the event page
///
/// When a user visits `http://localhost:8080/e/121901`, this handler:
/// 1. Parses "121901" into month/day "1219" and ordinal 1
/// 2. Resolves it to an event
/// 3. Sends a 307 Temporary Redirect to `{BASE_URL}/events/{id}`
///
/// # Response
///
/// - **307 Temporary Redirect** - Redirects to the event page
/// - **404 Not Found** - Malformed code, or no event behind it
pub async fn redirect_event(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let Some(query) = event_url::parse(&code) else {
        tracing::debug!(code = %code, "not a short code");
        return Err(AppError::NotFound("Event not found"));
    };

    match database::resolve_short_code(&state.db, &query, &code)? {
        Some(event) => Ok(Redirect::temporary(&state.event_url(&event.id))),
        None => Err(AppError::NotFound("Event not found")),
    }
}

/// Lists events with pagination
///
/// # Query Parameters
///
/// - `page` (optional) - Page number, starts from 1 (default: 1)
/// - `limit` (optional) - Items per page, max 100 (default: 10)
///
/// # Response
///
/// ```json
/// {
///   "page": 2,
///   "limit": 20,
///   "total_fetched": 15,
///   "data": [...]
/// }
/// ```
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).min(100);
    let offset = (page - 1).saturating_mul(limit);

    let data: Vec<EventResponse> = database::list_events(&state.db, offset, limit)?
        .into_iter()
        .map(|event| EventResponse {
            short_url: state.short_url(&event.short_code),
            event,
        })
        .collect();

    Ok(Json(json!({
        "page": page,
        "limit": limit,
        "total_fetched": data.len(),
        "data": data
    })))
}

/// Fetches one event
pub async fn get_event(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let event = database::find_event(&state.db, &id)?.ok_or(AppError::NotFound("Event not found"))?;

    Ok(Json(EventResponse {
        short_url: state.short_url(&event.short_code),
        event,
    }))
}

/// Deletes an event
///
/// The short code stops resolving. It is not handed out to later events.
///
/// # Response
///
/// - **200 OK** - Event deleted
/// - **404 Not Found** - Event does not exist
pub async fn delete_event(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let record = database::delete_event(&state.db, &id)?;

    Ok(Json(json!({
        "message": "Event deleted successfully",
        "deleted_id": record.id,
        "short_code": record.short_code
    })))
}

/// Adds a comment, or a reply when `parent_id` is given
///
/// # Request Body
///
/// ```json
/// {
///   "author_id": "user_123",
///   "content": "See you there!",
///   "parent_id": "Qm2x9LkP0aZr"  // Optional
/// }
/// ```
///
/// # Response
///
/// - **201 Created** - Comment stored
/// - **404 Not Found** - `parent_id` is not a comment of this post
/// - **422 Unprocessable Entity** - Empty content or author, or a post id
///   with characters other than letters, digits, '-', '_' and '.'
pub async fn create_comment(
    Path(post_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    database::validate_post_id(&post_id)?;
    if payload.content.trim().is_empty() {
        return Err(AppError::Validation("Comment content must not be empty".to_string()));
    }
    if payload.author_id.is_empty() {
        return Err(AppError::Validation("author_id must not be empty".to_string()));
    }

    let comment = database::insert_comment(
        &state.db,
        &post_id,
        payload.author_id,
        payload.content,
        payload.parent_id.filter(|id| !id.is_empty()),
    )?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Returns the comments of a post as a reply tree
///
/// # Response
///
/// ```json
/// {
///   "post_id": "p1",
///   "total": 3,
///   "orphaned": 0,
///   "comments": [
///     { "id": "a", "content": "...", "children": [ { "id": "b", ..., "children": [] } ] }
///   ]
/// }
/// ```
pub async fn list_comments(
    Path(post_id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let (total, forest) = database::comment_thread(&state.db, &post_id)?;

    Ok(Json(CommentThreadResponse {
        post_id,
        total,
        orphaned: forest.orphaned,
        comments: forest.roots,
    }))
}

/// Deletes one comment of a post
///
/// Replies to it stay and are shown as top-level comments afterwards.
pub async fn delete_comment(
    Path((post_id, id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    database::delete_comment(&state.db, &post_id, &id)?;

    Ok(Json(json!({
        "message": "Comment deleted successfully",
        "deleted_id": id
    })))
}
