//! Route definitions for the events and comments API
//!
//! This module maps every HTTP route to its handler and builds the Axum
//! router with the application state.

use axum::middleware;
use axum::routing::{delete, get};
use axum::Router;

use crate::database::AppState;
use crate::handler::{
    create_comment, create_event, delete_comment, delete_event, get_event, list_comments,
    list_events, redirect_event,
};
use crate::middleware::auth_middleware;

/// Creates and configures the Axum application router with all routes
///
/// # Route Definitions
///
/// Public:
/// - `GET /e/{code}` - Redirects a short code to its event page
/// - `GET /api/events` - Lists events with pagination
/// - `GET /api/events/{id}` - Fetches one event
/// - `GET /api/posts/{post_id}/comments` - Comment reply tree of a post
///
/// Behind the authorization check:
/// - `POST /api/events` - Creates an event and assigns its short code
/// - `DELETE /api/events/{id}` - Deletes an event
/// - `POST /api/posts/{post_id}/comments` - Adds a comment or reply
/// - `DELETE /api/posts/{post_id}/comments/{id}` - Deletes a comment
///
/// # Example Usage
///
/// ```no_run
/// # use founders_links::database::{init_db, AppState};
/// # use founders_links::route::create_app;
/// # let db = init_db("data.db").unwrap();
/// let state = AppState::new(db, "http://localhost:8080");
/// let app = create_app(state);
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    // The authorization check only applies to mutating methods
    let api_routes = Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/{id}", get(get_event).delete(delete_event))
        .route(
            "/posts/{post_id}/comments",
            get(list_comments).post(create_comment),
        )
        .route("/posts/{post_id}/comments/{id}", delete(delete_comment))
        .layer(middleware::from_fn(auth_middleware));

    Router::new()
        // Public short link endpoint
        .route("/e/{code}", get(redirect_event))
        .nest("/api", api_routes)
        .with_state(state)
}
