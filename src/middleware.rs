use axum::{
    extract::Request,
    http::{HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::env;

/// Middleware guarding the mutating API routes
///
/// When the `AUTHORIZATION` environment variable is set and non-empty, every
/// request other than `GET`/`HEAD`/`OPTIONS` must carry an `Authorization`
/// header with exactly that value. Reads stay public.
///
/// If the environment variable is not set, the check is skipped.
pub async fn auth_middleware(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let read_only = matches!(
        *request.method(),
        Method::GET | Method::HEAD | Method::OPTIONS
    );

    if !read_only {
        if let Ok(auth_secret) = env::var("AUTHORIZATION") {
            let authorized = headers
                .get("Authorization")
                .and_then(|value| value.to_str().ok())
                .is_some_and(|value| value == auth_secret);

            if !auth_secret.is_empty() && !authorized {
                tracing::info!(
                    method = %request.method(),
                    path = %request.uri().path(),
                    "rejected request with missing or invalid authorization"
                );
                return Err((
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "error": "Unauthorized",
                        "message": "Invalid or missing authorization header"
                    })),
                )
                    .into_response());
            }
        }
    }

    Ok(next.run(request).await)
}
