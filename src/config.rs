//! Runtime configuration read from the environment
//!
//! Values come from process environment variables, with a `.env` file
//! loaded first by `main` if present.

use std::env;

/// Server settings
///
/// # Environment Variables
///
/// - `PORT` - Server port number (default: 8080)
/// - `DATABASE_URL` - Path to database file (default: "data.db")
/// - `BASE_URL` - Public origin used to build event links
///   (default: "http://localhost:{PORT}")
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "data.db".to_string());

        let base_url = env::var("BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| format!("http://localhost:{}", port));

        Config {
            port,
            database_url,
            base_url,
        }
    }
}
