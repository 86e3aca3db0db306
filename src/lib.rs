//! Library exports for the events and comments service
//!
//! The pure building blocks live in [`event_url`] (date-coded short codes)
//! and [`comments_tree`] (reply forest). The rest is the HTTP service around
//! them.

pub mod comments_tree;
pub mod config;
pub mod database;
pub mod error;
pub mod event_url;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod route;
