//! HTTP API Module
//!
//! Serves the demo pages plus status and health documents.

mod http;
pub mod pages;

pub use http::{create_router, AppState, HttpServer};
