//! # askroute HTTP API
//!
//! Thin axum front for the assistant pipeline.
//!
//! - **POST** `/chat` with `{role, mode, query}` returns `{response: <outcome>}`
//! - **GET** `/health` returns `{"status": "Running"}`
//!
//! The outcome is one of the structured, degraded or error payloads and carries
//! a `kind` tag. Requests with an unknown role or mode are rejected with 422
//! before reaching the pipeline.

pub mod middleware;
pub mod routes;
pub mod server;
pub mod types;

pub use server::{build_router, ApiServer, AppState};
pub use types::*;
