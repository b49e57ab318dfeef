//! HTTP layer: request handlers and the view models they render.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Template contexts
//!
//! # Routes
//!
//! - `GET /upload`: upload form
//! - `POST /upload`: store a `multipart/form-data` request and redisplay the form with the result
//! - `GET /healthz`: liveness
//! - `GET /`: redirects to `/upload`

pub mod handlers;
pub mod models;
