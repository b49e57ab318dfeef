//! # uprange: a deliberately naive upload target
//!
//! `uprange` serves a single upload page for security training. `POST /upload` accepts a
//! `multipart/form-data` request, writes every part that names a file into
//! `<app_root>/webapp/<filename>`, and redisplays the page with a one-line result. Filenames are
//! taken from the `content-disposition` header by naive slicing and joined to the upload
//! directory by plain concatenation, so `../` sequences in a filename escape the directory. That
//! is the point of the exercise; do not deploy this anywhere that matters.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum). A request that passes the declared
//! `Content-Length` check goes through three steps (see [`upload`]):
//!
//! 1. **Directory**: `<app_root>/webapp` is created with any missing parents.
//! 2. **Intake** streams the body through multer, spooling large parts to anonymous temp files
//!    and rejecting bodies over the configured limits with `413` before any part is stored.
//! 3. **Store** copies each part to disk in arrival order, stopping at the first failure.
//!
//! Any other failure in these steps becomes the page message `文件上传失败: <description>` with a
//! `200` status. Logging goes through an injected [`upload::UploadLog`], backed by `tracing`
//! in the server.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use uprange::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = uprange::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     uprange::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config)?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod config;
pub mod errors;
pub mod telemetry;
pub mod upload;
mod views;

#[cfg(test)]
pub mod test_utils;

use axum::{Router, response::Redirect, routing::get};
use bon::Builder;
pub use config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info, instrument};
use upload::{TracingUploadLog, UploadLog};
use views::Views;

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .views(Arc::new(Views::new()?))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    views: Arc<Views>,
    #[builder(default = Arc::new(TracingUploadLog))]
    pub upload_log: Arc<dyn UploadLog>,
}

/// Build the router with the upload page, health check and tracing middleware.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/upload") }))
        .route("/healthz", get(|| async { "OK" }))
        .route(
            "/upload",
            get(api::handlers::upload::upload_form).post(api::handlers::upload::upload),
        )
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main application struct that owns the router and configuration.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] compiles the views and builds the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles requests until the
///    shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application that logs uploads through `tracing`
    pub fn new(config: Config) -> anyhow::Result<Self> {
        Self::with_upload_log(config, Arc::new(TracingUploadLog))
    }

    /// Create a new application with a caller-provided upload log
    pub fn with_upload_log(config: Config, upload_log: Arc<dyn UploadLog>) -> anyhow::Result<Self> {
        debug!("Starting upload range with configuration: {:#?}", config);

        let views = Views::new().map_err(|e| anyhow::anyhow!("Failed to compile templates: {}", e))?;
        let state = AppState::builder()
            .config(config.clone())
            .views(Arc::new(views))
            .upload_log(upload_log)
            .build();

        Ok(Self {
            router: build_router(state),
            config,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            upload_dir = %self.config.upload_dir_path().display(),
            "Upload range listening on http://{}", bind_addr
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::test_utils::{create_test_app, create_test_config};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_healthz() {
        let root = tempfile::tempdir().unwrap();
        let (server, _log) = create_test_app(create_test_config(root.path()));

        let response = server.get("/healthz").await;

        response.assert_status_ok();
        response.assert_text("OK");
    }

    #[tokio::test]
    async fn test_root_redirects_to_upload() {
        let root = tempfile::tempdir().unwrap();
        let (server, _log) = create_test_app(create_test_config(root.path()));

        let response = server.get("/").await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").map(|v| v.to_str().unwrap()),
            Some("/upload")
        );
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let root = tempfile::tempdir().unwrap();
        let (server, _log) = create_test_app(create_test_config(root.path()));

        server.get("/upload.jsp").expect_failure().await.assert_status(StatusCode::NOT_FOUND);
    }
}
