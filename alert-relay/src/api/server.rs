//! HTTP server setup and routing

use crate::alarm::AlarmPlayer;
use crate::channel::EventChannel;
use crate::error::{Error, Result};
use crate::images::ImageStore;
use crate::state::SharedState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
///
/// Cloning is cheap; every field is reference counted.
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<SharedState>,
    pub alarm: Arc<AlarmPlayer>,
    pub images: Arc<ImageStore>,
    pub channel: EventChannel,
}

impl AppContext {
    pub fn new(state: Arc<SharedState>, alarm: Arc<AlarmPlayer>, images: ImageStore) -> Self {
        let channel = EventChannel::new(Arc::clone(&state), Arc::clone(&alarm));
        Self {
            state,
            alarm,
            images: Arc::new(images),
            channel,
        }
    }
}

/// Build the router with all routes and layers
///
/// `max_upload_bytes` caps request bodies, which bounds image uploads.
pub fn create_router(ctx: AppContext, max_upload_bytes: usize) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))

        // Image upload
        .route("/upload-image/", post(super::handlers::upload_image))
        .route("/upload-image", post(super::handlers::upload_image))

        // Alarm control
        .route("/stop-alarm/", post(super::handlers::stop_alarm))
        .route("/stop-alarm", post(super::handlers::stop_alarm))

        // Event channel
        .route("/events", get(super::socket::event_socket))

        .with_state(ctx)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        // Any origin may upload or stop the alarm
        .layer(CorsLayer::permissive())
}

/// Serve `app` on an already bound listener until `shutdown` resolves
pub async fn run<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .map_err(|e| Error::Http(format!("Failed to read listener address: {}", e)))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    info!("HTTP server stopped");
    Ok(())
}
