// Router assembly for the photoweb server.
// Wires the handlers to their routes, mounts the static asset service, and
// applies the shared middleware stack (body size limit, panic containment,
// request tracing).

use crate::{
    handlers::{self, MAX_UPLOAD_SIZE_BYTES},
    storage::ImageStore,
    views::ViewCache,
};
use axum::{
    Router,
    body::Bytes,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Response, StatusCode, header},
    routing::get,
};
use http_body_util::Full;
use std::any::Any;
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::Level;

// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ImageStore>,
    pub views: Arc<ViewCache>,
}

pub fn create_app(state: AppState, static_dir: &Path) -> Router {
    // Configure the router with all endpoints
    Router::new()
        // Upload form and multipart upload
        .route(
            "/upload",
            get(handlers::upload_form).post(handlers::upload_image),
        )
        // Stored image retrieval and listing
        .route("/view", get(handlers::view_image))
        .route("/list", get(handlers::list_images))
        // JSON demo record
        .route("/json", get(handlers::demo_json))
        // Static assets served straight from disk
        .nest_service(
            "/assets",
            ServeDir::new(static_dir).append_index_html_on_directories(false),
        )
        // Apply a layer to limit the maximum size of request bodies
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE_BYTES))
        // Contain handler panics so a single request cannot take the process down
        .layer(CatchPanicLayer::custom(handle_panic))
        // Add tracing for HTTP requests and responses
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new().level(Level::INFO)))
        // Provide the shared state
        .with_state(state)
}

// Converts a caught handler panic into a 500 response with the same JSON
// error shape as AppError. Handlers return Result for expected failures;
// anything arriving here is a fault, so it is also logged at error level.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response<Full<Bytes>> {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!("Handler panicked: {}", details);

    let body = serde_json::json!({
        "error": {
            "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            "message": details,
        }
    })
    .to_string();

    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}
