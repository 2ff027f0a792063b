// Main entry point for the photoweb server.
// Sets up the Tokio runtime, loads the view templates, prepares the image
// store, configures the Axum router, and starts the HTTP server.

mod app;
mod error;
mod handlers;
mod listeners;
mod models;
mod shutdown_signal;
mod storage;
mod views;

use app::AppState;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use storage::ImageStore;
use tracing::Level;
use views::ViewCache;

/// Command line arguments for photoweb-server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct AppConfig {
    /// Hostname/IP to bind the server to.
    /// Pass the flag without a value (or use "*") to listen on all interfaces.
    #[arg(long, env = "PHOTOWEB_HOST", default_value = "localhost", num_args = 0..=1, default_missing_value = "*")]
    host: String,

    /// Port number to listen on.
    #[arg(short, long, env = "PHOTOWEB_PORT", default_value_t = 8080)]
    port: u16,

    /// Directory uploaded images are stored in. Created if missing.
    #[arg(long, env = "PHOTOWEB_UPLOADS_DIR", default_value = "uploads")]
    uploads_dir: String,

    /// Directory containing the HTML view templates.
    #[arg(long, env = "PHOTOWEB_VIEWS_DIR", default_value = "views")]
    views_dir: String,

    /// Directory served as static assets under /assets.
    #[arg(long, env = "PHOTOWEB_STATIC_DIR", default_value = "public")]
    static_dir: String,
}

#[tokio::main]
async fn main() {
    // Parse command line args and environment variables
    let config = AppConfig::parse();

    // Initialize tracing subscriber for structured logging.
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting photoweb-server...");

    // --- Load view templates ---
    // Templates are read once at startup; handlers render from the
    // in-memory cache for the lifetime of the process.
    let views = ViewCache::load(&config.views_dir)
        .await
        .unwrap_or_else(|err| {
            tracing::error!(
                "FATAL: Failed to load view templates from '{}': {}. Server cannot render pages without them.",
                config.views_dir,
                err
            );
            eprintln!("FATAL: View template loading failed. See logs for details. Exiting.");
            std::process::exit(1);
        });
    tracing::info!("View cache initialized. Loaded {} template(s).", views.len());
    if views.is_empty() {
        tracing::warn!(
            "No view templates were loaded. The upload and list pages will fail to render."
        );
    }

    // --- Prepare the image store ---
    let store = ImageStore::new(&config.uploads_dir)
        .await
        .unwrap_or_else(|err| {
            tracing::error!("FATAL: Failed to prepare image store: {}", err);
            eprintln!("FATAL: Image store initialization failed. Error: {}. Exiting.", err);
            std::process::exit(1);
        });
    tracing::info!("Image store ready at '{}'.", config.uploads_dir);

    let state = AppState {
        store: Arc::new(store),
        views: Arc::new(views),
    };

    // --- Build Axum Application Router ---
    let app = app::create_app(state, Path::new(&config.static_dir));
    tracing::info!("Axum router configured.");

    // --- Start HTTP Server ---
    let listener = match listeners::create_listener(&config.host, config.port).await {
        Ok((addr, l)) => {
            tracing::info!("Listening on {}", addr);
            l
        }
        Err(e) => {
            tracing::error!("FATAL: Failed to bind {}:{}: {}", config.host, config.port, e);
            eprintln!("FATAL: Could not bind the server socket. Error: {}. Exiting.", e);
            std::process::exit(1);
        }
    };

    // Run the server.
    if let Err(e) = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal::shutdown_signal())
        .await
    {
        tracing::error!("Server exited with error: {}", e);
        eprintln!("ERROR: Server shut down unexpectedly. Error: {}", e);
    }

    tracing::info!("photoweb-server has shut down.");
}
