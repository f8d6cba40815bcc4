//! SchoolHub Banner Backend
//!
//! Banner store for the school administration dashboard, with SQLite persistence,
//! media uploads and the headless slideshows that rotate eligible banners.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod palette;
mod slideshow;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use tokio::runtime::Handle;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use palette::{PaletteCache, PaletteSink, RepositoryPaletteSink};
use slideshow::{MediaBackend, ReportedMedia, SlideshowHub, TimerHost, TokioTimerHost};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
    pub palettes: Arc<PaletteCache>,
    pub media: Arc<ReportedMedia>,
    pub slideshows: Arc<SlideshowHub>,
}

impl AppState {
    /// Open the palette cache and build both slideshows on `runtime`.
    pub fn new(repo: Arc<Repository>, config: Config, runtime: Handle) -> Self {
        let palettes = Arc::new(PaletteCache::open(&config.palette_cache_path));
        let timers: Arc<dyn TimerHost> = Arc::new(TokioTimerHost::new(runtime.clone()));
        let sink: Arc<dyn PaletteSink> =
            Arc::new(RepositoryPaletteSink::new(Arc::clone(&repo), runtime));

        // Frames come from the clients that decode the videos
        let media = Arc::new(ReportedMedia::new());
        let backend: Arc<dyn MediaBackend> = media.clone();
        let slideshows = Arc::new(SlideshowHub::new(
            timers,
            Arc::clone(&palettes),
            Some(backend),
            Some(sink),
            &config.poster_url,
        ));

        Self {
            repo,
            config: Arc::new(config),
            palettes,
            media,
            slideshows,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting SchoolHub Banner Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Media directory: {:?}", config.media_dir);
    tracing::info!("Palette cache: {:?}", config.palette_cache_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (SCHOOLHUB_API_PSK). Authentication is disabled!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    tokio::fs::create_dir_all(&config.media_dir).await?;

    let state = AppState::new(repo, config.clone(), Handle::current());

    // Load the banners eligible right now
    let loaded = state.slideshows.refresh(&state.repo).await?;
    tracing::info!("Slideshows loaded with {} eligible banners", loaded);

    let feed_refresh = spawn_feed_refresh(state.clone());
    let slideshows = Arc::clone(&state.slideshows);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    feed_refresh.abort();
    slideshows.dispose();
    tracing::info!("Server stopped");

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();
    let max_upload_bytes = state.config.max_upload_bytes;

    // API routes
    let api_routes = Router::new()
        // Banners
        .route(
            "/banners",
            get(api::list_banners).post(api::create_banner),
        )
        .route("/banners/active", get(api::list_active_banners))
        .route("/banners/revision", get(api::get_banner_revision))
        .route(
            "/banners/{id}",
            get(api::get_banner)
                .put(api::update_banner)
                .delete(api::delete_banner),
        )
        .route("/banners/{id}/palette", put(api::update_banner_palette))
        // Media
        .route(
            "/media",
            post(api::upload_media).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        // Slideshows
        .route("/slideshow/{variant}", get(api::get_slideshow))
        .route("/slideshow/{variant}/next", post(api::next_slide))
        .route("/slideshow/{variant}/prev", post(api::previous_slide))
        .route("/slideshow/{variant}/jump", post(api::jump_to_slide))
        .route("/slideshow/{variant}/toggle", post(api::toggle_slideshow))
        .route("/slideshow/{variant}/hover", post(api::set_slideshow_hover))
        .route("/slideshow/{variant}/decoded", post(api::report_decoded))
        .route("/slideshow/{variant}/frame", post(api::report_frame))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check and uploaded media (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .nest_service("/media", ServeDir::new(&state.config.media_dir));

    Router::new()
        .nest("/api", api_routes)
        .merge(public_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

/// Periodically reload the slideshows so schedule windows open and close on time.
fn spawn_feed_refresh(state: AppState) -> tokio::task::JoinHandle<()> {
    let period = state.config.feed_refresh;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match state.slideshows.refresh(&state.repo).await {
                Ok(count) => tracing::debug!("Slideshow feed refreshed: {} banners", count),
                Err(e) => tracing::warn!("Slideshow feed refresh failed: {}", e),
            }
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
