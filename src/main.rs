//! Timetable Administration Backend
//!
//! A REST backend for institutional timetables with SQLite persistence and
//! best-effort mirroring of the whole state document to a remote endpoint.

mod api;
mod auth;
mod config;
mod conflicts;
mod db;
mod errors;
mod models;
mod remote;
mod sync;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::LocalStore;
use remote::HttpRemoteStore;
use sync::Synchronizer;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub sync: Arc<Synchronizer>,
    pub store: LocalStore,
    pub config: Arc<Config>,
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

    tracing::info!("Starting Timetable Administration Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Remote push mode: {:?}", config.push_mode);

    // Initialize the local store
    let pool = db::init_database(&config.db_path).await?;
    let store = LocalStore::new(pool);
    let document = store
        .load_or_seed(config.default_remote_url.as_deref())
        .await?;

    if document.settings.sync_endpoint().is_none() {
        tracing::warn!("No remote endpoint configured. Running local-only.");
    }

    // Reconcile with the remote before serving
    let remote = Arc::new(HttpRemoteStore::new(config.push_mode, config.remote_timeout)?);
    let sync = Arc::new(Synchronizer::new(
        document,
        store.clone(),
        remote,
        config.default_remote_url.clone(),
    ));
    tracing::info!("Reconciling with remote store...");
    sync.reconcile().await;
    tracing::info!(
        "Synchronizer is {:?} at revision {}",
        sync.phase().await,
        sync.revision().await
    );

    // Create application state
    let state = AppState {
        sync,
        store,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let store = state.store.clone();

    // Viewer and sign-in routes (no session required)
    let public_routes = Router::new()
        .route("/public/timetable/class/{class_id}", get(api::class_schedule))
        .route(
            "/public/timetable/faculty/{faculty_id}",
            get(api::faculty_schedule),
        )
        .route("/public/substitutions", get(api::public_substitutions))
        .route("/public/directory", get(api::get_directory))
        .route("/auth/login", post(api::login))
        .route("/auth/sso", post(api::login_sso));

    // Principal only
    let principal_routes = Router::new()
        .route("/settings", get(api::get_settings))
        .route("/settings", put(api::update_settings))
        .route("/config", put(api::update_config))
        .route("/logs", get(api::list_logs))
        .route("/sync/status", get(api::sync_status))
        .route("/sync/pull", post(api::sync_pull))
        .route("/sync/push", post(api::sync_push))
        .route_layer(middleware::from_fn(auth::principal_layer));

    // Any signed-in role
    let session_routes = Router::new()
        // State
        .route("/state", get(api::get_state))
        .route("/state/revision", get(api::get_revision))
        .route("/dashboard", get(api::get_dashboard))
        // Session
        .route("/auth/session", get(api::current_session))
        .route("/auth/logout", post(api::logout))
        // Registry
        .route("/staff", get(api::list_staff))
        .route("/staff", post(api::create_staff))
        .route("/staff/{id}", delete(api::delete_staff))
        .route("/subjects", get(api::list_subjects))
        .route("/subjects", post(api::create_subject))
        .route("/subjects/{id}", delete(api::delete_subject))
        .route("/classes", get(api::list_classes))
        .route("/classes", post(api::create_class))
        .route("/classes/{id}", delete(api::delete_class))
        // Timetable
        .route("/timetable/assign", put(api::assign_slot))
        .route("/timetable/check", post(api::check_slot))
        .route("/timetable/slot", delete(api::clear_slot))
        // Attendance and leave
        .route("/attendance", get(api::list_attendance))
        .route("/attendance", post(api::mark_attendance))
        .route("/leaves", get(api::list_leaves))
        .route("/leaves", post(api::apply_leave))
        .route("/leaves/{id}/decision", post(api::decide_leave))
        // Substitutions
        .route("/substitutions", get(api::list_substitutions))
        .route("/substitutions", post(api::create_substitution))
        .route("/substitutions/{id}/decision", post(api::decide_substitution))
        .route(
            "/substitutions/suggest/{subject_id}",
            get(api::suggest_substitute),
        )
        .merge(principal_routes)
        // Apply session auth middleware
        .route_layer(middleware::from_fn(move |req, next| {
            auth::session_layer(store.clone(), req, next)
        }));

    let api_routes = Router::new().merge(public_routes).merge(session_routes);

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
