//! Documentation of the Peli rating backend.
//!
//! Peli is a dining-hall rating platform; this service is the ingestion and
//! quality-control side of it. The frontend only renders menus and collects
//! star ratings — everything that decides whether a rating counts, and what
//! the community numbers are, lives here.
//!
//!
//!
//! # Submission Flow
//!
//! - User submits {user, item, stars, comment} to `POST /ratings`
//! - The QC pipeline resolves the item's serving period from the catalog
//! - The content filter checks star range, comment length, and the denylist
//! - The dedup ledger enforces one rating per user per serving period
//! - Approved ratings fold into the item's aggregate (count, histogram,
//!   mean, confidence)
//! - Every attempt, approved or rejected, lands in the append-only QC log
//!
//!
//!
//! # Notes
//!
//! ## In-memory state
//!
//! All pipeline state (ledger, aggregates, QC log) is in-process, behind
//! per-collection and per-item locks. The dedup check and the aggregate
//! update each need an atomic read-modify-write; keyed in-memory maps give
//! us that without a round trip, and the whole pipeline stays synchronous
//! from the caller's point of view: when `POST /ratings` returns, the log
//! entry and the aggregate update are already visible to every reader.
//!
//! ## Dedup counts attempts, not acceptances
//!
//! "One rating per item per meal period" is enforced at the ledger. The
//! content filter runs first, so a comment rejection does not consume the
//! user's slot — only a filter-passing submission does, and that reservation
//! is never rolled back.
//!
//!
//!
//! # Admin
//!
//! The dashboard reads `GET /admin/summary`, `GET /admin/qc-log` (paginated,
//! newest first, CSV export available), and `GET /admin/top-items`.

use std::time::Duration;

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod aggregate;
pub mod catalog;
pub mod confidence;
pub mod config;
pub mod error;
pub mod filter;
pub mod ledger;
pub mod models;
pub mod qc;
pub mod qc_log;
pub mod query;
pub mod routes;
pub mod state;

use routes::{
    export_handler, item_handler, menu_handler, qc_log_handler, submit_handler, summary_handler,
    top_items_handler,
};
use state::AppState;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new();

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route("/ratings", post(submit_handler))
        .route("/items", get(menu_handler))
        .route("/items/{id}", get(item_handler))
        .route("/admin/summary", get(summary_handler))
        .route("/admin/qc-log", get(qc_log_handler))
        .route("/admin/qc-log/export", get(export_handler))
        .route("/admin/top-items", get(top_items_handler))
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
