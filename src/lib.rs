//! CMS Backend - library for app logic and testing

pub mod core;
pub mod db;
pub mod error;
pub mod logging;
pub mod routes;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use crate::db::AppState;

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN.
/// Falls back to localhost dev origins.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .and_then(|s| {
            let origins: Vec<HeaderValue> = s
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        })
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                "http://localhost:3000".parse().unwrap(),
                "http://127.0.0.1:3000".parse().unwrap(),
            ]
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors();

    Router::new()
        .route(
            "/api/blog",
            get(routes::blog::list_posts).post(routes::blog::create_post),
        )
        .route(
            "/api/blog/{slug}",
            get(routes::blog::get_post)
                .patch(routes::blog::update_post)
                .delete(routes::blog::delete_post),
        )
        .route(
            "/api/pages",
            get(routes::pages::list_pages).post(routes::pages::create_page),
        )
        .route(
            "/api/pages/{slug}",
            get(routes::pages::get_page)
                .patch(routes::pages::update_page)
                .delete(routes::pages::delete_page),
        )
        .route(
            "/api/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/api/projects/{slug}",
            get(routes::projects::get_project)
                .patch(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/api/folders",
            get(routes::folders::list_folders).post(routes::folders::create_folder),
        )
        .route(
            "/api/folders/{id}",
            axum::routing::patch(routes::folders::update_folder)
                .delete(routes::folders::delete_folder),
        )
        .route(
            "/api/media",
            get(routes::media::list_media).post(routes::media::create_media),
        )
        .route(
            "/api/media/{id}",
            get(routes::media::get_media)
                .patch(routes::media::update_media)
                .delete(routes::media::delete_media),
        )
        .route(
            "/api/galleries",
            get(routes::galleries::list_galleries).post(routes::galleries::create_gallery),
        )
        .route(
            "/api/galleries/{id}",
            get(routes::galleries::get_gallery)
                .patch(routes::galleries::update_gallery)
                .delete(routes::galleries::delete_gallery),
        )
        .route(
            "/api/galleries/{id}/images",
            post(routes::galleries::add_image),
        )
        .route(
            "/api/galleries/{id}/images/{image_id}",
            axum::routing::patch(routes::galleries::update_image)
                .delete(routes::galleries::remove_image),
        )
        .route(
            "/api/galleries/{id}/reorder",
            post(routes::galleries::reorder_images),
        )
        .route(
            "/api/timeline",
            get(routes::timeline::list_entries).post(routes::timeline::create_entry),
        )
        .route(
            "/api/timeline/reorder",
            post(routes::timeline::reorder_entries),
        )
        .route(
            "/api/timeline/{id}",
            axum::routing::patch(routes::timeline::update_entry)
                .delete(routes::timeline::delete_entry),
        )
        .route(
            "/api/seo/{content_type}/{content_id}",
            get(routes::associations::get_seo)
                .put(routes::associations::upsert_seo)
                .delete(routes::associations::delete_seo),
        )
        .route(
            "/api/social/{content_type}/{content_id}",
            get(routes::associations::get_social)
                .put(routes::associations::upsert_social)
                .delete(routes::associations::delete_social),
        )
        .route(
            "/api/social/{content_type}/{content_id}/links",
            get(routes::associations::share_links),
        )
        .route("/health", get(routes::health::health_ping))
        .route("/health/detailed", get(routes::health::health_detailed))
        .route("/health/database", get(routes::health::health_database))
        .route("/health/ready", get(routes::health::health_ready))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        // Compress responses with gzip/br/zstd automatically
        .layer(CompressionLayer::new())
        // Global 2 MB request body cap
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

/// Run the server (used by main).
pub async fn run() {
    dotenvy::dotenv().ok();

    // Guards must be held for the process lifetime; dropping them early
    // shuts down the background log-writer threads and loses buffered
    // log lines.
    let _log_guards = logging::init();

    routes::health::init_start_time();

    // The pool is the single storage dependency: opened here, threaded
    // through handlers as state, closed on shutdown. When the database is
    // unreachable at boot we fall back to a lazy pool so health endpoints
    // can report the outage instead of the process dying.
    let db_config = db::DbConfig::default();
    let pool = match db::connect(&db_config).await {
        Ok(pool) => {
            if let Err(e) = db::run_migrations(&pool).await {
                tracing::error!("Failed to run database migrations: {}", e);
            }
            pool
        }
        Err(e) => {
            tracing::warn!(
                "Failed to initialize database pool: {}. Continuing with lazy pool.",
                e
            );
            db::connect_lazy(&db_config).expect("Failed to build lazy database pool")
        }
    };

    let state = AppState { pool: pool.clone() };
    let app = create_app(state);

    // Bind address is configurable via HOST / PORT env vars.
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3001);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("Invalid HOST/PORT configuration");
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    pool.close().await;
    tracing::info!("Database pool closed, exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> AppState {
        let config = db::DbConfig {
            url: "postgresql://127.0.0.1:1/nowhere".to_string(),
            acquire_timeout_secs: 1,
            ..db::DbConfig::default()
        };
        AppState {
            pool: db::connect_lazy(&config).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_app_returns_router() {
        let _app = create_app(test_state());
        // Route table assembles without panicking (no conflicts).
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use tower::ServiceExt;

        let app = create_app(test_state());
        let res = app
            .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_content_type_is_400_without_db() {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use tower::ServiceExt;

        // Tag parsing happens before any storage access.
        let app = create_app(test_state());
        let uri = format!("/api/seo/gallery/{}", uuid::Uuid::new_v4());
        let res = app
            .oneshot(Request::get(&uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
