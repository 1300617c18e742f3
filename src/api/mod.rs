pub mod auth;
pub mod handlers;
pub mod presenter;

use crate::config::Config;
use crate::db::Database;
use anyhow::Result;
use axum::routing::{get, patch, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Start the API server
pub async fn start_api_server(db: Arc<Database>, shutdown: oneshot::Receiver<()>) -> Result<()> {
    let config = Config::get();

    // Create router with all routes
    let mut app = Router::new()
        // General routes
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::get_metrics))
        // Feed routes
        .route("/api/feed", get(handlers::feed::my_feed))
        .route("/api/feed/discover", get(handlers::feed::discover))
        .route("/api/feed/trending", get(handlers::feed::trending))
        // User routes
        .route(
            "/api/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/api/users/:id",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/api/users/:id/profile", patch(handlers::users::update_profile))
        .route("/api/users/:id/follow", post(handlers::users::follow_user))
        .route("/api/users/:id/unfollow", post(handlers::users::unfollow_user))
        .route("/api/users/:id/followers", get(handlers::users::get_followers))
        .route("/api/users/:id/following", get(handlers::users::get_following))
        // Post routes
        .route(
            "/api/posts",
            get(handlers::posts::list_posts).post(handlers::posts::create_post),
        )
        .route(
            "/api/posts/:id",
            get(handlers::posts::get_post)
                .put(handlers::posts::update_post)
                .delete(handlers::posts::delete_post),
        )
        .route("/api/posts/:id/like", post(handlers::posts::like_post))
        .route("/api/posts/:id/unlike", post(handlers::posts::unlike_post))
        .route("/api/posts/:id/likes", get(handlers::posts::get_likes))
        .route(
            "/api/posts/:id/comments",
            get(handlers::posts::get_comments).post(handlers::posts::add_comment),
        )
        // Comment routes
        .route(
            "/api/comments/:id",
            get(handlers::comments::get_comment)
                .put(handlers::comments::update_comment)
                .delete(handlers::comments::delete_comment),
        )
        // Add state and middleware
        .with_state(db.get_pool().clone())
        .layer(TraceLayer::new_for_http());

    if config.api.enable_cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    // Get bind address
    let addr = format!("{}:{}", config.api.host, config.api.port).parse::<SocketAddr>()?;

    // Start server
    info!("Starting API server on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = shutdown.await;
        })
        .await?;

    Ok(())
}
