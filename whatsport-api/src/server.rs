use anyhow::Result;
use axum::{
    extract::Extension,
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::env;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing;

use whatsport_core::geo::GeocodingClient;
use whatsport_core::AppContext;

use crate::auth;
use crate::handlers;

pub async fn run(ctx: AppContext) -> Result<()> {
    let api_port = ctx.config.server.api_port;
    let app = router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], api_port));
    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(ctx: AppContext) -> Router {
    // Allow specific origins when CORS_ORIGINS is set, permissive otherwise.
    let cors_layer = if let Ok(origins) = env::var("CORS_ORIGINS") {
        let origin_list: Vec<&str> = origins.split(',').map(|s| s.trim()).collect();
        let mut cors = CorsLayer::new();
        for origin in origin_list {
            if let Ok(parsed) = origin.parse::<axum::http::HeaderValue>() {
                cors = cors.allow_origin(parsed);
            }
        }
        cors.allow_methods(Any).allow_headers(Any)
    } else {
        tracing::warn!("CORS_ORIGINS not set, using permissive CORS. Set CORS_ORIGINS for production!");
        CorsLayer::permissive()
    };

    let geocoder = GeocodingClient::new(&ctx.config.geocoding);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/token", post(auth::mint_token))
        // Player reservations
        .route(
            "/api/v1/player/reservations",
            get(handlers::reservations::list_mine).post(handlers::reservations::create),
        )
        .route("/api/v1/player/reservations/:id", get(handlers::reservations::get))
        .route(
            "/api/v1/player/reservations/:id/cancel",
            post(handlers::reservations::cancel),
        )
        // Manager reservations
        .route(
            "/api/v1/manager/reservations/space/:space_id",
            get(handlers::reservations::list_for_space),
        )
        .route("/api/v1/manager/reservations/:id", get(handlers::reservations::get))
        .route(
            "/api/v1/manager/reservations/:id/approve",
            post(handlers::reservations::approve),
        )
        .route(
            "/api/v1/manager/reservations/:id/reject",
            post(handlers::reservations::reject),
        )
        .route(
            "/api/v1/manager/reservations/:id/complete",
            post(handlers::reservations::complete),
        )
        .route("/api/v1/manager/dashboard", get(handlers::reservations::dashboard))
        // Spaces
        .route(
            "/api/v1/manager/spaces",
            get(handlers::spaces::list_mine).post(handlers::spaces::create),
        )
        .route(
            "/api/v1/manager/spaces/:id",
            get(handlers::spaces::get)
                .put(handlers::spaces::update)
                .delete(handlers::spaces::delete),
        )
        .route("/api/v1/manager/spaces/:id/status", post(handlers::spaces::set_status))
        .route("/api/v1/spaces", get(handlers::spaces::search))
        .route("/api/v1/spaces/:id", get(handlers::spaces::get))
        // Events
        .route(
            "/api/v1/events",
            get(handlers::events::list).post(handlers::events::create),
        )
        .route("/api/v1/events/nearby", get(handlers::events::nearby))
        .route(
            "/api/v1/events/:id",
            get(handlers::events::get).put(handlers::events::update),
        )
        .route("/api/v1/events/:id/join", post(handlers::events::join))
        .route("/api/v1/events/:id/leave", post(handlers::events::leave))
        .route("/api/v1/events/:id/cancel", post(handlers::events::cancel))
        .route("/api/v1/events/:id/complete", post(handlers::events::complete))
        // Friendships
        .route("/api/v1/friends", get(handlers::social::list_friendships))
        .route("/api/v1/friends/requests", post(handlers::social::send_friend_request))
        .route("/api/v1/friends/status", get(handlers::social::friendship_status))
        .route("/api/v1/friends/block", post(handlers::social::block_user))
        .route("/api/v1/friends/:id", delete(handlers::social::remove_friend))
        .route(
            "/api/v1/friends/:id/respond",
            post(handlers::social::respond_friend_request),
        )
        .route(
            "/api/v1/friends/:id/cancel",
            post(handlers::social::cancel_friend_request),
        )
        .route("/api/v1/friends/:id/unblock", post(handlers::social::unblock_user))
        // Groups
        .route(
            "/api/v1/groups",
            get(handlers::social::list_groups).post(handlers::social::create_group),
        )
        .route(
            "/api/v1/groups/:id",
            get(handlers::social::get_group).delete(handlers::social::delete_group),
        )
        .route("/api/v1/groups/:id/invite", post(handlers::social::invite_to_group))
        .route("/api/v1/groups/:id/role", post(handlers::social::change_group_role))
        .route("/api/v1/groups/:id/remove", post(handlers::social::remove_group_member))
        .route("/api/v1/groups/:id/leave", post(handlers::social::leave_group))
        // Notifications
        .route("/api/v1/notifications", get(handlers::notifications::list))
        .route("/api/v1/notifications/counts", get(handlers::notifications::counts))
        .route("/api/v1/notifications/read", post(handlers::notifications::mark_many_read))
        .route("/api/v1/notifications/:id/read", post(handlers::notifications::mark_read))
        // Profile
        .route(
            "/api/v1/users/me",
            get(handlers::users::me).put(handlers::users::update_me),
        )
        // Geocoding passthrough
        .route("/api/v1/geo/search", get(handlers::geo::search))
        .route("/api/v1/geo/reverse", get(handlers::geo::reverse))
        .layer(
            ServiceBuilder::new()
                .layer(Extension(ctx))
                .layer(Extension(geocoder))
                .layer(middleware::from_fn(auth::auth_middleware))
                .layer(cors_layer),
        )
}
