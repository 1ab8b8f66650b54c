use axum::{routing::get, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn timeline() -> Router<AppState> {
    Router::new()
        .route("/timeline/api/timeline/", get(handlers::timeline))
        .route("/timeline/api/post/:id/", get(handlers::get_post))
        .route("/timeline/api/create_post/", post(handlers::create_post))
        .route("/timeline/api/post/:id/edit/", post(handlers::edit_post))
        .route("/timeline/api/post/:id/delete/", post(handlers::delete_post))
        .route("/timeline/api/post/:id/like/", post(handlers::toggle_like))
        .route("/timeline/api/post/:id/comment/", post(handlers::add_comment))
        .route(
            "/timeline/api/comment/:id/edit/",
            post(handlers::edit_comment),
        )
        .route(
            "/timeline/api/comment/:id/delete/",
            post(handlers::delete_comment),
        )
}

/// Paths used by the older mobile client.
pub fn legacy_mobile() -> Router<AppState> {
    Router::new()
        .route("/timeline/create_post_flutter/", post(handlers::create_post))
        .route(
            "/timeline/like_post_flutter/:id/",
            post(handlers::toggle_like),
        )
        .route(
            "/timeline/add_comment_flutter/:id/",
            post(handlers::add_comment),
        )
}
