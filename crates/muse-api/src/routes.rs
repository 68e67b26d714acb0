use axum::{
    Json, Router, middleware,
    routing::{get, post, put},
};
use serde_json::json;

use crate::middleware::{require_admin, require_auth};
use crate::{AppState, auth, content, favorites, notifications};

/// Build the full HTTP surface. Callers add transport layers (CORS, tracing).
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/admin/init", post(auth::admin_init));

    let protected_routes = Router::new()
        .route("/article/today", get(content::article_today))
        .route("/quote/today", get(content::quote_today))
        .route("/articles", get(content::list_articles))
        .route("/quotes", get(content::list_quotes))
        .route(
            "/notification/settings",
            get(notifications::get_settings).post(notifications::update_settings),
        )
        .route("/favorite/toggle", post(favorites::toggle_favorite))
        .route("/favorites", get(favorites::list_favorites))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Layers run bottom-up: auth first, then the admin check
    let admin_routes = Router::new()
        .route("/admin/article", post(content::create_article))
        .route("/admin/article/add", post(content::create_article))
        .route(
            "/admin/article/{id}",
            put(content::update_article).delete(content::delete_article),
        )
        .route("/admin/article/set-today/{id}", post(content::set_today_article))
        .route("/admin/quote", post(content::create_quote))
        .route("/admin/quote/add", post(content::create_quote))
        .route(
            "/admin/quote/{id}",
            put(content::update_quote).delete(content::delete_quote),
        )
        .route("/admin/quote/set-today/{id}", post(content::set_today_quote))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .with_state(state)
}
