use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::{middleware as axum_middleware, Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::middleware::auth::auth_middleware;
use crate::middleware::logging;
use crate::state::AppState;
use crate::websocket::handler::ws_handler;

pub mod conversations;
pub mod messages;

use conversations::{create_conversation, get_conversation, list_conversations};
use messages::{list_messages, mark_conversation_read, send_message, unread_count};

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub fn build_router(state: AppState) -> Router {
    // REST surface sits behind bearer auth; the websocket route does its own
    // token handling (browsers cannot set headers on upgrade requests) and
    // the health probe stays open.
    let api = Router::new()
        .route(
            "/v1/messages/conversations",
            post(create_conversation).get(list_conversations),
        )
        .route("/v1/messages/conversations/:id", get(get_conversation))
        .route(
            "/v1/messages/conversations/:id/messages",
            post(send_message),
        )
        .route("/v1/messages/unread", get(unread_count))
        .route("/v1/messages/:id", get(list_messages))
        .route("/v1/messages/:id/read", put(mark_conversation_read))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let router = Router::new()
        .route("/v1/health", get(health))
        .route("/ws/messages/:conversation_id", get(ws_handler))
        .merge(api)
        .layer(cors_layer(&state.config.cors_allowed_origin));

    logging::add_tracing(router).with_state(state)
}

fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE]);

    match allowed_origin.parse::<HeaderValue>() {
        Ok(origin) if allowed_origin != "*" => cors.allow_origin(origin),
        _ => cors.allow_origin(Any),
    }
}
