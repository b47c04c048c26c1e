use crate::display::HistoryEntry;
use crate::journal::JournalAgent;
use crate::models::Message;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    routing::{ delete, get, post },
    Json,
    Router,
    extract::{ Path, Query, Request, State },
    middleware::{ self, Next },
    response::{ IntoResponse, Response },
    http::StatusCode,
};
use serde::{ Deserialize, Serialize };
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, error };

#[derive(Serialize)]
struct DeleteResponse {
    id: String,
    removed: bool,
}

#[derive(Serialize)]
struct SessionResponse {
    onboarding_completed: bool,
    greeting: String,
}

#[derive(Deserialize)]
struct HistoryQuery {
    utc_offset_minutes: Option<i32>,
}

#[derive(Clone)]
struct AppState {
    agent: Arc<JournalAgent>,
    api_key: Option<String>,
}

pub fn router(agent: Arc<JournalAgent>, api_key: Option<String>) -> Router {
    let state = AppState { agent, api_key };
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/messages", get(messages_handler))
        .route("/api/history", get(history_handler))
        .route("/api/history/{id}", delete(delete_handler))
        .route("/api/session", get(session_handler))
        .route("/api/session/onboarding", post(onboarding_handler))
        .route("/api/data", delete(clear_handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .layer(cors)
        .with_state(state)
}

async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Some(required) = state.api_key.as_deref() {
        let provided = req
            .headers()
            .get("X-API-Key")
            .and_then(|v| v.to_str().ok());
        if provided != Some(required) {
            return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        }
    }
    next.run(req).await
}

pub async fn start_http_server(
    http_port: u16,
    agent: Arc<JournalAgent>,
    api_key: Option<String>
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = format!("0.0.0.0:{}", http_port).parse::<SocketAddr>()?;
    info!("Starting HTTP API server on: http://{}", addr);

    let app = router(agent, api_key);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app.into_make_service()).await {
            error!("HTTP server error: {}", e);
        }
    });

    info!("HTTP server started");
    Ok(())
}

async fn messages_handler(State(state): State<AppState>) -> Json<Vec<Message>> {
    Json(state.agent.conversation().await)
}

async fn history_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>
) -> Json<Vec<HistoryEntry>> {
    Json(state.agent.history(query.utc_offset_minutes).await)
}

async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>
) -> impl IntoResponse {
    let removed = state.agent.delete(&id).await;
    let code = if removed { StatusCode::OK } else { StatusCode::NOT_FOUND };
    (code, Json(DeleteResponse { id, removed }))
}

async fn session_handler(State(state): State<AppState>) -> Json<SessionResponse> {
    let session = state.agent.session().await;
    Json(SessionResponse {
        onboarding_completed: session.onboarding_completed,
        greeting: state.agent.greeting().to_string(),
    })
}

async fn onboarding_handler(State(state): State<AppState>) -> Json<SessionResponse> {
    let session = state.agent.complete_onboarding().await;
    Json(SessionResponse {
        onboarding_completed: session.onboarding_completed,
        greeting: state.agent.greeting().to_string(),
    })
}

async fn clear_handler(State(state): State<AppState>) -> Json<SessionResponse> {
    let session = state.agent.clear().await;
    Json(SessionResponse {
        onboarding_completed: session.onboarding_completed,
        greeting: state.agent.greeting().to_string(),
    })
}
