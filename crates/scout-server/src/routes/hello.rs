use axum::{extract::Path, routing::get, Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct HelloResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn hello(Path(user_input): Path<String>) -> Json<HelloResponse> {
    Json(HelloResponse {
        message: format!("Hello, World {}", user_input),
    })
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// Configure routes for this module
pub fn routes() -> Router {
    Router::new()
        .route("/hello/:user_input", get(hello))
        .route("/health", get(health))
}
