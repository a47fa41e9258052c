use actix_web::{web, HttpResponse};

use crate::auth::TokenEngine;

/// GET /health_check
///
/// Reports liveness and the signing algorithm the engine was started with.
pub async fn health_check(engine: web::Data<TokenEngine>) -> HttpResponse {
    tracing::debug!("Health check endpoint called");
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "algorithm": engine.algorithm().as_str(),
    }))
}
