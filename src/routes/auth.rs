/// Session Routes
///
/// Token refresh and current-session introspection.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::{authenticate, Claims, TokenEngine};
use crate::error::AppError;

/// Token refresh request
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Freshly minted access token
#[derive(Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the access token expires
    pub expires_in: i64,
}

/// Claims of the presented access token
#[derive(Serialize)]
pub struct SessionResponse {
    pub sub: String,
    pub exp: i64,
}

/// POST /auth/refresh
///
/// Exchange a still-valid refresh token for a new access token.
/// The refresh token itself is not rotated.
///
/// # Errors
/// - 401: Malformed, forged, incomplete or expired refresh token
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    engine: web::Data<TokenEngine>,
) -> Result<HttpResponse, AppError> {
    let claims = authenticate(engine.get_ref(), &form.refresh_token, Utc::now())?;

    let issued = engine.issue_token_pair(&claims.sub, true)?;

    tracing::info!(subject = %claims.sub, "Access token refreshed");

    Ok(HttpResponse::Ok().json(AccessTokenResponse {
        access_token: issued.access_token().to_string(),
        token_type: "Bearer".to_string(),
        expires_in: engine.access_token_lifetime().num_seconds(),
    }))
}

/// GET /api/me
///
/// **Requires** `Authorization: Bearer <access_token>`; claims are injected
/// by the authentication middleware.
pub async fn current_session(claims: web::ReqData<Claims>) -> HttpResponse {
    let claims = claims.into_inner();
    HttpResponse::Ok().json(SessionResponse {
        sub: claims.sub,
        exp: claims.exp,
    })
}
