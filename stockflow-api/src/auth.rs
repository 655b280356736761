use axum::{extract::State, routing::post, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, middleware::auth::StaffClaims, state::AppState};

#[derive(Debug, Deserialize)]
struct StaffLoginRequest {
    staff_id: String,
    role: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
}

pub fn routes() -> Router<AppState> {
    // Dev token issuance; real deployments sit behind the platform's SSO.
    Router::new().route("/v1/auth/staff", post(login_staff))
}

async fn login_staff(
    State(state): State<AppState>,
    Json(req): Json<StaffLoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let claims = StaffClaims {
        sub: req.staff_id,
        role: req.role,
        exp: (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))?;

    Ok(Json(AuthResponse { token }))
}
