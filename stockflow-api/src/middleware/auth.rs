use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StaffClaims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

// ============================================================================
// Staff Authentication Middleware
// ============================================================================

pub async fn staff_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract token from Authorization header
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Decode and validate JWT
    let token_data = decode::<StaffClaims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    // 3. Check role is staff-tier
    if !matches!(
        token_data.claims.role.as_str(),
        "STAFF" | "MANAGER" | "ADMIN"
    ) {
        return Err(StatusCode::FORBIDDEN);
    }

    // 4. Inject claims into request extensions
    req.extensions_mut().insert(token_data.claims);

    Ok(next.run(req).await)
}

// ============================================================================
// Role Check Helper
// ============================================================================

/// Seeding stock counts is reserved to the management tier
pub fn is_stock_admin(claims: &StaffClaims) -> bool {
    matches!(claims.role.as_str(), "MANAGER" | "ADMIN")
}
