//! Authentication middleware
//!
//! Validates JWT bearer tokens and exposes the acting user, business, and
//! store to handlers. Session issuance (login, refresh) is handled by a
//! separate identity service and is not part of this backend.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::AppState;

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: uuid::Uuid,
    pub business_id: uuid::Uuid,
    /// Store the user is currently operating; set when a store is selected
    /// in the app and carried in the token.
    pub store_id: uuid::Uuid,
}

/// Authentication middleware that validates JWT tokens against the
/// configured secret and inserts an [`AuthUser`] into request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => {
            return AppError::Unauthorized(
                "Missing or invalid Authorization header".to_string(),
            )
            .into_response();
        }
    };

    let claims = match decode_jwt(token, &state.config.jwt.secret) {
        Ok(claims) => claims,
        Err(msg) => {
            return AppError::Unauthorized(msg).into_response();
        }
    };

    // Parse UUIDs from claims
    let user_id = match uuid::Uuid::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => {
            return AppError::Unauthorized("Invalid user ID in token".to_string()).into_response()
        }
    };

    let business_id = match uuid::Uuid::parse_str(&claims.business_id) {
        Ok(id) => id,
        Err(_) => {
            return AppError::Unauthorized("Invalid business ID in token".to_string())
                .into_response()
        }
    };

    let store_id = match uuid::Uuid::parse_str(&claims.store_id) {
        Ok(id) => id,
        Err(_) => {
            return AppError::Unauthorized("Invalid store ID in token".to_string()).into_response()
        }
    };

    let auth_user = AuthUser {
        user_id,
        business_id,
        store_id,
    };

    request.extensions_mut().insert(auth_user);

    next.run(request).await
}

/// JWT claims structure
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Claims {
    sub: String,
    business_id: String,
    store_id: String,
    exp: i64,
    iat: i64,
}

/// Decode and validate JWT token
fn decode_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn claims() -> Claims {
        let now = chrono::Utc::now().timestamp();
        Claims {
            sub: uuid::Uuid::new_v4().to_string(),
            business_id: uuid::Uuid::new_v4().to_string(),
            store_id: uuid::Uuid::new_v4().to_string(),
            exp: now + 3600,
            iat: now,
        }
    }

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_token_signed_with_configured_secret() {
        let claims = claims();
        let token = sign(&claims, "store-secret");

        let decoded = decode_jwt(&token, "store-secret").unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.store_id, claims.store_id);
    }

    #[test]
    fn rejects_token_signed_with_different_secret() {
        let token = sign(&claims(), "store-secret");
        assert!(decode_jwt(&token, "some-other-secret").is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let mut expired = claims();
        expired.exp = chrono::Utc::now().timestamp() - 3600;
        let token = sign(&expired, "store-secret");

        assert!(decode_jwt(&token, "store-secret").is_err());
    }
}
