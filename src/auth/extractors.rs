use std::net::SocketAddr;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::errors::ErrorKind;
use tracing::{info, warn};

use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;

/// Proves which user a request claims to be. Verifies the bearer token and
/// yields the subject id; fetching the actual user record is the handler's
/// job.
#[derive(Debug)]
pub struct AuthUser(pub i32);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|c| c.0.ip().to_string())
            .unwrap_or_else(|| "unknown".into());

        // A missing header and a malformed scheme both count as "no token".
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "));
        let Some(token) = token else {
            warn!(ip = %ip, "authentication failed: no token provided");
            return Err(ApiError::MissingToken);
        };

        match keys.verify(token) {
            Ok(claims) => {
                info!(user_id = claims.sub, "user authenticated");
                Ok(AuthUser(claims.sub))
            }
            Err(e) => {
                // Expired and invalid differ only in the log, never in the
                // response.
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        warn!(ip = %ip, "authentication failed: token expired");
                    }
                    _ => {
                        warn!(ip = %ip, error = %e, "authentication failed: invalid token");
                    }
                }
                Err(ApiError::InvalidToken)
            }
        }
    }
}
