//! Bearer-token identity for API requests.
//!
//! Full account management (JWT, session cookies, multi-tenant roles)
//! lives in an external service; this layer only resolves an opaque
//! bearer token to a registered user.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use std::sync::Arc;

use crate::error::GameError;
use crate::state::AppState;
use crate::types::User;

/// Extractor resolving `Authorization: Bearer <token>` to a user
pub struct CurrentUser(pub User);

pub(crate) fn parse_bearer(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = GameError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_bearer)
            .ok_or(GameError::Unauthorized)?;

        state
            .get_user_by_token(token)
            .await
            .map(CurrentUser)
            .ok_or(GameError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer("Bearer ABC123"), Some("ABC123"));
        assert_eq!(parse_bearer("Bearer  ABC123 "), Some("ABC123"));
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("Basic ABC123"), None);
        assert_eq!(parse_bearer("ABC123"), None);
    }
}
