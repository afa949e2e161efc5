//! Caller identity
//!
//! Sign-in and token issuance stay with the hosted auth service. This module
//! only resolves an access token to a user and revokes identities on account
//! deletion.
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{api::AppState, error::AppError, error::AppResult};

pub mod gotrue;

pub use gotrue::GoTrueAuth;

/// Cookie carrying the access token when the client does not send a bearer header
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";

/// Authenticated user as reported by the auth service
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolves an access token; `Ok(None)` when the token is invalid or expired
    async fn user_for_token(&self, token: &str) -> AppResult<Option<AuthUser>>;

    /// Permanently removes the identity
    async fn delete_user(&self, user_id: Uuid) -> AppResult<()>;
}

/// Pulls the access token from `Authorization: Bearer` or the session cookie
pub fn access_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == ACCESS_TOKEN_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|t| !t.is_empty())
}

/// Resolves the caller from request headers, rejecting anonymous callers
pub async fn authenticate(auth: &dyn AuthProvider, headers: &HeaderMap) -> AppResult<AuthUser> {
    let token = access_token(headers).ok_or(AppError::Unauthorized)?;
    auth.user_for_token(&token)
        .await?
        .ok_or(AppError::Unauthorized)
}

/// Extractor for routes that reject anonymous callers with 401
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(state.auth.as_ref(), &parts.headers).await?;
        Ok(CurrentUser(user))
    }
}

/// Extractor for routes that behave differently for signed-in viewers
///
/// Any auth failure downgrades the caller to anonymous.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|u| u.id)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = access_token(&parts.headers) else {
            return Ok(MaybeUser(None));
        };

        match state.auth.user_for_token(&token).await {
            Ok(user) => Ok(MaybeUser(user)),
            Err(e) => {
                tracing::warn!(error = %e, "Auth lookup failed, continuing anonymously");
                Ok(MaybeUser(None))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn headers(builder: axum::http::request::Builder) -> HeaderMap {
        builder.body(()).unwrap().into_parts().0.headers
    }

    #[test]
    fn test_token_from_bearer_header() {
        let headers = headers(Request::builder().header("authorization", "Bearer abc.def"));
        assert_eq!(access_token(&headers), Some("abc.def".to_string()));
    }

    #[test]
    fn test_token_from_cookie() {
        let headers = headers(
            Request::builder().header("cookie", "theme=dark; sb-access-token=tok123; other=1"),
        );
        assert_eq!(access_token(&headers), Some("tok123".to_string()));
    }

    #[test]
    fn test_bearer_wins_over_cookie() {
        let headers = headers(
            Request::builder()
                .header("authorization", "Bearer header-token")
                .header("cookie", "sb-access-token=cookie-token"),
        );
        assert_eq!(access_token(&headers), Some("header-token".to_string()));
    }

    #[test]
    fn test_no_token() {
        let headers = headers(Request::builder().header("authorization", "Basic xyz"));
        assert_eq!(access_token(&headers), None);
    }

    #[test]
    fn test_empty_cookie_value_ignored() {
        let headers = headers(Request::builder().header("cookie", "sb-access-token="));
        assert_eq!(access_token(&headers), None);
    }

    #[tokio::test]
    async fn test_authenticate_resolves_user() {
        let mut auth = MockAuthProvider::new();
        auth.expect_user_for_token()
            .withf(|token| token == "tok")
            .returning(|_| {
                Ok(Some(AuthUser {
                    id: Uuid::from_u128(1),
                    email: None,
                }))
            });

        let headers = headers(Request::builder().header("authorization", "Bearer tok"));
        let user = authenticate(&auth, &headers).await.unwrap();
        assert_eq!(user.id, Uuid::from_u128(1));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_unknown_token() {
        let mut auth = MockAuthProvider::new();
        auth.expect_user_for_token().returning(|_| Ok(None));

        let headers = headers(Request::builder().header("authorization", "Bearer stale"));
        let err = authenticate(&auth, &headers).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn test_authenticate_without_token_skips_lookup() {
        let mut auth = MockAuthProvider::new();
        auth.expect_user_for_token().never();

        let err = authenticate(&auth, &HeaderMap::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }
}
