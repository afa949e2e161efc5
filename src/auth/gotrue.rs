use reqwest::{Client as HttpClient, StatusCode};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::{AuthProvider, AuthUser};

/// Client for the hosted auth service's REST API
#[derive(Clone)]
pub struct GoTrueAuth {
    http_client: HttpClient,
    base_url: String,
    anon_key: String,
    service_role_key: String,
}

impl GoTrueAuth {
    pub fn new(base_url: String, anon_key: String, service_role_key: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            service_role_key,
        }
    }
}

#[async_trait::async_trait]
impl AuthProvider for GoTrueAuth {
    async fn user_for_token(&self, token: &str) -> AppResult<Option<AuthUser>> {
        let url = format!("{}/auth/v1/user", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(Some(response.json().await?)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AppError::ExternalApi(format!(
                    "Auth service returned status {}: {}",
                    status, body
                )))
            }
        }
    }

    async fn delete_user(&self, user_id: Uuid) -> AppResult<()> {
        let url = format!("{}/auth/v1/admin/users/{}", self.base_url, user_id);

        let response = self
            .http_client
            .delete(&url)
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(user_id = %user_id, status = %status, "Auth admin delete failed");
            return Err(AppError::Internal(format!(
                "Admin delete failed: {} {}",
                status, body
            )));
        }

        tracing::info!(user_id = %user_id, "Auth identity deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::HeaderMap,
        routing::{delete, get},
        Json, Router,
    };
    use serde_json::json;

    const USER_ID: &str = "11111111-2222-4333-8444-555555555555";

    async fn spawn_auth_server() -> String {
        let app = Router::new()
            .route(
                "/auth/v1/user",
                get(|headers: HeaderMap| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    let has_key = headers.get("apikey").is_some();
                    if auth == "Bearer good" && has_key {
                        (
                            axum::http::StatusCode::OK,
                            Json(json!({ "id": USER_ID, "email": "ada@example.com" })),
                        )
                    } else if auth == "Bearer broken" {
                        (
                            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                            Json(json!({ "msg": "down" })),
                        )
                    } else {
                        (
                            axum::http::StatusCode::UNAUTHORIZED,
                            Json(json!({ "msg": "invalid JWT" })),
                        )
                    }
                }),
            )
            .route(
                "/auth/v1/admin/users/:id",
                delete(|Path(id): Path<String>, headers: HeaderMap| async move {
                    let is_service = headers
                        .get("authorization")
                        .and_then(|h| h.to_str().ok())
                        == Some("Bearer service");
                    if is_service && id == USER_ID {
                        axum::http::StatusCode::OK
                    } else {
                        axum::http::StatusCode::NOT_FOUND
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: String) -> GoTrueAuth {
        GoTrueAuth::new(base_url, "anon".to_string(), "service".to_string())
    }

    #[tokio::test]
    async fn test_valid_token_resolves_user() {
        let auth = client(spawn_auth_server().await);
        let user = auth.user_for_token("good").await.unwrap().unwrap();
        assert_eq!(user.id, Uuid::parse_str(USER_ID).unwrap());
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn test_invalid_token_is_anonymous() {
        let auth = client(spawn_auth_server().await);
        assert_eq!(auth.user_for_token("expired").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_auth_outage_is_an_error() {
        let auth = client(spawn_auth_server().await);
        assert!(auth.user_for_token("broken").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_user_uses_service_role() {
        let auth = client(spawn_auth_server().await);
        auth.delete_user(Uuid::parse_str(USER_ID).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_unknown_user_fails() {
        let auth = client(spawn_auth_server().await);
        let err = auth.delete_user(Uuid::nil()).await.unwrap_err();
        assert!(err.to_string().contains("Admin delete failed"));
    }
}
