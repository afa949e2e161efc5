use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::{
    api::AppState,
    auth,
    error::AppResult,
    services::account,
};

#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    #[serde(default)]
    confirm: Option<String>,
}

/// Handler for permanent account deletion
///
/// The confirmation phrase is checked before the caller is authenticated, so
/// a missing or wrong phrase is a 400 even without a token.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Option<Json<DeleteAccountRequest>>,
) -> AppResult<Json<Value>> {
    let confirm = request.as_ref().and_then(|Json(r)| r.confirm.as_deref());
    account::check_confirmation(confirm)?;

    let user = auth::authenticate(state.auth.as_ref(), &headers).await?;
    account::delete_account(state.repo.as_ref(), state.auth.as_ref(), user.id).await?;

    Ok(super::ok())
}
