use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{
    api::AppState,
    auth::{CurrentUser, MaybeUser},
    error::AppResult,
    models::{Profile, ProfileUpdate, PublicProfile},
    services::profile,
};

/// The caller's own profile, created on first visit
pub async fn own(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Profile>> {
    let profile = profile::ensure_profile(state.repo.as_ref(), &user).await?;
    Ok(Json(profile))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> AppResult<Json<Profile>> {
    let profile = profile::update_profile(state.repo.as_ref(), &user, update).await?;
    Ok(Json(profile))
}

pub async fn public(
    State(state): State<Arc<AppState>>,
    viewer: MaybeUser,
    Path(username): Path<String>,
) -> AppResult<Json<PublicProfile>> {
    let page = profile::public_profile(state.repo.as_ref(), &username, viewer.id()).await?;
    Ok(Json(page))
}
