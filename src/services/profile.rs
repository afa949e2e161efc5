use uuid::Uuid;

use crate::{
    auth::AuthUser,
    db::Repository,
    error::{AppError, AppResult},
    models::{LibraryFilter, NewProfile, Profile, ProfileUpdate, PublicProfile},
};

/// Library rows shown on a public profile
pub const PROFILE_ACTIVITY_LIMIT: i64 = 40;

/// Returns the caller's profile, creating the default one on first use
pub async fn ensure_profile(repo: &dyn Repository, user: &AuthUser) -> AppResult<Profile> {
    if let Some(profile) = repo.find_profile(user.id).await? {
        return Ok(profile);
    }

    let email = user.email.as_deref();
    let profile = match repo.insert_profile(&NewProfile::for_user(user.id, email)).await {
        // Short default name already belongs to someone else
        Err(AppError::InvalidInput(_)) => {
            repo.insert_profile(&NewProfile::for_user_full_id(user.id, email))
                .await?
        }
        result => result?,
    };

    tracing::info!(user_id = %user.id, username = %profile.username, "Profile created");

    Ok(profile)
}

/// Applies a profile edit; the username is trimmed and must not be empty
pub async fn update_profile(
    repo: &dyn Repository,
    user: &AuthUser,
    mut update: ProfileUpdate,
) -> AppResult<Profile> {
    update.username = update.username.trim().to_string();
    if update.username.is_empty() {
        return Err(AppError::InvalidInput("username is required".to_string()));
    }
    update.avatar_url = update
        .avatar_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty());

    ensure_profile(repo, user).await?;

    repo.update_profile(user.id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}

/// A user's public page
///
/// Private profiles are reported as missing to everyone but their owner.
pub async fn public_profile(
    repo: &dyn Repository,
    username: &str,
    viewer: Option<Uuid>,
) -> AppResult<PublicProfile> {
    let not_found = || AppError::NotFound(format!("User '{}' not found", username));

    let profile = repo
        .find_profile_by_username(username)
        .await?
        .ok_or_else(not_found)?;

    if !profile.privacy_public && viewer != Some(profile.id) {
        return Err(not_found());
    }

    let activity = repo
        .list_library(
            profile.id,
            LibraryFilter::All,
            Some(PROFILE_ACTIVITY_LIMIT),
        )
        .await?;

    Ok(PublicProfile {
        id: profile.id,
        username: profile.username,
        avatar_url: profile.avatar_url,
        activity,
    })
}
