use uuid::Uuid;

use crate::{
    auth::AuthProvider,
    db::Repository,
    error::{AppError, AppResult},
};

/// Phrase the caller must type to delete their account
pub const CONFIRMATION_PHRASE: &str = "DELETE MY ACCOUNT";

/// Rows removed per table
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DeletionReport {
    pub reactions: u64,
    pub comments: u64,
    pub suppressions: u64,
    pub user_items: u64,
    pub profiles: u64,
}

/// Fails unless `confirm` is exactly the confirmation phrase
pub fn check_confirmation(confirm: Option<&str>) -> AppResult<()> {
    if confirm != Some(CONFIRMATION_PHRASE) {
        return Err(AppError::InvalidInput(format!(
            "Type \"{}\" to confirm",
            CONFIRMATION_PHRASE
        )));
    }
    Ok(())
}

/// Permanently deletes a user
///
/// Reactions, comments, hidden rows and mutes, user-items and the profile go
/// first, in that order. The auth identity is revoked only once all of them
/// succeeded, so a failure part-way leaves a user who can still sign in and
/// retry.
pub async fn delete_account(
    repo: &dyn Repository,
    auth: &dyn AuthProvider,
    user_id: Uuid,
) -> AppResult<DeletionReport> {
    let report = DeletionReport {
        reactions: repo.delete_reactions_by_user(user_id).await?,
        comments: repo.delete_comments_by_user(user_id).await?,
        suppressions: repo.delete_suppressions(user_id).await?,
        user_items: repo.delete_user_items(user_id).await?,
        profiles: repo.delete_profile(user_id).await?,
    };

    auth.delete_user(user_id).await?;

    tracing::info!(user_id = %user_id, report = ?report, "Account deleted");

    Ok(report)
}
