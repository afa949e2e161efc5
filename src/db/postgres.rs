use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::{
    db::Repository,
    error::{AppError, AppResult},
    models::{
        library::LibraryRow,
        social::{CommentRow, FeedRow, ReviewRow},
        Comment, CommentCount, FeedEntry, Item, LibraryEntry, LibraryFilter, MediaType, NewItem,
        NewProfile, Profile, ProfileUpdate, ReactionCount, Review, UserItem, UserItemPatch,
    },
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

const PROFILE_COLUMNS: &str = "id, username, avatar_url, privacy_public, created_at";

const ITEM_COLUMNS: &str = "id, tmdb_id, media_type, title, poster_path, release_date, genres";

const USER_ITEM_COLUMNS: &str =
    "id, user_id, item_id, status, favorite, rating, review, created_at, updated_at";

/// Columns of a user-item joined with its item (`ui`, `i`)
const JOINED_ITEM_COLUMNS: &str = "ui.id, ui.status, ui.favorite, ui.rating, ui.review, ui.updated_at, \
     i.id AS item_id, i.tmdb_id, i.media_type, i.title, i.poster_path, i.release_date, i.genres";

/// [`Repository`] backed by Postgres
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

const USERNAME_TAKEN: &str = "username already taken";

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps constraint violations caused by caller input to a 400
fn reject_violation(e: sqlx::Error, message: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() || db.is_foreign_key_violation() => {
            AppError::InvalidInput(message.to_string())
        }
        _ => AppError::Database(e),
    }
}

fn library_condition(filter: LibraryFilter) -> &'static str {
    match filter {
        LibraryFilter::All => "",
        LibraryFilter::Watchlist => "AND ui.status = 'watchlist'",
        LibraryFilter::Completed => "AND ui.status = 'completed'",
        LibraryFilter::Favorites => "AND ui.favorite",
    }
}

#[async_trait::async_trait]
impl Repository for PgRepository {
    async fn find_profile(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {} FROM profiles WHERE id = $1",
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn find_profile_by_username(&self, username: &str) -> AppResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {} FROM profiles WHERE username = $1",
            PROFILE_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn insert_profile(&self, profile: &NewProfile) -> AppResult<Profile> {
        // A concurrent first request may have created the row already
        let inserted = sqlx::query_as::<_, Profile>(&format!(
            r#"
            INSERT INTO profiles (id, username, avatar_url)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        ))
        .bind(profile.id)
        .bind(&profile.username)
        .bind(&profile.avatar_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| reject_violation(e, USERNAME_TAKEN))?;

        Ok(inserted)
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> AppResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            r#"
            UPDATE profiles
            SET username = $2, avatar_url = $3, privacy_public = $4
            WHERE id = $1
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .bind(&update.username)
        .bind(&update.avatar_url)
        .bind(update.privacy_public)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| reject_violation(e, USERNAME_TAKEN))?;

        Ok(profile)
    }

    async fn delete_profile(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn find_item_by_catalog_id(
        &self,
        tmdb_id: i64,
        media_type: MediaType,
    ) -> AppResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(&format!(
            "SELECT {} FROM items WHERE tmdb_id = $1 AND media_type = $2",
            ITEM_COLUMNS
        ))
        .bind(tmdb_id)
        .bind(media_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn find_item_by_title(
        &self,
        title: &str,
        media_type: MediaType,
    ) -> AppResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(&format!(
            r#"
            SELECT {} FROM items
            WHERE media_type = $1 AND lower(title) = lower($2)
            ORDER BY id
            LIMIT 1
            "#,
            ITEM_COLUMNS
        ))
        .bind(media_type)
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn insert_item(&self, item: &NewItem) -> AppResult<Item> {
        let inserted = sqlx::query_as::<_, Item>(&format!(
            r#"
            INSERT INTO items (tmdb_id, media_type, title, poster_path, release_date, genres)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(item.tmdb_id)
        .bind(item.media_type)
        .bind(&item.title)
        .bind(&item.poster_path)
        .bind(&item.release_date)
        .bind(&item.genres)
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }

    async fn find_user_item(&self, user_id: Uuid, item_id: i64) -> AppResult<Option<UserItem>> {
        let row = sqlx::query_as::<_, UserItem>(&format!(
            "SELECT {} FROM user_items WHERE user_id = $1 AND item_id = $2",
            USER_ITEM_COLUMNS
        ))
        .bind(user_id)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn upsert_user_item(
        &self,
        user_id: Uuid,
        item_id: i64,
        patch: &UserItemPatch,
    ) -> AppResult<UserItem> {
        let row = sqlx::query_as::<_, UserItem>(&format!(
            r#"
            INSERT INTO user_items (user_id, item_id, status, favorite, rating, review)
            VALUES ($1, $2, $3, COALESCE($4, FALSE), $5, $6)
            ON CONFLICT (user_id, item_id) DO UPDATE SET
                status     = CASE WHEN $7 THEN EXCLUDED.status ELSE user_items.status END,
                favorite   = CASE WHEN $4 IS NOT NULL THEN EXCLUDED.favorite ELSE user_items.favorite END,
                rating     = CASE WHEN $8 THEN EXCLUDED.rating ELSE user_items.rating END,
                review     = CASE WHEN $9 THEN EXCLUDED.review ELSE user_items.review END,
                updated_at = now()
            RETURNING {}
            "#,
            USER_ITEM_COLUMNS
        ))
        .bind(user_id)
        .bind(item_id)
        .bind(patch.status.flatten())
        .bind(patch.favorite)
        .bind(patch.rating.flatten())
        .bind(patch.review.clone().flatten())
        .bind(patch.status.is_some())
        .bind(patch.rating.is_some())
        .bind(patch.review.is_some())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_library(
        &self,
        user_id: Uuid,
        filter: LibraryFilter,
        limit: Option<i64>,
    ) -> AppResult<Vec<LibraryEntry>> {
        let rows = sqlx::query_as::<_, LibraryRow>(&format!(
            r#"
            SELECT {}
            FROM user_items ui
            JOIN items i ON i.id = ui.item_id
            WHERE ui.user_id = $1 {}
            ORDER BY ui.updated_at DESC
            LIMIT $2
            "#,
            JOINED_ITEM_COLUMNS,
            library_condition(filter)
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LibraryEntry::from).collect())
    }

    async fn list_reviews(&self, item_id: i64, limit: i64) -> AppResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT ui.id, ui.user_id, ui.rating, ui.review, ui.favorite, ui.updated_at,
                   p.username, p.avatar_url
            FROM user_items ui
            LEFT JOIN profiles p ON p.id = ui.user_id
            WHERE ui.item_id = $1 AND ui.review IS NOT NULL
            ORDER BY ui.updated_at DESC
            LIMIT $2
            "#,
        )
        .bind(item_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    async fn feed_page(
        &self,
        before: Option<DateTime<Utc>>,
        limit: i64,
    ) -> AppResult<Vec<FeedEntry>> {
        let rows = sqlx::query_as::<_, FeedRow>(&format!(
            r#"
            SELECT ui.user_id, {}, p.username, p.avatar_url
            FROM user_items ui
            JOIN items i ON i.id = ui.item_id
            LEFT JOIN profiles p ON p.id = ui.user_id
            WHERE $1::timestamptz IS NULL OR ui.updated_at < $1
            ORDER BY ui.updated_at DESC
            LIMIT $2
            "#,
            JOINED_ITEM_COLUMNS
        ))
        .bind(before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(FeedEntry::from).collect())
    }

    async fn delete_user_items(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM user_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn insert_reaction(
        &self,
        user_id: Uuid,
        user_item_id: i64,
        emoji: &str,
    ) -> AppResult<()> {
        sqlx::query("INSERT INTO reactions (user_id, user_item_id, emoji) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(user_item_id)
            .bind(emoji)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find_reaction(
        &self,
        user_id: Uuid,
        user_item_id: i64,
        emoji: &str,
    ) -> AppResult<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id FROM reactions
            WHERE user_id = $1 AND user_item_id = $2 AND emoji = $3
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(user_item_id)
        .bind(emoji)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }

    async fn delete_reaction(&self, reaction_id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM reactions WHERE id = $1")
            .bind(reaction_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn reaction_counts(&self, user_item_ids: &[i64]) -> AppResult<Vec<ReactionCount>> {
        let counts = sqlx::query_as::<_, ReactionCount>(
            r#"
            SELECT user_item_id, emoji, COUNT(*) AS count
            FROM reactions
            WHERE user_item_id = ANY($1)
            GROUP BY user_item_id, emoji
            "#,
        )
        .bind(user_item_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    async fn delete_reactions_by_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM reactions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn insert_comment(
        &self,
        user_id: Uuid,
        user_item_id: i64,
        content: &str,
    ) -> AppResult<Comment> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (user_id, user_item_id, content)
                VALUES ($1, $2, $3)
                RETURNING id, user_item_id, user_id, content, created_at
            )
            SELECT c.id, c.user_item_id, c.user_id, c.content, c.created_at,
                   p.username, p.avatar_url
            FROM inserted c
            LEFT JOIN profiles p ON p.id = c.user_id
            "#,
        )
        .bind(user_id)
        .bind(user_item_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_comments(&self, user_item_ids: &[i64]) -> AppResult<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.user_item_id, c.user_id, c.content, c.created_at,
                   p.username, p.avatar_url
            FROM comments c
            LEFT JOIN profiles p ON p.id = c.user_id
            WHERE c.user_item_id = ANY($1)
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(user_item_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn comment_counts(&self, user_item_ids: &[i64]) -> AppResult<Vec<CommentCount>> {
        let counts = sqlx::query_as::<_, CommentCount>(
            r#"
            SELECT user_item_id, COUNT(*) AS count
            FROM comments
            WHERE user_item_id = ANY($1)
            GROUP BY user_item_id
            "#,
        )
        .bind(user_item_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    async fn delete_comments_by_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM comments WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn hide_item(&self, user_id: Uuid, item_id: i64) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO hidden (user_id, item_id) VALUES ($1, $2) ON CONFLICT (user_id, item_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(item_id)
        .execute(&self.pool)
        .await
        .map_err(|e| reject_violation(e, "Unknown item"))?;

        Ok(())
    }

    async fn unhide_item(&self, user_id: Uuid, item_id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM hidden WHERE user_id = $1 AND item_id = $2")
            .bind(user_id)
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn hidden_item_ids(&self, user_id: Uuid) -> AppResult<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT item_id FROM hidden WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    async fn mute_user(&self, user_id: Uuid, muted_user_id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO muted_users (user_id, muted_user_id) VALUES ($1, $2)
            ON CONFLICT (user_id, muted_user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(muted_user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn unmute_user(&self, user_id: Uuid, muted_user_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM muted_users WHERE user_id = $1 AND muted_user_id = $2")
            .bind(user_id)
            .bind(muted_user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn muted_user_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT muted_user_id FROM muted_users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn delete_suppressions(&self, user_id: Uuid) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        let hidden = sqlx::query("DELETE FROM hidden WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        let muted = sqlx::query("DELETE FROM muted_users WHERE user_id = $1 OR muted_user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(hidden.rows_affected() + muted.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_condition() {
        assert_eq!(library_condition(LibraryFilter::All), "");
        assert!(library_condition(LibraryFilter::Watchlist).contains("'watchlist'"));
        assert!(library_condition(LibraryFilter::Completed).contains("'completed'"));
        assert!(library_condition(LibraryFilter::Favorites).contains("favorite"));
    }

    #[derive(Debug)]
    struct FakeDbError(sqlx::error::ErrorKind);

    impl std::fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }

    impl std::error::Error for FakeDbError {}

    impl sqlx::error::DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "constraint"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            match self.0 {
                sqlx::error::ErrorKind::UniqueViolation => sqlx::error::ErrorKind::UniqueViolation,
                sqlx::error::ErrorKind::ForeignKeyViolation => {
                    sqlx::error::ErrorKind::ForeignKeyViolation
                }
                _ => sqlx::error::ErrorKind::Other,
            }
        }
    }

    fn db_error(kind: sqlx::error::ErrorKind) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError(kind)))
    }

    #[test]
    fn test_constraint_violations_become_invalid_input() {
        let err = reject_violation(
            db_error(sqlx::error::ErrorKind::UniqueViolation),
            USERNAME_TAKEN,
        );
        assert!(matches!(err, AppError::InvalidInput(ref m) if m == "username already taken"));

        let err = reject_violation(
            db_error(sqlx::error::ErrorKind::ForeignKeyViolation),
            "Unknown item",
        );
        assert!(matches!(err, AppError::InvalidInput(ref m) if m == "Unknown item"));
    }

    #[test]
    fn test_other_database_errors_stay_internal() {
        let err = reject_violation(db_error(sqlx::error::ErrorKind::Other), USERNAME_TAKEN);
        assert!(matches!(err, AppError::Database(_)));

        let err = reject_violation(sqlx::Error::RowNotFound, USERNAME_TAKEN);
        assert!(matches!(err, AppError::Database(_)));
    }

    fn heat() -> NewItem {
        NewItem {
            tmdb_id: Some(949),
            media_type: MediaType::Movie,
            title: "Heat".to_string(),
            poster_path: None,
            release_date: Some("1995-12-15".to_string()),
            genres: None,
        }
    }

    #[sqlx::test]
    #[ignore = "requires a running Postgres"]
    async fn test_upsert_user_item_twice_keeps_one_row(pool: PgPool) {
        let repo = PgRepository::new(pool);
        let user_id = Uuid::from_u128(1);
        let item = repo.insert_item(&heat()).await.unwrap();

        let first = repo
            .upsert_user_item(user_id, item.id, &UserItemPatch::review(Some(6), None))
            .await
            .unwrap();
        let second = repo
            .upsert_user_item(
                user_id,
                item.id,
                &UserItemPatch::review(Some(9), Some("Better the second time".to_string())),
            )
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        let library = repo
            .list_library(user_id, LibraryFilter::All, None)
            .await
            .unwrap();
        assert_eq!(library.len(), 1);
        assert_eq!(library[0].rating, Some(9));
        assert_eq!(library[0].review.as_deref(), Some("Better the second time"));
    }

    #[sqlx::test]
    #[ignore = "requires a running Postgres"]
    async fn test_duplicate_username_is_invalid_input(pool: PgPool) {
        let repo = PgRepository::new(pool);
        let profile = |id: u128| NewProfile {
            id: Uuid::from_u128(id),
            username: "ada".to_string(),
            avatar_url: None,
        };
        repo.insert_profile(&profile(1)).await.unwrap();

        let err = repo.insert_profile(&profile(2)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(ref m) if m == USERNAME_TAKEN));

        repo.insert_profile(&NewProfile {
            username: "grace".to_string(),
            ..profile(2)
        })
        .await
        .unwrap();
        let update = ProfileUpdate {
            username: "ada".to_string(),
            avatar_url: None,
            privacy_public: true,
        };
        let err = repo
            .update_profile(Uuid::from_u128(2), &update)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(ref m) if m == USERNAME_TAKEN));
    }

    #[sqlx::test]
    #[ignore = "requires a running Postgres"]
    async fn test_hiding_unknown_item_is_invalid_input(pool: PgPool) {
        let repo = PgRepository::new(pool);

        let err = repo.hide_item(Uuid::from_u128(1), 424242).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
