use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LibraryEntry;

/// Public-facing user profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
    pub privacy_public: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProfile {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl NewProfile {
    /// Default profile for a first-time user: `<email local part>_<8 chars of id>`
    pub fn for_user(id: Uuid, email: Option<&str>) -> Self {
        let short_id: String = id.to_string().chars().take(8).collect();
        Self::with_suffix(id, email, &short_id)
    }

    /// Same as [`NewProfile::for_user`] but with the whole id, for when the short name is taken
    pub fn for_user_full_id(id: Uuid, email: Option<&str>) -> Self {
        Self::with_suffix(id, email, &id.simple().to_string())
    }

    fn with_suffix(id: Uuid, email: Option<&str>, suffix: &str) -> Self {
        let local = email
            .and_then(|e| e.split('@').next())
            .filter(|s| !s.is_empty())
            .unwrap_or("user");

        Self {
            id,
            username: format!("{}_{}", local, suffix),
            avatar_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProfileUpdate {
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default = "default_public")]
    pub privacy_public: bool,
}

fn default_public() -> bool {
    true
}

/// Author shown next to feed rows, reviews and comments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileSummary {
    pub username: String,
    pub avatar_url: Option<String>,
}

impl ProfileSummary {
    /// Builds a summary from LEFT JOIN columns, absent when no profile row exists
    pub fn from_columns(username: Option<String>, avatar_url: Option<String>) -> Option<Self> {
        username.map(|username| Self {
            username,
            avatar_url,
        })
    }
}

/// A user's page: profile plus recent activity
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PublicProfile {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
    pub activity: Vec<LibraryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_username_from_email() {
        let id = Uuid::parse_str("3f2c9a1e-0000-4000-8000-000000000000").unwrap();
        let profile = NewProfile::for_user(id, Some("ada@example.com"));
        assert_eq!(profile.username, "ada_3f2c9a1e");
        assert_eq!(profile.avatar_url, None);
    }

    #[test]
    fn test_default_username_without_email() {
        let id = Uuid::parse_str("abcdef12-0000-4000-8000-000000000000").unwrap();
        let profile = NewProfile::for_user(id, None);
        assert_eq!(profile.username, "user_abcdef12");
    }

    #[test]
    fn test_full_id_username() {
        let id = Uuid::parse_str("abcdef12-0000-4000-8000-000000000000").unwrap();
        let profile = NewProfile::for_user_full_id(id, Some("ada@example.com"));
        assert_eq!(profile.username, "ada_abcdef12000040008000000000000000");
    }

    #[test]
    fn test_profile_update_defaults_to_public() {
        let update: ProfileUpdate = serde_json::from_str(r#"{ "username": "ada" }"#).unwrap();
        assert!(update.privacy_public);
        assert_eq!(update.avatar_url, None);
    }

    #[test]
    fn test_summary_absent_without_username() {
        assert_eq!(ProfileSummary::from_columns(None, Some("x".into())), None);
    }
}
