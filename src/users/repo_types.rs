use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String, // argon2 PHC string
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub school: String,
    pub major1: String,
    pub major2: String,
    pub minor: String,
    pub avatar_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Study group the user is a member of.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct StudyGroup {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Columns written by signup.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

/// The seven profile columns overwritten by an account update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub school: String,
    pub major1: String,
    pub major2: String,
    pub minor: String,
}

/// Offset/limit window derived from `page` and `page_size`. The offset
/// saturates at `i64::MAX`, which simply yields an empty page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: i64,
    pub offset: i64,
}

impl PageWindow {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            limit: i64::from(page_size),
            offset: i64::from(page).saturating_mul(i64::from(page_size)),
        }
    }
}
