use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::users::repo_types::{NewUser, PageWindow, ProfileUpdate, StudyGroup, User};

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for user records. Each mutation is its own statement and only
/// touches the columns it names.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> StoreResult<User>;
    async fn find_by_email(&self, email: &str) -> StoreResult<User>;
    async fn email_exists(&self, email: &str) -> StoreResult<bool>;
    /// Inserts and returns the full row. Fails with `UniqueViolation` when
    /// the email is already taken.
    async fn insert(&self, user: &NewUser) -> StoreResult<User>;
    async fn update_profile(&self, id: i64, profile: &ProfileUpdate) -> StoreResult<User>;
    async fn update_password(&self, id: i64, password_hash: &str) -> StoreResult<User>;
    async fn update_avatar(&self, id: i64, avatar_url: &str) -> StoreResult<User>;
    async fn list(&self, window: PageWindow) -> StoreResult<Vec<User>>;
    async fn list_study_groups(&self, user_id: i64, window: PageWindow)
        -> StoreResult<Vec<StudyGroup>>;
    async fn delete(&self, id: i64) -> StoreResult<()>;
}

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, bio, school, \
                            major1, major2, minor, avatar_url, created_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_one(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_one(&self.db)
            .await?;
        Ok(user)
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.db)
        .await?;
        Ok(exists)
    }

    async fn insert(&self, user: &NewUser) -> StoreResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (first_name, last_name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.db)
            .await?;
        Ok(row)
    }

    async fn update_profile(&self, id: i64, p: &ProfileUpdate) -> StoreResult<User> {
        let sql = format!(
            r#"
            UPDATE users
               SET first_name = $2, last_name = $3, bio = $4, school = $5,
                   major1 = $6, major2 = $7, minor = $8
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&p.first_name)
            .bind(&p.last_name)
            .bind(&p.bio)
            .bind(&p.school)
            .bind(&p.major1)
            .bind(&p.major2)
            .bind(&p.minor)
            .fetch_one(&self.db)
            .await?;
        Ok(row)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> StoreResult<User> {
        let sql = format!(
            "UPDATE users SET password_hash = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(password_hash)
            .fetch_one(&self.db)
            .await?;
        Ok(row)
    }

    async fn update_avatar(&self, id: i64, avatar_url: &str) -> StoreResult<User> {
        let sql =
            format!("UPDATE users SET avatar_url = $2 WHERE id = $1 RETURNING {USER_COLUMNS}");
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(avatar_url)
            .fetch_one(&self.db)
            .await?;
        Ok(row)
    }

    async fn list(&self, window: PageWindow) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT $1 OFFSET $2");
        let rows = sqlx::query_as::<_, User>(&sql)
            .bind(window.limit)
            .bind(window.offset)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn list_study_groups(
        &self,
        user_id: i64,
        window: PageWindow,
    ) -> StoreResult<Vec<StudyGroup>> {
        let rows = sqlx::query_as::<_, StudyGroup>(
            r#"
            SELECT g.id, g.name, g.description, g.created_at
              FROM study_groups g
              JOIN study_group_members m ON m.study_group_id = g.id
             WHERE m.user_id = $1
             ORDER BY g.id
             LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let done = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
