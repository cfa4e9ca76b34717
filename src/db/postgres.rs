//! PostgreSQL user store: `users`, `roles`, `user_roles`.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use uuid::Uuid;

use super::UserStore;
use crate::error::{AppError, AppResult};
use crate::models::{sorted_roles, NewUser, User};

pub type DbPool = sqlx::PgPool;

pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

const SELECT_USER: &str = r#"
    SELECT u.id, u.username, u.email, u.password_hash, u.created_at,
           COALESCE(array_agg(r.name ORDER BY r.name COLLATE "C") FILTER (WHERE r.name IS NOT NULL), '{}') AS roles
    FROM users u
    LEFT JOIN user_roles ur ON ur.user_id = u.id
    LEFT JOIN roles r ON r.id = ur.role_id
"#;

#[derive(Clone)]
pub struct PgUserStore {
    pool: DbPool,
}

impl PgUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> AppResult<Self> {
        Ok(Self::new(create_pool(database_url).await?))
    }

    async fn find_one(&self, filter: &str, value: &str) -> AppResult<Option<User>> {
        let sql = format!("{SELECT_USER} WHERE {filter} GROUP BY u.id");
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

fn conflict_or_db(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            let message = match db.constraint() {
                Some(c) if c.contains("email") => "Email is already in use",
                _ => "Username is already in use",
            };
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Db(err),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.find_one("u.username = $1", username).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.find_one("lower(u.email) = lower($1)", email).await
    }

    async fn role_exists(&self, name: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM roles WHERE name = $1)")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let roles = sorted_roles(user.roles);
        let mut tx = self.pool.begin().await?;

        let (id, created_at): (Uuid, chrono::DateTime<chrono::Utc>) = sqlx::query_as(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_or_db)?;

        let linked = sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            SELECT $1, id FROM roles WHERE name = ANY($2)
            "#,
        )
        .bind(id)
        .bind(&roles)
        .execute(&mut *tx)
        .await?;
        if linked.rows_affected() as usize != roles.len() {
            return Err(AppError::Validation("Unknown role requested".to_string()));
        }

        tx.commit().await?;

        Ok(User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            roles,
            created_at,
        })
    }
}
