//! User accounts and roles.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Role granted when a signup names none.
pub const DEFAULT_ROLE: &str = "user";

/// Roles every fresh store knows about.
pub const SEED_ROLES: [&str; 3] = ["user", "moderator", "admin"];

/// Stored user account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Account about to be inserted. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<String>,
}

/// Public view of a user (never includes the hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            roles: user.roles.clone(),
        }
    }
}

/// Role list to store for a signup: requested roles sorted by name without repeats,
/// or the default.
pub fn resolve_roles(requested: Option<&[String]>) -> Vec<String> {
    let roles = sorted_roles(requested.unwrap_or_default().to_vec());
    if roles.is_empty() {
        return vec![DEFAULT_ROLE.to_string()];
    }
    roles
}

/// Roles are always stored and reported sorted by name.
pub fn sorted_roles(mut roles: Vec<String>) -> Vec<String> {
    roles.sort();
    roles.dedup();
    roles
}

/// Key under which emails are compared; matches `lower(email)` in PostgreSQL.
pub fn email_key(email: &str) -> String {
    email.to_lowercase()
}
