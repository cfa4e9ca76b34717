//! Storage seam used by the signup stages and the auth handlers.

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{NewUser, User};

/// User and role persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn role_exists(&self, name: &str) -> AppResult<bool>;

    /// Insert a user. Fails with `AppError::Conflict` when username or email is taken.
    async fn create_user(&self, user: NewUser) -> AppResult<User>;
}
