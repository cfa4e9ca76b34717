//! In-process user store, used when no database is configured and in tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::UserStore;
use crate::error::{AppError, AppResult};
use crate::models::{email_key, sorted_roles, NewUser, User, SEED_ROLES};

#[derive(Debug)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
    roles: HashSet<String>,
}

impl MemoryUserStore {
    /// Empty store that knows the seed roles.
    pub fn new() -> Self {
        Self::with_roles(SEED_ROLES)
    }

    pub fn with_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            users: RwLock::new(HashMap::new()),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let key = email_key(email);
        let users = self.users.read().await;
        Ok(users.values().find(|u| email_key(&u.email) == key).cloned())
    }

    async fn role_exists(&self, name: &str) -> AppResult<bool> {
        Ok(self.roles.contains(name))
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        // Uniqueness is checked under the write lock so concurrent signups cannot both win.
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("Username is already in use".to_string()));
        }
        let key = email_key(&user.email);
        if users.values().any(|u| email_key(&u.email) == key) {
            return Err(AppError::Conflict("Email is already in use".to_string()));
        }

        let row = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            roles: sorted_roles(user.roles),
            created_at: Utc::now(),
        };
        users.insert(row.id, row.clone());
        Ok(row)
    }
}
