//! Signup checks that run before the account is created.

use async_trait::async_trait;
use tracing::debug;

use crate::auth::SignupRequest;
use crate::error::{AppError, AppResult};
use crate::pipeline::{AuthRequest, Flow, Stage};

/// Rejects a signup whose username or email already belongs to an account.
pub struct CheckDuplicateUsernameOrEmail;

#[async_trait]
impl Stage<SignupRequest> for CheckDuplicateUsernameOrEmail {
    fn name(&self) -> &'static str {
        "check_duplicate_username_or_email"
    }

    async fn handle(&self, req: &AuthRequest<SignupRequest>) -> AppResult<Flow> {
        let store = req.state.store();

        if store.find_by_username(&req.body.username).await?.is_some() {
            debug!(username = %req.body.username, "username taken");
            return Err(AppError::Conflict("Username is already in use".to_string()));
        }
        if store.find_by_email(&req.body.email).await?.is_some() {
            debug!("email taken");
            return Err(AppError::Conflict("Email is already in use".to_string()));
        }

        Ok(Flow::Continue)
    }
}

/// Rejects a signup naming a role the store does not know.
pub struct CheckRolesExisted;

#[async_trait]
impl Stage<SignupRequest> for CheckRolesExisted {
    fn name(&self) -> &'static str {
        "check_roles_existed"
    }

    async fn handle(&self, req: &AuthRequest<SignupRequest>) -> AppResult<Flow> {
        let Some(roles) = req.body.roles.as_deref() else {
            return Ok(Flow::Continue);
        };

        for role in roles {
            if !req.state.store().role_exists(role).await? {
                return Err(AppError::Validation(format!("Role {} does not exist", role)));
            }
        }

        Ok(Flow::Continue)
    }
}
