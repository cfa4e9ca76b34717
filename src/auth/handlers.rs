//! Terminal auth handlers: signup, signin.

use async_trait::async_trait;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::auth::Credentials;
use crate::error::{AppError, AppResult};
use crate::models::{resolve_roles, NewUser, UserInfo};
use crate::pipeline::{AuthRequest, Terminal};

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 32))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SigninResponse {
    pub token: String,
    pub user: UserInfo,
}

/// POST /signup — creates the account once every check has passed.
pub struct Signup;

#[async_trait]
impl Terminal<SignupRequest> for Signup {
    fn name(&self) -> &'static str {
        "signup"
    }

    async fn handle(&self, req: AuthRequest<SignupRequest>) -> AppResult<Response> {
        let AuthRequest { state, body } = req;
        body.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let password_hash = Credentials::hash_blocking(body.password).await?;
        let user = state
            .store()
            .create_user(NewUser {
                username: body.username,
                email: body.email,
                password_hash,
                roles: resolve_roles(body.roles.as_deref()),
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "user registered");
        Ok((StatusCode::CREATED, Json(UserInfo::from(&user))).into_response())
    }
}

/// POST /signin — exchanges username and password for an access token.
pub struct Signin;

#[async_trait]
impl Terminal<SigninRequest> for Signin {
    fn name(&self) -> &'static str {
        "signin"
    }

    async fn handle(&self, req: AuthRequest<SigninRequest>) -> AppResult<Response> {
        let AuthRequest { state, body } = req;
        let invalid = || AppError::Auth("Invalid username or password".to_string());

        let user = state.store().find_by_username(&body.username).await?;

        // Unknown users pay for a verify too, so timing does not reveal which accounts exist.
        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        if !Credentials::verify_blocking(body.password, stored_hash).await? {
            return Err(invalid());
        }
        let user = user.ok_or_else(invalid)?;

        let token = state.jwt_secret().issue(&user)?;

        Ok(Json(SigninResponse {
            token,
            user: UserInfo::from(&user),
        })
        .into_response())
    }
}
