//! Ordered request pipelines: zero or more stages that may answer early, then one terminal handler.
//!
//! A stage sees the request and either lets it through ([`Flow::Continue`]) or answers it
//! ([`Flow::Respond`], or an `Err` rendered as an error response). The first stage that
//! answers ends the request; later stages and the terminal handler never run.

use std::sync::Arc;

use async_trait::async_trait;
use axum::response::{IntoResponse, Response};
use tracing::{debug, info};

use crate::error::AppResult;
use crate::handlers::http::AppState;

/// Request as seen by every stage of a pipeline.
pub struct AuthRequest<B> {
    pub state: AppState,
    pub body: B,
}

impl<B> AuthRequest<B> {
    pub fn new(state: AppState, body: B) -> Self {
        Self { state, body }
    }
}

/// Outcome of a non-terminal stage.
pub enum Flow {
    Continue,
    Respond(Response),
}

impl Flow {
    pub fn respond(response: impl IntoResponse) -> Self {
        Flow::Respond(response.into_response())
    }
}

impl std::fmt::Debug for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flow::Continue => f.write_str("Continue"),
            Flow::Respond(res) => f.debug_tuple("Respond").field(&res.status()).finish(),
        }
    }
}

/// A check that runs before the terminal handler.
#[async_trait]
pub trait Stage<B: Send + Sync + 'static>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, req: &AuthRequest<B>) -> AppResult<Flow>;
}

/// The last stage of a pipeline; always answers.
#[async_trait]
pub trait Terminal<B: Send + Sync + 'static>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, req: AuthRequest<B>) -> AppResult<Response>;
}

pub struct Pipeline<B: Send + Sync + 'static> {
    stages: Vec<Arc<dyn Stage<B>>>,
    terminal: Arc<dyn Terminal<B>>,
}

impl<B: Send + Sync + 'static> Clone for Pipeline<B> {
    fn clone(&self) -> Self {
        Self {
            stages: self.stages.clone(),
            terminal: self.terminal.clone(),
        }
    }
}

impl<B> Pipeline<B>
where
    B: Send + Sync + 'static,
{
    pub fn new(stages: Vec<Arc<dyn Stage<B>>>, terminal: Arc<dyn Terminal<B>>) -> Self {
        Self { stages, terminal }
    }

    /// Pipeline with no checks in front of the handler.
    pub fn terminal_only(terminal: Arc<dyn Terminal<B>>) -> Self {
        Self::new(Vec::new(), terminal)
    }

    /// Stage names in execution order, terminal last.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages
            .iter()
            .map(|s| s.name())
            .chain(std::iter::once(self.terminal.name()))
            .collect()
    }

    pub async fn run(&self, req: AuthRequest<B>) -> Response {
        for stage in &self.stages {
            match stage.handle(&req).await {
                Ok(Flow::Continue) => {
                    debug!(stage = stage.name(), "stage passed");
                }
                Ok(Flow::Respond(response)) => {
                    info!(stage = stage.name(), status = %response.status(), "stage answered request");
                    return response;
                }
                Err(e) => {
                    info!(stage = stage.name(), error = %e, "stage rejected request");
                    return e.into_response();
                }
            }
        }

        let terminal = self.terminal.name();
        match self.terminal.handle(req).await {
            Ok(response) => {
                debug!(handler = terminal, status = %response.status(), "request handled");
                response
            }
            Err(e) => {
                debug!(handler = terminal, error = %e, "handler failed");
                e.into_response()
            }
        }
    }
}
