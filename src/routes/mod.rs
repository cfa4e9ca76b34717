//! Authentication route table: `(method, path) -> pipeline` bindings built once at startup.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::Method,
    response::IntoResponse,
    routing::{on, MethodFilter, MethodRouter},
    Json, Router,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::auth::{Signin, SigninRequest, Signup, SignupRequest};
use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::{CheckDuplicateUsernameOrEmail, CheckRolesExisted};
use crate::pipeline::{AuthRequest, Pipeline, Stage, Terminal};

pub const SIGNUP_PATH: &str = "/signup";
pub const SIGNIN_PATH: &str = "/signin";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("route {method} {path} is already registered")]
    Duplicate { method: Method, path: String },
    #[error("method {0} cannot be routed")]
    UnsupportedMethod(Method),
}

/// One HTTP method and path bound to its pipeline.
#[derive(Clone)]
pub struct RouteBinding {
    method: Method,
    path: &'static str,
    stages: Vec<&'static str>,
    handler: MethodRouter<AppState>,
}

impl RouteBinding {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    /// Stage names in execution order, terminal last.
    pub fn stages(&self) -> &[&'static str] {
        &self.stages
    }
}

impl std::fmt::Debug for RouteBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteBinding")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("stages", &self.stages)
            .finish()
    }
}

#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    bindings: Vec<RouteBinding>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `method path` to `pipeline`. The request body is decoded as JSON into `B`
    /// before the first stage runs; a body that does not decode is a 400.
    pub fn bind<B>(
        mut self,
        method: Method,
        path: &'static str,
        pipeline: Pipeline<B>,
    ) -> Result<Self, RouteError>
    where
        B: DeserializeOwned + Send + Sync + 'static,
    {
        if self
            .bindings
            .iter()
            .any(|b| b.method == method && b.path == path)
        {
            return Err(RouteError::Duplicate {
                method,
                path: path.to_string(),
            });
        }

        let filter = MethodFilter::try_from(method.clone())
            .map_err(|_| RouteError::UnsupportedMethod(method.clone()))?;
        let stages = pipeline.stage_names();
        let pipeline = Arc::new(pipeline);

        let handler = on(
            filter,
            move |State(state): State<AppState>, body: Result<Json<B>, JsonRejection>| {
                let pipeline = pipeline.clone();
                async move {
                    match body {
                        Ok(Json(body)) => pipeline.run(AuthRequest::new(state, body)).await,
                        Err(rejection) => {
                            AppError::Validation(rejection.body_text()).into_response()
                        }
                    }
                }
            },
        );

        debug!(%method, path, stages = ?stages, "route bound");
        self.bindings.push(RouteBinding {
            method,
            path,
            stages,
            handler,
        });
        Ok(self)
    }

    /// POST /signup: `stages` in order, then `handler`.
    pub fn register_signup(
        self,
        stages: Vec<Arc<dyn Stage<SignupRequest>>>,
        handler: Arc<dyn Terminal<SignupRequest>>,
    ) -> Result<Self, RouteError> {
        self.bind(Method::POST, SIGNUP_PATH, Pipeline::new(stages, handler))
    }

    /// POST /signin: `handler` alone.
    pub fn register_signin(
        self,
        handler: Arc<dyn Terminal<SigninRequest>>,
    ) -> Result<Self, RouteError> {
        self.bind(Method::POST, SIGNIN_PATH, Pipeline::terminal_only(handler))
    }

    pub fn bindings(&self) -> &[RouteBinding] {
        &self.bindings
    }

    pub fn find(&self, method: &Method, path: &str) -> Option<&RouteBinding> {
        self.bindings
            .iter()
            .find(|b| &b.method == method && b.path == path)
    }

    /// axum router serving every binding. Bindings sharing a path share one method router.
    pub fn router(&self) -> Router<AppState> {
        let mut by_path: BTreeMap<&'static str, MethodRouter<AppState>> = BTreeMap::new();
        for binding in &self.bindings {
            let handler = match by_path.remove(binding.path) {
                Some(existing) => existing.merge(binding.handler.clone()),
                None => binding.handler.clone(),
            };
            by_path.insert(binding.path, handler);
        }

        by_path
            .into_iter()
            .fold(Router::new(), |router, (path, handler)| {
                router.route(path, handler)
            })
    }
}

/// The production auth routes:
/// `POST /signup` -> duplicate check -> role check -> signup, and `POST /signin` -> signin.
pub fn auth_route_table() -> Result<RouteTable, RouteError> {
    let signup_checks: Vec<Arc<dyn Stage<SignupRequest>>> = vec![
        Arc::new(CheckDuplicateUsernameOrEmail),
        Arc::new(CheckRolesExisted),
    ];

    RouteTable::new()
        .register_signup(signup_checks, Arc::new(Signup))?
        .register_signin(Arc::new(Signin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtSecret;
    use crate::db::MemoryUserStore;
    use crate::pipeline::testing::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    fn state() -> AppState {
        AppState::new(
            Arc::new(MemoryUserStore::new()),
            JwtSecret::new("test-jwt-secret-min-32-chars!!!!".into(), 1),
        )
    }

    fn post(path: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    const SIGNUP_JSON: &str =
        r#"{"username":"ana","email":"ana@example.com","password":"password123"}"#;

    #[test]
    fn auth_table_wires_signup_checks_in_order() {
        let table = auth_route_table().unwrap();
        assert_eq!(table.bindings().len(), 2);

        let signup = table.find(&Method::POST, SIGNUP_PATH).unwrap();
        assert_eq!(
            signup.stages(),
            &["check_duplicate_username_or_email", "check_roles_existed", "signup"]
        );

        let signin = table.find(&Method::POST, SIGNIN_PATH).unwrap();
        assert_eq!(signin.stages(), &["signin"]);
        assert!(table.find(&Method::GET, SIGNIN_PATH).is_none());
    }

    #[test]
    fn duplicate_registration_is_reported() {
        let err = auth_route_table()
            .unwrap()
            .register_signin(Arc::new(Signin))
            .unwrap_err();
        assert_eq!(
            err,
            RouteError::Duplicate {
                method: Method::POST,
                path: SIGNIN_PATH.to_string()
            }
        );
    }

    #[test]
    fn same_path_different_method_is_allowed() {
        let log = log();
        let table = RouteTable::new()
            .bind(
                Method::POST,
                "/thing",
                Pipeline::<serde_json::Value>::terminal_only(Recording::terminal("post", &log)),
            )
            .unwrap()
            .bind(
                Method::PUT,
                "/thing",
                Pipeline::<serde_json::Value>::terminal_only(Recording::terminal("put", &log)),
            )
            .unwrap();
        assert_eq!(table.bindings().len(), 2);
    }

    #[tokio::test]
    async fn signup_route_short_circuits_on_first_responding_stage() {
        let log = log();
        let table = RouteTable::new()
            .register_signup(
                vec![
                    Recording::stage("duplicate", Behaviour::Respond(StatusCode::CONFLICT), &log),
                    Recording::stage("roles", Behaviour::Continue, &log),
                ],
                Recording::terminal("signup", &log),
            )
            .unwrap();
        let app = table.router().with_state(state());

        let res = app.oneshot(post(SIGNUP_PATH, SIGNUP_JSON)).await.unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        assert_eq!(entries(&log), vec!["duplicate"]);
    }

    #[tokio::test]
    async fn signup_route_runs_every_stage_when_all_continue() {
        let log = log();
        let table = RouteTable::new()
            .register_signup(
                vec![
                    Recording::stage("duplicate", Behaviour::Continue, &log),
                    Recording::stage("roles", Behaviour::Continue, &log),
                ],
                Recording::terminal("signup", &log),
            )
            .unwrap();
        let app = table.router().with_state(state());

        let res = app.oneshot(post(SIGNUP_PATH, SIGNUP_JSON)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(entries(&log), vec!["duplicate", "roles", "signup"]);
    }

    #[tokio::test]
    async fn signin_route_runs_only_its_handler() {
        let log = log();
        let table = RouteTable::new()
            .register_signup(
                vec![Recording::stage("duplicate", Behaviour::Continue, &log)],
                Recording::terminal("signup", &log),
            )
            .unwrap()
            .register_signin(Recording::terminal("signin", &log))
            .unwrap();
        let app = table.router().with_state(state());

        let res = app
            .oneshot(post(SIGNIN_PATH, r#"{"username":"ana","password":"x"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(entries(&log), vec!["signin"]);
    }

    #[tokio::test]
    async fn malformed_body_never_reaches_a_stage() {
        let log = log();
        let table = RouteTable::new()
            .register_signup(
                vec![Recording::stage("duplicate", Behaviour::Continue, &log)],
                Recording::terminal("signup", &log),
            )
            .unwrap();
        let app = table.router().with_state(state());

        let res = app.oneshot(post(SIGNUP_PATH, "{not json")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(entries(&log).is_empty());
    }

    #[tokio::test]
    async fn wrong_method_is_not_routed() {
        let table = auth_route_table().unwrap();
        let app = table.router().with_state(state());

        let req = Request::builder()
            .method("GET")
            .uri(SIGNIN_PATH)
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
