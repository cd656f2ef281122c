//! Shared fixtures for the middleware integration tests

#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    http::{request::Parts, Method, Request, StatusCode},
    response::Response,
    routing::{get, post},
    Router,
};
use http_body_util::BodyExt;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tower::ServiceExt;
use warden_core::{Controls, UserPrincipal};
use warden_web::{AuthenticationFailure, Authenticator, CurrentUser, Identity};

pub const CHROME_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0.0.0 Safari/537.36";

/// Authenticator with a fixed outcome that counts how often it runs
#[derive(Clone)]
pub struct ScriptedAuthenticator {
    outcome: Result<(String, String), Option<String>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedAuthenticator {
    /// Always resolves `username` with rights parsed from `acl`
    pub fn grants(username: &str, acl: &str) -> Self {
        Self {
            outcome: Ok((username.to_string(), acl.to_string())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always rejects, optionally with a message
    pub fn rejects(message: Option<&str>) -> Self {
        Self {
            outcome: Err(message.map(str::to_string)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Authenticator for ScriptedAuthenticator {
    async fn authenticate(&self, _request: &Parts) -> Result<UserPrincipal, AuthenticationFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Ok((username, acl)) => Ok(UserPrincipal::new(
                username.clone(),
                Controls::parse(acl).expect("test ACL must parse"),
            )),
            Err(message) => Err(AuthenticationFailure {
                message: message.clone(),
            }),
        }
    }
}

/// Handlers standing in for the protected application
pub struct App {
    pub hits: Arc<AtomicUsize>,
}

impl App {
    pub fn new() -> Self {
        Self {
            hits: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// `/items/{id}` (GET, POST), `/whoami` and `/upload`
    pub fn router(&self) -> Router {
        let items_hits = Arc::clone(&self.hits);
        let whoami_hits = Arc::clone(&self.hits);
        let upload_hits = Arc::clone(&self.hits);
        let anyone_hits = Arc::clone(&self.hits);

        Router::new()
            .route(
                "/items/{id}",
                get(move || {
                    items_hits.fetch_add(1, Ordering::SeqCst);
                    async { "item" }
                })
                .post(|| async { "created" })
                .options(move |identity: Identity| {
                    anyone_hits.fetch_add(1, Ordering::SeqCst);
                    async move { identity.username().unwrap_or("anonymous").to_string() }
                }),
            )
            .route(
                "/whoami",
                get(move |CurrentUser(user): CurrentUser| {
                    whoami_hits.fetch_add(1, Ordering::SeqCst);
                    async move { user.username().to_string() }
                }),
            )
            .route(
                "/identity",
                get(|identity: Identity| async move {
                    identity.username().unwrap_or("anonymous").to_string()
                }),
            )
            .route(
                "/upload",
                post(move |body: Bytes| {
                    upload_hits.fetch_add(1, Ordering::SeqCst);
                    async move { body.len().to_string() }
                }),
            )
    }
}

pub fn request(method: Method, uri: &str) -> axum::http::request::Builder {
    Request::builder().method(method).uri(uri)
}

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(
        response.status(),
        expected,
        "unexpected status, headers: {:?}",
        response.headers()
    );
}
