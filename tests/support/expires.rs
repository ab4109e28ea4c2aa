//! Demo origin with three actions, each rendering a random body.
//!
//! - `/expires/expires_header`: `max-age=10`, no validators.
//! - `/expires/expires_etag`: entity tag derived from `"1"`.
//! - `/expires/expires_last_modified`: the app's fixed modification time.
//!
//! A `private` query parameter switches any action to private caching.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::SystemTime;

use rttp_cache::cache::Origin;
use rttp_cache::conditional::{RenderOptions, RenderOptionsBuilder, evaluate, expires_in};
use rttp_cache::freshness::{PolicyError, Visibility};
use rttp_cache::http::{Request, Response, StatusCode};
use rttp_cache::validation::ConditionalRequest;

pub struct ExpiresApp {
    last_modified: SystemTime,
    calls: AtomicUsize,
    not_modified: AtomicUsize,
}

impl ExpiresApp {
    pub fn new(last_modified: SystemTime) -> Arc<Self> {
        Arc::new(Self {
            last_modified,
            calls: AtomicUsize::new(0),
            not_modified: AtomicUsize::new(0),
        })
    }

    pub fn origin(self: &Arc<Self>) -> impl Origin {
        let app = Arc::clone(self);
        move |request: Request, conditional: ConditionalRequest| {
            let app = Arc::clone(&app);
            async move { app.dispatch(&request, &conditional) }
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn not_modified_count(&self) -> usize {
        self.not_modified.load(Ordering::SeqCst)
    }

    fn dispatch(&self, request: &Request, conditional: &ConditionalRequest) -> Response {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let visibility = if request.query_param("private").is_some() {
            Visibility::Private
        } else {
            Visibility::Public
        };

        let result = match request.path() {
            "/expires/expires_header" => expires_in(
                Response::new(StatusCode::Ok).body(random_body()),
                visibility,
                10,
                false,
            ),
            "/expires/expires_etag" => self.render_conditionally(
                RenderOptions::builder().etag("1"),
                visibility,
                conditional,
            ),
            "/expires/expires_last_modified" => self.render_conditionally(
                RenderOptions::builder().last_modified(self.last_modified),
                visibility,
                conditional,
            ),
            _ => return Response::new(StatusCode::NotFound).body("Not Found"),
        };

        result.unwrap_or_else(|e| {
            Response::new(StatusCode::InternalServerError).body(e.to_string())
        })
    }

    fn render_conditionally(
        &self,
        options: RenderOptionsBuilder,
        visibility: Visibility,
        conditional: &ConditionalRequest,
    ) -> Result<Response, PolicyError> {
        let options = options.visibility(visibility).build()?;
        let evaluation = evaluate(&options, conditional);
        if !evaluation.is_stale() {
            self.not_modified.fetch_add(1, Ordering::SeqCst);
        }
        Ok(evaluation.respond(|| Response::new(StatusCode::Ok).body(random_body())))
    }
}

fn random_body() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}
