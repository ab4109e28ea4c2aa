//! # rttp-cache
//!
//! An HTTP response cache that sits between clients and an origin handler,
//! deciding per request whether a stored response can be served directly,
//! must be revalidated, or must be fetched fresh and stored.
//!
//! ## Quick Start
//!
//! ```rust
//! use rttp_cache::cache::{CacheController, MemoryStore};
//! use rttp_cache::conditional::{RenderOptions, evaluate};
//! use rttp_cache::config::CacheConfig;
//! use rttp_cache::http::{Method, Request, Response, StatusCode};
//! use rttp_cache::validation::ConditionalRequest;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let origin = |_req: Request, conditional: ConditionalRequest| async move {
//!     let options = RenderOptions::builder().public().etag("v1").build().unwrap();
//!     evaluate(&options, &conditional)
//!         .respond(|| Response::new(StatusCode::Ok).body("document"))
//! };
//! let cache = CacheController::new(MemoryStore::new(), origin, CacheConfig::default());
//!
//! let first = cache.handle(Request::new(Method::Get, "/doc")).await;
//! assert_eq!(first.headers().get("x-cache-status"), Some("miss, store"));
//!
//! let second = cache.handle(Request::new(Method::Get, "/doc")).await;
//! assert_eq!(second.headers().get("x-cache-status"), Some("stale, valid, store"));
//! assert_eq!(second.payload(), first.payload());
//! # });
//! ```

pub mod cache;
pub mod conditional;
pub mod config;
pub mod freshness;
pub mod http;
pub mod validation;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use cache::{CacheController, MemoryStore, TransactionOutcome};
pub use config::CacheConfig;
pub use http::{Headers, Method, Request, Response, StatusCode};
