//! The per-request caching state machine.
//!
//! ```text
//! Lookup ──absent──────────────► OriginFetch ──► Store? ──► Respond
//!   │    ──stale / private─────► OriginFetch (carrying stored validators)
//!   └────fresh─────────────────────────────────────────────► Respond
//! ```

use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, error, warn};

use super::{CacheKey, CacheStore, CachedEntry, Clock, Origin, SystemClock, TransactionOutcome};
use crate::config::CacheConfig;
use crate::freshness::{FreshnessPolicy, is_cacheable};
use crate::http::{Request, Response, StatusCode, names};
use crate::validation::{ConditionalRequest, Validators};

/// The result of one request through the cache.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub outcome: TransactionOutcome,
    /// The response for the client, with the diagnostic header attached.
    pub response: Response,
}

/// Decides, per request, whether to serve from the store, revalidate with
/// the origin, or fetch fresh, and whether to store the result.
///
/// Cheap to clone; clones share the store, origin, and clock. Requests may
/// be handled concurrently from any number of tasks. Duplicate origin
/// fetches for the same stale key are allowed.
///
/// Must be used inside a Tokio runtime: origin fetches run on spawned tasks
/// so that a client dropping its request future does not abort the fetch or
/// the store write that follows it.
///
/// # Examples
///
/// ```
/// use rttp_cache::cache::{CacheController, MemoryStore};
/// use rttp_cache::config::CacheConfig;
/// use rttp_cache::http::{Method, Request, Response, StatusCode};
/// use rttp_cache::validation::ConditionalRequest;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let origin = |_req: Request, _cond: ConditionalRequest| async {
///     Response::new(StatusCode::Ok)
///         .header("Cache-Control", "max-age=60, public")
///         .body("hello")
/// };
/// let cache = CacheController::new(MemoryStore::new(), origin, CacheConfig::default());
///
/// let first = cache.execute(Request::new(Method::Get, "/")).await;
/// assert_eq!(first.response.headers().get("x-cache-status"), Some("miss, store"));
///
/// let second = cache.execute(Request::new(Method::Get, "/")).await;
/// assert_eq!(second.response.headers().get("x-cache-status"), Some("fresh"));
/// # });
/// ```
#[derive(Clone)]
pub struct CacheController {
    store: Arc<dyn CacheStore>,
    origin: Arc<dyn Origin>,
    clock: Arc<dyn Clock>,
    config: Arc<CacheConfig>,
}

impl CacheController {
    pub fn new(store: impl CacheStore + 'static, origin: impl Origin, config: CacheConfig) -> Self {
        Self {
            store: Arc::new(store),
            origin: Arc::new(origin),
            clock: Arc::new(SystemClock),
            config: Arc::new(config),
        }
    }

    /// Replaces the time source used for age computations.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Runs `request` through the cache and returns the client response.
    pub async fn handle(&self, request: Request) -> Response {
        self.execute(request).await.response
    }

    /// Runs `request` through the cache, returning the outcome alongside
    /// the response.
    pub async fn execute(&self, request: Request) -> Transaction {
        let now = self.clock.now();
        let incoming = ConditionalRequest::from_headers(request.headers());

        if !request.method().is_cacheable() {
            debug!(method = %request.method(), path = %request.path(), "method bypasses cache");
            let controller = self.clone();
            return self
                .detached(async move { controller.pass(request, incoming).await })
                .await;
        }

        let key = CacheKey::for_request(&request, &self.config.vary_headers);
        let stored = match self.store.get(&key) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(key = %key, error = %e, "cache lookup failed, fetching from origin");
                let controller = self.clone();
                return self
                    .detached(async move { controller.pass(request, incoming).await })
                    .await;
            }
        };

        if let Some(entry) = stored.as_deref() {
            if entry.is_fresh(now) {
                let age = entry.age(now).as_secs();
                debug!(key = %key, age, "serving fresh entry");
                let mut response = entry.to_response();
                response.set_header(names::AGE, age.to_string());
                return self.finish(TransactionOutcome::HitFresh, response);
            }
            debug!(key = %key, "stored entry is stale, revalidating");
        }

        let controller = self.clone();
        self.detached(async move {
            controller
                .revalidate_or_fetch(key, request, incoming, stored, now)
                .await
        })
        .await
    }

    /// Forwards to the origin with no store access.
    async fn pass(&self, request: Request, incoming: ConditionalRequest) -> Transaction {
        let response = self.origin.handle(request, incoming).await;
        self.finish(TransactionOutcome::Miss, response)
    }

    async fn revalidate_or_fetch(
        &self,
        key: CacheKey,
        mut request: Request,
        incoming: ConditionalRequest,
        stored: Option<Arc<CachedEntry>>,
        now: SystemTime,
    ) -> Transaction {
        let conditional = match stored.as_deref() {
            Some(entry) => incoming.revalidating(&entry.validators),
            None => incoming,
        };
        conditional.apply(request.headers_mut());

        let response = self.origin.handle(request, conditional).await;
        let (mut outcome, response, replacement) =
            self.classify(&key, stored.as_deref(), response, now);

        if let Some(entry) = replacement {
            if let Err(e) = self.store.put(key.clone(), entry) {
                warn!(key = %key, error = %e, "cache write failed, response still served");
                outcome = TransactionOutcome::Miss;
            }
        }

        self.finish(outcome, response)
    }

    /// Labels the origin's answer and builds the entry to store, if any.
    fn classify(
        &self,
        key: &CacheKey,
        stored: Option<&CachedEntry>,
        response: Response,
        now: SystemTime,
    ) -> (TransactionOutcome, Response, Option<CachedEntry>) {
        let status_header = self.config.status_header.as_str();

        if response.is_not_modified() {
            let Some(prior) = stored else {
                // Only the client's own validators could have matched.
                return (TransactionOutcome::Miss, response, None);
            };
            let refreshed = prior.refreshed(&response, status_header, now);
            let served = refreshed.to_response();
            let storable = is_cacheable(
                refreshed.status,
                &refreshed.policy,
                !refreshed.validators.is_empty(),
            ) && self.fits(&refreshed);
            return if storable {
                (TransactionOutcome::StaleValidStore, served, Some(refreshed))
            } else {
                (TransactionOutcome::Miss, served, None)
            };
        }

        let policy = FreshnessPolicy::from_header(response.cache_control());
        let validators = Validators::from_headers(response.headers());
        if !is_cacheable(response.status(), &policy, !validators.is_empty()) {
            return (TransactionOutcome::Miss, response, None);
        }

        let entry = CachedEntry::capture(key.clone(), &response, status_header, now);
        if !self.fits(&entry) {
            debug!(key = %key, bytes = entry.body.len(), "body too large to store");
            return (TransactionOutcome::Miss, response, None);
        }
        let outcome = if stored.is_some() {
            TransactionOutcome::StaleInvalidStore
        } else {
            TransactionOutcome::MissStore
        };
        (outcome, response, Some(entry))
    }

    fn fits(&self, entry: &CachedEntry) -> bool {
        entry.body.len() <= self.config.max_entry_bytes
    }

    fn finish(&self, outcome: TransactionOutcome, mut response: Response) -> Transaction {
        response.set_header(self.config.status_header.as_str(), outcome.as_str());
        debug!(
            outcome = %outcome,
            status = response.status().as_u16(),
            "cache transaction complete"
        );
        Transaction { outcome, response }
    }

    /// Runs `work` on its own task and waits for it.
    async fn detached<F>(&self, work: F) -> Transaction
    where
        F: Future<Output = Transaction> + Send + 'static,
    {
        match tokio::spawn(work).await {
            Ok(transaction) => transaction,
            Err(e) => {
                error!(error = %e, "origin task failed");
                let response =
                    Response::new(StatusCode::InternalServerError).body("origin handler failed");
                self.finish(TransactionOutcome::Miss, response)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;
    use crate::cache::MemoryStore;
    use crate::http::Method;

    struct FixedClock(Mutex<SystemTime>);

    impl FixedClock {
        fn at(secs: u64) -> Arc<Self> {
            Arc::new(Self(Mutex::new(UNIX_EPOCH + Duration::from_secs(secs))))
        }

        fn advance(&self, secs: u64) {
            let mut now = self.0.lock().unwrap();
            *now += Duration::from_secs(secs);
        }
    }

    impl Clock for Arc<FixedClock> {
        fn now(&self) -> SystemTime {
            *self.0.lock().unwrap()
        }
    }

    fn counting_origin(
        cache_control: &'static str,
        calls: Arc<AtomicUsize>,
    ) -> impl Origin {
        move |_req: Request, _cond: ConditionalRequest| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Response::new(StatusCode::Ok)
                    .header("Cache-Control", cache_control)
                    .body(format!("body-{n}"))
            }
        }
    }

    #[tokio::test]
    async fn fresh_hit_skips_origin_until_expiry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let clock = FixedClock::at(1_000);
        let cache = CacheController::new(
            MemoryStore::new(),
            counting_origin("max-age=10, public", Arc::clone(&calls)),
            CacheConfig::default(),
        )
        .with_clock(Arc::clone(&clock));

        let first = cache.execute(Request::new(Method::Get, "/a")).await;
        assert_eq!(first.outcome, TransactionOutcome::MissStore);

        clock.advance(9);
        let second = cache.execute(Request::new(Method::Get, "/a")).await;
        assert_eq!(second.outcome, TransactionOutcome::HitFresh);
        assert_eq!(second.response.payload(), first.response.payload());
        assert_eq!(second.response.headers().get("age"), Some("9"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(1);
        let third = cache.execute(Request::new(Method::Get, "/a")).await;
        assert_eq!(third.outcome, TransactionOutcome::StaleInvalidStore);
        assert_ne!(third.response.payload(), first.response.payload());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn uncacheable_methods_bypass_store() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = Arc::new(MemoryStore::new());
        let cache = CacheController::new(
            Arc::clone(&store),
            counting_origin("max-age=10, public", Arc::clone(&calls)),
            CacheConfig::default(),
        );

        for _ in 0..2 {
            let t = cache.execute(Request::new(Method::Post, "/a")).await;
            assert_eq!(t.outcome, TransactionOutcome::Miss);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn oversized_bodies_are_not_stored() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = CacheConfig {
            max_entry_bytes: 3,
            ..CacheConfig::default()
        };
        let store = Arc::new(MemoryStore::new());
        let cache = CacheController::new(
            Arc::clone(&store),
            counting_origin("max-age=10, public", calls),
            config,
        );

        let t = cache.execute(Request::new(Method::Get, "/big")).await;
        assert_eq!(t.outcome, TransactionOutcome::Miss);
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn unchanged_without_prior_entry_passes_through() {
        let origin = |_req: Request, cond: ConditionalRequest| async move {
            assert_eq!(cond.if_none_match.as_deref(), Some("\"client\""));
            Response::not_modified()
                .header("Cache-Control", "public")
                .header("ETag", "\"client\"")
        };
        let store = Arc::new(MemoryStore::new());
        let cache = CacheController::new(Arc::clone(&store), origin, CacheConfig::default());

        let request = Request::new(Method::Get, "/a").with_header("If-None-Match", "\"client\"");
        let t = cache.execute(request).await;
        assert_eq!(t.outcome, TransactionOutcome::Miss);
        assert!(t.response.is_not_modified());
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn origin_panic_becomes_server_error() {
        let origin = |_req: Request, _cond: ConditionalRequest| async move {
            if true {
                panic!("origin exploded");
            }
            Response::new(StatusCode::Ok)
        };
        let cache = CacheController::new(MemoryStore::new(), origin, CacheConfig::default());

        let t = cache.execute(Request::new(Method::Get, "/a")).await;
        assert_eq!(t.outcome, TransactionOutcome::Miss);
        assert_eq!(t.response.status(), StatusCode::InternalServerError);
        assert_eq!(t.response.headers().get("x-cache-status"), Some("miss"));
    }
}
