#![allow(dead_code)]

pub mod expires;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rttp_cache::cache::{
    CacheController, CacheKey, CacheStore, CachedEntry, Clock, MemoryStore, StoreError,
};
use rttp_cache::http::{Request, Response};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Parses a raw GET for `target` with `headers` and runs it through `cache`.
pub async fn get(cache: &CacheController, target: &str, headers: &[(&str, &str)]) -> Response {
    let mut raw = format!("GET {target} HTTP/1.1\r\nHost: example.org\r\n");
    for (name, value) in headers {
        raw.push_str(&format!("{name}: {value}\r\n"));
    }
    raw.push_str("\r\n");
    let (request, _) = Request::parse(raw.as_bytes()).unwrap();
    cache.handle(request).await
}

pub fn status(response: &Response) -> &str {
    response.headers().get("x-cache-status").unwrap_or("")
}

/// A clock the test moves by hand.
#[derive(Clone)]
pub struct ManualClock(Arc<Mutex<SystemTime>>);

impl ManualClock {
    pub fn at(secs: u64) -> Self {
        Self(Arc::new(Mutex::new(UNIX_EPOCH + Duration::from_secs(secs))))
    }

    pub fn advance(&self, secs: u64) {
        *self.0.lock().unwrap() += Duration::from_secs(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.0.lock().unwrap()
    }
}

/// Wraps a [`MemoryStore`] and fails the operations it is told to.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    pub fail_get: bool,
    pub fail_put: bool,
    pub puts: AtomicUsize,
}

impl FailingStore {
    pub fn failing_get() -> Self {
        Self {
            fail_get: true,
            ..Self::default()
        }
    }

    pub fn failing_put() -> Self {
        Self {
            fail_put: true,
            ..Self::default()
        }
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

impl CacheStore for FailingStore {
    fn get(&self, key: &CacheKey) -> Result<Option<Arc<CachedEntry>>, StoreError> {
        if self.fail_get {
            return Err(StoreError::Unavailable {
                reason: "backend offline".into(),
            });
        }
        self.inner.get(key)
    }

    fn put(&self, key: CacheKey, entry: CachedEntry) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_put {
            return Err(StoreError::Unavailable {
                reason: "disk full".into(),
            });
        }
        self.inner.put(key, entry)
    }
}
