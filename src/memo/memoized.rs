//! Memoized Function Module
//!
//! Wraps a function behind a bounded store: arguments are normalized, sliced
//! and turned into a key; hits skip the function entirely, misses run it and
//! store whatever it returned, pending computations included.

use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::FutureExt;
use serde_json::Value;
use tracing::debug;

use crate::cache::{BoundedStore, CacheStats};
use crate::config::{CacheConfig, KeyLength};
use crate::error::{CachifyError, Result};
use crate::memo::call::{identity_normalize, json_key, value_kind};
use crate::memo::{Call, Outcome, PendingResult};

type WrappedFn<T, E> = Arc<dyn Fn(&Call) -> std::result::Result<Outcome<T, E>, E> + Send + Sync>;
type NormalizeFn = Arc<dyn Fn(&Call) -> Value + Send + Sync>;
type KeyFn<K> = Arc<dyn Fn(&Call) -> K + Send + Sync>;
type SharedStore<K, T, E> = Arc<Mutex<BoundedStore<K, Outcome<T, E>>>>;

// The store is never left half-updated, so a poisoned lock is still usable.
fn lock<K, V>(store: &Mutex<BoundedStore<K, V>>) -> MutexGuard<'_, BoundedStore<K, V>> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

// == Memoized ==
/// A function wrapped behind a bounded LRU store.
///
/// `T` is the function's value type, `E` its error type and `K` the cache key
/// type (`String` unless a custom key function is installed).
pub struct Memoized<T, E, K = String> {
    func: WrappedFn<T, E>,
    normalize: NormalizeFn,
    key: KeyFn<K>,
    length: KeyLength,
    store: SharedStore<K, T, E>,
    enabled: AtomicBool,
}

/// Wraps `func` with the default configuration.
pub fn cachify<T, E, F>(func: F) -> Memoized<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    F: Fn(&Call) -> std::result::Result<Outcome<T, E>, E> + Send + Sync + 'static,
{
    cachify_with(CacheConfig::default(), func)
}

/// Wraps `func` with an explicit configuration.
pub fn cachify_with<T, E, F>(config: CacheConfig, func: F) -> Memoized<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    F: Fn(&Call) -> std::result::Result<Outcome<T, E>, E> + Send + Sync + 'static,
{
    MemoizedBuilder::new().config(config).assemble(Arc::new(func))
}

impl<T, E> Memoized<T, E, String>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Starts a builder exposing every option.
    pub fn builder() -> MemoizedBuilder<T, E, String> {
        MemoizedBuilder::new()
    }
}

impl<T, E, K> Memoized<T, E, K>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    K: Eq + Hash + Clone + fmt::Debug + Send + 'static,
{
    // == Call ==
    /// Invokes the memoized function.
    ///
    /// On a hit the stored outcome is returned and the function is not run. A
    /// stored pending outcome that has already failed counts as a miss.
    /// On a miss the function runs with the full normalized arguments and its
    /// outcome is stored, unless it failed synchronously. A pending outcome is
    /// stored as-is, so concurrent callers share one computation; if it later
    /// fails, its key is dropped from the store.
    pub fn call(&self, call: impl Into<Call>) -> Result<Outcome<T, E>, E> {
        let (normalized, key) = self.resolve(&call.into())?;
        let enabled = self.is_enabled();

        if enabled {
            if let Some(hit) = self.live_hit(&key) {
                debug!(?key, "cache hit");
                return Ok(hit);
            }
            lock(&self.store).record_miss();
            debug!(?key, "cache miss");
        } else {
            lock(&self.store).record_bypass();
            debug!(?key, "cache disabled, skipping");
        }

        // Throwing synchronously means nothing is stored
        let outcome = (self.func)(&normalized).map_err(CachifyError::Computation)?;

        if !enabled {
            return Ok(outcome);
        }

        let outcome = match outcome {
            Outcome::Pending(pending) => {
                Outcome::Pending(self.evict_on_failure(key.clone(), pending))
            }
            ready => ready,
        };
        lock(&self.store).set(key, outcome.clone());

        Ok(outcome)
    }

    // == Side Methods ==
    /// Looks up the outcome a call would hit, without promoting it.
    pub fn peek(&self, call: impl Into<Call>) -> Result<Option<Outcome<T, E>>, E> {
        let (_, key) = self.resolve(&call.into())?;
        Ok(lock(&self.store).peek(&key))
    }

    /// Reports whether a call would hit.
    pub fn has(&self, call: impl Into<Call>) -> Result<bool, E> {
        let (_, key) = self.resolve(&call.into())?;
        Ok(lock(&self.store).has(&key))
    }

    /// Drops the entry a call would hit. Returns whether there was one.
    pub fn delete(&self, call: impl Into<Call>) -> Result<bool, E> {
        let (_, key) = self.resolve(&call.into())?;
        debug!(?key, "deleting");
        Ok(lock(&self.store).delete(&key).is_some())
    }

    /// Alias of [`Memoized::delete`].
    pub fn del(&self, call: impl Into<Call>) -> Result<bool, E> {
        self.delete(call)
    }

    /// Computes the cache key a call maps to.
    pub fn key_for(&self, call: impl Into<Call>) -> Result<K, E> {
        self.resolve(&call.into()).map(|(_, key)| key)
    }

    pub fn enable_cache(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    /// Bypasses lookups and writes until re-enabled. Entries are kept.
    pub fn disable_cache(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    // == Store Pass-through ==
    /// Reads an entry by raw key, promoting it.
    pub fn get(&self, key: &K) -> Option<Outcome<T, E>> {
        lock(&self.store).get(key)
    }

    /// Writes an entry by raw key.
    pub fn set(&self, key: K, outcome: Outcome<T, E>) {
        lock(&self.store).set(key, outcome);
    }

    /// Writes an entry by raw key with its own max-age (None = never expires).
    pub fn set_with_ttl(&self, key: K, outcome: Outcome<T, E>, ttl: Option<Duration>) {
        lock(&self.store).set_with_ttl(key, outcome, ttl);
    }

    pub fn reset(&self) {
        lock(&self.store).reset();
    }

    pub fn len(&self) -> usize {
        lock(&self.store).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.store).is_empty()
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<K> {
        lock(&self.store).keys()
    }

    /// Stored outcomes from most to least recently used.
    pub fn values(&self) -> Vec<Outcome<T, E>> {
        lock(&self.store).values()
    }

    /// Drops expired entries, returning how many were removed.
    pub fn prune(&self) -> usize {
        lock(&self.store).prune()
    }

    pub fn stats(&self) -> CacheStats {
        lock(&self.store).stats()
    }

    pub fn max(&self) -> usize {
        lock(&self.store).max()
    }

    // == Key Pipeline ==
    // normalize -> key-relevant slice -> key; shared by `call` and every side method.
    fn resolve(&self, call: &Call) -> Result<(Call, K), E> {
        let args = match (self.normalize)(call) {
            Value::Array(args) => args,
            other => return Err(CachifyError::InvalidNormalizeResult(value_kind(&other))),
        };

        let end = self.length.slice_end(args.len());
        let key = (self.key)(&call.with_args(args[..end].to_vec()));

        Ok((call.with_args(args), key))
    }

    // A stored pending outcome whose computation already failed is not a hit.
    // Polling it once runs the eviction below, so the lock must not be held.
    fn live_hit(&self, key: &K) -> Option<Outcome<T, E>> {
        let stored = {
            let mut store = lock(&self.store);
            if !store.has(key) {
                return None;
            }
            store.peek(key)?
        };

        if let Outcome::Pending(pending) = &stored {
            if let Some(Err(_)) = pending.clone().now_or_never() {
                debug!(?key, "stored pending result already failed");
                return None;
            }
        }

        lock(&self.store).get(key)
    }

    fn evict_on_failure(&self, key: K, pending: PendingResult<T, E>) -> PendingResult<T, E> {
        // Unconditional delete-by-key: a newer entry written under the same key
        // before this failure surfaces is dropped as well.
        let store = Arc::clone(&self.store);
        async move {
            let result = pending.await;
            if result.is_err() {
                debug!(?key, "pending result failed, evicting");
                let mut guard = lock(&store);
                if guard.delete(&key).is_some() {
                    guard.record_unwind();
                }
            }
            result
        }
        .boxed()
        .shared()
    }
}

impl<T, E, K> fmt::Debug for Memoized<T, E, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("length", &self.length)
            .field("enabled", &self.enabled.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

// == Builder ==
/// Configures and builds a [`Memoized`] function.
pub struct MemoizedBuilder<T, E, K = String> {
    config: CacheConfig,
    normalize: NormalizeFn,
    key: KeyFn<K>,
    func: Option<WrappedFn<T, E>>,
}

impl<T, E> MemoizedBuilder<T, E, String> {
    pub fn new() -> Self {
        Self {
            config: CacheConfig::default(),
            normalize: Arc::new(identity_normalize),
            key: Arc::new(json_key),
            func: None,
        }
    }
}

impl<T, E> Default for MemoizedBuilder<T, E, String> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E, K> MemoizedBuilder<T, E, K>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    K: Eq + Hash + Clone + fmt::Debug + Send + 'static,
{
    /// Replaces store settings and key length with a whole configuration.
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Maximum number of entries, 0 = unbounded.
    pub fn max(mut self, max: usize) -> Self {
        self.config.store.max = max;
        self
    }

    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.config.store.max_age_ms = Some(u64::try_from(max_age.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn stale(mut self, stale: bool) -> Self {
        self.config.store.stale = stale;
        self
    }

    /// Caps how many leading normalized arguments form the key.
    pub fn length(mut self, length: impl Into<KeyLength>) -> Self {
        self.config.length = length.into();
        self
    }

    /// Maps raw call arguments to the normalized list; must return an array.
    pub fn normalize<N>(mut self, normalize: N) -> Self
    where
        N: Fn(&Call) -> Value + Send + Sync + 'static,
    {
        self.normalize = Arc::new(normalize);
        self
    }

    /// Installs a custom key function over the key-relevant slice.
    pub fn key<K2, F>(self, key: F) -> MemoizedBuilder<T, E, K2>
    where
        F: Fn(&Call) -> K2 + Send + Sync + 'static,
    {
        MemoizedBuilder {
            config: self.config,
            normalize: self.normalize,
            key: Arc::new(key),
            func: self.func,
        }
    }

    /// The function to memoize.
    pub fn function<F>(mut self, func: F) -> Self
    where
        F: Fn(&Call) -> std::result::Result<Outcome<T, E>, E> + Send + Sync + 'static,
    {
        self.func = Some(Arc::new(func));
        self
    }

    pub fn build(mut self) -> Result<Memoized<T, E, K>, E> {
        let func = self.func.take().ok_or(CachifyError::MissingFunction)?;
        Ok(self.assemble(func))
    }

    fn assemble(self, func: WrappedFn<T, E>) -> Memoized<T, E, K> {
        Memoized {
            func,
            normalize: self.normalize,
            key: self.key,
            length: self.config.length,
            store: Arc::new(Mutex::new(BoundedStore::from_options(&self.config.store))),
            enabled: AtomicBool::new(true),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::call;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn counting_identity(calls: Arc<AtomicUsize>) -> Memoized<Value, String> {
        cachify(move |call: &Call| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Outcome::Ready(call.arg(0).clone()))
        })
    }

    #[test]
    fn test_builder_requires_function() {
        let result = Memoized::<u32, String>::builder().max(1).build();
        assert!(matches!(result, Err(CachifyError::MissingFunction)));
    }

    #[test]
    fn test_hit_skips_function() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo = counting_identity(calls.clone());

        assert_eq!(memo.call(call![3]).unwrap().into_ready(), Some(json!(3)));
        assert_eq!(memo.call(call![3]).unwrap().into_ready(), Some(json!(3)));
        assert_eq!(memo.call(call!["foo"]).unwrap().into_ready(), Some(json!("foo")));
        assert_eq!(memo.call(call!["foo"]).unwrap().into_ready(), Some(json!("foo")));

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(memo.stats().hits, 2);
        assert_eq!(memo.stats().misses, 2);
    }

    #[test]
    fn test_function_receives_full_normalized_args() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let memo = Memoized::builder()
            .length(1)
            .function(move |call: &Call| {
                sink.lock().unwrap().push(call.args().to_vec());
                Ok::<_, String>(Outcome::Ready(call.arity()))
            })
            .build()
            .unwrap();

        memo.call(call![1, 2, 3]).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![vec![json!(1), json!(2), json!(3)]]);
        assert_eq!(memo.key_for(call![1, 2, 3]).unwrap(), "[1]");
    }

    #[test]
    fn test_key_sees_receiver_and_slice() {
        let memo = Memoized::builder()
            .length(1)
            .key(|call: &Call| (call.receiver().map(Value::to_string), json_key(call)))
            .function(|_: &Call| Ok::<_, String>(Outcome::Ready(())))
            .build()
            .unwrap();

        let key = memo.key_for(call![1, 2].with_receiver(json!("svc"))).unwrap();
        assert_eq!(key, (Some(r#""svc""#.to_string()), "[1]".to_string()));
    }

    #[test]
    fn test_receiver_reaches_normalize_and_function() {
        let memo = Memoized::builder()
            .normalize(|call: &Call| json!([call.receiver().cloned(), call.arg(0)]))
            .function(|call: &Call| {
                Ok::<_, String>(Outcome::Ready(call.receiver().cloned().unwrap_or(Value::Null)))
            })
            .build()
            .unwrap();

        let outcome = memo.call(call![1].with_receiver(json!("a"))).unwrap();
        assert_eq!(outcome.into_ready(), Some(json!("a")));
        assert!(memo.has(call![1].with_receiver(json!("a"))).unwrap());
        assert!(!memo.has(call![1].with_receiver(json!("b"))).unwrap());
    }

    #[test]
    fn test_disabled_cache_neither_reads_nor_writes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo = counting_identity(calls.clone());

        memo.disable_cache();
        memo.call(call![1]).unwrap();
        assert!(!memo.is_enabled());
        assert!(memo.is_empty());
        assert_eq!(memo.stats().bypassed, 1);

        memo.enable_cache();
        memo.call(call![1]).unwrap();
        memo.call(call![1]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_synchronous_failure_is_not_stored() {
        let memo: Memoized<u32, String> = cachify(|_: &Call| Err("boom".to_string()));

        let err = memo.call(call![1]).unwrap_err();

        assert_eq!(err, CachifyError::Computation("boom".to_string()));
        assert!(!memo.has(call![1]).unwrap());
    }

    #[test]
    fn test_invalid_normalize_result() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let memo = Memoized::builder()
            .normalize(|call: &Call| call.arg(0).clone())
            .function(move |_: &Call| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(Outcome::Ready(0))
            })
            .build()
            .unwrap();

        let err = memo.call(call![{"a": 1}]).unwrap_err();
        assert_eq!(err, CachifyError::InvalidNormalizeResult("object"));
        assert!(err.to_string().contains("normalize must return an array"));

        assert!(memo.peek(call![1]).is_err());
        assert!(memo.has(call![1]).is_err());
        assert!(memo.delete(call![1]).is_err());
        assert!(memo.del(call![null]).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // An array as first argument passes through as the normalized list
        assert!(memo.call(call![[1, 2]]).is_ok());
    }

    #[test]
    fn test_pass_through_raw_keys() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo = counting_identity(calls.clone());

        memo.set("[7]".to_string(), Outcome::Ready(json!("seeded")));
        assert_eq!(
            memo.call(call![7]).unwrap().into_ready(),
            Some(json!("seeded"))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert!(memo.get(&"[7]".to_string()).is_some());
        assert_eq!(memo.keys(), vec!["[7]".to_string()]);
        assert_eq!(memo.len(), 1);
        assert_eq!(memo.max(), 0);

        memo.set_with_ttl(
            "[8]".to_string(),
            Outcome::Ready(json!("short-lived")),
            Some(Duration::from_millis(30)),
        );
        let values: Vec<_> = memo.values().into_iter().filter_map(Outcome::into_ready).collect();
        assert_eq!(values, vec![json!("short-lived"), json!("seeded")]);

        std::thread::sleep(Duration::from_millis(60));
        assert!(!memo.has(call![8]).unwrap());
        assert_eq!(memo.call(call![8]).unwrap().into_ready(), Some(json!(8)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        memo.reset();
        assert!(memo.is_empty());
    }

    #[test]
    fn test_delete_reports_existence() {
        let memo = counting_identity(Arc::new(AtomicUsize::new(0)));

        memo.call(call![1]).unwrap();

        assert!(memo.delete(call![1]).unwrap());
        assert!(!memo.del(call![1]).unwrap());
    }

    #[test]
    fn test_reentrant_call_from_function() {
        let memo: Arc<Mutex<Option<Arc<Memoized<u64, String>>>>> = Arc::new(Mutex::new(None));
        let handle = memo.clone();
        let fib = Arc::new(cachify(move |call: &Call| -> std::result::Result<Outcome<u64, String>, String> {
            let n = call.arg(0).as_u64().unwrap_or(0);
            if n < 2 {
                return Ok(Outcome::Ready(n));
            }
            let inner = handle.lock().unwrap().clone().ok_or("unset".to_string())?;
            let a = inner.call(call![n - 1]).map_err(|e| e.to_string())?;
            let b = inner.call(call![n - 2]).map_err(|e| e.to_string())?;
            Ok(Outcome::Ready(a.into_ready().unwrap_or(0) + b.into_ready().unwrap_or(0)))
        }));
        *memo.lock().unwrap() = Some(fib.clone());

        assert_eq!(fib.call(call![30]).unwrap().into_ready(), Some(832040));
        assert_eq!(fib.len(), 31);
    }
}
