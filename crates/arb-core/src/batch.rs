//! Debounced collection of multi-part transmissions (Telegram albums).
//!
//! Telegram delivers every part of a media group as an independent update and
//! never marks the last one. [`BatchCollector`] groups parts under a key and
//! hands the whole batch to a flush handler once the key has been quiet for a
//! fixed interval, measured from the most recent part.

use std::{
    collections::HashMap,
    fmt::Debug,
    future::Future,
    hash::Hash,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard,
    },
    time::Duration,
};

use tokio_util::sync::CancellationToken;

pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Called once per flushed key with the accumulated batch.
pub type FlushFn<K, T, E> = Arc<dyn Fn(K, Batch<T, E>) -> BoxFuture + Send + Sync>;

/// Caption text plus its formatting spans.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caption<E> {
    pub text: String,
    pub entities: Vec<E>,
}

impl<E> Caption<E> {
    /// Blank captions count as "no caption" so a later part can still supply one.
    pub fn new(text: impl Into<String>, entities: Vec<E>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return None;
        }
        Some(Self { text, entities })
    }
}

/// What the flush handler receives: items in arrival order and the first caption seen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch<T, E> {
    pub items: Vec<T>,
    pub caption: Option<Caption<E>>,
}

struct PendingBatch<T, E> {
    items: Vec<T>,
    caption: Option<Caption<E>>,
    generation: u64,
    cancel: CancellationToken,
}

struct Inner<K, T, E> {
    quiet: Duration,
    on_flush: FlushFn<K, T, E>,
    pending: Mutex<HashMap<K, PendingBatch<T, E>>>,
    /// Shared by all keys so a generation is never handed out twice.
    next_generation: AtomicU64,
}

/// Per-key debounce buffer.
///
/// Every `observe` appends, cancels the key's waiting timer and arms a new one
/// inside the same critical section. Timers carry the generation they were
/// armed with; a timer that wakes up after being superseded finds a newer
/// generation in the map and leaves the entry alone. Generations come from one
/// collector-wide counter, so a stale timer cannot match a later entry that
/// reuses its key.
pub struct BatchCollector<K, T, E = ()> {
    inner: Arc<Inner<K, T, E>>,
}

impl<K, T, E> Clone for BatchCollector<K, T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, T, E> BatchCollector<K, T, E>
where
    K: Clone + Eq + Hash + Debug + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    pub fn new(quiet: Duration, on_flush: FlushFn<K, T, E>) -> Self {
        Self {
            inner: Arc::new(Inner {
                quiet,
                on_flush,
                pending: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    pub fn quiet_interval(&self) -> Duration {
        self.inner.quiet
    }

    /// Record one part for `key` and restart its quiet timer.
    ///
    /// `item` is `None` for parts of a kind the caller cannot resend; those
    /// still count as activity on the key. Must be called from within a tokio
    /// runtime; it never awaits.
    pub fn observe(&self, key: K, item: Option<T>, caption: Option<Caption<E>>) {
        let cancel = CancellationToken::new();
        let generation = {
            let mut map = self.lock();
            let entry = map.entry(key.clone()).or_insert_with(|| PendingBatch {
                items: Vec::new(),
                caption: None,
                generation: 0,
                cancel: CancellationToken::new(),
            });

            if let Some(item) = item {
                entry.items.push(item);
            }
            if entry.caption.is_none() {
                entry.caption = caption;
            }

            entry.cancel.cancel();
            entry.cancel = cancel.clone();
            entry.generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);

            tracing::debug!(
                key = ?key,
                parts = entry.items.len(),
                generation = entry.generation,
                "batch part observed"
            );
            entry.generation
        };

        self.spawn_timer(key, generation, cancel);
    }

    /// Number of keys currently waiting for their quiet interval to elapse.
    pub fn pending_len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.lock().contains_key(key)
    }

    fn spawn_timer(&self, key: K, generation: u64, cancel: CancellationToken) {
        let collector = self.clone();
        let quiet = self.inner.quiet;
        tokio::spawn(async move {
            tokio::select! {
              _ = cancel.cancelled() => {}
              _ = tokio::time::sleep(quiet) => {
                collector.fire(key, generation).await;
              }
            }
        });
    }

    async fn fire(&self, key: K, generation: u64) {
        let Some(batch) = self.take_if_current(&key, generation) else {
            return;
        };

        tracing::debug!(key = ?key, parts = batch.items.len(), "flushing batch");
        (self.inner.on_flush)(key, batch).await;
    }

    fn take_if_current(&self, key: &K, generation: u64) -> Option<Batch<T, E>> {
        let mut map = self.lock();
        if map.get(key)?.generation != generation {
            return None;
        }
        let pending = map.remove(key)?;
        Some(Batch {
            items: pending.items,
            caption: pending.caption,
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, PendingBatch<T, E>>> {
        // Critical sections never panic mid-update, so a poisoned map is still consistent.
        self.inner
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
