// ============================================================================
// Batch Loader
// ============================================================================
//
// Per-operation memoizing fetch coordinator.
//
// - A key is registered synchronously at call time into the open batch.
//   Every key of a batch awaits the batch's shared dispatch future, which
//   closes the batch and runs the fetch when it is first polled. Nothing is
//   polled before the caller's synchronous segment ends, so every key
//   requested in that segment lands in the same batch on any executor.
// - Each key maps to one shared outcome for the loader's whole lifetime;
//   later requests (in flight or resolved) reuse it without fetching.
//
// ============================================================================

use crate::core::{DomainError, Result};
use async_trait::async_trait;
use futures::future::{self, BoxFuture, FutureExt, Shared, try_join_all};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Outcome of loading one key: `None` when the store has no entity for it.
pub type LoadOutcome<V> = Result<Option<V>>;

type SharedLoad<V> = Shared<BoxFuture<'static, LoadOutcome<V>>>;
type Dispatch = Shared<BoxFuture<'static, ()>>;
type Waiters<K, V> = Vec<(K, oneshot::Sender<LoadOutcome<V>>)>;

/// The underlying fetch behind a loader.
#[async_trait]
pub trait BatchFn<K, V>: Send + Sync + 'static {
    /// Fetch entities for a list of distinct keys. Keys without an entity
    /// are simply absent from the result.
    async fn load(&self, keys: &[K]) -> Result<Vec<V>>;

    /// Key a fetched entity answers.
    fn key_of(&self, value: &V) -> K;
}

/// Keys registered since the last dispatch.
struct OpenBatch<K, V> {
    id: u64,
    waiters: Waiters<K, V>,
    dispatch: Dispatch,
}

struct LoaderState<K, V> {
    cache: HashMap<K, SharedLoad<V>>,
    open: Option<OpenBatch<K, V>>,
    batch_seq: u64,
}

#[derive(Default)]
struct Counters {
    batches: AtomicUsize,
    keys: AtomicUsize,
}

/// Fetch activity of one loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoaderStats {
    /// Calls made to the underlying fetch.
    pub batches: usize,
    /// Keys handed to the underlying fetch, summed over all batches.
    pub keys_fetched: usize,
}

pub struct BatchLoader<K, V, F> {
    fetcher: Arc<F>,
    state: Arc<Mutex<LoaderState<K, V>>>,
    counters: Arc<Counters>,
    max_batch_size: usize,
}

impl<K, V, F> BatchLoader<K, V, F>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    F: BatchFn<K, V>,
{
    pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            state: Arc::new(Mutex::new(LoaderState {
                cache: HashMap::new(),
                open: None,
                batch_seq: 0,
            })),
            counters: Arc::new(Counters::default()),
            max_batch_size: Self::DEFAULT_MAX_BATCH_SIZE,
        }
    }

    pub fn with_max_batch_size(mut self, max: usize) -> Self {
        self.max_batch_size = max.max(1);
        self
    }

    /// Resolve one key. The key is registered before this returns, so the
    /// returned future may be awaited later without losing batching.
    pub fn load(&self, key: K) -> BoxFuture<'static, LoadOutcome<V>> {
        match self.register(key) {
            Ok(shared) => shared.boxed(),
            Err(err) => future::ready(Err(err)).boxed(),
        }
    }

    /// Resolve several keys; the result is positional with `keys`.
    pub fn load_many<I>(&self, keys: I) -> BoxFuture<'static, Result<Vec<Option<V>>>>
    where
        I: IntoIterator<Item = K>,
    {
        let registered: Result<Vec<SharedLoad<V>>> =
            keys.into_iter().map(|key| self.register(key)).collect();

        async move { try_join_all(registered?).await }.boxed()
    }

    /// Seed the cache with a value already in hand, replacing whatever
    /// outcome was cached for the key. Waiters already holding the old
    /// outcome are unaffected.
    pub fn prime(&self, key: K, value: V) {
        // The state is a cache; a poisoned lock still holds usable entries.
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .cache
            .insert(key, future::ready(Ok(Some(value))).boxed().shared());
    }

    pub fn stats(&self) -> LoaderStats {
        LoaderStats {
            batches: self.counters.batches.load(Ordering::Relaxed),
            keys_fetched: self.counters.keys.load(Ordering::Relaxed),
        }
    }

    fn register(&self, key: K) -> Result<SharedLoad<V>> {
        let mut state = self.state.lock()?;
        if let Some(existing) = state.cache.get(&key) {
            return Ok(existing.clone());
        }

        let mut batch = match state.open.take() {
            Some(batch) => batch,
            None => {
                state.batch_seq += 1;
                self.open_batch(state.batch_seq)
            }
        };

        let (sender, receiver) = oneshot::channel();
        let dispatch = batch.dispatch.clone();
        let shared = async move {
            dispatch.await;
            receiver.await.unwrap_or_else(|_| {
                Err(DomainError::storage("batch dispatch ended before resolving key"))
            })
        }
        .boxed()
        .shared();

        batch.waiters.push((key.clone(), sender));
        state.open = Some(batch);
        state.cache.insert(key, shared.clone());
        Ok(shared)
    }

    fn open_batch(&self, id: u64) -> OpenBatch<K, V> {
        let dispatch = Self::dispatch(
            id,
            Arc::clone(&self.fetcher),
            Arc::clone(&self.state),
            Arc::clone(&self.counters),
            self.max_batch_size,
        )
        .boxed()
        .shared();

        OpenBatch {
            id,
            waiters: Vec::new(),
            dispatch,
        }
    }

    /// Close batch `id` and fetch its keys. Runs once, on first poll.
    async fn dispatch(
        id: u64,
        fetcher: Arc<F>,
        state: Arc<Mutex<LoaderState<K, V>>>,
        counters: Arc<Counters>,
        max_batch_size: usize,
    ) {
        let mut waiters = {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            match state.open.take() {
                Some(batch) if batch.id == id => batch.waiters,
                other => {
                    state.open = other;
                    Vec::new()
                }
            }
        };

        while !waiters.is_empty() {
            let rest = waiters.split_off(waiters.len().min(max_batch_size));
            Self::dispatch_chunk(fetcher.as_ref(), waiters, &counters).await;
            waiters = rest;
        }
    }

    async fn dispatch_chunk(fetcher: &F, chunk: Waiters<K, V>, counters: &Counters) {
        let keys: Vec<K> = chunk.iter().map(|(key, _)| key.clone()).collect();
        counters.batches.fetch_add(1, Ordering::Relaxed);
        counters.keys.fetch_add(keys.len(), Ordering::Relaxed);
        debug!(keys = keys.len(), "dispatching batch");

        match fetcher.load(&keys).await {
            Ok(values) => {
                let mut found: HashMap<K, V> = values
                    .into_iter()
                    .map(|value| (fetcher.key_of(&value), value))
                    .collect();
                for (key, sender) in chunk {
                    // A dropped receiver only means nobody awaits this key.
                    let _ = sender.send(Ok(found.remove(&key)));
                }
            }
            Err(err) => {
                warn!(keys = ?keys, error = %err, "batch fetch failed");
                for (_, sender) in chunk {
                    let _ = sender.send(Err(err.clone()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    /// Squares keys; records every batch it receives.
    type SquareLoader = BatchLoader<u32, (u32, u64), Arc<Squares>>;

    #[derive(Default)]
    struct Squares {
        calls: StdMutex<Vec<Vec<u32>>>,
    }

    #[async_trait]
    impl BatchFn<u32, (u32, u64)> for Arc<Squares> {
        async fn load(&self, keys: &[u32]) -> Result<Vec<(u32, u64)>> {
            self.calls.lock().unwrap().push(keys.to_vec());
            Ok(keys
                .iter()
                .filter(|key| **key != 0)
                .map(|key| (*key, u64::from(*key) * u64::from(*key)))
                .collect())
        }

        fn key_of(&self, value: &(u32, u64)) -> u32 {
            value.0
        }
    }

    #[tokio::test]
    async fn test_same_segment_requests_share_one_batch() {
        let squares = Arc::new(Squares::default());
        let loader = SquareLoader::new(Arc::clone(&squares));

        let a = loader.load(3);
        let b = loader.load(4);
        let c = loader.load(3);
        let (a, b, c) = tokio::join!(a, b, c);

        assert_eq!(a.unwrap(), Some((3, 9)));
        assert_eq!(b.unwrap(), Some((4, 16)));
        assert_eq!(c.unwrap(), Some((3, 9)));
        assert_eq!(*squares.calls.lock().unwrap(), vec![vec![3, 4]]);
    }

    #[tokio::test]
    async fn test_max_batch_size_splits_dispatch() {
        let squares = Arc::new(Squares::default());
        let loader = SquareLoader::new(Arc::clone(&squares)).with_max_batch_size(2);

        let values = loader.load_many(vec![1, 2, 3, 4, 5]).await.unwrap();
        assert_eq!(values.len(), 5);
        assert_eq!(
            *squares.calls.lock().unwrap(),
            vec![vec![1, 2], vec![3, 4], vec![5]]
        );
        assert_eq!(loader.stats().batches, 3);
        assert_eq!(loader.stats().keys_fetched, 5);
    }

    #[tokio::test]
    async fn test_prime_skips_fetch() {
        let squares = Arc::new(Squares::default());
        let loader = SquareLoader::new(Arc::clone(&squares));

        loader.prime(7, (7, 0));
        assert_eq!(loader.load(7).await.unwrap(), Some((7, 0)));
        assert!(squares.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keys_after_dispatch_open_a_new_batch() {
        let squares = Arc::new(Squares::default());
        let loader = SquareLoader::new(Arc::clone(&squares));

        let first = loader.load(1);
        let second = loader.load(2);
        assert_eq!(first.await.unwrap(), Some((1, 1)));

        let third = loader.load(3);
        assert_eq!(second.await.unwrap(), Some((2, 4)));
        assert_eq!(third.await.unwrap(), Some((3, 9)));
        assert_eq!(*squares.calls.lock().unwrap(), vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_resolves_on_any_executor() {
        let squares = Arc::new(Squares::default());
        let loader = SquareLoader::new(Arc::clone(&squares));

        let values = futures::executor::block_on(loader.load_many(vec![0, 5, 5])).unwrap();
        assert_eq!(values, vec![None, Some((5, 25)), Some((5, 25))]);
        assert_eq!(*squares.calls.lock().unwrap(), vec![vec![0, 5]]);
    }
}
