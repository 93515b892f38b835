//! Core pool implementation

use crate::config::PoolConfiguration;
use crate::errors::{PoolError, PoolResult};
use crate::free_list::FreeList;
use crate::handle::PooledResource;
use crate::metrics::{MetricsExporter, MetricsTracker, PoolMetrics};
use crate::resource::{Producer, Resource};

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    /// Free-list is being pre-filled; nothing may use it yet
    Warming,
    Open,
    Closed,
}

pub(crate) struct State<P> {
    pub lifecycle: Lifecycle,
    /// Dropped on close
    pub producer: Option<P>,
}

/// State shared by every clone of a [`Pool`] and, weakly, by its handles.
///
/// `get` and `put` hold the read side of `state`; `close` holds the write
/// side for its whole duration.
pub(crate) struct Shared<P: Producer> {
    pub state: RwLock<State<P>>,
    pub free_list: FreeList<P::Resource>,
    pub metrics: MetricsTracker,
}

impl<P: Producer> Shared<P> {
    fn new(producer: P, max_capacity: usize) -> Self {
        Self {
            state: RwLock::new(State {
                lifecycle: Lifecycle::Warming,
                producer: Some(producer),
            }),
            free_list: FreeList::new(max_capacity),
            metrics: MetricsTracker::new(),
        }
    }

    /// Pre-fill the free-list, then open the pool.
    ///
    /// On failure every resource made so far is released and the pool ends
    /// up closed.
    fn warm_up(&self, count: usize) -> PoolResult<()> {
        let mut state = self.state.write();

        let filled = match state.producer.as_ref() {
            Some(producer) => self.fill(producer, count),
            None => Ok(()),
        };

        match filled {
            Ok(()) => {
                state.lifecycle = Lifecycle::Open;
                tracing::debug!(idle = self.free_list.len(), "pool warmed up");
                Ok(())
            }
            Err(e) => {
                let released = self.shut_down(&mut state);
                tracing::debug!(released, error = %e, "pool warm-up failed");
                Err(PoolError::Initialization(Box::new(e)))
            }
        }
    }

    fn fill(&self, producer: &P, count: usize) -> Result<(), P::Error> {
        for _ in 0..count {
            let resource = producer.produce()?;
            self.metrics.produced.fetch_add(1, Ordering::Relaxed);
            if let Err(resource) = self.free_list.try_push(resource) {
                self.discard(resource);
            }
        }
        Ok(())
    }

    pub fn acquire(&self) -> PoolResult<P::Resource> {
        let state = self.state.read();
        match state.lifecycle {
            Lifecycle::Warming => return Err(PoolError::Uninitialized),
            Lifecycle::Closed => return Err(PoolError::Closed),
            Lifecycle::Open => {}
        }

        if let Some(resource) = self.free_list.try_pop() {
            self.metrics.reused.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(idle = self.free_list.len(), "reusing idle resource");
            return Ok(resource);
        }

        // The free-list is empty. Produce past max capacity if need be;
        // recycle() drops the surplus on the way back.
        let producer = state.producer.as_ref().ok_or(PoolError::Closed)?;
        let resource = producer
            .produce()
            .map_err(|e| PoolError::Produce(Box::new(e)))?;
        self.metrics.produced.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("free-list empty, produced a new resource");
        Ok(resource)
    }

    pub fn recycle(&self, resource: P::Resource) -> PoolResult<()> {
        let state = self.state.read();
        match state.lifecycle {
            Lifecycle::Warming => {
                release_quietly(resource);
                return Err(PoolError::Uninitialized);
            }
            Lifecycle::Closed => {
                drop(state);
                tracing::trace!("pool closed, releasing returned resource");
                self.discard(resource);
                return Ok(());
            }
            Lifecycle::Open => {}
        }

        match self.free_list.try_push(resource) {
            Ok(()) => {
                self.metrics.returned.fetch_add(1, Ordering::Relaxed);
            }
            Err(resource) => {
                tracing::trace!(
                    max_capacity = self.free_list.capacity(),
                    "free-list full, releasing returned resource"
                );
                self.discard(resource);
            }
        }
        Ok(())
    }

    /// Drop the producer, then release every idle resource and mark the
    /// pool closed. Returns the number of resources released.
    pub fn shut_down(&self, state: &mut State<P>) -> usize {
        state.producer = None;
        if state.lifecycle == Lifecycle::Closed {
            return 0;
        }

        let mut released = 0;
        while let Some(resource) = self.free_list.try_pop() {
            self.metrics.drained.fetch_add(1, Ordering::Relaxed);
            self.dispose(resource);
            released += 1;
        }

        state.lifecycle = Lifecycle::Closed;
        released
    }

    fn discard(&self, resource: P::Resource) {
        self.metrics.discarded.fetch_add(1, Ordering::Relaxed);
        self.dispose(resource);
    }

    fn dispose(&self, resource: P::Resource) {
        if !release_quietly(resource) {
            self.metrics.release_failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl<P: Producer> Drop for Shared<P> {
    fn drop(&mut self) {
        let mut state = self.state.write();
        let released = self.shut_down(&mut state);
        if released > 0 {
            tracing::debug!(released, "pool dropped while open");
        }
    }
}

/// Release a resource, logging instead of returning any failure.
pub(crate) fn release_quietly<R: Resource>(resource: R) -> bool {
    match resource.release() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "failed to release resource");
            false
        }
    }
}

/// Thread-safe pool of resources made by a [`Producer`]
///
/// Cloning a `Pool` is cheap; all clones share the same free-list.
///
/// # Examples
///
/// ```
/// use holdpool::{Pool, Resource};
///
/// struct Conn;
///
/// impl Resource for Conn {
///     type Error = std::io::Error;
///
///     fn release(self) -> Result<(), Self::Error> {
///         Ok(())
///     }
/// }
///
/// let pool = Pool::new(2, 4, || Ok::<_, std::io::Error>(Conn)).unwrap();
/// assert_eq!(pool.idle_count(), 2);
///
/// let conn = pool.get().unwrap();
/// assert_eq!(pool.idle_count(), 1);
///
/// conn.release().unwrap();
/// assert_eq!(pool.idle_count(), 2);
///
/// pool.close();
/// assert!(pool.get().is_err());
/// ```
pub struct Pool<P: Producer> {
    shared: Arc<Shared<P>>,
}

impl<P: Producer> Clone for Pool<P> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<P: Producer> Pool<P> {
    /// Create a pool holding up to `max_capacity` idle resources, with
    /// `initial_capacity` of them produced up front.
    pub fn new(initial_capacity: usize, max_capacity: usize, producer: P) -> PoolResult<Self> {
        let config = PoolConfiguration::new()
            .with_initial_capacity(initial_capacity)
            .with_max_capacity(max_capacity);
        Self::with_config(config, producer)
    }

    /// Create a pool from a configuration
    pub fn with_config(config: PoolConfiguration, producer: P) -> PoolResult<Self> {
        config.validate()?;

        let shared = Shared::new(producer, config.max_capacity);
        shared.warm_up(config.initial_capacity)?;

        Ok(Self {
            shared: Arc::new(shared),
        })
    }

    /// Take an idle resource, or produce a new one if none is idle.
    ///
    /// Never waits for another caller to return a resource.
    pub fn get(&self) -> PoolResult<PooledResource<P>> {
        let resource = self.shared.acquire()?;
        Ok(PooledResource::new(resource, Arc::downgrade(&self.shared)))
    }

    /// Hand a resource back for reuse.
    ///
    /// A full free-list releases the resource instead. Returning to a closed
    /// pool releases it too and still succeeds.
    pub fn put(&self, resource: P::Resource) -> PoolResult<()> {
        self.shared.recycle(resource)
    }

    /// Release every idle resource and refuse further use.
    ///
    /// Resources still checked out are released when they come back.
    /// Closing twice is a no-op.
    pub fn close(&self) {
        let mut state = self.shared.state.write();
        let released = self.shared.shut_down(&mut state);
        tracing::debug!(released, "pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.read().lifecycle == Lifecycle::Closed
    }

    /// Get idle count
    pub fn idle_count(&self) -> usize {
        self.shared.free_list.len()
    }

    pub fn max_capacity(&self) -> usize {
        self.shared.free_list.capacity()
    }

    /// Get pool metrics
    pub fn metrics(&self) -> PoolMetrics {
        self.shared
            .metrics
            .get_metrics(self.idle_count(), self.max_capacity())
    }

    /// Export metrics
    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.metrics().export()
    }

    /// Export metrics in Prometheus format
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        MetricsExporter::export_prometheus(&self.metrics(), pool_name, tags)
    }
}

impl<P> Pool<P>
where
    P: Producer + 'static,
    P::Resource: Send + 'static,
{
    /// Get a resource without blocking the async runtime.
    ///
    /// A producer may block on I/O, so the call runs on tokio's blocking
    /// thread pool.
    pub async fn get_async(&self) -> PoolResult<PooledResource<P>> {
        let pool = self.clone();
        tokio::task::spawn_blocking(move || pool.get())
            .await
            .map_err(|_| PoolError::Cancelled)?
    }

    /// Close the pool on tokio's blocking thread pool
    pub async fn close_async(&self) -> PoolResult<()> {
        let pool = self.clone();
        tokio::task::spawn_blocking(move || pool.close())
            .await
            .map_err(|_| PoolError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug)]
    struct Broken;

    impl fmt::Display for Broken {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("broken")
        }
    }

    impl std::error::Error for Broken {}

    struct Slot {
        id: usize,
        released: Arc<AtomicUsize>,
        fail_release: bool,
    }

    impl Resource for Slot {
        type Error = Broken;

        fn release(self) -> Result<(), Self::Error> {
            self.released.fetch_add(1, Ordering::SeqCst);
            if self.fail_release { Err(Broken) } else { Ok(()) }
        }
    }

    fn producer(
        released: Arc<AtomicUsize>,
        fail_release: bool,
    ) -> impl Fn() -> Result<Slot, Broken> + Send + Sync {
        let next = AtomicUsize::new(0);
        move || {
            Ok(Slot {
                id: next.fetch_add(1, Ordering::SeqCst),
                released: Arc::clone(&released),
                fail_release,
            })
        }
    }

    #[test]
    fn test_warming_pool_has_no_backing_storage() {
        let released = Arc::new(AtomicUsize::new(0));
        let shared = Shared::new(producer(Arc::clone(&released), false), 2);

        assert!(matches!(shared.acquire(), Err(PoolError::Uninitialized)));

        let stray = Slot {
            id: 99,
            released: Arc::clone(&released),
            fail_release: false,
        };
        assert!(matches!(shared.recycle(stray), Err(PoolError::Uninitialized)));
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_warm_up_opens_pool() {
        let released = Arc::new(AtomicUsize::new(0));
        let shared = Shared::new(producer(Arc::clone(&released), false), 3);

        shared.warm_up(2).unwrap();
        assert_eq!(shared.state.read().lifecycle, Lifecycle::Open);
        assert_eq!(shared.free_list.len(), 2);
        assert_eq!(shared.acquire().unwrap().id, 0);
    }

    #[test]
    fn test_shut_down_is_idempotent() {
        let released = Arc::new(AtomicUsize::new(0));
        let shared = Shared::new(producer(Arc::clone(&released), false), 4);
        shared.warm_up(4).unwrap();

        let mut state = shared.state.write();
        assert_eq!(shared.shut_down(&mut state), 4);
        assert_eq!(shared.shut_down(&mut state), 0);
        assert!(state.producer.is_none());
        assert_eq!(state.lifecycle, Lifecycle::Closed);
        drop(state);

        assert_eq!(released.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_release_failures_are_counted_not_returned() {
        let released = Arc::new(AtomicUsize::new(0));
        let pool = Pool::new(1, 1, producer(Arc::clone(&released), true)).unwrap();

        let first = pool.get().unwrap();
        let second = pool.get().unwrap();
        assert!(first.release().is_ok());
        // free-list is full again, so this one is released and fails
        assert!(second.release().is_ok());

        pool.close();
        let metrics = pool.metrics();
        assert_eq!(metrics.discarded, 1);
        assert_eq!(metrics.drained, 1);
        assert_eq!(metrics.release_failures, 2);
        assert_eq!(released.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dropping_last_pool_releases_idle() {
        let released = Arc::new(AtomicUsize::new(0));
        let pool = Pool::new(3, 3, producer(Arc::clone(&released), false)).unwrap();
        let clone = pool.clone();

        drop(pool);
        assert_eq!(released.load(Ordering::SeqCst), 0);

        drop(clone);
        assert_eq!(released.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_async_get_and_close() {
        let released = Arc::new(AtomicUsize::new(0));
        let pool = Pool::new(1, 2, producer(Arc::clone(&released), false)).unwrap();

        let first = pool.get_async().await.unwrap();
        let second = pool.get_async().await.unwrap();
        assert_eq!(first.id, 0);
        assert_eq!(second.id, 1);
        drop(first);
        drop(second);
        assert_eq!(pool.idle_count(), 2);

        pool.close_async().await.unwrap();
        assert!(pool.is_closed());
        assert!(matches!(pool.get_async().await, Err(PoolError::Closed)));
        assert_eq!(released.load(Ordering::SeqCst), 2);
    }
}
