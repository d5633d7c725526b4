//! Keyed async queries with a stale-while-revalidate cache.
//!
//! Inspired by TanStack Query, a `Query<K, T>` is one query family: a fetcher
//! that knows how to load a `T` for any key `K`, plus a cache entry per key.
//! The view tells the query which key is active each time its inputs change
//! and polls it on every tick.
//!
//! # Example
//!
//! ```ignore
//! let catalog = client.clone();
//! let mut products = Query::new(move |page: &u32| {
//!     catalog.fetch_page(10, (*page as usize - 1) * 10)
//! })
//! .with_stale_time(Duration::from_secs(10))
//! .keep_previous_data();
//!
//! // Whenever the page changes
//! products.observe(page, true);
//!
//! // In event loop tick
//! if products.poll() {
//!     // State changed, trigger re-render
//! }
//!
//! // In render
//! if products.is_error() {
//!     render_error(products.error());
//! } else if let Some(rows) = products.data() {
//!     render_rows(rows);
//! }
//! ```

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

/// The status of one cache entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus {
  /// Nothing fetched successfully yet
  Pending,
  /// Last fetch succeeded
  Success,
  /// Last fetch failed
  Error(String),
}

/// Cached state for a single key
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
  pub data: Option<T>,
  pub fetched_at: Option<Instant>,
  pub status: QueryStatus,
  pub in_flight: bool,
  /// Id of the newest request; older responses are dropped
  request_id: u64,
}

impl<T> Default for CacheEntry<T> {
  fn default() -> Self {
    Self {
      data: None,
      fetched_at: None,
      status: QueryStatus::Pending,
      in_flight: false,
      request_id: 0,
    }
  }
}

impl<T> CacheEntry<T> {
  fn is_stale(&self, stale_time: Duration) -> bool {
    self
      .fetched_at
      .map(|t| t.elapsed() >= stale_time)
      .unwrap_or(true)
  }
}

/// A boxed future that returns a Result<T, String>
type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;

/// A factory function that creates futures for fetching data for a key
type FetcherFn<K, T> = Box<dyn Fn(&K) -> BoxFuture<T> + Send + Sync>;

/// Completed fetch: key, request id and outcome
type Completion<K, T> = (K, u64, Result<T, String>);

/// Keyed async query for data fetching with state management.
///
/// Query<K, T> encapsulates:
/// - The fetching logic (via a closure taking the key)
/// - One cache entry per key with status, data and fetch time
/// - Async result handling via a channel, keyed so that a late response for
///   a key the view already left lands in that key's entry only
/// - Freshness: an entry younger than the stale time is reused as-is
pub struct Query<K, T> {
  entries: HashMap<K, CacheEntry<T>>,
  active: Option<K>,
  enabled: bool,
  /// Last key that had data, shown while the active key loads
  previous: Option<K>,
  keep_previous_data: bool,
  fetcher: FetcherFn<K, T>,
  stale_time: Duration,
  next_request_id: u64,
  sender: mpsc::UnboundedSender<Completion<K, T>>,
  receiver: mpsc::UnboundedReceiver<Completion<K, T>>,
}

impl<K, T> Query<K, T>
where
  K: Clone + Eq + Hash + Debug + Send + 'static,
  T: Clone + Send + 'static,
{
  /// Create a new query with the given fetcher function.
  ///
  /// The fetcher is called with the key each time that key needs loading.
  pub fn new<F, Fut, E>(fetcher: F) -> Self
  where
    F: Fn(&K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    E: ToString + Send + 'static,
  {
    let (sender, receiver) = mpsc::unbounded_channel();
    Self {
      entries: HashMap::new(),
      active: None,
      enabled: false,
      previous: None,
      keep_previous_data: false,
      fetcher: Box::new(move |key: &K| -> BoxFuture<T> {
        let fut = fetcher(key);
        Box::pin(async move { fut.await.map_err(|e| e.to_string()) })
      }),
      stale_time: Duration::ZERO,
      next_request_id: 0,
      sender,
      receiver,
    }
  }

  /// Set the stale time for this query.
  ///
  /// Entries younger than this are served from cache without a request.
  pub fn with_stale_time(mut self, duration: Duration) -> Self {
    self.stale_time = duration;
    self
  }

  /// Keep showing the last successful key's data while a new key loads.
  pub fn keep_previous_data(mut self) -> Self {
    self.keep_previous_data = true;
    self
  }

  /// Make `key` the active key and fetch it if needed.
  ///
  /// Disabled queries never fetch and report no data. A key that just became
  /// active is fetched when it has no entry, failed last time or went stale;
  /// observing the same key again only fetches if it was never loaded.
  pub fn observe(&mut self, key: K, enabled: bool) {
    let key_changed = self.active.as_ref() != Some(&key);
    if key_changed {
      if let Some(old) = self.active.take() {
        if self.entry_has_data(&old) {
          self.previous = Some(old);
        }
      }
      self.active = Some(key.clone());
    }

    let activated = key_changed || !self.enabled;
    self.enabled = enabled;
    if !enabled {
      return;
    }

    let should_fetch = match self.entries.get(&key) {
      None => true,
      Some(entry) if entry.in_flight => false,
      Some(entry) => match entry.status {
        QueryStatus::Pending => true,
        QueryStatus::Error(_) => activated,
        QueryStatus::Success => activated && entry.is_stale(self.stale_time),
      },
    };

    if should_fetch {
      self.start_fetch(key);
    }
  }

  /// Poll for results from pending fetches.
  ///
  /// Returns `true` if any entry changed. Call this in your event loop tick
  /// handler.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;

    while let Ok((key, request_id, result)) = self.receiver.try_recv() {
      let entry = self.entries.entry(key.clone()).or_default();
      if entry.request_id != request_id {
        debug!(?key, "dropping superseded response");
        continue;
      }

      entry.in_flight = false;
      match result {
        Ok(data) => {
          debug!(?key, "query succeeded");
          entry.data = Some(data);
          entry.fetched_at = Some(Instant::now());
          entry.status = QueryStatus::Success;
        }
        Err(error) => {
          debug!(?key, %error, "query failed");
          entry.status = QueryStatus::Error(error);
        }
      }
      changed = true;
    }

    changed
  }

  /// Force a fetch of the active key; an in-flight response for it is dropped.
  pub fn refetch(&mut self) {
    if !self.enabled {
      return;
    }
    if let Some(key) = self.active.clone() {
      self.start_fetch(key);
    }
  }

  /// Drop inactive entries last fetched more than `max_age` ago.
  pub fn prune(&mut self, max_age: Duration) {
    let active = self.active.clone();
    let previous = self.previous.clone();
    self.entries.retain(|key, entry| {
      Some(key) == active.as_ref()
        || Some(key) == previous.as_ref()
        || entry.in_flight
        || entry.fetched_at.is_some_and(|t| t.elapsed() < max_age)
    });
  }

  /// Get the cache entry for any key.
  #[cfg(test)]
  pub fn entry(&self, key: &K) -> Option<&CacheEntry<T>> {
    self.entries.get(key)
  }

  /// Number of keys currently cached.
  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Data to show for the active key: its own, or the previous key's while
  /// it loads when `keep_previous_data` is set.
  pub fn data(&self) -> Option<&T> {
    if !self.enabled {
      return None;
    }
    self.active_entry().and_then(|e| e.data.as_ref()).or_else(|| {
      if self.keep_previous_data {
        self.previous_data()
      } else {
        None
      }
    })
  }

  /// Whether `data()` is the previous key's data.
  pub fn is_placeholder(&self) -> bool {
    self.enabled
      && self.keep_previous_data
      && self.active_entry().and_then(|e| e.data.as_ref()).is_none()
      && self.previous_data().is_some()
  }

  /// Enabled, not failed, and nothing to show yet.
  pub fn is_pending(&self) -> bool {
    self.enabled && !self.is_error() && self.data().is_none()
  }

  /// A request for the active key is in flight.
  pub fn is_fetching(&self) -> bool {
    self.enabled && self.active_entry().is_some_and(|e| e.in_flight)
  }

  /// The last fetch for the active key failed.
  pub fn is_error(&self) -> bool {
    self.error().is_some()
  }

  /// Get the error message if the active key's last fetch failed.
  pub fn error(&self) -> Option<&str> {
    if !self.enabled {
      return None;
    }
    match self.active_entry().map(|e| &e.status) {
      Some(QueryStatus::Error(e)) => Some(e),
      _ => None,
    }
  }

  fn active_entry(&self) -> Option<&CacheEntry<T>> {
    self.active.as_ref().and_then(|k| self.entries.get(k))
  }

  fn previous_data(&self) -> Option<&T> {
    self
      .previous
      .as_ref()
      .and_then(|k| self.entries.get(k))
      .and_then(|e| e.data.as_ref())
  }

  fn entry_has_data(&self, key: &K) -> bool {
    self.entries.get(key).is_some_and(|e| e.data.is_some())
  }

  /// Internal: start the fetch operation for `key`
  fn start_fetch(&mut self, key: K) {
    self.next_request_id += 1;
    let request_id = self.next_request_id;

    let entry = self.entries.entry(key.clone()).or_default();
    entry.in_flight = true;
    entry.request_id = request_id;

    debug!(?key, request_id, "query fetching");

    let future = (self.fetcher)(&key);
    let tx = self.sender.clone();
    tokio::spawn(async move {
      let result = future.await;
      // Ignore send errors - the query may have been dropped
      let _ = tx.send((key, request_id, result));
    });
  }
}

// Query is not Clone because the fetcher is boxed and receiver is owned.

impl<K: Debug, T: Debug> Debug for Query<K, T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("active", &self.active)
      .field("enabled", &self.enabled)
      .field("entries", &self.entries)
      .field("stale_time", &self.stale_time)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::{Arc, Mutex};

  async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
  }

  /// Query whose data is `key * 10`, counting fetches
  fn counting_query(calls: Arc<AtomicU32>) -> Query<u32, u32> {
    Query::new(move |key: &u32| {
      let key = *key;
      calls.fetch_add(1, Ordering::SeqCst);
      async move { Ok::<_, String>(key * 10) }
    })
  }

  #[tokio::test]
  async fn test_query_success() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(calls.clone());

    assert!(!query.is_pending());
    query.observe(1, true);
    assert!(query.is_pending());
    assert!(query.is_fetching());

    settle().await;

    assert!(query.poll());
    assert!(!query.is_pending());
    assert!(!query.is_fetching());
    assert_eq!(query.data(), Some(&10));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_query_error() {
    let mut query: Query<u32, i32> = Query::new(|_: &u32| async {
      Err::<i32, _>("Something went wrong".to_string())
    });

    query.observe(1, true);
    settle().await;

    assert!(query.poll());
    assert!(query.is_error());
    assert!(!query.is_pending());
    assert!(!query.is_fetching());
    assert_eq!(query.error(), Some("Something went wrong"));
    assert_eq!(query.data(), None);
  }

  #[tokio::test]
  async fn test_disabled_query_never_fetches() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(calls.clone());

    query.observe(1, false);
    settle().await;
    query.poll();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(query.data(), None);
    assert!(!query.is_pending());
    assert!(!query.is_fetching());
  }

  #[tokio::test]
  async fn test_disabled_hides_cached_data() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(calls.clone()).with_stale_time(Duration::from_secs(10));

    query.observe(1, true);
    settle().await;
    query.poll();

    query.observe(1, false);
    assert_eq!(query.data(), None);

    // Fresh entry is reused when re-enabled
    query.observe(1, true);
    assert_eq!(query.data(), Some(&10));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_fresh_entry_is_reused() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(calls.clone()).with_stale_time(Duration::from_secs(10));

    query.observe(1, true);
    settle().await;
    query.poll();

    query.observe(2, true);
    settle().await;
    query.poll();

    // Back to a key fetched moments ago
    query.observe(1, true);
    assert!(!query.is_fetching());
    assert_eq!(query.data(), Some(&10));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_stale_entry_refetched_on_activation() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(calls.clone()).with_stale_time(Duration::from_secs(10));

    query.observe(1, true);
    settle().await;
    query.poll();

    // Re-observing the active key every tick does not refetch
    tokio::time::sleep(Duration::from_secs(11)).await;
    query.observe(1, true);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Leaving and returning does
    query.observe(2, true);
    query.observe(1, true);
    assert!(query.is_fetching());
    // Stale data stays visible while revalidating
    assert_eq!(query.data(), Some(&10));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn test_keep_previous_data_while_loading() {
    let mut query: Query<u32, u32> = Query::new(|key: &u32| {
      let key = *key;
      async move {
        if key == 2 {
          tokio::time::sleep(Duration::from_millis(50)).await;
        }
        Ok::<_, String>(key * 10)
      }
    })
    .keep_previous_data();

    query.observe(1, true);
    settle().await;
    query.poll();

    query.observe(2, true);
    assert!(query.is_placeholder());
    assert!(query.is_fetching());
    assert!(!query.is_pending());
    assert_eq!(query.data(), Some(&10));

    tokio::time::sleep(Duration::from_millis(100)).await;
    query.poll();
    assert!(!query.is_placeholder());
    assert_eq!(query.data(), Some(&20));
  }

  #[tokio::test]
  async fn test_without_keep_previous_data_new_key_is_pending() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(calls);

    query.observe(1, true);
    settle().await;
    query.poll();

    query.observe(2, true);
    assert!(query.is_pending());
    assert_eq!(query.data(), None);
  }

  #[tokio::test]
  async fn test_late_response_does_not_overwrite_active_key() {
    let mut query: Query<u32, u32> = Query::new(|key: &u32| {
      let key = *key;
      async move {
        if key == 1 {
          tokio::time::sleep(Duration::from_millis(50)).await;
        }
        Ok::<_, String>(key * 10)
      }
    });

    query.observe(1, true);
    query.observe(2, true);
    settle().await;
    query.poll();
    assert_eq!(query.data(), Some(&20));

    // Key 1 resolves after the view moved on
    tokio::time::sleep(Duration::from_millis(100)).await;
    query.poll();
    assert_eq!(query.data(), Some(&20));
    assert_eq!(query.entry(&1).and_then(|e| e.data), Some(10));
  }

  #[tokio::test]
  async fn test_error_keeps_other_keys() {
    let mut query: Query<u32, u32> = Query::new(|key: &u32| {
      let key = *key;
      async move {
        if key == 2 {
          Err("HTTP 500".to_string())
        } else {
          Ok(key * 10)
        }
      }
    })
    .keep_previous_data();

    query.observe(1, true);
    settle().await;
    query.poll();

    query.observe(2, true);
    settle().await;
    query.poll();

    assert!(query.is_error());
    assert_eq!(query.entry(&1).map(|e| e.status.clone()), Some(QueryStatus::Success));
    assert_eq!(query.entry(&1).and_then(|e| e.data), Some(10));
  }

  #[tokio::test]
  async fn test_errored_key_not_retried_every_observe() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let mut query: Query<u32, u32> = Query::new(move |_: &u32| {
      counter.fetch_add(1, Ordering::SeqCst);
      async { Err::<u32, _>("boom".to_string()) }
    });

    query.observe(1, true);
    settle().await;
    query.poll();
    query.observe(1, true);
    query.observe(1, true);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Coming back to it retries
    query.observe(2, true);
    query.observe(1, true);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn test_refetch_drops_superseded_response() {
    let counter = Arc::new(AtomicU32::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let counter_clone = counter.clone();

    let mut query: Query<u32, u32> = Query::new(move |_: &u32| {
      let n = counter_clone.fetch_add(1, Ordering::SeqCst);
      async move {
        // First request is the slow one
        if n == 0 {
          tokio::time::sleep(Duration::from_millis(80)).await;
        }
        Ok::<_, String>(n)
      }
    });

    query.observe(1, true);
    settle().await;
    query.refetch();

    tokio::time::sleep(Duration::from_millis(20)).await;
    query.poll();
    seen.lock().unwrap().push(query.data().copied());

    tokio::time::sleep(Duration::from_millis(100)).await;
    query.poll();
    seen.lock().unwrap().push(query.data().copied());

    assert_eq!(*seen.lock().unwrap(), vec![Some(1), Some(1)]);
  }

  #[tokio::test(start_paused = true)]
  async fn test_prune_drops_old_inactive_entries() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(calls).keep_previous_data();

    for key in 1..=4 {
      query.observe(key, true);
      settle().await;
      query.poll();
    }
    assert_eq!(query.len(), 4);

    tokio::time::sleep(Duration::from_secs(301)).await;
    query.prune(Duration::from_secs(300));

    // Active (4) and previous (3) survive
    assert_eq!(query.len(), 2);
    assert!(query.entry(&4).is_some());
    assert!(query.entry(&3).is_some());
  }
}
