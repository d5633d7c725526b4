//! Trailing-edge debouncing for rapidly changing values.
//!
//! [`Debouncer`] is the bare cancellable timer. [`Debounced`] wraps it into a
//! value that lags its source and is polled from the event loop, the same
//! way [`crate::query::Query`] is.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A cancellable one-shot timer.
///
/// Starting the timer again cancels the pending one, so only the last value
/// handed to [`Debouncer::start`] fires, and only once the full delay passed
/// without another start. Dropping the debouncer cancels any pending timer.
#[derive(Debug, Default)]
pub struct Debouncer {
  handle: Option<JoinHandle<()>>,
}

impl Debouncer {
  pub fn new() -> Self {
    Self::default()
  }

  /// Schedule `on_fire(value)` after `delay`, replacing any pending timer.
  pub fn start<T, F>(&mut self, value: T, delay: Duration, on_fire: F)
  where
    T: Send + 'static,
    F: FnOnce(T) + Send + 'static,
  {
    self.cancel();
    self.handle = Some(tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      on_fire(value);
    }));
  }

  /// Drop the pending timer, if any, without firing it.
  pub fn cancel(&mut self) {
    if let Some(handle) = self.handle.take() {
      handle.abort();
    }
  }

  pub fn is_pending(&self) -> bool {
    self.handle.as_ref().is_some_and(|h| !h.is_finished())
  }
}

impl Drop for Debouncer {
  fn drop(&mut self) {
    self.cancel();
  }
}

/// A value that follows its source only after the source stayed unchanged
/// for the configured delay.
#[derive(Debug)]
pub struct Debounced<T> {
  value: T,
  source: T,
  /// Last value handed out by `poll`
  reported: T,
  delay: Duration,
  timer: Debouncer,
  tx: mpsc::UnboundedSender<T>,
  rx: mpsc::UnboundedReceiver<T>,
}

impl<T> Debounced<T>
where
  T: Clone + PartialEq + Send + 'static,
{
  pub fn new(initial: T, delay: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      source: initial.clone(),
      reported: initial.clone(),
      value: initial,
      delay,
      timer: Debouncer::new(),
      tx,
      rx,
    }
  }

  /// The current debounced value.
  pub fn value(&self) -> &T {
    &self.value
  }

  /// Whether a new source value is waiting out its quiet period.
  pub fn is_pending(&self) -> bool {
    self.timer.is_pending()
  }

  /// Feed a new source value; restarts the wait if it differs from the last one.
  pub fn set(&mut self, value: T) {
    if value == self.source {
      return;
    }
    // A timer that already fired still counts, even if not polled yet
    self.absorb();
    self.source = value.clone();

    let tx = self.tx.clone();
    self.timer.start(value, self.delay, move |v| {
      // Receiver gone means the owner was torn down
      let _ = tx.send(v);
    });
  }

  /// Replace both source and debounced value immediately, dropping any
  /// pending or already-fired update.
  pub fn set_now(&mut self, value: T) {
    self.timer.cancel();
    while self.rx.try_recv().is_ok() {}

    self.source = value.clone();
    self.value = value;
  }

  /// Returns the debounced value once each time it differs from what the
  /// previous poll returned.
  pub fn poll(&mut self) -> Option<T> {
    self.absorb();
    if self.value == self.reported {
      return None;
    }
    self.reported = self.value.clone();
    Some(self.value.clone())
  }

  /// Cancel any pending update; the debounced value stays as it is.
  pub fn cancel(&mut self) {
    self.timer.cancel();
  }

  fn absorb(&mut self) {
    while let Ok(v) = self.rx.try_recv() {
      self.value = v;
    }
  }
}
