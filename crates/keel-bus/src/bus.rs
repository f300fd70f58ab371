//! EventBus - priority-ordered publish/subscribe fan-out.
//!
//! The bus routes named events from publishers to subscribers:
//!
//! ```text
//! publish("doc:saved", data)
//!     │
//!     ▼ middleware pipeline (sequential, payload transform)
//! ┌─────────────────────────────────────────────┐
//! │ subscriber list snapshot (priority desc)    │
//! │   cb(prio 10) ──┐                           │
//! │   cb(prio 0)  ──┼── started in order,       │
//! │   cb(prio -5) ──┘   run concurrently        │
//! └─────────────────────────────────────────────┘
//!     │
//!     ▼ all-settle join; per-handler errors logged, never propagated
//! publish resolves
//! ```
//!
//! # Ordering Guarantees
//!
//! - Subscribers are kept sorted by **descending priority**; ties keep
//!   registration order (stable insert).
//! - `publish` snapshots the subscriber list up front: handlers
//!   subscribed while a dispatch is in flight do not join that pass.
//! - Handler futures are *started* in priority order but run
//!   concurrently; completion order is unspecified.
//!
//! # Isolation
//!
//! One misbehaving subscriber must never take down the fan-out. Every
//! handler error is caught and logged; `publish` always resolves. The
//! same applies to middleware, which continues with the last good
//! payload. This is deliberately the opposite policy from store
//! middleware, which may veto a dispatch outright.

use crate::BusError;
use futures::future::join_all;
use keel_types::SubscriptionId;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Boxed future returned by subscriber handlers.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), BusError>> + Send>>;

/// Boxed future returned by middleware.
pub type MiddlewareFuture = Pin<Box<dyn Future<Output = Result<Value, BusError>> + Send>>;

type Handler = Arc<dyn Fn(Value) -> HandlerFuture + Send + Sync>;
type Middleware = Arc<dyn Fn(String, Value) -> MiddlewareFuture + Send + Sync>;

/// Options for [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscribeOptions {
    /// Remove the subscription after its first dispatch pass.
    pub once: bool,
    /// Higher priorities are started first. Default `0`.
    pub priority: i32,
}

impl SubscribeOptions {
    /// Options for a one-shot subscription.
    #[must_use]
    pub fn once() -> Self {
        Self {
            once: true,
            priority: 0,
        }
    }

    /// Options with the given priority.
    #[must_use]
    pub fn with_priority(priority: i32) -> Self {
        Self {
            once: false,
            priority,
        }
    }
}

struct Entry {
    id: SubscriptionId,
    priority: i32,
    once: bool,
    handler: Handler,
}

struct BusInner {
    /// Per-event subscriber lists, sorted by descending priority,
    /// stable on ties.
    topics: HashMap<String, Vec<Entry>>,
    middleware: Vec<Middleware>,
    debug: bool,
}

/// Priority-ordered asynchronous event bus.
///
/// Cheaply cloneable: clones share the same subscriber registry, so a
/// module can hold the bus by value while the composition root keeps
/// its own handle.
///
/// # Example
///
/// ```
/// use keel_bus::{EventBus, SubscribeOptions};
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let bus = EventBus::new();
/// bus.subscribe(
///     "greeting",
///     |payload| async move {
///         assert_eq!(payload, json!("hello"));
///         Ok(())
///     },
///     SubscribeOptions::default(),
/// );
///
/// let delivered = bus.publish("greeting", json!("hello")).await;
/// assert_eq!(delivered, 1);
/// # }
/// ```
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

impl EventBus {
    /// Creates a new bus with no subscribers or middleware.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                topics: HashMap::new(),
                middleware: Vec::new(),
                debug: false,
            })),
        }
    }

    /// Subscribes a handler to an event.
    ///
    /// The returned [`SubscriptionHandle`] unsubscribes idempotently;
    /// dropping it does *not* unsubscribe (modules keep handles alive
    /// for cleanup on destroy).
    ///
    /// The subscriber list stays sorted by descending priority; equal
    /// priorities preserve registration order.
    pub fn subscribe<F, Fut>(
        &self,
        event: impl Into<String>,
        handler: F,
        options: SubscribeOptions,
    ) -> SubscriptionHandle
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BusError>> + Send + 'static,
    {
        let event = event.into();
        let id = SubscriptionId::new();
        let handler: Handler = Arc::new(move |payload| Box::pin(handler(payload)));

        let mut inner = self.inner.lock();
        let entries = inner.topics.entry(event.clone()).or_default();
        // Stable descending insert: after all entries with priority >= ours.
        let at = entries.partition_point(|e| e.priority >= options.priority);
        entries.insert(
            at,
            Entry {
                id,
                priority: options.priority,
                once: options.once,
                handler,
            },
        );
        if inner.debug {
            tracing::debug!(event = %event, subscription = %id, priority = options.priority, "subscribe");
        }
        drop(inner);

        SubscriptionHandle {
            bus: self.clone(),
            event,
            id,
        }
    }

    /// Subscribes a handler that fires at most once.
    pub fn once<F, Fut>(&self, event: impl Into<String>, handler: F) -> SubscriptionHandle
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BusError>> + Send + 'static,
    {
        self.subscribe(event, handler, SubscribeOptions::once())
    }

    /// Removes a subscription by event name and id.
    ///
    /// Returns `true` if something was removed. Unknown ids are a
    /// no-op, which makes repeated unsubscribes safe.
    pub fn unsubscribe(&self, event: &str, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock();
        let Some(entries) = inner.topics.get_mut(event) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            inner.topics.remove(event);
        }
        removed
    }

    /// Publishes an event to all current subscribers.
    ///
    /// Steps:
    ///
    /// 1. Snapshot the subscriber list (priority order) and drop
    ///    `once` entries from the live list - they fire in this pass
    ///    only, even if the publish is re-entered.
    /// 2. Run the payload through the middleware pipeline
    ///    sequentially; a failing middleware is logged and skipped,
    ///    the pipeline continuing with the last good value.
    /// 3. Start every handler in priority order, run them
    ///    concurrently, and wait for all of them to settle. Handler
    ///    errors are logged in isolation.
    ///
    /// Returns the number of handlers that ran. No subscribers is not
    /// an error - the call resolves immediately with `0`.
    pub async fn publish(&self, event: &str, payload: Value) -> usize {
        let (middleware, snapshot, debug) = {
            let mut inner = self.inner.lock();
            let middleware = inner.middleware.clone();
            let debug = inner.debug;
            let snapshot: Vec<(SubscriptionId, Handler)> = match inner.topics.get_mut(event) {
                Some(entries) => {
                    let snap = entries
                        .iter()
                        .map(|e| (e.id, e.handler.clone()))
                        .collect();
                    entries.retain(|e| !e.once);
                    let empty = entries.is_empty();
                    if empty {
                        inner.topics.remove(event);
                    }
                    snap
                }
                None => Vec::new(),
            };
            (middleware, snapshot, debug)
        };

        if debug {
            tracing::debug!(event = %event, subscribers = snapshot.len(), "publish");
        }

        let mut data = payload;
        for (index, mw) in middleware.iter().enumerate() {
            match mw(event.to_string(), data.clone()).await {
                Ok(next) => data = next,
                Err(error) => tracing::warn!(
                    event = %event,
                    index,
                    %error,
                    "bus middleware failed; continuing with previous payload"
                ),
            }
        }

        if snapshot.is_empty() {
            return 0;
        }

        // Futures are created and first polled in snapshot order, so
        // handlers start in priority order; join_all lets them proceed
        // concurrently and settles them all before returning.
        let handlers: Vec<_> = snapshot
            .iter()
            .map(|(_, handler)| handler(data.clone()))
            .collect();
        let results = join_all(handlers).await;

        for ((id, _), result) in snapshot.iter().zip(results) {
            if let Err(error) = result {
                tracing::warn!(event = %event, subscription = %id, %error, "subscriber failed");
            }
        }

        snapshot.len()
    }

    /// Appends a payload middleware to the pipeline.
    ///
    /// Middleware run sequentially in registration order on every
    /// publish, each receiving `(event, payload)` and returning the
    /// (possibly transformed) payload.
    pub fn add_middleware<F, Fut>(&self, middleware: F)
    where
        F: Fn(String, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, BusError>> + Send + 'static,
    {
        let middleware: Middleware = Arc::new(move |event, data| Box::pin(middleware(event, data)));
        self.inner.lock().middleware.push(middleware);
    }

    /// Removes all subscribers for one event, or for every event when
    /// `None`.
    pub fn clear(&self, event: Option<&str>) {
        let mut inner = self.inner.lock();
        match event {
            Some(event) => {
                inner.topics.remove(event);
            }
            None => inner.topics.clear(),
        }
    }

    /// Waits for the next publish of `event`.
    ///
    /// Resolves with the published payload (after middleware), or
    /// fails with [`BusError::Timeout`] if nothing is published within
    /// the window. The internal one-shot subscription is cleaned up on
    /// either outcome.
    pub async fn wait_for(&self, event: &str, timeout: Duration) -> Result<Value, BusError> {
        let (tx, rx) = oneshot::channel::<Value>();
        let slot = Arc::new(Mutex::new(Some(tx)));
        let handle = self.subscribe(
            event,
            move |payload| {
                let slot = Arc::clone(&slot);
                async move {
                    if let Some(tx) = slot.lock().take() {
                        let _ = tx.send(payload);
                    }
                    Ok(())
                }
            },
            SubscribeOptions::once(),
        );

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(_)) => Err(BusError::WaitCancelled {
                event: event.to_string(),
            }),
            Err(_) => {
                handle.unsubscribe();
                Err(BusError::Timeout {
                    event: event.to_string(),
                })
            }
        }
    }

    /// Toggles verbose dispatch tracing. No behavioral effect.
    pub fn set_debug_mode(&self, enabled: bool) {
        self.inner.lock().debug = enabled;
    }

    /// Returns the number of live subscriptions for an event.
    #[must_use]
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.inner
            .lock()
            .topics
            .get(event)
            .map_or(0, |entries| entries.len())
    }

    /// Returns the names of all events with at least one subscriber.
    #[must_use]
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.lock().topics.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("EventBus")
            .field("events", &inner.topics.len())
            .field("middleware", &inner.middleware.len())
            .finish()
    }
}

/// Handle to a live bus subscription.
///
/// Unsubscribing is explicit and idempotent; dropping the handle
/// leaves the subscription active.
pub struct SubscriptionHandle {
    bus: EventBus,
    event: String,
    id: SubscriptionId,
}

impl SubscriptionHandle {
    /// Returns the subscription id.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns the subscribed event name.
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Removes the subscription. Safe to call more than once.
    pub fn unsubscribe(&self) -> bool {
        self.bus.unsubscribe(&self.event, self.id)
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("event", &self.event)
            .field("id", &self.id)
            .finish()
    }
}
