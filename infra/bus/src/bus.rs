use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{trace, warn};
use weave_domain::{Context, Payload, Topic};

/// A subscriber callback. Shared so that dispatch can run without holding the topic lock.
pub type Handler = Arc<dyn Fn(&Payload) + Send + Sync>;

struct Subscriber {
    id: u64,
    handler: Handler,
}

type TopicTable = FxHashMap<Topic, Vec<Subscriber>>;

#[derive(Default)]
struct BusInner {
    contexts: RwLock<FxHashMap<Context, TopicTable>>,
    next_id: AtomicU64,
}

/// Receipt for a registered handler.
///
/// Dropping it keeps the handler subscribed; hand it back to [`Bus::unsubscribe`] to remove it.
#[derive(Debug, PartialEq, Eq)]
pub struct Subscription {
    id: u64,
    context: Context,
    topic: Topic,
}

impl Subscription {
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    #[must_use]
    pub const fn topic(&self) -> &Topic {
        &self.topic
    }
}

/// Synchronous publish/subscribe broker keyed by `(context, topic)`.
///
/// Cloning yields another handle to the same subscriber table.
#[derive(Clone, Default)]
pub struct Bus {
    inner: Arc<BusInner>,
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let contexts = self.inner.contexts.read();
        let topics: usize = contexts.values().map(FxHashMap::len).sum();
        f.debug_struct("Bus").field("contexts", &contexts.len()).field("topics", &topics).finish()
    }
}

impl Bus {
    /// Creates a new, empty `Bus`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to the ordered handler list of `(context, topic)`.
    ///
    /// # Examples
    /// ```rust
    /// use weave_bus::{Bus, Payload};
    ///
    /// let bus = Bus::new();
    /// let subscription = bus.subscribe("SampleContext", "testProperty", |_: &Payload| {});
    /// assert_eq!(subscription.topic().as_str(), "testProperty");
    /// assert_eq!(bus.subscriber_count("SampleContext", "testProperty"), 1);
    /// ```
    pub fn subscribe<F>(
        &self,
        context: impl Into<Context>,
        topic: impl Into<Topic>,
        handler: F,
    ) -> Subscription
    where
        F: Fn(&Payload) + Send + Sync + 'static,
    {
        self.subscribe_handler(context, topic, Arc::new(handler))
    }

    /// Same as [`Bus::subscribe`] for an already shared handler.
    pub fn subscribe_handler(
        &self,
        context: impl Into<Context>,
        topic: impl Into<Topic>,
        handler: Handler,
    ) -> Subscription {
        let context = context.into();
        let topic = topic.into();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        {
            let mut contexts = self.inner.contexts.write();
            contexts
                .entry(context.clone())
                .or_default()
                .entry(topic.clone())
                .or_default()
                .push(Subscriber { id, handler });
        }

        trace!(%context, %topic, id, "Handler subscribed");
        Subscription { id, context, topic }
    }

    /// Removes the handler behind `subscription`.
    ///
    /// Returns `false` when it was already gone (e.g. after [`Bus::clear`]).
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut contexts = self.inner.contexts.write();
        let Some(topics) = contexts.get_mut(&subscription.context) else {
            return false;
        };
        let Some(subscribers) = topics.get_mut(&subscription.topic) else {
            return false;
        };

        let before = subscribers.len();
        subscribers.retain(|s| s.id != subscription.id);
        let removed = subscribers.len() != before;

        if subscribers.is_empty() {
            topics.remove(&subscription.topic);
        }
        if topics.is_empty() {
            contexts.remove(&subscription.context);
        }
        drop(contexts);

        if removed {
            trace!(
                context = %subscription.context,
                topic = %subscription.topic,
                id = subscription.id,
                "Handler unsubscribed"
            );
        }
        removed
    }

    /// Delivers `payload` to every handler of `(context, topic)`, in subscription order.
    ///
    /// Handlers run synchronously on the caller's thread. A handler that panics is logged and
    /// skipped; the remaining handlers still run. Publishing to a pair without subscribers is a
    /// no-op.
    ///
    /// Returns the number of handlers that completed.
    pub fn publish(&self, context: &str, topic: &str, payload: Payload) -> usize {
        let handlers = self.handlers(context, topic);
        if handlers.is_empty() {
            trace!(context, topic, "Message dropped: no subscribers");
            return 0;
        }

        let mut delivered = 0;
        for handler in &handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(&payload))) {
                Ok(()) => delivered += 1,
                Err(panic) => {
                    warn!(
                        context,
                        topic,
                        reason = panic_message(panic.as_ref()),
                        "Bus handler panicked; continuing with remaining handlers"
                    );
                },
            }
        }

        trace!(context, topic, delivered, total = handlers.len(), "Message dispatched");
        delivered
    }

    /// Number of handlers currently subscribed to `(context, topic)`.
    #[must_use]
    pub fn subscriber_count(&self, context: &str, topic: &str) -> usize {
        self.inner
            .contexts
            .read()
            .get(context)
            .and_then(|topics| topics.get(topic))
            .map_or(0, Vec::len)
    }

    /// Drops every subscription. Returns the number of `(context, topic)` pairs removed.
    #[must_use]
    pub fn clear(&self) -> usize {
        let mut contexts = self.inner.contexts.write();
        let count = contexts.values().map(FxHashMap::len).sum();
        contexts.clear();
        count
    }

    // Snapshot so that handlers can re-enter the bus while being dispatched.
    fn handlers(&self, context: &str, topic: &str) -> Vec<Handler> {
        self.inner
            .contexts
            .read()
            .get(context)
            .and_then(|topics| topics.get(topic))
            .map(|subscribers| subscribers.iter().map(|s| Arc::clone(&s.handler)).collect())
            .unwrap_or_default()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
