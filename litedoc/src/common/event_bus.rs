use crate::errors::{DocError, DocResult, ErrorKind};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::fmt::Debug;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type HandlerId = u64;

/// Trait for closure-based event handlers.
///
/// Any closure with the signature `Fn(&E) -> DocResult<()>` automatically
/// implements this trait. Returning an error marks the handler as failed for
/// that publication without affecting the other handlers.
pub trait EventCallback<E>: Send + Sync + Fn(&E) -> DocResult<()> {}

impl<E, F> EventCallback<E> for F where F: Send + Sync + Fn(&E) -> DocResult<()> {}

/// Listener wrapping an event callback.
///
/// Cheap to clone; all clones share the same callback.
pub struct EventListener<E> {
    on_event: Arc<dyn EventCallback<E>>,
}

impl<E> EventListener<E> {
    /// Creates a new listener wrapping the provided callback.
    pub fn new(on_event: impl EventCallback<E> + 'static) -> Self {
        EventListener {
            on_event: Arc::new(on_event),
        }
    }

    #[inline]
    pub(crate) fn notify(&self, event: &E) -> DocResult<()> {
        (self.on_event)(event)
    }
}

impl<E> Clone for EventListener<E> {
    fn clone(&self) -> Self {
        EventListener {
            on_event: self.on_event.clone(),
        }
    }
}

impl<E> Debug for EventListener<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListener").finish()
    }
}

/// In-process publish/subscribe of events of one type.
///
/// # Responsibilities
///
/// * **Listener Registration**: Registers handlers, returning a [`Subscription`]
/// * **Event Publishing**: Invokes every registered handler synchronously, in
///   registration order
/// * **Fault Isolation**: A handler that fails or panics does not prevent the
///   remaining handlers from running; failures are logged and summarised in
///   the result of `publish`
/// * **Lifecycle Management**: `close()` drops every listener and refuses new ones
///
/// The listener list is snapshotted when a publication starts, so a handler
/// registered while an event is being dispatched only sees later events.
///
/// # Example
///
/// ```ignore
/// let bus: EventBus<ChangeEvent> = EventBus::new();
/// let subscription = bus.register(EventListener::new(|event: &ChangeEvent| {
///     println!("{} changed", event.table());
///     Ok(())
/// }))?;
///
/// bus.publish(&event)?;
/// subscription.unsubscribe();
/// ```
pub struct EventBus<E> {
    inner: Arc<EventBusInner<E>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        EventBus {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Send + Sync + 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Send + Sync + 'static> EventBus<E> {
    /// Creates a new event bus instance.
    pub fn new() -> Self {
        EventBus {
            inner: Arc::new(EventBusInner::new()),
        }
    }

    /// Registers an event listener with the bus.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the bus has been closed.
    pub fn register(&self, listener: EventListener<E>) -> DocResult<Subscription> {
        let id = self.inner.register(listener)?;
        let registry: Weak<dyn Deregister> = Arc::downgrade(&self.inner) as Weak<dyn Deregister>;
        Ok(Subscription::new(id, registry))
    }

    /// Publishes an event to all registered listeners.
    pub fn publish(&self, event: &E) -> DocResult<()> {
        self.inner.publish(event)
    }

    /// Closes the event bus and clears all registered listeners.
    pub fn close(&self) {
        self.inner.close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Returns true if there are any registered listeners.
    pub fn has_listeners(&self) -> bool {
        self.listener_count() > 0
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }
}

trait Deregister: Send + Sync {
    fn deregister(&self, id: HandlerId) -> bool;
}

struct EventBusInner<E> {
    listeners: RwLock<Vec<(HandlerId, EventListener<E>)>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl<E> EventBusInner<E> {
    fn new() -> Self {
        EventBusInner {
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    fn register(&self, listener: EventListener<E>) -> DocResult<HandlerId> {
        let mut listeners = self.listeners.write();
        // checked under the write lock so a concurrent close cannot be missed
        if self.closed.load(Ordering::Acquire) {
            log::error!("Cannot register a listener on a closed event bus");
            return Err(DocError::new(
                "Event bus is closed",
                ErrorKind::InvalidOperation,
            ));
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        listeners.push((id, listener));
        Ok(id)
    }

    fn publish(&self, event: &E) -> DocResult<()> {
        let listeners: Vec<EventListener<E>> = {
            let guard = self.listeners.read();
            if guard.is_empty() {
                return Ok(());
            }
            guard.iter().map(|(_, listener)| listener.clone()).collect()
        };

        let mut failures = 0usize;
        for listener in &listeners {
            match catch_unwind(AssertUnwindSafe(|| listener.notify(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    failures += 1;
                    log::error!("Event listener failed: {}", err);
                }
                Err(panic) => {
                    failures += 1;
                    log::error!("Event listener panicked: {}", panic_message(&panic));
                }
            }
        }

        if failures > 0 {
            return Err(DocError::new(
                &format!(
                    "{} of {} event listener(s) failed",
                    failures,
                    listeners.len()
                ),
                ErrorKind::EventError,
            ));
        }
        Ok(())
    }

    fn close(&self) {
        let mut listeners = self.listeners.write();
        self.closed.store(true, Ordering::Release);
        listeners.clear();
    }
}

impl<E> Deregister for EventBusInner<E> {
    fn deregister(&self, id: HandlerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(handler_id, _)| *handler_id != id);
        listeners.len() != before
    }
}

fn panic_message(panic: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Handle returned by a registration.
///
/// Calling [`Subscription::unsubscribe`] removes exactly the listener it was
/// created for. Dropping a subscription does **not** unsubscribe.
pub struct Subscription {
    id: HandlerId,
    registry: Weak<dyn Deregister>,
    active: AtomicBool,
    teardown: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Subscription {
    fn new(id: HandlerId, registry: Weak<dyn Deregister>) -> Self {
        Subscription {
            id,
            registry,
            active: AtomicBool::new(true),
            teardown: Mutex::new(None),
        }
    }

    /// Attaches a hook that runs once, on the first `unsubscribe` call.
    pub(crate) fn with_teardown(self, teardown: impl FnOnce() + Send + 'static) -> Self {
        *self.teardown.lock() = Some(Box::new(teardown));
        self
    }

    /// Removes the listener from its bus.
    ///
    /// Returns `true` on the first call and `false` on every later call,
    /// which are no-ops.
    pub fn unsubscribe(&self) -> bool {
        if !self.active.swap(false, Ordering::AcqRel) {
            return false;
        }
        if let Some(teardown) = self.teardown.lock().take() {
            teardown();
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.deregister(self.id);
        }
        true
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
