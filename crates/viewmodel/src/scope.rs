//! Reference host: a tree of scopes with a dirty-checking digest loop.

use crate::error::ViewModelError;
use crate::host::{Accessor, ChangeListener, EventListener, HostObservation, HostRef, TeardownHook};
use fxhash::FxHashMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};
use weave_domain::config::ScopeConfig;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

struct Watcher {
    accessor: Accessor,
    on_change: ChangeListener,
    last: Mutex<Option<Value>>,
}

impl Watcher {
    /// Re-evaluates the accessor; returns whether the listener fired.
    fn check(&self) -> bool {
        let current = (self.accessor)();
        let previous = {
            let mut last = self.last.lock();
            if last.as_ref() == Some(&current) {
                return false;
            }
            last.replace(current.clone())
        };

        // No baseline yet: report the current value as both sides.
        let old = previous.as_ref().unwrap_or(&current);
        (self.on_change)(&current, old);
        true
    }
}

#[derive(Default)]
struct ScopeState {
    watchers: Vec<Arc<Watcher>>,
    listeners: FxHashMap<String, Vec<EventListener>>,
    teardown: Vec<TeardownHook>,
    children: Vec<Scope>,
}

struct ScopeInner {
    id: u64,
    parent: Weak<ScopeInner>,
    digest_ttl: usize,
    destroyed: AtomicBool,
    state: Mutex<ScopeState>,
}

/// A node of the host scope tree.
///
/// Cloning yields another handle to the same scope. Children are owned by their parent and
/// destroyed with it.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Scope")
            .field("id", &self.inner.id)
            .field("destroyed", &self.is_destroyed())
            .field("watchers", &state.watchers.len())
            .field("children", &state.children.len())
            .finish_non_exhaustive()
    }
}

impl Scope {
    /// A root scope with the default digest limit.
    #[must_use]
    pub fn root() -> Self {
        Self::with_config(&ScopeConfig::default())
    }

    #[must_use]
    pub fn with_config(config: &ScopeConfig) -> Self {
        Self::create(Weak::new(), config.digest_ttl.max(1))
    }

    fn create(parent: Weak<ScopeInner>, digest_ttl: usize) -> Self {
        let id = NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed);
        trace!(id, "Scope created");
        Self {
            inner: Arc::new(ScopeInner {
                id,
                parent,
                digest_ttl,
                destroyed: AtomicBool::new(false),
                state: Mutex::new(ScopeState::default()),
            }),
        }
    }

    /// Creates a child scope. A destroyed scope hands out detached, already destroyed children.
    #[must_use]
    pub fn new_child(&self) -> Self {
        let child = Self::create(Arc::downgrade(&self.inner), self.inner.digest_ttl);
        if self.is_destroyed() {
            child.inner.destroyed.store(true, Ordering::SeqCst);
            return child;
        }
        self.inner.state.lock().children.push(child.clone());
        child
    }

    /// This scope as a [`HostRef`] for view-model construction.
    #[must_use]
    pub fn handle(&self) -> HostRef {
        Arc::new(self.clone())
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.inner.parent.upgrade().map(|inner| Self { inner })
    }

    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        self.inner.state.lock().children.clone()
    }

    /// Number of watchers registered directly on this scope.
    #[must_use]
    pub fn watcher_count(&self) -> usize {
        self.inner.state.lock().watchers.len()
    }

    /// Runs one detection cycle over this scope and its descendants.
    ///
    /// Passes repeat while any watcher fired, so listeners that change watched values are
    /// observed within the same cycle. Returns the number of listener invocations.
    ///
    /// # Errors
    /// Returns [`ViewModelError::DigestOverflow`] when watchers are still firing after the
    /// configured number of passes.
    pub fn digest(&self) -> Result<usize, ViewModelError> {
        if self.is_destroyed() {
            return Ok(0);
        }

        let mut total = 0;
        for pass in 1..=self.inner.digest_ttl {
            let fired = self.digest_pass();
            total += fired;
            if fired == 0 {
                trace!(id = self.inner.id, passes = pass, fired = total, "Digest settled");
                return Ok(total);
            }
        }

        warn!(id = self.inner.id, ttl = self.inner.digest_ttl, "Digest did not settle");
        Err(ViewModelError::DigestOverflow {
            message: format!("{} passes reached", self.inner.digest_ttl).into(),
            context: Some(format!("scope {}", self.inner.id).into()),
        })
    }

    fn digest_pass(&self) -> usize {
        if self.is_destroyed() {
            return 0;
        }
        let (watchers, children) = {
            let state = self.inner.state.lock();
            (state.watchers.clone(), state.children.clone())
        };

        let own = watchers.iter().filter(|w| w.check()).count();
        own + children.iter().map(Self::digest_pass).sum::<usize>()
    }

    /// Delivers `payload` to `name` listeners of this scope, then of each ancestor.
    ///
    /// Returns the number of listeners invoked.
    pub fn emit(&self, name: &str, payload: &Value) -> usize {
        let mut invoked = 0;
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            invoked += scope.notify(name, payload);
            current = scope.parent();
        }
        trace!(id = self.inner.id, name, invoked, "Event emitted");
        invoked
    }

    /// Delivers `payload` to `name` listeners of this scope, then of every descendant.
    pub fn broadcast(&self, name: &str, payload: &Value) -> usize {
        let children = self.children();
        self.notify(name, payload) + children.iter().map(|c| c.broadcast(name, payload)).sum::<usize>()
    }

    fn notify(&self, name: &str, payload: &Value) -> usize {
        if self.is_destroyed() {
            return 0;
        }
        let listeners = self.inner.state.lock().listeners.get(name).cloned().unwrap_or_default();
        for listener in &listeners {
            listener(payload);
        }
        listeners.len()
    }

    /// Tears the scope down: teardown hooks run once, then children are destroyed.
    ///
    /// Watchers and listeners are dropped; later cycles and events are ignored. Calling it again
    /// is a no-op.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }

        let state = std::mem::take(&mut *self.inner.state.lock());
        if let Some(parent) = self.parent() {
            parent.inner.state.lock().children.retain(|c| !Arc::ptr_eq(&c.inner, &self.inner));
        }

        debug!(
            id = self.inner.id,
            hooks = state.teardown.len(),
            children = state.children.len(),
            "Scope destroyed"
        );

        for hook in state.teardown {
            hook();
        }
        for child in &state.children {
            child.destroy();
        }
    }
}

impl HostObservation for Scope {
    fn watch(&self, accessor: Accessor, on_change: ChangeListener) {
        if self.is_destroyed() {
            debug!(id = self.inner.id, "Watch ignored on destroyed scope");
            return;
        }
        let watcher = Arc::new(Watcher { accessor, on_change, last: Mutex::new(None) });
        self.inner.state.lock().watchers.push(watcher);
    }

    fn on_event(&self, name: &str, listener: EventListener) {
        if self.is_destroyed() {
            debug!(id = self.inner.id, name, "Listener ignored on destroyed scope");
            return;
        }
        self.inner.state.lock().listeners.entry(name.to_owned()).or_default().push(listener);
    }

    fn on_destroy(&self, hook: TeardownHook) {
        {
            let mut state = self.inner.state.lock();
            if !self.is_destroyed() {
                state.teardown.push(hook);
                return;
            }
        }
        hook();
    }

    fn derive(&self) -> HostRef {
        Arc::new(self.new_child())
    }

    fn destroy(&self) {
        Scope::destroy(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn first_check_reports_equal_values() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let watcher = Watcher {
            accessor: Box::new(|| json!(5)),
            on_change: Box::new(move |new, old| sink.lock().push((new.clone(), old.clone()))),
            last: Mutex::new(None),
        };

        assert!(watcher.check());
        assert!(!watcher.check());
        assert_eq!(*seen.lock(), vec![(json!(5), json!(5))]);
    }

    #[test]
    fn destroy_detaches_from_parent() {
        let root = Scope::root();
        let child = root.new_child();
        assert_eq!(root.children().len(), 1);

        child.destroy();

        assert!(root.children().is_empty());
        assert!(child.is_destroyed());
        assert!(!root.is_destroyed());
    }

    #[test]
    fn teardown_hook_after_destroy_runs_immediately() {
        let scope = Scope::root();
        scope.destroy();

        let ran = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ran);
        scope.on_destroy(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn children_of_destroyed_scope_start_destroyed() {
        let scope = Scope::root();
        scope.destroy();
        assert!(scope.new_child().is_destroyed());
    }

    #[test]
    fn zero_ttl_is_clamped() {
        let scope = Scope::with_config(&ScopeConfig { digest_ttl: 0 });
        assert_eq!(scope.digest().unwrap(), 0);
    }
}
