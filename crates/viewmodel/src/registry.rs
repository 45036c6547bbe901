//! Namespaced declaration tables.
//!
//! Separate instances are used for properties, events and child components; the dispatch layer
//! only wires what a table recognizes for the context at hand.

use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::trace;
use weave_domain::{Context, Namespace, Topic};

/// One recognized entry of a context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    /// A property or event key.
    Simple { key: Topic },
    /// A child to build from `type_name` and mount under the namespace's mount key.
    Component { namespace: Namespace, type_name: Arc<str> },
}

impl Declaration {
    /// The key the declaration is identified by (the namespace for component declarations).
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Simple { key } => key.as_str(),
            Self::Component { namespace, .. } => namespace.as_str(),
        }
    }

    #[must_use]
    pub const fn is_component(&self) -> bool {
        matches!(self, Self::Component { .. })
    }
}

/// Append-only multimap of declarations per context.
///
/// Registration is idempotent. Cloning yields another handle to the same table, so one registry
/// can be shared by every component of a hierarchy.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Arc<RwLock<FxHashMap<Context, Vec<Declaration>>>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `key` as recognized under `context`. Registering it again is a no-op.
    pub fn register(&self, context: impl Into<Context>, key: impl Into<Topic>) -> &Self {
        let context = context.into();
        let key = key.into();

        let mut entries = self.entries.write();
        let declarations = entries.entry(context.clone()).or_default();
        if declarations.iter().all(|d| d.key() != key.as_str()) {
            trace!(%context, %key, "Declaration registered");
            declarations.push(Declaration::Simple { key });
        }
        self
    }

    /// Records a child component declaration under `context`.
    ///
    /// Registering the same namespace again replaces its type name in place (last write wins,
    /// the original position is kept).
    pub fn register_component(
        &self,
        context: impl Into<Context>,
        namespace: impl Into<Namespace>,
        type_name: impl AsRef<str>,
    ) -> &Self {
        let context = context.into();
        let namespace = namespace.into();
        let type_name: Arc<str> = Arc::from(type_name.as_ref());

        let mut entries = self.entries.write();
        let declarations = entries.entry(context.clone()).or_default();
        let declaration = Declaration::Component { namespace: namespace.clone(), type_name };
        match declarations.iter_mut().find(|d| d.key() == namespace.as_str()) {
            Some(existing) => *existing = declaration,
            None => declarations.push(declaration),
        }
        trace!(%context, %namespace, "Component declaration registered");
        self
    }

    #[must_use]
    pub fn is_registered(&self, context: &str, key: &str) -> bool {
        self.entries.read().get(context).is_some_and(|d| d.iter().any(|d| d.key() == key))
    }

    /// All declarations of `context` in registration order. Unknown contexts yield nothing.
    #[must_use]
    pub fn entries_for(&self, context: &str) -> Vec<Declaration> {
        self.entries.read().get(context).cloned().unwrap_or_default()
    }

    /// Contexts with at least one declaration, in no particular order.
    #[must_use]
    pub fn contexts(&self) -> Vec<Context> {
        self.entries.read().keys().cloned().collect()
    }

    /// Total number of declarations across all contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
