use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::sync::Arc;

/// The observable state of a component.
///
/// A clonable handle over a JSON object: clones share the same storage, so the host's watchers
/// always read what the component last wrote. Values are compared structurally, which makes
/// nested mutations visible to the change-detection cycle.
#[derive(Debug, Clone, Default)]
pub struct PropertyBag {
    values: Arc<RwLock<Map<String, Value>>>,
}

impl PropertyBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A bag seeded from a JSON object. Non-object values yield an empty bag.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::from(map),
            _ => Self::default(),
        }
    }

    /// Clone of the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    /// Clone of the value at a dotted `path` (`complexProperty.a.b`, `items.0`).
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<Value> {
        let values = self.values.read();
        let mut segments = path.split('.');
        let root = values.get(segments.next()?)?;
        segments.try_fold(root, step).cloned()
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.write().insert(key.into(), value.into())
    }

    /// Replaces the value at a dotted `path`.
    ///
    /// Every intermediate segment must already exist; the last one may be new when its parent
    /// is an object. Returns `false` when the path cannot be reached.
    pub fn set_path(&self, path: &str, value: impl Into<Value>) -> bool {
        let Some((parent, leaf)) = path.rsplit_once('.') else {
            self.set(path, value);
            return true;
        };

        let mut values = self.values.write();
        let mut segments = parent.split('.');
        let Some(root) = segments.next().and_then(|first| values.get_mut(first)) else {
            return false;
        };
        let Some(target) = segments.try_fold(root, step_mut) else {
            return false;
        };

        match target {
            Value::Object(map) => {
                map.insert(leaf.to_owned(), value.into());
                true
            },
            Value::Array(items) => match leaf.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                Some(slot) => {
                    *slot = value.into();
                    true
                },
                None => false,
            },
            _ => false,
        }
    }

    /// Mutates the value under `key` in place.
    pub fn update<R>(&self, key: &str, f: impl FnOnce(&mut Value) -> R) -> Option<R> {
        self.values.write().get_mut(key).map(f)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.values.write().remove(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.values.read().keys().cloned().collect()
    }

    /// The whole bag as a JSON object.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        Value::Object(self.values.read().clone())
    }
}

impl From<Map<String, Value>> for PropertyBag {
    fn from(map: Map<String, Value>) -> Self {
        Self { values: Arc::new(RwLock::new(map)) }
    }
}

fn step<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
        _ => None,
    }
}

fn step_mut<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?),
        _ => None,
    }
}
