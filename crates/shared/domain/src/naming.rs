use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

macro_rules! shared_name {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Arc<str>);

        impl $name {
            #[must_use]
            pub fn new(value: impl AsRef<str>) -> Self {
                Self(Arc::from(value.as_ref()))
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(Arc::from(value))
            }
        }

        impl From<&String> for $name {
            fn from(value: &String) -> Self {
                Self::new(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

shared_name!(
    /// A logical domain partitioning registries and bus topics.
    ///
    /// Two contexts never see each other's declarations or messages.
    Context
);

shared_name!(
    /// A property name (optionally dotted, e.g. `toolbar.order`) or an event name.
    Topic
);

shared_name!(
    /// The namespace a child component is declared under, kept verbatim.
    Namespace
);

impl Topic {
    /// Splits a dotted topic into its leading mount key and the remaining path.
    ///
    /// Returns `None` for plain topics or when either side of the first dot is empty.
    #[must_use]
    pub fn split_nested(&self) -> Option<(&str, &str)> {
        let (head, rest) = self.0.split_once('.')?;
        (!head.is_empty() && !rest.is_empty()).then_some((head, rest))
    }

    /// Whether the topic addresses a property of a mounted child (see [`Topic::split_nested`]).
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.split_nested().is_some()
    }
}

impl Namespace {
    /// The key the child is mounted under: first character lowered, the rest untouched.
    #[must_use]
    pub fn mount_key(&self) -> MountKey {
        MountKey::from_namespace(&self.0)
    }
}

/// A normalized namespace: `Toolbar` → `toolbar`, `toolbarManagement` stays as is.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MountKey(String);

impl MountKey {
    #[must_use]
    pub fn from_namespace(namespace: &str) -> Self {
        let mut chars = namespace.chars();
        let key = chars.next().map_or_else(String::new, |first| {
            first.to_lowercase().chain(chars).collect::<String>()
        });
        Self(key)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for MountKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MountKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
