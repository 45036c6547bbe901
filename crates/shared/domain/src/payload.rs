use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message travelling over the bus.
///
/// Serializes to the conventional shapes: `{"newValue": .., "oldValue": ..}` for property
/// changes and `{"data": ..}` for events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    #[serde(rename_all = "camelCase")]
    Property { new_value: Value, old_value: Value },
    Event { data: Value },
}

impl Payload {
    #[must_use]
    pub fn property(new_value: impl Into<Value>, old_value: impl Into<Value>) -> Self {
        Self::Property { new_value: new_value.into(), old_value: old_value.into() }
    }

    #[must_use]
    pub fn event(data: impl Into<Value>) -> Self {
        Self::Event { data: data.into() }
    }

    #[must_use]
    pub const fn new_value(&self) -> Option<&Value> {
        match self {
            Self::Property { new_value, .. } => Some(new_value),
            Self::Event { .. } => None,
        }
    }

    #[must_use]
    pub const fn old_value(&self) -> Option<&Value> {
        match self {
            Self::Property { old_value, .. } => Some(old_value),
            Self::Event { .. } => None,
        }
    }

    #[must_use]
    pub const fn data(&self) -> Option<&Value> {
        match self {
            Self::Event { data } => Some(data),
            Self::Property { .. } => None,
        }
    }
}
