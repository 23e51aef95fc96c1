//! Mutable property bag threaded through wizard steps.

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::WizardError;

/// Named values collected by prompt steps and consumed by execute steps.
///
/// Snapshots capture the whole bag; restoring one during back-navigation
/// clears every field set after the snapshot was taken and reverts any
/// overwrites.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardContext {
    values: BTreeMap<String, Value>,
}

/// A point-in-time copy of the context, taken before a step runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSnapshot {
    values: BTreeMap<String, Value>,
}

impl WizardContext {
    /// Creates an empty context.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Returns true when the field has been set.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Reads a field, deserialising it into the requested type.
    ///
    /// Returns `None` when the field is absent or has an incompatible shape.
    #[must_use]
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        self.values
            .get(key)
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
    }

    /// Reads a field as its raw JSON value.
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Writes a field.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::Value`] when the value cannot be serialised.
    pub fn set<T>(&mut self, key: &str, value: T) -> Result<(), WizardError>
    where
        T: Serialize,
    {
        let serialised = serde_json::to_value(value).map_err(|error| WizardError::Value {
            message: error.to_string(),
        })?;
        self.values.insert(key.to_owned(), serialised);
        Ok(())
    }

    /// Removes a field, returning its previous value if any.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Captures the current state of the bag.
    #[must_use]
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            values: self.values.clone(),
        }
    }

    /// Restores the bag to a previously captured state.
    pub fn restore(&mut self, snapshot: &ContextSnapshot) {
        self.values = snapshot.values.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::WizardContext;

    #[test]
    fn typed_round_trip_through_json() {
        let mut ctx = WizardContext::new();
        ctx.set("name", "widget").expect("string should serialise");
        ctx.set("count", 3_u32).expect("number should serialise");

        assert_eq!(ctx.get::<String>("name").as_deref(), Some("widget"));
        assert_eq!(ctx.get::<u32>("count"), Some(3));
        assert_eq!(ctx.get::<u32>("name"), None);
        assert!(ctx.get::<String>("absent").is_none());
    }

    #[test]
    fn restore_discards_later_fields_and_overwrites() {
        let mut ctx = WizardContext::new();
        ctx.set("kept", "original").expect("value should serialise");

        let snapshot = ctx.snapshot();
        ctx.set("kept", "overwritten").expect("value should serialise");
        ctx.set("added", true).expect("value should serialise");

        ctx.restore(&snapshot);
        assert_eq!(ctx.get::<String>("kept").as_deref(), Some("original"));
        assert!(!ctx.contains("added"));
    }
}
