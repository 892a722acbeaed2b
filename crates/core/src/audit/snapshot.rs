//! Before/after snapshots for audit entries.
//!
//! Snapshots are caller-chosen key/value maps, not full row dumps: the
//! mutation site records the fields it considers meaningful. Keys are
//! kept ordered so serialized snapshots are stable.

use serde_json::Value;
use std::collections::BTreeMap;

/// An ordered key/value snapshot of entity state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot(BTreeMap<String, Value>);

impl Snapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, consuming and returning the snapshot for chaining.
    #[must_use]
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Adds an optional field; `None` is recorded as JSON null.
    #[must_use]
    pub fn opt_field(mut self, key: &str, value: Option<impl Into<Value>>) -> Self {
        self.0
            .insert(key.to_string(), value.map_or(Value::Null, Into::into));
        self
    }

    /// Returns true if the snapshot records no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the value for a key, if recorded.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Converts the snapshot into a JSON object for storage.
    #[must_use]
    pub fn into_json(self) -> Value {
        Value::Object(self.0.into_iter().collect())
    }

    /// Builds a snapshot back from a stored JSON object.
    /// Non-object values yield an empty snapshot.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
            _ => Self::default(),
        }
    }

    /// Iterates over the recorded fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

/// One changed field in a snapshot diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    /// Field name.
    pub key: String,
    /// Value before the change, if recorded.
    pub old: Option<Value>,
    /// Value after the change, if recorded.
    pub new: Option<Value>,
}

/// Expands the difference between two snapshots: keys whose values
/// differ, plus keys present on only one side. Used by audit readers
/// for on-demand diff display.
#[must_use]
pub fn diff(old: &Snapshot, new: &Snapshot) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    let keys: std::collections::BTreeSet<&String> =
        old.0.keys().chain(new.0.keys()).collect();

    for key in keys {
        let old_value = old.0.get(key);
        let new_value = new.0.get(key);
        if old_value != new_value {
            changes.push(FieldChange {
                key: key.clone(),
                old: old_value.cloned(),
                new: new_value.cloned(),
            });
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_builder() {
        let snap = Snapshot::new()
            .field("amount", "200.00")
            .field("kind", "expense")
            .opt_field("fund_id", None::<String>);

        assert_eq!(snap.get("amount"), Some(&json!("200.00")));
        assert_eq!(snap.get("fund_id"), Some(&Value::Null));
        assert!(snap.get("missing").is_none());
    }

    #[test]
    fn test_json_roundtrip() {
        let snap = Snapshot::new().field("name", "Main").field("balance", "1000.00");
        let json = snap.clone().into_json();
        assert_eq!(Snapshot::from_json(&json), snap);
    }

    #[test]
    fn test_diff_reports_changed_keys_only() {
        let old = Snapshot::new()
            .field("amount", "200.00")
            .field("kind", "expense")
            .field("description", "office chairs");
        let new = Snapshot::new()
            .field("amount", "50.00")
            .field("kind", "expense")
            .field("description", "office chairs");

        let changes = diff(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].key, "amount");
        assert_eq!(changes[0].old, Some(json!("200.00")));
        assert_eq!(changes[0].new, Some(json!("50.00")));
    }

    #[test]
    fn test_diff_handles_one_sided_keys() {
        let old = Snapshot::new().field("reason", "dup");
        let new = Snapshot::new().field("status", "rejected");

        let changes = diff(&old, &new);
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().any(|c| c.key == "reason" && c.new.is_none()));
        assert!(changes.iter().any(|c| c.key == "status" && c.old.is_none()));
    }

    #[test]
    fn test_diff_of_identical_is_empty() {
        let snap = Snapshot::new().field("a", 1).field("b", 2);
        assert!(diff(&snap, &snap.clone()).is_empty());
    }
}
