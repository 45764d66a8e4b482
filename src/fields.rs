use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered key/value pairs passed to a log call or bound onto a logger.
///
/// Values are arbitrary JSON. A `Value::Null` is the explicit "unset"
/// marker: bound into a child it removes the key from the child's
/// bindings, passed at a call site it removes the field from that entry.
/// Insertion order is kept so that `context` renders in call order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(Map<String, Value>);

impl Fields {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Builder-style explicit unset of `key`.
    pub fn unset(mut self, key: impl Into<String>) -> Self {
        self.0.insert(key.into(), Value::Null);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Layer `overrides` on top of `self`: null values remove keys, every
    /// other value replaces or appends.
    pub fn merged(&self, overrides: Fields) -> Fields {
        let mut merged = self.0.clone();
        for (key, value) in overrides.0 {
            if value.is_null() {
                merged.shift_remove(&key);
            } else {
                merged.insert(key, value);
            }
        }
        Fields(merged)
    }
}

impl From<Map<String, Value>> for Fields {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Objects convert key for key; any other JSON value yields no fields.
impl From<Value> for Fields {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Build [`Fields`] with `serde_json::json!` object syntax.
///
/// ```
/// use homelab_log::fields;
///
/// let f = fields!("test": true, "trace_id": null);
/// assert_eq!(f.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::fields::Fields::new()
    };
    ($($body:tt)+) => {
        $crate::fields::Fields::from($crate::__private::serde_json::json!({ $($body)+ }))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merged_overrides_and_unsets() {
        let parent = Fields::new().with("a", 1).with("b", "x").with("c", true);
        let child = parent.merged(Fields::new().with("b", "y").unset("c").with("d", 4));

        assert_eq!(child.get("a"), Some(&json!(1)));
        assert_eq!(child.get("b"), Some(&json!("y")));
        assert!(!child.contains_key("c"));
        assert_eq!(child.get("d"), Some(&json!(4)));
        // parent untouched
        assert_eq!(parent.get("c"), Some(&json!(true)));
    }

    #[test]
    fn macro_keeps_order_and_nulls() {
        let f = crate::fields!("z": 1, "a": null, "m": [1, 2]);
        let keys: Vec<_> = f.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["z", "a", "m"]);
        assert_eq!(f.get("a"), Some(&Value::Null));
    }

    #[test]
    fn non_object_value_is_empty() {
        assert!(Fields::from(json!("nope")).is_empty());
        assert!(Fields::from(json!([1, 2])).is_empty());
    }
}
