//! Identity of the component emitting log lines.

use serde::{Deserialize, Serialize};

use crate::EMPTY_VALUE;

/// Identity triple stamped on every canonical log object.
///
/// Set once when the formatter is built and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentIdentity {
    /// Stable component identifier.
    #[serde(default = "default_empty")]
    pub id: String,
    /// Human readable component name.
    #[serde(default = "default_empty")]
    pub name: String,
    /// Index of this instance when several replicas run.
    #[serde(default)]
    pub instance_index: u32,
}

fn default_empty() -> String {
    EMPTY_VALUE.to_string()
}

impl Default for ComponentIdentity {
    fn default() -> Self {
        Self {
            id: default_empty(),
            name: default_empty(),
            instance_index: 0,
        }
    }
}

impl ComponentIdentity {
    /// Create an identity with the given id and name.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            instance_index: 0,
        }
    }

    /// Set the instance index.
    #[must_use]
    pub fn with_instance_index(mut self, index: u32) -> Self {
        self.instance_index = index;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_identity_uses_sentinel() {
        let identity = ComponentIdentity::default();
        assert_eq!(identity.id, "-");
        assert_eq!(identity.name, "-");
        assert_eq!(identity.instance_index, 0);
    }

    #[test]
    fn test_partial_deserialization() {
        let identity: ComponentIdentity = serde_json::from_str(r#"{"name":"orders"}"#).unwrap();
        assert_eq!(identity.id, "-");
        assert_eq!(identity.name, "orders");
        assert_eq!(identity.instance_index, 0);
    }
}
