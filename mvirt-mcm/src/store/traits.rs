//! DataStore trait definitions.
//!
//! The driver only talks to the control plane through these traits, so the
//! same orchestration code runs against the REST API and the in-memory store.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;

use super::error::Result;
use super::object::{MachineObject, SecretObject};

/// Exact-match label filter. All pairs must match; an empty selector matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector(BTreeMap<String, String>);

/// Characters that delimit pairs in the rendered selector.
const SELECTOR_DELIMITERS: [char; 2] = [',', '='];

/// Whether a label key or value can be rendered into a selector unambiguously.
pub fn is_selector_safe(text: &str) -> bool {
    !text.contains(SELECTOR_DELIMITERS)
}

impl LabelSelector {
    pub fn everything() -> Self {
        Self::default()
    }

    /// Whether every pair renders unambiguously.
    pub fn is_renderable(&self) -> bool {
        self.0
            .iter()
            .all(|(k, v)| is_selector_safe(k) && is_selector_safe(v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.0
            .iter()
            .all(|(k, v)| labels.get(k).is_some_and(|actual| actual == v))
    }
}

impl From<BTreeMap<String, String>> for LabelSelector {
    fn from(labels: BTreeMap<String, String>) -> Self {
        Self(labels)
    }
}

/// Renders as `k1=v1,k2=v2`, the `labelSelector` query format.
impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Store trait for machine objects.
#[async_trait]
pub trait MachineStore: Send + Sync {
    /// Get a machine by name.
    async fn get_machine(&self, namespace: &str, name: &str) -> Result<Option<MachineObject>>;

    /// List machines in a namespace matching the selector.
    async fn list_machines(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<MachineObject>>;

    /// Create a machine. Fails with `Conflict` if the name is taken.
    async fn create_machine(&self, machine: MachineObject) -> Result<MachineObject>;

    /// Request deletion of a machine. Fails with `NotFound` if it is absent.
    ///
    /// The control plane tears the machine down asynchronously; the object
    /// stays visible until that completes.
    async fn delete_machine(&self, namespace: &str, name: &str) -> Result<()>;
}

/// Store trait for secret objects.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Get a secret by name.
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<SecretObject>>;

    /// Create a secret. Fails with `Conflict` if the name is taken.
    async fn create_secret(&self, secret: SecretObject) -> Result<SecretObject>;

    /// Delete a secret. Fails with `NotFound` if it is absent.
    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<()>;
}

/// Composite data store combining all object stores.
pub trait DataStore: MachineStore + SecretStore + Send + Sync {}

impl<T> DataStore for T where T: MachineStore + SecretStore + Send + Sync {}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_selector_matches_everything() {
        let selector = LabelSelector::everything();
        assert!(selector.matches(&labels(&[])));
        assert!(selector.matches(&labels(&[("shoot", "dev")])));
        assert_eq!(selector.to_string(), "");
    }

    #[test]
    fn test_selector_requires_every_pair() {
        let selector = LabelSelector::from(labels(&[("shoot", "dev"), ("pool", "a")]));
        assert!(selector.matches(&labels(&[("shoot", "dev"), ("pool", "a"), ("x", "y")])));
        assert!(!selector.matches(&labels(&[("shoot", "dev")])));
        assert!(!selector.matches(&labels(&[("shoot", "dev"), ("pool", "b")])));
        assert_eq!(selector.to_string(), "pool=a,shoot=dev");
    }

    #[test]
    fn test_delimiters_are_not_renderable() {
        assert!(LabelSelector::from(labels(&[("shoot", "dev")])).is_renderable());
        assert!(!LabelSelector::from(labels(&[("shoot", "dev,pool=a")])).is_renderable());
        assert!(!LabelSelector::from(labels(&[("a=b", "c")])).is_renderable());
        assert!(is_selector_safe("shoot--dev.a_b-c"));
        assert!(!is_selector_safe("a,b"));
    }
}
