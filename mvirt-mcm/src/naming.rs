//! Provider IDs and derived object names.
//!
//! Everything here is a pure function of immutable object attributes so the
//! driver can address dependent objects without keeping any lookup state.

use crate::store::MachineObject;

const IGNITION_PREFIX: &str = "ignition";

/// Provider ID of a machine: `{provider}://{namespace}/{name}`.
pub fn provider_id(provider: &str, namespace: &str, name: &str) -> String {
    format!("{}://{}/{}", provider, namespace, name)
}

/// Provider ID derived from a backend machine object.
pub fn provider_id_for_machine(provider: &str, machine: &MachineObject) -> String {
    provider_id(
        provider,
        &machine.metadata.namespace,
        &machine.metadata.name,
    )
}

/// Name of the ignition secret belonging to a machine.
pub fn ignition_secret_name(machine_name: &str) -> String {
    format!("{}-{}", IGNITION_PREFIX, machine_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ObjectMeta;

    #[test]
    fn test_ignition_secret_name() {
        assert_eq!(ignition_secret_name("m1"), "ignition-m1");
        assert_eq!(ignition_secret_name("m1"), ignition_secret_name("m1"));
        assert_ne!(ignition_secret_name("m1"), ignition_secret_name("m2"));
    }

    #[test]
    fn test_provider_id_for_machine() {
        let machine = MachineObject {
            metadata: ObjectMeta::new("shoot--dev", "m1"),
            ..Default::default()
        };
        let id = provider_id_for_machine("mvirt", &machine);
        assert_eq!(id, "mvirt://shoot--dev/m1");
        assert_eq!(id, provider_id_for_machine("mvirt", &machine.clone()));
    }
}
