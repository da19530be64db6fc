//! In-memory DataStore.
//!
//! Used by tests and for local runs without a control plane. Deleting a
//! machine can be made to linger for a number of reads to mimic the
//! asynchronous teardown of the real control plane.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use super::error::{Result, StoreError};
use super::object::{MachineObject, MachineState, SecretObject};
use super::traits::{LabelSelector, MachineStore, SecretStore};

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

struct StoredMachine {
    object: MachineObject,
    /// Reads left before a machine marked for deletion disappears.
    teardown_reads_left: Option<u32>,
}

/// In-memory store for machines and secrets.
#[derive(Default)]
pub struct MemoryStore {
    machines: RwLock<BTreeMap<Key, StoredMachine>>,
    secrets: RwLock<BTreeMap<Key, SecretObject>>,
    teardown_reads: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep deleted machines visible for `reads` further `get_machine` calls.
    pub fn with_teardown_reads(mut self, reads: u32) -> Self {
        self.teardown_reads = reads;
        self
    }

    /// Insert a machine as is, without stamping uid or timestamps.
    pub async fn insert_machine(&self, machine: MachineObject) {
        let k = key(&machine.metadata.namespace, &machine.metadata.name);
        self.machines.write().await.insert(
            k,
            StoredMachine {
                object: machine,
                teardown_reads_left: None,
            },
        );
    }

    /// Insert a secret as is.
    pub async fn insert_secret(&self, secret: SecretObject) {
        let k = key(&secret.metadata.namespace, &secret.metadata.name);
        self.secrets.write().await.insert(k, secret);
    }

    pub async fn machine_count(&self) -> usize {
        self.machines.read().await.len()
    }

    pub async fn contains_secret(&self, namespace: &str, name: &str) -> bool {
        self.secrets.read().await.contains_key(&key(namespace, name))
    }
}

fn stamp(meta: &mut super::ObjectMeta) {
    if meta.uid.is_empty() {
        meta.uid = uuid::Uuid::new_v4().to_string();
    }
    if meta.creation_timestamp.is_none() {
        meta.creation_timestamp = Some(Utc::now());
    }
}

#[async_trait]
impl MachineStore for MemoryStore {
    async fn get_machine(&self, namespace: &str, name: &str) -> Result<Option<MachineObject>> {
        let k = key(namespace, name);
        let mut machines = self.machines.write().await;

        let Some(stored) = machines.get_mut(&k) else {
            return Ok(None);
        };
        if stored.teardown_reads_left == Some(0) {
            debug!(namespace, name, "Machine teardown complete");
            machines.remove(&k);
            return Ok(None);
        }
        if let Some(left) = stored.teardown_reads_left.as_mut() {
            *left -= 1;
        }
        Ok(Some(stored.object.clone()))
    }

    async fn list_machines(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<MachineObject>> {
        let machines = self.machines.read().await;
        Ok(machines
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .filter(|(_, m)| selector.matches(&m.object.metadata.labels))
            .map(|(_, m)| m.object.clone())
            .collect())
    }

    async fn create_machine(&self, mut machine: MachineObject) -> Result<MachineObject> {
        let k = key(&machine.metadata.namespace, &machine.metadata.name);
        let mut machines = self.machines.write().await;
        if machines.contains_key(&k) {
            return Err(StoreError::Conflict(format!(
                "machine '{}' already exists",
                machine.metadata.name
            )));
        }

        stamp(&mut machine.metadata);
        machines.insert(
            k,
            StoredMachine {
                object: machine.clone(),
                teardown_reads_left: None,
            },
        );
        Ok(machine)
    }

    async fn delete_machine(&self, namespace: &str, name: &str) -> Result<()> {
        let k = key(namespace, name);
        let mut machines = self.machines.write().await;

        let Some(stored) = machines.get_mut(&k) else {
            return Err(StoreError::NotFound(format!("machine '{}' not found", name)));
        };
        if self.teardown_reads == 0 {
            machines.remove(&k);
            return Ok(());
        }
        if stored.teardown_reads_left.is_none() {
            stored.object.metadata.deletion_timestamp = Some(Utc::now());
            stored.object.status.state = MachineState::Terminating;
            stored.teardown_reads_left = Some(self.teardown_reads);
        }
        Ok(())
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<SecretObject>> {
        Ok(self.secrets.read().await.get(&key(namespace, name)).cloned())
    }

    async fn create_secret(&self, mut secret: SecretObject) -> Result<SecretObject> {
        let k = key(&secret.metadata.namespace, &secret.metadata.name);
        let mut secrets = self.secrets.write().await;
        if secrets.contains_key(&k) {
            return Err(StoreError::Conflict(format!(
                "secret '{}' already exists",
                secret.metadata.name
            )));
        }

        stamp(&mut secret.metadata);
        secrets.insert(k, secret.clone());
        Ok(secret)
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<()> {
        match self.secrets.write().await.remove(&key(namespace, name)) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(format!("secret '{}' not found", name))),
        }
    }
}
