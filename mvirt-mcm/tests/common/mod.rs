//! Shared helpers for driver integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use mvirt_mcm::api::{Machine, MachineClass, Secret};
use mvirt_mcm::store::{
    LabelSelector, MachineObject, MachineStore, MemoryStore, ObjectMeta, Result, SecretObject,
    SecretStore, StoreError,
};
use mvirt_mcm::{Driver, DriverConfig};

pub const NAMESPACE: &str = "shoot--dev";
pub const PROVIDER: &str = "mvirt";

/// Store operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    GetMachine,
    ListMachines,
    CreateMachine,
    DeleteMachine,
    GetSecret,
    CreateSecret,
    DeleteSecret,
}

/// MemoryStore wrapper recording every call and injecting failures.
pub struct TestStore {
    pub inner: MemoryStore,
    calls: Mutex<Vec<Op>>,
    faults: Mutex<HashSet<Op>>,
}

impl TestStore {
    pub fn new() -> Arc<Self> {
        Self::with_inner(MemoryStore::new())
    }

    /// Deleted machines stay visible for `reads` further reads.
    pub fn with_teardown_reads(reads: u32) -> Arc<Self> {
        Self::with_inner(MemoryStore::new().with_teardown_reads(reads))
    }

    fn with_inner(inner: MemoryStore) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: Mutex::new(Vec::new()),
            faults: Mutex::new(HashSet::new()),
        })
    }

    pub fn fail(&self, op: Op) {
        self.faults.lock().unwrap().insert(op);
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == op).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, op: Op) -> Result<()> {
        self.calls.lock().unwrap().push(op);
        if self.faults.lock().unwrap().contains(&op) {
            return Err(StoreError::Transport(format!("injected {:?} failure", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl MachineStore for TestStore {
    async fn get_machine(&self, namespace: &str, name: &str) -> Result<Option<MachineObject>> {
        self.record(Op::GetMachine)?;
        self.inner.get_machine(namespace, name).await
    }

    async fn list_machines(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<MachineObject>> {
        self.record(Op::ListMachines)?;
        self.inner.list_machines(namespace, selector).await
    }

    async fn create_machine(&self, machine: MachineObject) -> Result<MachineObject> {
        self.record(Op::CreateMachine)?;
        self.inner.create_machine(machine).await
    }

    async fn delete_machine(&self, namespace: &str, name: &str) -> Result<()> {
        self.record(Op::DeleteMachine)?;
        self.inner.delete_machine(namespace, name).await
    }
}

#[async_trait]
impl SecretStore for TestStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<SecretObject>> {
        self.record(Op::GetSecret)?;
        self.inner.get_secret(namespace, name).await
    }

    async fn create_secret(&self, secret: SecretObject) -> Result<SecretObject> {
        self.record(Op::CreateSecret)?;
        self.inner.create_secret(secret).await
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<()> {
        self.record(Op::DeleteSecret)?;
        self.inner.delete_secret(namespace, name).await
    }
}

pub fn config() -> DriverConfig {
    DriverConfig::new(NAMESPACE)
}

pub fn fast_config() -> DriverConfig {
    config().with_polling(Duration::from_secs(1), Duration::from_secs(10))
}

pub fn driver(store: &Arc<TestStore>, config: DriverConfig) -> Driver {
    Driver::new(store.clone(), config).expect("valid config")
}

pub fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn machine_class(labels: &BTreeMap<String, String>) -> MachineClass {
    MachineClass {
        name: "small".to_string(),
        provider: PROVIDER.to_string(),
        provider_spec: json!({
            "image": "ghcr.io/mvirt/gardenlinux:1443",
            "rootDisk": { "volumeClassName": "fast", "size": "10Gi" },
            "networkName": "shoot-net",
            "prefixName": "shoot-prefix",
            "dnsServers": ["10.0.0.53"],
            "labels": labels,
        }),
    }
}

pub fn secret() -> Secret {
    Secret::with_user_data("#cloud-config\nhostname: m1\n")
}

pub fn machine(name: &str) -> Option<Machine> {
    Some(Machine::new(name))
}

pub fn machine_object(namespace: &str, name: &str, labels: BTreeMap<String, String>) -> MachineObject {
    MachineObject {
        metadata: ObjectMeta::new(namespace, name).with_labels(labels),
        ..Default::default()
    }
}

pub fn ignition_secret(namespace: &str, machine: &str) -> SecretObject {
    SecretObject {
        metadata: ObjectMeta::new(namespace, format!("ignition-{}", machine)),
        data: BTreeMap::from([("ignition".to_string(), b"#cloud-config".to_vec())]),
    }
}
