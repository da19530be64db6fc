//! Objects stored in the mvirt control plane.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata shared by all namespaced objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    /// Assigned by the control plane on creation.
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub creation_timestamp: Option<DateTime<Utc>>,
    /// Set once deletion was requested but the object is still being torn down.
    #[serde(default)]
    pub deletion_timestamp: Option<DateTime<Utc>>,
}

impl ObjectMeta {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = labels;
        self
    }
}

/// Reference from a machine to a volume class and its size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootVolume {
    pub volume_class_name: String,
    #[serde(default)]
    pub size: Option<String>,
}

/// Network interface of a machine, bound to a network and a prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    pub name: String,
    pub network_name: String,
    pub prefix_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineObjectSpec {
    pub image: String,
    #[serde(default)]
    pub machine_class_name: Option<String>,
    #[serde(default)]
    pub root_volume: Option<RootVolume>,
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterface>,
    #[serde(default)]
    pub dns_servers: Vec<String>,
    /// Name of the secret holding the ignition config.
    #[serde(default)]
    pub ignition_ref: Option<String>,
}

/// Machine state as reported by the control plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineState {
    #[default]
    Pending,
    Running,
    Shutdown,
    Terminating,
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineObjectStatus {
    #[serde(default)]
    pub state: MachineState,
    #[serde(default)]
    pub node_name: Option<String>,
}

/// A machine object: the control plane's view of one compute instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineObject {
    pub metadata: ObjectMeta,
    pub spec: MachineObjectSpec,
    #[serde(default)]
    pub status: MachineObjectStatus,
}

/// A secret object holding opaque key/value data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretObject {
    pub metadata: ObjectMeta,
    #[serde(default, with = "crate::api::secret_data")]
    pub data: BTreeMap<String, Vec<u8>>,
}
