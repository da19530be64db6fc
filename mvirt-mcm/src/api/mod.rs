//! Machine lifecycle request and response types.
//!
//! These mirror what the machine controller sends: a machine class holding
//! the raw provider spec, the machine being acted on, and the secret carrying
//! user data. Class, machine and secret are optional so that an incomplete
//! request can be rejected instead of failing to deserialize.

pub(crate) mod secret_data;
pub mod validation;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Secret key holding the machine's boot user data.
pub const USER_DATA_KEY: &str = "userData";

/// Machine class: provider name plus the provider-specific configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineClass {
    pub name: String,
    pub provider: String,
    /// Raw provider spec, decoded into [`ProviderSpec`] during validation.
    #[serde(default)]
    pub provider_spec: serde_json::Value,
}

/// The machine a request acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub node_name: Option<String>,
}

impl Machine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Opaque credential and user-data bundle supplied with each request.
///
/// Values are base64 strings on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    #[serde(default, with = "secret_data")]
    pub data: BTreeMap<String, Vec<u8>>,
}

impl Secret {
    /// Secret with only a `userData` entry.
    pub fn with_user_data(user_data: impl Into<Vec<u8>>) -> Self {
        let mut data = BTreeMap::new();
        data.insert(USER_DATA_KEY.to_string(), user_data.into());
        Self { data }
    }

    pub fn user_data(&self) -> Option<&[u8]> {
        self.data.get(USER_DATA_KEY).map(Vec::as_slice)
    }
}

/// Root disk of a machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootDisk {
    #[serde(default)]
    pub volume_class_name: String,
    /// Requested size as a quantity string (e.g. `10Gi`).
    #[serde(default)]
    pub size: Option<String>,
}

/// Provider-specific desired configuration of a machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSpec {
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub root_disk: Option<RootDisk>,
    #[serde(default)]
    pub network_name: String,
    #[serde(default)]
    pub prefix_name: String,
    #[serde(default)]
    pub dns_servers: Vec<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub machine_class_name: Option<String>,
    /// Additional ignition config merged by the backend.
    #[serde(default)]
    pub ignition: Option<String>,
}

// =============================================================================
// Requests / Responses
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMachineRequest {
    pub machine: Option<Machine>,
    pub machine_class: Option<MachineClass>,
    pub secret: Option<Secret>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMachineResponse {
    pub provider_id: String,
    pub node_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMachineRequest {
    pub machine: Option<Machine>,
    pub machine_class: Option<MachineClass>,
    pub secret: Option<Secret>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteMachineResponse {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMachinesRequest {
    pub machine_class: Option<MachineClass>,
    pub secret: Option<Secret>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMachinesResponse {
    /// Provider ID to machine name.
    pub machine_list: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMachineStatusRequest {
    pub machine: Option<Machine>,
    pub machine_class: Option<MachineClass>,
    pub secret: Option<Secret>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMachineStatusResponse {
    pub provider_id: String,
    pub node_name: String,
}
