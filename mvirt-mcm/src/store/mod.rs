//! Access to the mvirt control plane.

pub mod error;
pub mod memory;
pub mod object;
pub mod rest;
pub mod traits;

pub use error::{Result, StoreError, ignore_not_found};
pub use memory::MemoryStore;
pub use object::{
    MachineObject, MachineObjectSpec, MachineObjectStatus, MachineState, NetworkInterface,
    ObjectMeta, RootVolume, SecretObject,
};
pub use rest::RestStore;
pub use traits::{DataStore, LabelSelector, MachineStore, SecretStore, is_selector_safe};
