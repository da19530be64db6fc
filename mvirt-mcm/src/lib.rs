//! mvirt-mcm: machine driver for the mvirt control plane.
//!
//! Translates provider-agnostic machine lifecycle requests (create, delete,
//! list, status) into `Machine` and `Secret` objects on the mvirt API and
//! classifies every failure into a status code the calling controller uses
//! to choose its retry cadence.

pub mod api;
pub mod config;
pub mod context;
pub mod driver;
pub mod naming;
pub mod status;
pub mod store;

pub use api::validation::{ErrorList, FieldError, FieldPath};
pub use config::{ConfigError, DriverConfig};
pub use context::{Interrupted, RequestContext};
pub use driver::Driver;
pub use store::{DataStore, LabelSelector, MemoryStore, RestStore, StoreError};
