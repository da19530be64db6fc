//! Machine driver: validates lifecycle requests and drives them against the store.
//!
//! Every operation checks the request shape and the provider name before any
//! backend call is made, so malformed requests never cause side effects.

mod create;
mod delete;
mod list;
mod machine_status;

use std::sync::Arc;

use tonic::Status;

use crate::api::{Machine, MachineClass};
use crate::config::{ConfigError, DriverConfig};
use crate::context::RequestContext;
use crate::status;
use crate::store::DataStore;

/// Driver for one namespace of the mvirt control plane.
///
/// Holds no per-request state; concurrent requests share only the store.
pub struct Driver {
    store: Arc<dyn DataStore>,
    config: DriverConfig,
}

impl Driver {
    pub fn new(store: Arc<dyn DataStore>, config: DriverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    fn namespace(&self) -> &str {
        &self.config.namespace
    }

    /// Reject classes addressed to a different provider.
    fn check_provider(&self, class: &MachineClass) -> Result<(), Status> {
        if class.provider != self.config.provider_name {
            return Err(status::provider_mismatch(
                &class.provider,
                &self.config.provider_name,
            ));
        }
        Ok(())
    }

    /// Run a single store call under the request context.
    async fn call<F, T>(&self, ctx: &RequestContext, what: &str, fut: F) -> Result<T, Status>
    where
        F: std::future::Future<Output = T>,
    {
        ctx.run(fut)
            .await
            .map_err(|reason| status::interrupted(reason, what))
    }
}

/// Machine, class and secret must all be present and the machine named.
fn require_machine_request<'a, S>(
    machine: &'a Option<Machine>,
    class: &'a Option<MachineClass>,
    secret: &Option<S>,
) -> Result<(&'a Machine, &'a MachineClass), Status> {
    match (machine, class, secret) {
        (Some(machine), Some(class), Some(_)) if !machine.name.is_empty() => Ok((machine, class)),
        _ => Err(status::empty_request()),
    }
}
