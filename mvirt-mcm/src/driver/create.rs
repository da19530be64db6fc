//! Machine creation.
//!
//! Creates the ignition secret carrying the user data, then the machine
//! referencing it. Objects that already exist are reused so the controller
//! can safely retry a create that failed halfway.

use std::collections::BTreeMap;

use tonic::Status;
use tracing::{debug, info, warn};

use super::{Driver, require_machine_request};
use crate::api::validation::validate_machine_class;
use crate::api::{CreateMachineRequest, CreateMachineResponse, ProviderSpec, Secret};
use crate::context::RequestContext;
use crate::naming::{ignition_secret_name, provider_id};
use crate::status;
use crate::store::{
    MachineObject, MachineObjectSpec, NetworkInterface, ObjectMeta, RootVolume, SecretObject,
};

/// Secret key holding the ignition config.
pub const IGNITION_KEY: &str = "ignition";

/// Secret key holding the additional ignition config from the provider spec.
pub const IGNITION_OVERRIDE_KEY: &str = "ignitionOverride";

/// Name of the single network interface every machine gets.
const PRIMARY_INTERFACE: &str = "primary";

impl Driver {
    pub async fn create_machine(
        &self,
        ctx: &RequestContext,
        req: CreateMachineRequest,
    ) -> Result<CreateMachineResponse, Status> {
        let (machine, class) =
            require_machine_request(&req.machine, &req.machine_class, &req.secret)?;
        self.check_provider(class)?;

        debug!(machine = %machine.name, "Machine creation request has been received");

        let spec = validate_machine_class(class, req.secret.as_ref())
            .map_err(|errors| status::invalid_provider_spec(&class.provider, &errors))?;
        // Validation guarantees the secret is present.
        let secret = req.secret.as_ref().ok_or_else(status::empty_request)?;

        let secret_object = self.ignition_secret(&machine.name, &spec, secret);
        match self
            .call(
                ctx,
                "creating ignition secret",
                self.store.create_secret(secret_object),
            )
            .await?
        {
            Ok(_) => {}
            Err(e) if e.is_conflict() => {
                debug!(machine = %machine.name, "Ignition secret already exists");
            }
            Err(e) => {
                warn!(machine = %machine.name, error = %e, "Failed to create ignition secret");
                return Err(status::create_failed("ignition secret", &e));
            }
        }

        let machine_object = self.machine_object(&machine.name, &spec);
        match self
            .call(ctx, "creating machine", self.store.create_machine(machine_object))
            .await?
        {
            Ok(created) => {
                info!(machine = %machine.name, uid = %created.metadata.uid, "Machine created");
            }
            Err(e) if e.is_conflict() => {
                debug!(machine = %machine.name, "Machine already exists");
            }
            Err(e) => {
                warn!(machine = %machine.name, error = %e, "Failed to create machine");
                return Err(status::create_failed("machine", &e));
            }
        }

        Ok(CreateMachineResponse {
            provider_id: provider_id(
                &self.config.provider_name,
                self.namespace(),
                &machine.name,
            ),
            node_name: machine.name.clone(),
        })
    }

    fn ignition_secret(&self, name: &str, spec: &ProviderSpec, secret: &Secret) -> SecretObject {
        let mut data = BTreeMap::new();
        data.insert(
            IGNITION_KEY.to_string(),
            secret.user_data().unwrap_or_default().to_vec(),
        );
        if let Some(ignition) = &spec.ignition {
            data.insert(
                IGNITION_OVERRIDE_KEY.to_string(),
                ignition.as_bytes().to_vec(),
            );
        }

        SecretObject {
            metadata: ObjectMeta::new(self.namespace(), ignition_secret_name(name))
                .with_labels(spec.labels.clone()),
            data,
        }
    }

    fn machine_object(&self, name: &str, spec: &ProviderSpec) -> MachineObject {
        MachineObject {
            metadata: ObjectMeta::new(self.namespace(), name).with_labels(spec.labels.clone()),
            spec: MachineObjectSpec {
                image: spec.image.clone(),
                machine_class_name: spec.machine_class_name.clone(),
                root_volume: spec.root_disk.as_ref().map(|disk| RootVolume {
                    volume_class_name: disk.volume_class_name.clone(),
                    size: disk.size.clone(),
                }),
                network_interfaces: vec![NetworkInterface {
                    name: PRIMARY_INTERFACE.to_string(),
                    network_name: spec.network_name.clone(),
                    prefix_name: spec.prefix_name.clone(),
                }],
                dns_servers: spec.dns_servers.iter().map(|s| s.trim().to_string()).collect(),
                ignition_ref: Some(ignition_secret_name(name)),
            },
            status: Default::default(),
        }
    }
}
