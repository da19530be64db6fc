use tonic::Status;
use tracing::debug;

use super::{Driver, require_machine_request};
use crate::api::{GetMachineStatusRequest, GetMachineStatusResponse};
use crate::context::RequestContext;
use crate::naming::provider_id_for_machine;
use crate::status;

impl Driver {
    /// Report the provider ID and node name of an existing machine.
    pub async fn get_machine_status(
        &self,
        ctx: &RequestContext,
        req: GetMachineStatusRequest,
    ) -> Result<GetMachineStatusResponse, Status> {
        let (machine, class) =
            require_machine_request(&req.machine, &req.machine_class, &req.secret)?;
        self.check_provider(class)?;

        debug!(machine = %machine.name, "Machine status request has been received");

        let object = self
            .call(
                ctx,
                "getting machine",
                self.store.get_machine(self.namespace(), &machine.name),
            )
            .await?
            .map_err(|e| status::get_failed(&machine.name, &e))?
            .ok_or_else(|| status::machine_not_found(&machine.name))?;

        let node_name = object
            .status
            .node_name
            .clone()
            .unwrap_or_else(|| object.metadata.name.clone());

        Ok(GetMachineStatusResponse {
            provider_id: provider_id_for_machine(&self.config.provider_name, &object),
            node_name,
        })
    }
}
