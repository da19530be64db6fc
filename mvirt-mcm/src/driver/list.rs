use std::collections::BTreeMap;

use tonic::Status;
use tracing::{debug, warn};

use super::Driver;
use crate::api::validation::validate_machine_class;
use crate::api::{ListMachinesRequest, ListMachinesResponse};
use crate::context::RequestContext;
use crate::naming::provider_id_for_machine;
use crate::status;
use crate::store::LabelSelector;

impl Driver {
    /// List the machines selected by the class' labels, keyed by provider ID.
    pub async fn list_machines(
        &self,
        ctx: &RequestContext,
        req: ListMachinesRequest,
    ) -> Result<ListMachinesResponse, Status> {
        let Some(class) = req.machine_class.as_ref() else {
            return Err(status::empty_request());
        };
        self.check_provider(class)?;

        debug!(class = %class.name, "Machine list request has been received");

        let spec = validate_machine_class(class, req.secret.as_ref())
            .map_err(|errors| status::invalid_provider_spec(&class.provider, &errors))?;

        let selector = LabelSelector::from(spec.labels);
        let machines = self
            .call(
                ctx,
                "listing machines",
                self.store.list_machines(self.namespace(), &selector),
            )
            .await?
            .map_err(|e| {
                warn!(class = %class.name, error = %e, "Failed to list machines");
                status::list_failed(&e)
            })?;

        let machine_list: BTreeMap<String, String> = machines
            .iter()
            .map(|m| {
                (
                    provider_id_for_machine(&self.config.provider_name, m),
                    m.metadata.name.clone(),
                )
            })
            .collect();

        debug!(class = %class.name, count = machine_list.len(), "Machine list request has been processed");
        Ok(ListMachinesResponse { machine_list })
    }
}
