//! Machine deletion.
//!
//! Deletion removes the ignition secret, asks the control plane to delete the
//! machine and then actively waits until the machine object is gone. The
//! machine controller assumes a successful delete means the instance no
//! longer exists; returning earlier would let the node register again after
//! the controller already removed it.

use tokio::time::{MissedTickBehavior, interval};
use tonic::Status;
use tracing::{debug, info, warn};

use super::{Driver, require_machine_request};
use crate::api::{DeleteMachineRequest, DeleteMachineResponse};
use crate::context::RequestContext;
use crate::naming::ignition_secret_name;
use crate::status;
use crate::store::ignore_not_found;

impl Driver {
    /// Delete a machine and its ignition secret, waiting for the machine to disappear.
    pub async fn delete_machine(
        &self,
        ctx: &RequestContext,
        req: DeleteMachineRequest,
    ) -> Result<DeleteMachineResponse, Status> {
        let (machine, class) =
            require_machine_request(&req.machine, &req.machine_class, &req.secret)?;
        self.check_provider(class)?;

        debug!(machine = %machine.name, "Machine deletion request has been received");
        let result = self.delete_machine_and_wait(ctx, &machine.name).await;
        debug!(machine = %machine.name, ok = result.is_ok(), "Machine deletion request has been processed");

        result.map(|()| DeleteMachineResponse {})
    }

    async fn delete_machine_and_wait(&self, ctx: &RequestContext, name: &str) -> Result<(), Status> {
        let namespace = self.namespace();

        let secret_name = ignition_secret_name(name);
        let deleted = self
            .call(
                ctx,
                "deleting ignition secret",
                self.store.delete_secret(namespace, &secret_name),
            )
            .await?;
        if let Err(e) = ignore_not_found(deleted) {
            warn!(machine = %name, secret = %secret_name, error = %e, "Failed to delete ignition secret");
            return Err(status::delete_ignition_secret_failed(&e));
        }

        let deleted = self
            .call(
                ctx,
                "deleting machine",
                self.store.delete_machine(namespace, name),
            )
            .await?;
        if let Err(e) = deleted {
            if e.is_not_found() {
                info!(machine = %name, "Machine already deleted");
            } else {
                warn!(machine = %name, error = %e, "Failed to delete machine");
            }
            return Err(status::delete_machine_failed(&e));
        }

        self.wait_until_deleted(ctx, name).await
    }

    /// Poll the machine until it is gone, a read fails, or the delete timeout passes.
    ///
    /// The first read happens immediately; subsequent reads follow the poll interval.
    async fn wait_until_deleted(&self, ctx: &RequestContext, name: &str) -> Result<(), Status> {
        let ctx = ctx.with_timeout(self.config.delete_timeout);
        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut attempts: u32 = 0;

        loop {
            tokio::select! {
                biased;
                reason = ctx.done() => {
                    warn!(machine = %name, attempts, %reason, "Machine deletion not confirmed");
                    return Err(status::deletion_not_confirmed(name, reason));
                }
                _ = ticker.tick() => {}
            }

            attempts += 1;
            let current = ctx
                .run(self.store.get_machine(self.namespace(), name))
                .await
                .map_err(|reason| status::deletion_not_confirmed(name, reason))?;

            match current {
                Ok(None) => {
                    info!(machine = %name, attempts, "Machine deleted");
                    return Ok(());
                }
                Ok(Some(machine)) => {
                    debug!(
                        machine = %name,
                        attempts,
                        state = ?machine.status.state,
                        "Waiting for machine deletion"
                    );
                }
                Err(e) => {
                    warn!(machine = %name, attempts, error = %e, "Failed to get machine while waiting for deletion");
                    return Err(status::confirm_deletion_failed(&e));
                }
            }
        }
    }
}
