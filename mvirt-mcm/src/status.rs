//! Classification of driver failures into status codes.
//!
//! The machine controller picks its retry cadence from the code:
//!
//! - `InvalidArgument`: malformed request or provider spec, not retried as-is
//! - `NotFound`: the machine is already gone
//! - `DeadlineExceeded`: deletion was not confirmed in time, retried later
//! - `Unknown`: a backend call failed, retried soon
//! - `Internal`: unexpected failure while creating, listing or reading machines

use tonic::{Code, Status};

use crate::api::validation::ErrorList;
use crate::context::Interrupted;
use crate::store::StoreError;

pub fn empty_request() -> Status {
    Status::invalid_argument("received empty request")
}

pub fn provider_mismatch(requested: &str, supported: &str) -> Status {
    Status::invalid_argument(format!(
        "requested provider '{}' is not supported by the driver '{}'",
        requested, supported
    ))
}

pub fn invalid_provider_spec(provider: &str, errors: &ErrorList) -> Status {
    Status::invalid_argument(format!(
        "provider spec for requested provider '{}' is invalid: {}",
        provider, errors
    ))
}

/// Status for a request whose context ended before the work did.
pub fn interrupted(reason: Interrupted, what: &str) -> Status {
    match reason {
        Interrupted::Cancelled => Status::unknown(format!("{}: {}", what, reason)),
        Interrupted::DeadlineExceeded => Status::deadline_exceeded(format!("{}: {}", what, reason)),
    }
}

/// Failure deleting the ignition secret. Callers filter out `NotFound` first.
pub fn delete_ignition_secret_failed(err: &StoreError) -> Status {
    Status::unknown(format!("error deleting ignition secret: {}", err))
}

/// Failure requesting deletion of the machine itself.
pub fn delete_machine_failed(err: &StoreError) -> Status {
    if err.is_not_found() {
        Status::not_found(err.to_string())
    } else {
        Status::unknown(format!("error deleting machine: {}", err))
    }
}

/// A confirmation poll read failed.
pub fn confirm_deletion_failed(err: &StoreError) -> Status {
    Status::unknown(format!("error waiting for machine deletion: {}", err))
}

pub fn deletion_not_confirmed(name: &str, reason: Interrupted) -> Status {
    interrupted(reason, &format!("machine '{}' not deleted", name))
}

pub fn list_failed(err: &StoreError) -> Status {
    Status::internal(err.to_string())
}

pub fn create_failed(what: &str, err: &StoreError) -> Status {
    Status::internal(format!("error creating {}: {}", what, err))
}

pub fn get_failed(name: &str, err: &StoreError) -> Status {
    Status::internal(format!("error getting machine '{}': {}", name, err))
}

pub fn machine_not_found(name: &str) -> Status {
    Status::not_found(format!("machine '{}' not found", name))
}

/// Whether the controller should treat this status as a completed deletion.
pub fn is_deleted(status: &Status) -> bool {
    status.code() == Code::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::validation::{FieldError, FieldPath};

    #[test]
    fn test_interrupted_codes() {
        assert_eq!(interrupted(Interrupted::Cancelled, "x").code(), Code::Unknown);
        assert_eq!(
            interrupted(Interrupted::DeadlineExceeded, "x").code(),
            Code::DeadlineExceeded
        );
    }

    #[test]
    fn test_delete_machine_failed() {
        let gone = delete_machine_failed(&StoreError::NotFound("machine 'm1' not found".into()));
        assert_eq!(gone.code(), Code::NotFound);
        assert!(is_deleted(&gone));

        let broken = delete_machine_failed(&StoreError::Transport("connection reset".into()));
        assert_eq!(broken.code(), Code::Unknown);
        assert!(broken.message().contains("connection reset"));
    }

    #[test]
    fn test_invalid_provider_spec_embeds_all_errors() {
        let errors = ErrorList::from(vec![
            FieldError::required(&FieldPath::root().child("spec.image"), "image is required"),
            FieldError::required(
                &FieldPath::root().child("spec.networkName"),
                "networkName is required",
            ),
        ]);
        let status = invalid_provider_spec("mvirt", &errors);
        assert_eq!(status.code(), Code::InvalidArgument);
        assert!(status.message().contains("spec.image"));
        assert!(status.message().contains("spec.networkName"));
    }

    #[test]
    fn test_backend_failures() {
        let err = StoreError::Api {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(list_failed(&err).code(), Code::Internal);
        assert_eq!(create_failed("machine", &err).code(), Code::Internal);
        assert_eq!(get_failed("m1", &err).code(), Code::Internal);
        assert_eq!(delete_ignition_secret_failed(&err).code(), Code::Unknown);
        assert_eq!(confirm_deletion_failed(&err).code(), Code::Unknown);
    }
}
