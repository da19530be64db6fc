//! Provider spec and secret validation.
//!
//! Validation never fails fast: every violation is collected into an
//! [`ErrorList`] so the operator sees all of them at once. The only exception
//! is a missing secret, which skips the checks on the secret's contents.

use std::fmt;
use std::net::IpAddr;

use thiserror::Error;

use super::{MachineClass, ProviderSpec, Secret};
use crate::store::is_selector_safe;

/// Path to a field inside a request, rendered as `spec.rootDisk.volumeClassName`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Empty root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Path to a named child of this path.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    /// Path to the `i`-th element of the list at this path.
    pub fn index(&self, i: usize) -> Self {
        let mut segments = self.segments.clone();
        match segments.last_mut() {
            Some(last) => last.push_str(&format!("[{}]", i)),
            None => segments.push(format!("[{}]", i)),
        }
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// A single field-level violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{field}: Required value: {detail}")]
    Required { field: String, detail: String },

    #[error("{field}: Invalid value: {value:?}: {detail}")]
    Invalid {
        field: String,
        value: String,
        detail: String,
    },
}

impl FieldError {
    pub fn required(path: &FieldPath, detail: impl Into<String>) -> Self {
        Self::Required {
            field: path.to_string(),
            detail: detail.into(),
        }
    }

    pub fn invalid(path: &FieldPath, value: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Invalid {
            field: path.to_string(),
            value: value.into(),
            detail: detail.into(),
        }
    }

    /// Path of the offending field.
    pub fn field(&self) -> &str {
        match self {
            Self::Required { field, .. } | Self::Invalid { field, .. } => field,
        }
    }
}

/// Collected field errors, rendered as `[err1, err2]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorList(Vec<FieldError>);

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: FieldError) {
        self.0.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn contains(&self, err: &FieldError) -> bool {
        self.0.contains(err)
    }
}

impl From<Vec<FieldError>> for ErrorList {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

impl std::error::Error for ErrorList {}

/// Validate a provider spec together with the request's secret.
pub fn validate_provider_spec_and_secret(
    spec: &ProviderSpec,
    secret: Option<&Secret>,
    path: &FieldPath,
) -> ErrorList {
    let mut errors = ErrorList::new();

    match secret {
        None => errors.push(FieldError::required(
            &path.child("spec.secretRef"),
            "secretRef is required",
        )),
        Some(secret) => errors.0.extend(validate_secret(secret, path)),
    }

    errors.0.extend(validate_spec(spec, &path.child("spec")));
    errors
}

fn validate_secret(secret: &Secret, path: &FieldPath) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if secret.user_data().is_none_or(<[u8]>::is_empty) {
        errors.push(FieldError::required(
            &path.child(super::USER_DATA_KEY),
            "userData is required",
        ));
    }
    errors
}

fn validate_spec(spec: &ProviderSpec, path: &FieldPath) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if spec.image.is_empty() {
        errors.push(FieldError::required(&path.child("image"), "image is required"));
    }

    match &spec.root_disk {
        None => errors.push(FieldError::required(
            &path.child("rootDisk"),
            "rootDisk is required",
        )),
        Some(disk) if disk.volume_class_name.is_empty() => errors.push(FieldError::required(
            &path.child("rootDisk").child("volumeClassName"),
            "volumeClassName is required",
        )),
        Some(_) => {}
    }

    if spec.network_name.is_empty() {
        errors.push(FieldError::required(
            &path.child("networkName"),
            "networkName is required",
        ));
    }

    if spec.prefix_name.is_empty() {
        errors.push(FieldError::required(
            &path.child("prefixName"),
            "prefixName is required",
        ));
    }

    for (key, value) in &spec.labels {
        if !is_selector_safe(key) || !is_selector_safe(value) {
            errors.push(FieldError::invalid(
                &path.child("labels").child(key),
                value.clone(),
                "label must not contain ',' or '='",
            ));
        }
    }

    for (i, ip) in spec.dns_servers.iter().enumerate() {
        if parse_ip(ip).is_none() {
            errors.push(FieldError::invalid(
                &path.child("dnsServers").index(i),
                ip.clone(),
                "ip is invalid",
            ));
        }
    }

    errors
}

/// Parse an address, rejecting the empty and unspecified (zero) addresses.
pub fn parse_ip(s: &str) -> Option<IpAddr> {
    s.trim()
        .parse::<IpAddr>()
        .ok()
        .filter(|ip| !ip.is_unspecified())
}

/// Decode the class' raw provider spec.
pub fn decode_provider_spec(class: &MachineClass) -> Result<ProviderSpec, ErrorList> {
    serde_json::from_value(class.provider_spec.clone()).map_err(|e| {
        ErrorList::from(vec![FieldError::invalid(
            &FieldPath::root().child("spec.providerSpec"),
            class.provider_spec.to_string(),
            e.to_string(),
        )])
    })
}

/// Decode and validate a machine class and its secret in one go.
pub fn validate_machine_class(
    class: &MachineClass,
    secret: Option<&Secret>,
) -> Result<ProviderSpec, ErrorList> {
    let spec = decode_provider_spec(class)?;
    let errors = validate_provider_spec_and_secret(&spec, secret, &FieldPath::root());
    if errors.is_empty() {
        Ok(spec)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RootDisk;
    use serde_json::json;

    fn valid_spec() -> ProviderSpec {
        ProviderSpec {
            image: "ghcr.io/mvirt/gardenlinux:1443".to_string(),
            root_disk: Some(RootDisk {
                volume_class_name: "fast".to_string(),
                size: Some("10Gi".to_string()),
            }),
            network_name: "shoot-net".to_string(),
            prefix_name: "shoot-prefix".to_string(),
            dns_servers: vec!["10.0.0.53".to_string(), "2001:db8::53".to_string()],
            ..Default::default()
        }
    }

    fn valid_secret() -> Secret {
        Secret::with_user_data("#cloud-config")
    }

    fn validate(spec: &ProviderSpec, secret: Option<&Secret>) -> ErrorList {
        validate_provider_spec_and_secret(spec, secret, &FieldPath::root())
    }

    #[test]
    fn test_field_path_rendering() {
        let root = FieldPath::root();
        assert_eq!(root.child("spec").child("image").to_string(), "spec.image");
        assert_eq!(
            root.child("spec").child("dnsServers").index(2).to_string(),
            "spec.dnsServers[2]"
        );
        assert_eq!(root.index(0).to_string(), "[0]");
    }

    #[test]
    fn test_valid_spec_has_no_errors() {
        let errors = validate(&valid_spec(), Some(&valid_secret()));
        assert!(errors.is_empty(), "unexpected errors: {}", errors);
    }

    #[test]
    fn test_missing_secret_skips_user_data_check() {
        let errors = validate(&valid_spec(), None);
        assert_eq!(
            errors,
            ErrorList::from(vec![FieldError::required(
                &FieldPath::root().child("spec.secretRef"),
                "secretRef is required",
            )])
        );
    }

    #[test]
    fn test_missing_user_data() {
        let mut secret = Secret::default();
        secret.data.insert("userData".to_string(), Vec::new());

        let errors = validate(&valid_spec(), Some(&secret));
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(&FieldError::required(
            &FieldPath::root().child("userData"),
            "userData is required",
        )));

        let errors = validate(&valid_spec(), Some(&Secret::default()));
        assert_eq!(errors.iter().next().unwrap().field(), "userData");
    }

    #[test]
    fn test_each_required_field() {
        let cases: Vec<(&str, &str, Box<dyn Fn(&mut ProviderSpec)>)> = vec![
            ("spec.image", "image is required", Box::new(|s: &mut ProviderSpec| s.image.clear())),
            (
                "spec.rootDisk",
                "rootDisk is required",
                Box::new(|s: &mut ProviderSpec| s.root_disk = None),
            ),
            (
                "spec.rootDisk.volumeClassName",
                "volumeClassName is required",
                Box::new(|s: &mut ProviderSpec| s.root_disk.as_mut().unwrap().volume_class_name.clear()),
            ),
            (
                "spec.networkName",
                "networkName is required",
                Box::new(|s: &mut ProviderSpec| s.network_name.clear()),
            ),
            (
                "spec.prefixName",
                "prefixName is required",
                Box::new(|s: &mut ProviderSpec| s.prefix_name.clear()),
            ),
        ];

        for (field, detail, mutate) in cases {
            let mut spec = valid_spec();
            mutate(&mut spec);

            let errors = validate(&spec, Some(&valid_secret()));
            assert_eq!(
                errors,
                ErrorList::from(vec![FieldError::Required {
                    field: field.to_string(),
                    detail: detail.to_string(),
                }]),
                "case {}",
                field
            );
        }
    }

    #[test]
    fn test_collects_all_violations() {
        let spec = ProviderSpec {
            root_disk: Some(RootDisk::default()),
            ..Default::default()
        };
        let errors = validate(&spec, None);
        let fields: Vec<&str> = errors.iter().map(FieldError::field).collect();
        assert_eq!(
            fields,
            vec![
                "spec.secretRef",
                "spec.image",
                "spec.rootDisk.volumeClassName",
                "spec.networkName",
                "spec.prefixName",
            ]
        );
    }

    #[test]
    fn test_invalid_dns_servers() {
        let mut spec = valid_spec();
        spec.dns_servers = vec![
            "1.1.1.1".to_string(),
            String::new(),
            "0.0.0.0".to_string(),
            "::".to_string(),
            "not-an-ip".to_string(),
        ];

        let errors = validate(&spec, Some(&valid_secret()));
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&FieldError::invalid(
            &FieldPath::root().child("spec").child("dnsServers").index(1),
            "",
            "ip is invalid",
        )));
        let fields: Vec<&str> = errors.iter().map(FieldError::field).collect();
        assert_eq!(
            fields,
            vec![
                "spec.dnsServers[1]",
                "spec.dnsServers[2]",
                "spec.dnsServers[3]",
                "spec.dnsServers[4]",
            ]
        );
    }

    #[test]
    fn test_labels_must_render_as_selector() {
        let mut spec = valid_spec();
        spec.labels = [
            ("pool".to_string(), "a,b".to_string()),
            ("shoot".to_string(), "dev".to_string()),
            ("x=y".to_string(), "z".to_string()),
        ]
        .into_iter()
        .collect();

        let errors = validate(&spec, Some(&valid_secret()));
        let fields: Vec<&str> = errors.iter().map(FieldError::field).collect();
        assert_eq!(fields, vec!["spec.labels.pool", "spec.labels.x=y"]);
    }

    #[test]
    fn test_error_list_display() {
        let errors = ErrorList::from(vec![
            FieldError::required(&FieldPath::root().child("spec.image"), "image is required"),
            FieldError::invalid(
                &FieldPath::root().child("spec.dnsServers[0]"),
                "",
                "ip is invalid",
            ),
        ]);
        assert_eq!(
            errors.to_string(),
            "[spec.image: Required value: image is required, \
             spec.dnsServers[0]: Invalid value: \"\": ip is invalid]"
        );
    }

    #[test]
    fn test_validate_machine_class() {
        let class = MachineClass {
            name: "small".to_string(),
            provider: "mvirt".to_string(),
            provider_spec: serde_json::to_value(valid_spec()).unwrap(),
        };
        let spec = validate_machine_class(&class, Some(&valid_secret())).unwrap();
        assert_eq!(spec, valid_spec());

        let broken = MachineClass {
            provider_spec: json!({ "image": 42 }),
            ..class
        };
        let errors = validate_machine_class(&broken, Some(&valid_secret())).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.iter().next().unwrap().field(), "spec.providerSpec");
    }
}
