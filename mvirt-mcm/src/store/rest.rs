//! DataStore backed by the mvirt control plane REST API.
//!
//! Objects are addressed as `{endpoint}/v1/namespaces/{ns}/{machines|secrets}/{name}`.
//! Namespace and name are percent-encoded as single path segments.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{Result, StoreError};
use super::object::{MachineObject, SecretObject};
use super::traits::{LabelSelector, MachineStore, SecretStore};

const MACHINES: &str = "machines";
const SECRETS: &str = "secrets";

/// List envelope returned by collection endpoints.
#[derive(Debug, Deserialize, Serialize)]
struct ObjectList<T> {
    items: Vec<T>,
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// REST client for the control plane. Cheap to clone; connections are pooled.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    endpoint: Url,
}

impl RestStore {
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| StoreError::Internal(format!("invalid endpoint '{}': {}", endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(StoreError::Internal(format!(
                "invalid endpoint '{}': not a base URL",
                endpoint
            )));
        }
        Ok(Self { client, endpoint })
    }

    fn url(&self, namespace: &str, resource: &str, name: Option<&str>) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::Internal(format!("invalid endpoint '{}'", self.endpoint)))?
            .pop_if_empty()
            .extend(["v1", "namespaces", namespace, resource])
            .extend(name);
        Ok(url)
    }

    fn collection_url(&self, namespace: &str, resource: &str) -> Result<Url> {
        self.url(namespace, resource, None)
    }

    fn object_url(&self, namespace: &str, resource: &str, name: &str) -> Result<Url> {
        self.url(namespace, resource, Some(name))
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
        };
        debug!(%status, what, "Control plane request failed");
        Err(match status {
            StatusCode::NOT_FOUND => StoreError::NotFound(format!("{}: {}", what, message)),
            StatusCode::CONFLICT => StoreError::Conflict(format!("{}: {}", what, message)),
            _ => StoreError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        namespace: &str,
        resource: &str,
        name: &str,
    ) -> Result<Option<T>> {
        let what = format!("{} {}/{}", resource, namespace, name);
        let request = self.client.get(self.object_url(namespace, resource, name)?);
        match self.send(request, &what).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create<T: Serialize + DeserializeOwned>(
        &self,
        namespace: &str,
        resource: &str,
        name: &str,
        object: &T,
    ) -> Result<T> {
        let what = format!("{} {}/{}", resource, namespace, name);
        let request = self
            .client
            .post(self.collection_url(namespace, resource)?)
            .json(object);
        Ok(self.send(request, &what).await?.json().await?)
    }

    async fn delete(&self, namespace: &str, resource: &str, name: &str) -> Result<()> {
        let what = format!("{} {}/{}", resource, namespace, name);
        let request = self.client.delete(self.object_url(namespace, resource, name)?);
        self.send(request, &what).await?;
        Ok(())
    }
}

#[async_trait]
impl MachineStore for RestStore {
    async fn get_machine(&self, namespace: &str, name: &str) -> Result<Option<MachineObject>> {
        self.get(namespace, MACHINES, name).await
    }

    async fn list_machines(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<MachineObject>> {
        if !selector.is_renderable() {
            return Err(StoreError::Internal(format!(
                "label selector '{}' contains ',' or '=' inside a key or value",
                selector
            )));
        }
        let mut request = self.client.get(self.collection_url(namespace, MACHINES)?);
        if !selector.is_empty() {
            request = request.query(&[("labelSelector", selector.to_string())]);
        }
        let what = format!("{} {}", MACHINES, namespace);
        let list: ObjectList<MachineObject> = self.send(request, &what).await?.json().await?;
        Ok(list.items)
    }

    async fn create_machine(&self, machine: MachineObject) -> Result<MachineObject> {
        let namespace = machine.metadata.namespace.clone();
        let name = machine.metadata.name.clone();
        self.create(&namespace, MACHINES, &name, &machine).await
    }

    async fn delete_machine(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete(namespace, MACHINES, name).await
    }
}

#[async_trait]
impl SecretStore for RestStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<SecretObject>> {
        self.get(namespace, SECRETS, name).await
    }

    async fn create_secret(&self, secret: SecretObject) -> Result<SecretObject> {
        let namespace = secret.metadata.namespace.clone();
        let name = secret.metadata.name.clone();
        self.create(&namespace, SECRETS, &name, &secret).await
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete(namespace, SECRETS, name).await
    }
}
