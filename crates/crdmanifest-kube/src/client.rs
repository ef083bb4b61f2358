//! kube-rs backed [`LiveReader`]

use async_trait::async_trait;
use kube::{
    Client,
    api::{Api, DynamicObject},
    core::GroupVersionKind,
    discovery::ApiResource,
};
use serde_json::Value as JsonValue;
use std::time::Duration;

use crdmanifest_core::ProviderConfig;

use crate::error::{KubeError, Result};
use crate::reader::{LiveReader, ObjectRef};

/// Reads objects through the dynamic API
///
/// The client is supplied by the caller, already configured and
/// authenticated. Requests are never retried.
#[derive(Clone)]
pub struct KubeReader {
    client: Client,
    timeout: Option<Duration>,
}

impl KubeReader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    /// Reader using the configured fetch timeout
    pub fn from_config(client: Client, config: &ProviderConfig) -> Self {
        Self::new(client).with_timeout(config.fetch_timeout)
    }

    /// Abort each read after `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn api(&self, object: &ObjectRef) -> Api<DynamicObject> {
        let gvk = GroupVersionKind::gvk(&object.group, &object.version, &object.kind);
        let ar = ApiResource::from_gvk_with_plural(&gvk, &object.plural);
        match &object.namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &ar),
            None => Api::all_with(self.client.clone(), &ar),
        }
    }
}

#[async_trait]
impl LiveReader for KubeReader {
    #[tracing::instrument(skip(self, object), fields(object = %object))]
    async fn fetch(&self, object: &ObjectRef) -> Result<JsonValue> {
        let api = self.api(object);
        let request = api.get(&object.name);

        let response = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, request)
                .await
                .map_err(|_| {
                    tracing::warn!(?timeout, "live read timed out");
                    KubeError::Timeout {
                        object: object.clone(),
                        timeout,
                    }
                })?,
            None => request.await,
        };

        match response {
            Ok(found) => {
                tracing::debug!("fetched live object");
                Ok(serde_json::to_value(found)?)
            }
            Err(e) => {
                let err = KubeError::from_api(e, object);
                if err.is_not_found() {
                    tracing::debug!("live object not found");
                } else {
                    tracing::warn!(error = %err, "live read failed");
                }
                Err(err)
            }
        }
    }
}
