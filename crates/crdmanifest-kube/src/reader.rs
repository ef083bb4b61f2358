//! Live object reads
//!
//! A [`LiveReader`] fetches one object by reference and returns its raw JSON.
//! Implementations must not retry: a failed read is reported as-is.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::fmt;

use crdmanifest_core::ResourceSchema;

use crate::error::Result;

/// Everything needed to address one object on the API server
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
    /// `None` for cluster-scoped objects
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectRef {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
        plural: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
            plural: plural.into(),
            namespace: None,
            name: name.into(),
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Reference an object of the given resource kind
    pub fn for_resource(resource: &ResourceSchema, name: impl Into<String>) -> Self {
        Self::new(
            resource.group.clone(),
            resource.version.clone(),
            resource.kind.clone(),
            resource.plural.clone(),
            name,
        )
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.kind, self.api_version())?;
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}", ns, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Source of live objects
///
/// Implementations must be Send + Sync for use across async tasks.
#[async_trait]
pub trait LiveReader: Send + Sync {
    /// Fetch the object, returning `KubeError::NotFound` when it does not exist
    async fn fetch(&self, object: &ObjectRef) -> Result<JsonValue>;

    /// Check if the object exists
    async fn exists(&self, object: &ObjectRef) -> Result<bool> {
        match self.fetch(object).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let namespaced = ObjectRef::new("gateway.solo.io", "v1", "RouteOption", "routeoptions", "a")
            .in_namespace("ns");
        assert_eq!(namespaced.to_string(), "RouteOption gateway.solo.io/v1 ns/a");

        let core = ObjectRef::new("", "v1", "Namespace", "namespaces", "default");
        assert_eq!(core.to_string(), "Namespace v1 default");
    }

    #[test]
    fn test_for_resource() {
        let resource = ResourceSchema::new("cert-manager.io", "v1", "ClusterIssuer")
            .with_plural("clusterissuers");
        let object = ObjectRef::for_resource(&resource, "letsencrypt");
        assert_eq!(object.plural, "clusterissuers");
        assert_eq!(object.namespace, None);
    }
}
