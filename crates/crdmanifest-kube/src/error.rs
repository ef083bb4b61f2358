//! Error types for crdmanifest-kube

use std::time::Duration;
use thiserror::Error;

use crate::reader::ObjectRef;

/// Result type for crdmanifest-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur while reading live objects
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// The object does not exist
    #[error("{object} not found")]
    NotFound { object: ObjectRef },

    /// The API server refused the request (401/403)
    #[error("access to {object} denied: {message}")]
    Forbidden { object: ObjectRef, message: String },

    /// Any other API or connection failure
    #[error("failed to read {object}: {source}")]
    Transport {
        object: ObjectRef,
        #[source]
        source: kube::Error,
    },

    /// The per-request deadline expired
    #[error("reading {object} timed out after {timeout:?}")]
    Timeout { object: ObjectRef, timeout: Duration },

    /// A namespaced kind was read without a namespace
    #[error("{kind} is namespaced, a namespace is required")]
    MissingNamespace { kind: String },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Decoding or rendering the live object failed
    #[error(transparent)]
    Core(#[from] crdmanifest_core::CoreError),
}

impl KubeError {
    /// Classify an API error for `object`
    pub fn from_api(source: kube::Error, object: &ObjectRef) -> Self {
        match &source {
            kube::Error::Api(resp) if resp.code == 404 => KubeError::NotFound {
                object: object.clone(),
            },
            kube::Error::Api(resp) if resp.code == 401 || resp.code == 403 => {
                KubeError::Forbidden {
                    object: object.clone(),
                    message: resp.message.clone(),
                }
            }
            _ => KubeError::Transport {
                object: object.clone(),
                source,
            },
        }
    }

    /// Check if the object was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, KubeError::NotFound { .. })
    }

    /// Check if access was denied
    pub fn is_forbidden(&self) -> bool {
        matches!(self, KubeError::Forbidden { .. })
    }
}
