//! In-memory [`LiveReader`] for testing
//!
//! Serves objects without requiring a Kubernetes cluster.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{KubeError, Result};
use crate::reader::{LiveReader, ObjectRef};

/// apiVersion, kind, namespace, name
type ObjectKey = (String, String, Option<String>, String);

/// In-memory reader for testing
#[derive(Clone, Default)]
pub struct MockReader {
    objects: Arc<RwLock<HashMap<ObjectKey, JsonValue>>>,
    forbidden: Arc<RwLock<HashSet<ObjectKey>>>,
    fetches: Arc<AtomicUsize>,
}

fn key(object: &ObjectRef) -> ObjectKey {
    (
        object.api_version(),
        object.kind.clone(),
        object.namespace.clone(),
        object.name.clone(),
    )
}

/// Key of a raw object, read from its own `apiVersion`, `kind` and `metadata`
fn key_of(value: &JsonValue) -> Option<ObjectKey> {
    let api_version = value.get("apiVersion")?.as_str()?.to_string();
    let kind = value.get("kind")?.as_str()?.to_string();
    let metadata = value.get("metadata")?;
    let name = metadata.get("name")?.as_str()?.to_string();
    let namespace = metadata
        .get("namespace")
        .and_then(JsonValue::as_str)
        .map(String::from);
    Some((api_version, kind, namespace, name))
}

impl MockReader {
    /// Create a new empty mock reader
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-populated objects
    pub fn with_objects(objects: impl IntoIterator<Item = JsonValue>) -> Self {
        let reader = Self::new();
        for object in objects {
            reader.insert(object);
        }
        reader
    }

    /// Store an object under its own identity
    ///
    /// Returns `false` when the object has no apiVersion, kind or name.
    pub fn insert(&self, object: JsonValue) -> bool {
        let Some(key) = key_of(&object) else {
            return false;
        };
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, object);
        true
    }

    /// Make every read of `object` fail with `Forbidden`
    pub fn deny(&self, object: &ObjectRef) {
        self.forbidden
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key(object));
    }

    /// Number of fetches served so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LiveReader for MockReader {
    async fn fetch(&self, object: &ObjectRef) -> Result<JsonValue> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let key = key(object);

        let denied = self
            .forbidden
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&key);
        if denied {
            return Err(KubeError::Forbidden {
                object: object.clone(),
                message: "forbidden".to_string(),
            });
        }

        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
            .ok_or_else(|| KubeError::NotFound {
                object: object.clone(),
            })
    }
}
