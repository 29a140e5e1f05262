use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use kube::api::DynamicObject;
use kube::core::TypeMeta;
use kube::discovery::ApiResource;
use serde_json::json;
use tokio::sync::RwLock;

use super::ObjectStore;
use crate::error::{ReconcileErr, Result};

type Objects = Arc<RwLock<HashMap<String, DynamicObject>>>;

/// In-process [`ObjectStore`] with apiserver-like create/replace semantics:
/// uids and resourceVersions are assigned on write, stale resourceVersions
/// are rejected, and `replace` never touches `status`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    objects: Objects,
    writes: Arc<AtomicUsize>,
    next_version: Arc<AtomicU64>,
}

fn key(ar: &ApiResource, ns: Option<&str>, name: &str) -> String {
    format!("{}/{}/{}/{}", ar.api_version, ar.kind, ns.unwrap_or(""), name)
}

fn identity(ar: &ApiResource, obj: &DynamicObject) -> Result<String> {
    let name = obj
        .metadata
        .name
        .as_deref()
        .ok_or_else(|| ReconcileErr::Transport("object has no name".into()))?;
    Ok(key(ar, obj.metadata.namespace.as_deref(), name))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful create/replace/status writes so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of stored objects of the given resource.
    pub async fn count(&self, ar: &ApiResource) -> usize {
        let prefix = format!("{}/{}/", ar.api_version, ar.kind);
        self.objects
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .count()
    }

    fn bump(&self) -> String {
        (self.next_version.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    fn check_version(
        stored: &DynamicObject,
        incoming: &DynamicObject,
    ) -> Result<()> {
        match incoming.metadata.resource_version.as_deref() {
            Some(rv) if Some(rv) != stored.metadata.resource_version.as_deref() => {
                Err(ReconcileErr::Transport(format!(
                    "Conflict: the object has been modified (have {rv}, stored {:?})",
                    stored.metadata.resource_version
                )))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(
        &self,
        ar: &ApiResource,
        ns: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject> {
        self.objects
            .read()
            .await
            .get(&key(ar, ns, name))
            .cloned()
            .ok_or_else(|| {
                ReconcileErr::NotFound(format!("{} {:?}/{}", ar.kind, ns, name))
            })
    }

    async fn create(
        &self,
        ar: &ApiResource,
        obj: &DynamicObject,
    ) -> Result<DynamicObject> {
        let k = identity(ar, obj)?;
        let mut objects = self.objects.write().await;
        if objects.contains_key(&k) {
            return Err(ReconcileErr::AlreadyExists(k));
        }
        let mut stored = obj.clone();
        stored.types = Some(TypeMeta {
            api_version: ar.api_version.clone(),
            kind: ar.kind.clone(),
        });
        let version = self.bump();
        stored.metadata.uid = Some(format!("uid-{version}"));
        stored.metadata.resource_version = Some(version);
        objects.insert(k, stored.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(stored)
    }

    async fn replace(
        &self,
        ar: &ApiResource,
        obj: &DynamicObject,
    ) -> Result<DynamicObject> {
        let k = identity(ar, obj)?;
        let mut objects = self.objects.write().await;
        let current = objects
            .get(&k)
            .ok_or_else(|| ReconcileErr::NotFound(k.clone()))?;
        Self::check_version(current, obj)?;
        let mut stored = obj.clone();
        stored.types = current.types.clone();
        stored.metadata.uid = current.metadata.uid.clone();
        match current.data.get("status") {
            Some(status) => stored.data["status"] = status.clone(),
            None => {
                if let Some(map) = stored.data.as_object_mut() {
                    map.remove("status");
                }
            }
        }
        stored.metadata.resource_version = Some(self.bump());
        objects.insert(k, stored.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(stored)
    }

    async fn update_status(
        &self,
        ar: &ApiResource,
        obj: &DynamicObject,
    ) -> Result<DynamicObject> {
        let k = identity(ar, obj)?;
        let mut objects = self.objects.write().await;
        let current = objects
            .get_mut(&k)
            .ok_or_else(|| ReconcileErr::NotFound(k.clone()))?;
        Self::check_version(current, obj)?;
        current.data["status"] =
            obj.data.get("status").cloned().unwrap_or_else(|| json!({}));
        current.metadata.resource_version = Some(self.bump());
        let stored = current.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(stored)
    }
}
