use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use kube::{
    Client, ResourceExt,
    api::{Api, DynamicObject, PostParams},
    discovery::{self, ApiResource},
};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use super::ObjectStore;
use crate::controller::dynamic::provider_gvk;
use crate::error::{ReconcileErr, Result};

/// [`ObjectStore`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    resolved: Arc<RwLock<HashMap<String, ApiResource>>>,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            resolved: Arc::default(),
        }
    }

    fn api(&self, ar: &ApiResource, ns: Option<&str>) -> Api<DynamicObject> {
        match ns {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, ar),
            None => Api::all_with(self.client.clone(), ar),
        }
    }
}

fn name_of(obj: &DynamicObject) -> Result<String> {
    obj.metadata
        .name
        .clone()
        .ok_or_else(|| ReconcileErr::Transport("object has no name".into()))
}

/// Body of a status PUT: the whole object, carrying its resourceVersion as
/// precondition. An absent status is sent as `{}` so the stored status is
/// cleared rather than left in place.
pub(crate) fn status_body(obj: &DynamicObject) -> Result<Vec<u8>> {
    let mut body = serde_json::to_value(obj)?;
    if body.get("status").is_none_or(|s| s.is_null()) {
        body["status"] = json!({});
    }
    Ok(serde_json::to_vec(&body)?)
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn resolve_kind(&self, kind: &str) -> Result<ApiResource> {
        if let Some(ar) = self.resolved.read().await.get(kind) {
            return Ok(ar.clone());
        }
        let gvk = provider_gvk(kind)?;
        let (ar, _caps) = discovery::pinned_kind(&self.client, &gvk).await?;
        debug!(%kind, plural = %ar.plural, "resolved provider kind");
        self.resolved
            .write()
            .await
            .insert(kind.to_string(), ar.clone());
        Ok(ar)
    }

    async fn get(
        &self,
        ar: &ApiResource,
        ns: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject> {
        trace!(kind = %ar.kind, ?ns, %name, "store: get");
        Ok(self.api(ar, ns).get(name).await?)
    }

    async fn create(
        &self,
        ar: &ApiResource,
        obj: &DynamicObject,
    ) -> Result<DynamicObject> {
        trace!(kind = %ar.kind, name = %obj.name_any(), "store: create");
        Ok(self
            .api(ar, obj.metadata.namespace.as_deref())
            .create(&PostParams::default(), obj)
            .await?)
    }

    async fn replace(
        &self,
        ar: &ApiResource,
        obj: &DynamicObject,
    ) -> Result<DynamicObject> {
        let name = name_of(obj)?;
        trace!(kind = %ar.kind, %name, "store: replace");
        Ok(self
            .api(ar, obj.metadata.namespace.as_deref())
            .replace(&name, &PostParams::default(), obj)
            .await?)
    }

    async fn update_status(
        &self,
        ar: &ApiResource,
        obj: &DynamicObject,
    ) -> Result<DynamicObject> {
        let name = name_of(obj)?;
        trace!(kind = %ar.kind, %name, "store: update_status");
        Ok(self
            .api(ar, obj.metadata.namespace.as_deref())
            .replace_status(&name, &PostParams::default(), status_body(obj)?)
            .await?)
    }
}
