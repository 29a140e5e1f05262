use kube::api::DynamicObject;
use kube::discovery::ApiResource;
use kube::{Resource, ResourceExt};
use serde::Serialize;
use tracing::{debug, info};

use super::dynamic::provider_object;
use super::ownership::set_controller_reference;
use crate::error::Result;
use crate::store::ObjectStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    Created,
    Updated,
    Unchanged,
}

/// Create `obj` if absent, otherwise apply `mutate` to the stored copy and
/// write it back only when the content changed.
pub async fn create_or_update<S, F>(
    store: &S,
    ar: &ApiResource,
    mut obj: DynamicObject,
    mutate: F,
) -> Result<(OperationResult, DynamicObject)>
where
    S: ObjectStore + ?Sized,
    F: FnOnce(&mut DynamicObject) -> Result<()>,
{
    let name = obj.name_any();
    let ns = obj.namespace();
    let mut existing = match store.get(ar, ns.as_deref(), &name).await {
        Ok(existing) => existing,
        Err(e) if e.is_not_found() => {
            mutate(&mut obj)?;
            let created = store.create(ar, &obj).await?;
            return Ok((OperationResult::Created, created));
        }
        Err(e) => return Err(e),
    };

    let before = serde_json::to_value(&existing)?;
    mutate(&mut existing)?;
    if serde_json::to_value(&existing)? == before {
        debug!(kind = %ar.kind, %name, "create_or_update: no change");
        return Ok((OperationResult::Unchanged, existing));
    }
    let updated = store.replace(ar, &existing).await?;
    Ok((OperationResult::Updated, updated))
}

/// Project `desired_spec` into the provider object of `kind` that shares
/// `owner`'s identity, with `owner` as its sole controller.
pub async fn reconcile_child<O, S, T>(
    store: &S,
    owner: &O,
    desired_spec: &T,
    kind: &str,
) -> Result<(OperationResult, DynamicObject)>
where
    O: Resource<DynamicType = ()>,
    S: ObjectStore + ?Sized,
    T: Serialize + ?Sized,
{
    let ar = store.resolve_kind(kind).await?;
    let obj = provider_object(&ar, owner);
    let spec = serde_json::to_value(desired_spec)?;

    let (result, child) = create_or_update(store, &ar, obj, |child| {
        child.data["spec"] = spec;
        child.metadata.owner_references = None;
        set_controller_reference(owner, &mut child.metadata)
    })
    .await?;

    if result != OperationResult::Unchanged {
        info!(%kind, name = %child.name_any(), ?result, "provider object reconciled");
    }
    Ok((result, child))
}
