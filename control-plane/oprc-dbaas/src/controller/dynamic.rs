use kube::api::DynamicObject;
use kube::core::GroupVersionKind;
use kube::discovery::ApiResource;
use kube::{Resource, ResourceExt};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::crd::{GROUP, VERSION};
use crate::error::{ReconcileErr, Result};

/// Kinds are CamelCase identifiers, e.g. "CrunchyBridgeInventory".
pub fn validate_kind(kind: &str) -> Result<()> {
    let mut chars = kind.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(ReconcileErr::InvalidKind(kind.to_string()))
    }
}

/// GroupVersionKind of a provider kind in the operator's group/version.
pub fn provider_gvk(kind: &str) -> Result<GroupVersionKind> {
    validate_kind(kind)?;
    Ok(GroupVersionKind::gvk(GROUP, VERSION, kind))
}

/// ApiResource for a provider kind with the plural guessed from the kind.
/// Kinds with irregular plurals need discovery, see
/// [`ObjectStore::resolve_kind`](crate::store::ObjectStore::resolve_kind).
pub fn provider_api_resource(kind: &str) -> Result<ApiResource> {
    Ok(ApiResource::from_gvk(&provider_gvk(kind)?))
}

/// Empty provider object sharing the owner's namespace and name.
pub fn provider_object<O: Resource>(ar: &ApiResource, owner: &O) -> DynamicObject {
    let mut obj = DynamicObject::new(&owner.name_any(), ar);
    obj.metadata.namespace = owner.namespace();
    obj.data = json!({});
    obj
}

/// Re-read an untyped object as `T` through its JSON form.
pub fn decode<T: DeserializeOwned>(obj: &DynamicObject) -> Result<T> {
    let value = serde_json::to_value(obj)?;
    Ok(serde_json::from_value(value)?)
}

#[derive(Deserialize)]
struct StatusRegion<S> {
    status: Option<S>,
}

/// Decode the `status` region of a provider object; absent status yields `S::default()`.
pub fn decode_status<S: DeserializeOwned + Default>(
    obj: &DynamicObject,
) -> Result<S> {
    let region: StatusRegion<S> = decode(obj)?;
    Ok(region.status.unwrap_or_default())
}
