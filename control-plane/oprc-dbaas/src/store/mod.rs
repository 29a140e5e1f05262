//! Read/write access to the declarative store.
//!
//! Everything goes through untyped [`DynamicObject`]s keyed by an
//! [`ApiResource`], so one code path serves both compiled resource types and
//! kinds that are only known by name at runtime. Objects are never cached:
//! every call is a fresh round trip and conflicts surface as ordinary errors.

mod k8s;
mod memory;

pub use self::k8s::KubeStore;
pub use self::memory::MemoryStore;

use async_trait::async_trait;
use kube::Resource;
use kube::api::DynamicObject;
use kube::discovery::ApiResource;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::controller::dynamic::{decode, provider_api_resource};
use crate::error::Result;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// ApiResource serving the provider `kind` in the operator's group.
    /// Without discovery the plural is derived from the kind name.
    async fn resolve_kind(&self, kind: &str) -> Result<ApiResource> {
        provider_api_resource(kind)
    }

    /// Fetch the object `name` (in `ns`, or cluster scope when `None`).
    async fn get(
        &self,
        ar: &ApiResource,
        ns: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject>;

    /// Create `obj`; fails with `AlreadyExists` when the identity is taken.
    async fn create(
        &self,
        ar: &ApiResource,
        obj: &DynamicObject,
    ) -> Result<DynamicObject>;

    /// Replace the object (everything but `status`).
    async fn replace(
        &self,
        ar: &ApiResource,
        obj: &DynamicObject,
    ) -> Result<DynamicObject>;

    /// Persist the `status` region of `obj` as a whole, guarded by its
    /// resourceVersion. Fields absent from `obj`'s status are removed.
    async fn update_status(
        &self,
        ar: &ApiResource,
        obj: &DynamicObject,
    ) -> Result<DynamicObject>;
}

/// ApiResource for a compiled resource type.
pub fn api_resource<K: Resource<DynamicType = ()>>() -> ApiResource {
    ApiResource::erase::<K>(&())
}

pub fn to_dynamic<K: Serialize>(obj: &K) -> Result<DynamicObject> {
    Ok(serde_json::from_value(serde_json::to_value(obj)?)?)
}

pub async fn get_typed<K, S>(
    store: &S,
    ns: Option<&str>,
    name: &str,
) -> Result<K>
where
    K: Resource<DynamicType = ()> + DeserializeOwned,
    S: ObjectStore + ?Sized,
{
    let obj = store.get(&api_resource::<K>(), ns, name).await?;
    decode(&obj)
}

pub async fn create_typed<K, S>(store: &S, obj: &K) -> Result<K>
where
    K: Resource<DynamicType = ()> + Serialize + DeserializeOwned,
    S: ObjectStore + ?Sized,
{
    let created = store
        .create(&api_resource::<K>(), &to_dynamic(obj)?)
        .await?;
    decode(&created)
}

pub async fn update_status_typed<K, S>(store: &S, obj: &K) -> Result<K>
where
    K: Resource<DynamicType = ()> + Serialize + DeserializeOwned,
    S: ObjectStore + ?Sized,
{
    let updated = store
        .update_status(&api_resource::<K>(), &to_dynamic(obj)?)
        .await?;
    decode(&updated)
}
