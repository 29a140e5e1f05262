use kube::core::ObjectMeta;
use kube::runtime::reflector::ObjectRef;
use kube::{Resource, ResourceExt};

use crate::error::{ReconcileErr, Result};

/// Make `owner` the controller of `child`, replacing any previous controller
/// reference. A namespaced owner may only control objects in its own namespace.
pub fn set_controller_reference<O>(owner: &O, child: &mut ObjectMeta) -> Result<()>
where
    O: Resource<DynamicType = ()>,
{
    let owner_ref = owner.controller_owner_ref(&()).ok_or_else(|| {
        ReconcileErr::Ownership(format!(
            "{} {} has no uid; it must be persisted before owning objects",
            O::kind(&()),
            owner.name_any()
        ))
    })?;
    if let Some(owner_ns) = owner.meta().namespace.as_deref() {
        match child.namespace.as_deref() {
            None => {
                return Err(ReconcileErr::Ownership(format!(
                    "cluster-scoped resource must not have a namespace-scoped owner, owner's namespace {owner_ns}"
                )));
            }
            Some(child_ns) if child_ns != owner_ns => {
                return Err(ReconcileErr::Ownership(format!(
                    "cross-namespace owner references are disallowed, owner's namespace {owner_ns}, obj's namespace {child_ns}"
                )));
            }
            _ => {}
        }
    }
    let refs = child.owner_references.get_or_insert_with(Vec::new);
    refs.retain(|r| r.controller != Some(true) && r.uid != owner_ref.uid);
    refs.push(owner_ref);
    Ok(())
}

/// The owner of type `K` recorded as controller of `obj`, if any.
pub fn controller_owner<K>(obj: &impl Resource) -> Option<ObjectRef<K>>
where
    K: Resource<DynamicType = ()>,
{
    let owner = obj.meta().owner_references.as_ref()?.iter().find(|r| {
        r.controller == Some(true)
            && r.kind == K::kind(&())
            && r.api_version == K::api_version(&())
    })?;
    let oref = ObjectRef::new(&owner.name);
    Some(match obj.meta().namespace.as_deref() {
        Some(ns) => oref.within(ns),
        None => oref,
    })
}
