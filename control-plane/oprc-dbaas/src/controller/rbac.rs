use k8s_openapi::api::rbac::v1::{PolicyRule, Role, RoleBinding, RoleRef, Subject};
use kube::core::ObjectMeta;
use kube::{Resource, ResourceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};

use super::ownership::set_controller_reference;
use crate::collections::{contains, unique_str};
use crate::crd::GROUP;
use crate::crd::inventory::DBaaSInventory;
use crate::error::Result;
use crate::store::{ObjectStore, create_typed, get_typed};

pub const RBAC_GROUP: &str = "rbac.authorization.k8s.io";
const ALL_NAMESPACES: &str = "*";
const AUTHENTICATED_GROUP: &str = "system:authenticated";

/// Create `desired` owned by `owner` unless an object with its identity
/// already exists. Returns whether it already existed. Existing objects are
/// never modified; an `AlreadyExists` from a lost create race is returned as-is.
pub async fn ensure_exists<K, O, S>(store: &S, mut desired: K, owner: &O) -> Result<bool>
where
    K: Resource<DynamicType = ()> + Serialize + DeserializeOwned,
    O: Resource<DynamicType = ()>,
    S: ObjectStore + ?Sized,
{
    let name = desired.name_any();
    let ns = desired.namespace();
    let kind = K::kind(&());
    match get_typed::<K, S>(store, ns.as_deref(), &name).await {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => {
            debug!(%kind, %name, ?ns, "resource not found");
            set_controller_reference(owner, desired.meta_mut())?;
            if let Err(e) = create_typed(store, &desired).await {
                error!(error = %e, %kind, %name, ?ns, "error creating resource");
                return Err(e);
            }
            debug!(%kind, %name, ?ns, "resource created");
            Ok(false)
        }
        Err(e) => {
            error!(error = %e, %kind, %name, ?ns, "error getting the resource");
            Err(e)
        }
    }
}

pub fn subject(name: &str, namespace: Option<&str>, kind: &str) -> Subject {
    Subject {
        api_group: Some(RBAC_GROUP.to_string()),
        kind: kind.to_string(),
        name: name.to_string(),
        namespace: namespace.map(String::from),
    }
}

/// Groups allowed to read an inventory: service accounts of the install
/// namespace, the inventory's namespace and every policy namespace, or all
/// authenticated users when the policy lists "*".
pub fn inventory_viewer_subjects(
    inventory: &DBaaSInventory,
    install_namespace: &str,
) -> Vec<Subject> {
    let policy_namespaces = inventory
        .spec
        .inventory
        .policy
        .as_ref()
        .and_then(|p| p.connection_namespaces.clone())
        .unwrap_or_default();

    let groups = if contains(&policy_namespaces, ALL_NAMESPACES) {
        vec![AUTHENTICATED_GROUP.to_string()]
    } else {
        let mut namespaces = vec![install_namespace.to_string()];
        namespaces.extend(inventory.namespace());
        namespaces.extend(policy_namespaces);
        unique_str(&namespaces)
            .into_iter()
            .map(|ns| format!("system:serviceaccounts:{ns}"))
            .collect()
    };
    groups.iter().map(|g| subject(g, None, "Group")).collect()
}

fn viewer_name(inventory: &DBaaSInventory) -> String {
    format!("dbaas-{}-inventory-viewer", inventory.name_any())
}

pub fn inventory_viewer_role(inventory: &DBaaSInventory) -> Role {
    Role {
        metadata: ObjectMeta {
            name: Some(viewer_name(inventory)),
            namespace: inventory.namespace(),
            ..Default::default()
        },
        rules: Some(vec![PolicyRule {
            api_groups: Some(vec![GROUP.to_string()]),
            resources: Some(vec![
                "dbaasinventories".to_string(),
                "dbaasinventories/status".to_string(),
            ]),
            resource_names: Some(vec![inventory.name_any()]),
            verbs: vec!["get".into(), "list".into(), "watch".into()],
            ..Default::default()
        }]),
    }
}

pub fn inventory_viewer_binding(
    inventory: &DBaaSInventory,
    subjects: Vec<Subject>,
) -> RoleBinding {
    RoleBinding {
        metadata: ObjectMeta {
            name: Some(viewer_name(inventory)),
            namespace: inventory.namespace(),
            ..Default::default()
        },
        role_ref: RoleRef {
            api_group: RBAC_GROUP.to_string(),
            kind: "Role".to_string(),
            name: viewer_name(inventory),
        },
        subjects: Some(subjects),
    }
}

#[instrument(skip_all, fields(inventory = %inventory.name_any()))]
pub async fn ensure_inventory_rbac<S>(
    store: &S,
    inventory: &DBaaSInventory,
    install_namespace: &str,
) -> Result<()>
where
    S: ObjectStore + ?Sized,
{
    let role_existed =
        ensure_exists(store, inventory_viewer_role(inventory), inventory).await?;
    let subjects = inventory_viewer_subjects(inventory, install_namespace);
    let binding_existed = ensure_exists(
        store,
        inventory_viewer_binding(inventory, subjects),
        inventory,
    )
    .await?;
    debug!(role_existed, binding_existed, "inventory rbac ensured");
    Ok(())
}
