use std::sync::Arc;
use std::time::Duration;

use k8s_openapi::api::rbac::v1::{Role, RoleBinding};
use kube::runtime::controller::Action;
use oprc_dbaas::controller::dynamic::provider_api_resource;
use oprc_dbaas::controller::{
    ControllerContext, ProviderKinds, error_policy, reconcile_connection,
    reconcile_inventory, resolve_kinds,
};
use oprc_dbaas::crd::connection::DBaaSConnection;
use oprc_dbaas::crd::inventory::DBaaSInventory;
use oprc_dbaas::crd::{
    CONDITION_SPEC_SYNCED, ConditionStatus, REASON_INVENTORY_NOT_FOUND,
    REASON_PROVIDER_NOT_FOUND,
};
use oprc_dbaas::error::ReconcileErr;
use oprc_dbaas::store::{MemoryStore, ObjectStore, api_resource, get_typed};
use serde_json::json;

mod common;
use common::{
    FlakyStore, seed_connection, seed_inventory, seed_provider, test_config, uniq,
};

fn ctx(store: &MemoryStore) -> Arc<ControllerContext<MemoryStore>> {
    Arc::new(ControllerContext::new(store.clone(), test_config()))
}

async fn fetch_inventory(store: &MemoryStore, ns: &str, name: &str) -> Arc<DBaaSInventory> {
    Arc::new(get_typed(store, Some(ns), name).await.unwrap())
}

async fn fetch_connection(store: &MemoryStore, ns: &str, name: &str) -> Arc<DBaaSConnection> {
    Arc::new(get_typed(store, Some(ns), name).await.unwrap())
}

#[test_log::test(tokio::test)]
async fn inventory_projects_provider_object_and_syncs_status() {
    let store = MemoryStore::new();
    let ns = uniq("tenant");
    seed_provider(&store, "foo").await;
    seed_inventory(&store, &ns, "inv", "foo").await;

    let action = reconcile_inventory(fetch_inventory(&store, &ns, "inv").await, ctx(&store))
        .await
        .unwrap();
    assert_eq!(action, Action::await_change());

    let ar = provider_api_resource("FooInventory").unwrap();
    let mut child = store.get(&ar, Some(&ns), "inv").await.unwrap();
    assert_eq!(
        child.data["spec"],
        json!({
            "credentialsRef": {"name": "inv-credentials"},
            "policy": {"connectionNamespaces": ["apps"]}
        })
    );
    assert_eq!(child.metadata.owner_references.as_ref().unwrap()[0].name, "inv");
    assert_eq!(store.count(&api_resource::<Role>()).await, 1);
    assert_eq!(store.count(&api_resource::<RoleBinding>()).await, 1);

    let inv = fetch_inventory(&store, &ns, "inv").await;
    let status = inv.status.clone().unwrap();
    let synced = status
        .conditions
        .iter()
        .find(|c| c.type_ == CONDITION_SPEC_SYNCED)
        .unwrap();
    assert_eq!(synced.status, ConditionStatus::True);
    assert!(status.instances.is_empty());

    // provider reports instances on its own object
    child.data["status"] = json!({
        "conditions": [{"type": "InventoryReady", "status": "True"}],
        "instances": [{"instanceId": "db-1", "name": "orders", "instanceInfo": {"region": "eu"}}]
    });
    store.update_status(&ar, &child).await.unwrap();

    reconcile_inventory(inv, ctx(&store)).await.unwrap();
    let inv = fetch_inventory(&store, &ns, "inv").await;
    let status = inv.status.clone().unwrap();
    assert_eq!(status.instances.len(), 1);
    assert_eq!(status.instances[0].instance_info["region"], "eu");
    assert_eq!(status.conditions.len(), 2);
    assert_eq!(store.count(&ar).await, 1);
    assert_eq!(store.count(&api_resource::<Role>()).await, 1);

    // provider drops every instance; the owner must not keep the old list
    let mut child = store.get(&ar, Some(&ns), "inv").await.unwrap();
    child.data["status"] = json!({
        "conditions": [{"type": "InventoryReady", "status": "True"}]
    });
    store.update_status(&ar, &child).await.unwrap();

    reconcile_inventory(inv, ctx(&store)).await.unwrap();
    let inv = fetch_inventory(&store, &ns, "inv").await;
    assert!(inv.status.as_ref().unwrap().instances.is_empty());
}

#[tokio::test]
async fn inventory_waits_for_provider() {
    let store = MemoryStore::new();
    seed_inventory(&store, "tenant", "inv", "missing").await;

    let err = reconcile_inventory(fetch_inventory(&store, "tenant", "inv").await, ctx(&store))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let inv = fetch_inventory(&store, "tenant", "inv").await;
    let cond = &inv.status.as_ref().unwrap().conditions[0];
    assert_eq!(cond.status, ConditionStatus::False);
    assert_eq!(cond.reason.as_deref(), Some(REASON_PROVIDER_NOT_FOUND));
    assert_eq!(store.count(&provider_api_resource("FooInventory").unwrap()).await, 0);

    // provider registers later; the retried reconcile goes through
    seed_provider(&store, "missing").await;
    reconcile_inventory(inv, ctx(&store)).await.unwrap();
    let inv = fetch_inventory(&store, "tenant", "inv").await;
    let cond = &inv.status.as_ref().unwrap().conditions[0];
    assert_eq!(cond.status, ConditionStatus::True);
}

#[tokio::test]
async fn connection_projects_spec_and_reads_back_refs() {
    let store = MemoryStore::new();
    seed_provider(&store, "foo").await;
    seed_inventory(&store, "apps", "inv", "foo").await;
    seed_connection(&store, "apps", "orders-db", "inv").await;

    reconcile_connection(fetch_connection(&store, "apps", "orders-db").await, ctx(&store))
        .await
        .unwrap();

    let ar = provider_api_resource("FooConnection").unwrap();
    let mut child = store.get(&ar, Some("apps"), "orders-db").await.unwrap();
    assert_eq!(
        child.data["spec"],
        json!({"inventoryRef": {"name": "inv"}, "instanceId": "db-1"})
    );

    child.data["status"] = json!({
        "credentialsRef": {"name": "orders-db-credentials"},
        "connectionInfoRef": {"name": "orders-db-info"}
    });
    store.update_status(&ar, &child).await.unwrap();

    let writes = store.writes();
    reconcile_connection(fetch_connection(&store, "apps", "orders-db").await, ctx(&store))
        .await
        .unwrap();
    // only the owner status write; the provider object is already converged
    assert_eq!(store.writes(), writes + 1);

    let conn = fetch_connection(&store, "apps", "orders-db").await;
    let status = conn.status.clone().unwrap();
    assert_eq!(status.credentials_ref.unwrap().name, "orders-db-credentials");
    assert_eq!(status.connection_info_ref.unwrap().name, "orders-db-info");
}

#[tokio::test]
async fn connection_without_inventory_is_not_found() {
    let store = MemoryStore::new();
    seed_connection(&store, "apps", "orders-db", "nope").await;

    let err = reconcile_connection(fetch_connection(&store, "apps", "orders-db").await, ctx(&store))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    let conn = fetch_connection(&store, "apps", "orders-db").await;
    assert_eq!(
        conn.status.as_ref().unwrap().conditions[0].reason.as_deref(),
        Some(REASON_INVENTORY_NOT_FOUND)
    );
}

#[tokio::test]
async fn error_policy_requeues_by_error_class() {
    let store = MemoryStore::new();
    let inv = seed_inventory(&store, "tenant", "inv", "foo").await;
    let ctx = ctx(&store);

    let action = error_policy(
        Arc::new(inv.clone()),
        &ReconcileErr::NotFound("provider".into()),
        ctx.clone(),
    );
    assert_eq!(action, Action::requeue(Duration::from_secs(15)));

    let action = error_policy(
        Arc::new(inv),
        &ReconcileErr::Transport("boom".into()),
        ctx,
    );
    assert_eq!(action, Action::requeue(Duration::from_secs(60)));
}

#[tokio::test]
async fn unserved_provider_kinds_are_deferred() {
    let store = FlakyStore {
        unserved_kinds: true,
        ..Default::default()
    };
    let provider = seed_provider(&store.inner, "foo").await;

    let kinds = ProviderKinds::from_providers([&provider]);
    let bound = resolve_kinds(&store, &kinds).await.unwrap();
    assert!(bound.inventory.is_empty());
    assert!(bound.connection.is_empty());
    assert_eq!(bound.unresolved, vec!["FooInventory", "FooConnection"]);
}
