#![allow(dead_code)]

use async_trait::async_trait;
use kube::api::DynamicObject;
use kube::discovery::ApiResource;
use oprc_dbaas::config::OperatorConfig;
use oprc_dbaas::crd::NamedRef;
use oprc_dbaas::crd::connection::{DBaaSConnection, DBaaSConnectionSpec};
use oprc_dbaas::crd::inventory::{
    DBaaSInventory, DBaaSInventorySpec, InventoryPolicy, ProviderInventorySpec,
};
use oprc_dbaas::crd::provider::{
    DBaaSProvider, DBaaSProviderSpec, DatabaseProvider,
};
use oprc_dbaas::error::{ReconcileErr, Result};
use oprc_dbaas::store::{MemoryStore, ObjectStore, create_typed};

pub const DIGITS: [char; 10] =
    ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];
pub fn uniq(prefix: &str) -> String {
    format!("{prefix}-{}", nanoid::nanoid!(6, &DIGITS))
}

pub fn test_config() -> OperatorConfig {
    OperatorConfig {
        install_namespace: "dbaas-system".into(),
        error_requeue_secs: 60,
        not_found_requeue_secs: 15,
    }
}

pub async fn seed_provider(store: &MemoryStore, name: &str) -> DBaaSProvider {
    let provider = DBaaSProvider::new(
        name,
        DBaaSProviderSpec {
            provider: DatabaseProvider {
                name: name.into(),
                display_name: Some("Foo Cloud".into()),
            },
            inventory_kind: "FooInventory".into(),
            connection_kind: "FooConnection".into(),
        },
    );
    create_typed(store, &provider).await.expect("seed provider")
}

pub async fn seed_inventory(
    store: &MemoryStore,
    ns: &str,
    name: &str,
    provider: &str,
) -> DBaaSInventory {
    let mut inv = DBaaSInventory::new(
        name,
        DBaaSInventorySpec {
            provider_ref: NamedRef {
                name: provider.into(),
            },
            inventory: ProviderInventorySpec {
                credentials_ref: NamedRef {
                    name: format!("{name}-credentials"),
                },
                policy: Some(InventoryPolicy {
                    connection_namespaces: Some(vec!["apps".into()]),
                }),
            },
        },
    );
    inv.metadata.namespace = Some(ns.into());
    create_typed(store, &inv).await.expect("seed inventory")
}

pub async fn seed_connection(
    store: &MemoryStore,
    ns: &str,
    name: &str,
    inventory: &str,
) -> DBaaSConnection {
    let mut conn = DBaaSConnection::new(
        name,
        DBaaSConnectionSpec {
            inventory_ref: NamedRef {
                name: inventory.into(),
            },
            instance_id: "db-1".into(),
        },
    );
    conn.metadata.namespace = Some(ns.into());
    create_typed(store, &conn).await.expect("seed connection")
}

/// Delegates to a [`MemoryStore`] but can fail reads, hide existing
/// objects from them, or report provider kinds as not served.
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_get: bool,
    pub hide_existing: bool,
    pub unserved_kinds: bool,
}

#[async_trait]
impl ObjectStore for FlakyStore {
    async fn resolve_kind(&self, kind: &str) -> Result<ApiResource> {
        if self.unserved_kinds {
            return Err(ReconcileErr::NotFound(format!(
                "kind {kind} is not served"
            )));
        }
        self.inner.resolve_kind(kind).await
    }

    async fn get(
        &self,
        ar: &ApiResource,
        ns: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject> {
        if self.fail_get {
            return Err(ReconcileErr::Transport("connection refused".into()));
        }
        if self.hide_existing {
            return Err(ReconcileErr::NotFound(name.to_string()));
        }
        self.inner.get(ar, ns, name).await
    }

    async fn create(
        &self,
        ar: &ApiResource,
        obj: &DynamicObject,
    ) -> Result<DynamicObject> {
        self.inner.create(ar, obj).await
    }

    async fn replace(
        &self,
        ar: &ApiResource,
        obj: &DynamicObject,
    ) -> Result<DynamicObject> {
        self.inner.replace(ar, obj).await
    }

    async fn update_status(
        &self,
        ar: &ApiResource,
        obj: &DynamicObject,
    ) -> Result<DynamicObject> {
        self.inner.update_status(ar, obj).await
    }
}
