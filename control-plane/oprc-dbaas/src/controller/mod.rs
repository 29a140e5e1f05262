pub mod connection;
pub mod dynamic;
pub mod inventory;
pub mod ownership;
pub mod projection;
pub mod rbac;
pub mod registry;
pub mod status;
pub mod watch;

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::Arc;

use futures_util::StreamExt;
use kube::api::{Api, ListParams};
use kube::discovery::ApiResource;
use kube::runtime::controller::Action;
use kube::runtime::{Controller, watcher};
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::collections::unique_str;
use crate::config::OperatorConfig;
use crate::crd::connection::DBaaSConnection;
use crate::crd::inventory::DBaaSInventory;
use crate::crd::provider::DBaaSProvider;
use crate::error::{ReconcileErr, Result};
use crate::store::{KubeStore, ObjectStore};

pub use connection::reconcile_connection;
pub use inventory::reconcile_inventory;
pub use projection::{OperationResult, reconcile_child};

pub struct ControllerContext<S> {
    pub store: S,
    pub cfg: OperatorConfig,
}

impl<S> ControllerContext<S> {
    pub fn new(store: S, cfg: OperatorConfig) -> Self {
        Self { store, cfg }
    }
}

/// Retry is left to the controller's requeue; a missing provider or inventory
/// is expected to appear later and is retried sooner.
pub fn error_policy<K, S>(
    obj: Arc<K>,
    error: &ReconcileErr,
    ctx: Arc<ControllerContext<S>>,
) -> Action
where
    K: Resource,
{
    if error.is_not_found() {
        info!(name = %obj.name_any(), %error, "dependency not available yet; requeue");
        Action::requeue(ctx.cfg.not_found_requeue())
    } else {
        error!(name = %obj.name_any(), %error, "reconcile failed; requeue");
        Action::requeue(ctx.cfg.error_requeue())
    }
}

/// Child kinds declared by the registered providers, de-duplicated per role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderKinds {
    pub inventory: Vec<String>,
    pub connection: Vec<String>,
}

impl ProviderKinds {
    pub fn from_providers<'a>(
        providers: impl IntoIterator<Item = &'a DBaaSProvider>,
    ) -> Self {
        let (inventory, connection): (Vec<&str>, Vec<&str>) = providers
            .into_iter()
            .map(|p| {
                (p.spec.inventory_kind.as_str(), p.spec.connection_kind.as_str())
            })
            .unzip();
        Self {
            inventory: unique_str(&inventory),
            connection: unique_str(&connection),
        }
    }

    /// Same kinds per role, ignoring order.
    pub fn same_kinds(&self, other: &ProviderKinds) -> bool {
        fn set(kinds: &[String]) -> BTreeSet<&str> {
            kinds.iter().map(String::as_str).collect()
        }
        set(&self.inventory) == set(&other.inventory)
            && set(&self.connection) == set(&other.connection)
    }
}

pub async fn list_provider_kinds(client: &Client) -> Result<ProviderKinds> {
    let api: Api<DBaaSProvider> = Api::all(client.clone());
    let providers = api.list(&ListParams::default()).await?;
    let kinds = ProviderKinds::from_providers(&providers.items);
    info!(providers = providers.items.len(), inventory_kinds = ?kinds.inventory, connection_kinds = ?kinds.connection, "discovered provider kinds");
    Ok(kinds)
}

/// Provider kinds resolved to the resources that get watched.
#[derive(Debug, Clone, Default)]
pub struct BoundKinds {
    pub inventory: Vec<ApiResource>,
    pub connection: Vec<ApiResource>,
    /// Kinds the store does not serve yet; they are retried later.
    pub unresolved: Vec<String>,
}

pub async fn resolve_kinds<S>(store: &S, kinds: &ProviderKinds) -> Result<BoundKinds>
where
    S: ObjectStore + ?Sized,
{
    async fn resolve_all<S: ObjectStore + ?Sized>(
        store: &S,
        kinds: &[String],
        unresolved: &mut Vec<String>,
    ) -> Result<Vec<ApiResource>> {
        let mut resources = Vec::with_capacity(kinds.len());
        for kind in kinds {
            match store.resolve_kind(kind).await {
                Ok(ar) => resources.push(ar),
                Err(e) if e.is_not_found() => {
                    warn!(%kind, error = %e, "provider kind not served; watch deferred");
                    unresolved.push(kind.clone());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(resources)
    }

    let mut unresolved = Vec::new();
    let inventory = resolve_all(store, &kinds.inventory, &mut unresolved).await?;
    let connection =
        resolve_all(store, &kinds.connection, &mut unresolved).await?;
    Ok(BoundKinds {
        inventory,
        connection,
        unresolved,
    })
}

fn owner_controller<K>(
    client: &Client,
    resources: Vec<ApiResource>,
    token: &CancellationToken,
) -> Controller<K>
where
    K: Resource<DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static,
{
    let api: Api<K> = Api::all(client.clone());
    let mut controller = Controller::new(api, watcher::Config::default())
        .graceful_shutdown_on(token.clone().cancelled_owned());
    for ar in resources {
        controller = watch::watch_provider_kind(controller, client, ar);
    }
    controller
}

pub async fn run_inventory_controller(
    client: Client,
    ctx: Arc<ControllerContext<KubeStore>>,
    resources: Vec<ApiResource>,
    token: CancellationToken,
) -> anyhow::Result<()> {
    owner_controller::<DBaaSInventory>(&client, resources, &token)
        .run(
            reconcile_inventory::<KubeStore>,
            error_policy::<DBaaSInventory, KubeStore>,
            ctx,
        )
        .for_each(|res| async move {
            match res {
                Ok((obj_ref, action)) => {
                    info!(%obj_ref, ?action, "reconciled inventory")
                }
                Err(e) => warn!(error = %e, "inventory reconcile error"),
            }
        })
        .await;
    Ok(())
}

pub async fn run_connection_controller(
    client: Client,
    ctx: Arc<ControllerContext<KubeStore>>,
    resources: Vec<ApiResource>,
    token: CancellationToken,
) -> anyhow::Result<()> {
    owner_controller::<DBaaSConnection>(&client, resources, &token)
        .run(
            reconcile_connection::<KubeStore>,
            error_policy::<DBaaSConnection, KubeStore>,
            ctx,
        )
        .for_each(|res| async move {
            match res {
                Ok((obj_ref, action)) => {
                    info!(%obj_ref, ?action, "reconciled connection")
                }
                Err(e) => warn!(error = %e, "connection reconcile error"),
            }
        })
        .await;
    Ok(())
}
