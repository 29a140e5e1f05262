use std::sync::Arc;
use std::time::Duration;

use kube::Client;
use kube::discovery::ApiResource;
use tokio::{task::JoinHandle, try_join};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::OperatorConfig;
use crate::controller::watch::watch_provider_registry;
use crate::controller::{
    ControllerContext, ProviderKinds, list_provider_kinds, resolve_kinds,
    run_connection_controller, run_inventory_controller,
};
use crate::store::KubeStore;

type Ctx = Arc<ControllerContext<KubeStore>>;

/// Spawn the DBaaSInventory controller loop. It stops once `token` is
/// cancelled and cancels `token` itself when it ends.
pub fn spawn_inventory_controller(
    client: Client,
    ctx: Ctx,
    resources: Vec<ApiResource>,
    token: CancellationToken,
) -> JoinHandle<anyhow::Result<()>> {
    tokio::spawn(async move {
        let _guard = token.clone().drop_guard();
        run_inventory_controller(client, ctx, resources, token).await
    })
}

/// Spawn the DBaaSConnection controller loop; same shutdown rules as
/// [`spawn_inventory_controller`].
pub fn spawn_connection_controller(
    client: Client,
    ctx: Ctx,
    resources: Vec<ApiResource>,
    token: CancellationToken,
) -> JoinHandle<anyhow::Result<()>> {
    tokio::spawn(async move {
        let _guard = token.clone().drop_guard();
        run_connection_controller(client, ctx, resources, token).await
    })
}

/// Spawn the provider registry follower for one binding generation.
pub fn spawn_registry_watch(
    client: Client,
    bound: ProviderKinds,
    retry_after: Option<Duration>,
    token: CancellationToken,
) -> JoinHandle<ProviderKinds> {
    tokio::spawn(watch_provider_registry(client, bound, retry_after, token))
}

/// Run both controllers with watches bound to the registered provider kinds.
/// When the registry declares different kinds, the controllers are shut down
/// and started again with the new bindings.
pub async fn run_all(client: Client, cfg: OperatorConfig) -> anyhow::Result<()> {
    let ctx: Ctx =
        Arc::new(ControllerContext::new(KubeStore::new(client.clone()), cfg));
    let mut kinds = list_provider_kinds(&client).await?;

    loop {
        let bound = resolve_kinds(&ctx.store, &kinds).await?;
        let retry_after =
            (!bound.unresolved.is_empty()).then(|| ctx.cfg.error_requeue());
        let token = CancellationToken::new();

        let inventories = spawn_inventory_controller(
            client.clone(),
            ctx.clone(),
            bound.inventory,
            token.clone(),
        );
        let connections = spawn_connection_controller(
            client.clone(),
            ctx.clone(),
            bound.connection,
            token.clone(),
        );
        let registry =
            spawn_registry_watch(client.clone(), kinds, retry_after, token);

        let (i_res, c_res, next) = try_join!(inventories, connections, registry)?;
        i_res?;
        c_res?;
        kinds = next;
        info!(inventory_kinds = ?kinds.inventory, connection_kinds = ?kinds.connection, "rebinding provider watches");
    }
}
