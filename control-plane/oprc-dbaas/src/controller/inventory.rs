use std::sync::Arc;

use kube::ResourceExt;
use kube::runtime::controller::Action;
use tracing::{info, instrument, warn};

use super::dynamic::decode_status;
use super::projection::reconcile_child;
use super::rbac::ensure_inventory_rbac;
use super::registry::get_provider;
use super::status::{merge_spec_synced, sync_status};
use super::ControllerContext;
use crate::crd::inventory::{DBaaSInventory, DBaaSInventoryStatus};
use crate::crd::provider::ProviderRole;
use crate::crd::{
    CONDITION_SPEC_SYNCED, Condition, ConditionStatus, REASON_PROVIDER_NOT_FOUND,
    REASON_SYNCED, set_condition,
};
use crate::error::ReconcileErr;
use crate::store::ObjectStore;

#[instrument(skip_all, fields(ns = %obj.namespace().unwrap_or_default(), name = %obj.name_any()))]
pub async fn reconcile_inventory<S>(
    obj: Arc<DBaaSInventory>,
    ctx: Arc<ControllerContext<S>>,
) -> Result<Action, ReconcileErr>
where
    S: ObjectStore + 'static,
{
    let store = &ctx.store;
    let mut inventory = (*obj).clone();
    let provider_name = inventory.spec.provider_ref.name.clone();

    let provider = match get_provider(store, &provider_name).await {
        Ok(provider) => provider,
        Err(e) if e.is_not_found() => {
            info!(provider = %provider_name, "provider not registered yet");
            mark_not_synced(
                store,
                &mut inventory,
                REASON_PROVIDER_NOT_FOUND,
                format!("DBaaSProvider {provider_name} not found"),
            )
            .await;
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    let kind = provider.spec.kind_for(ProviderRole::Inventory);
    let (result, child) =
        reconcile_child(store, &inventory, &inventory.spec.inventory, kind)
            .await?;
    let observed: DBaaSInventoryStatus = decode_status(&child)?;

    sync_status(store, &mut inventory, |inv| {
        let previous = inv.status.take().unwrap_or_default();
        let synced = Condition::new(
            CONDITION_SPEC_SYNCED,
            ConditionStatus::True,
            REASON_SYNCED,
            format!("{kind} spec synced"),
        );
        inv.status = Some(DBaaSInventoryStatus {
            conditions: merge_spec_synced(
                &previous.conditions,
                observed.conditions,
                synced,
            ),
            instances: observed.instances,
        });
        Ok(())
    })
    .await?;

    ensure_inventory_rbac(store, &inventory, &ctx.cfg.install_namespace)
        .await?;

    info!(%kind, ?result, "reconcile: inventory synced");
    Ok(Action::await_change())
}

async fn mark_not_synced<S>(
    store: &S,
    inventory: &mut DBaaSInventory,
    reason: &str,
    message: String,
) where
    S: ObjectStore + ?Sized,
{
    let res = sync_status(store, inventory, |inv| {
        let status = inv.status.get_or_insert_with(Default::default);
        set_condition(
            &mut status.conditions,
            Condition::new(
                CONDITION_SPEC_SYNCED,
                ConditionStatus::False,
                reason,
                message,
            ),
        );
        Ok(())
    })
    .await;
    if let Err(e) = res {
        warn!(error = %e, "failed to record SpecSynced=False");
    }
}
