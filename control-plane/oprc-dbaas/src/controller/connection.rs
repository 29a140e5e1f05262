use std::sync::Arc;

use kube::ResourceExt;
use kube::runtime::controller::Action;
use tracing::{info, instrument, warn};

use super::dynamic::decode_status;
use super::projection::reconcile_child;
use super::registry::get_provider;
use super::status::{merge_spec_synced, sync_status};
use super::ControllerContext;
use crate::crd::connection::{DBaaSConnection, DBaaSConnectionStatus};
use crate::crd::inventory::DBaaSInventory;
use crate::crd::provider::ProviderRole;
use crate::crd::{
    CONDITION_SPEC_SYNCED, Condition, ConditionStatus,
    REASON_INVENTORY_NOT_FOUND, REASON_PROVIDER_NOT_FOUND, REASON_SYNCED,
    set_condition,
};
use crate::error::ReconcileErr;
use crate::store::{ObjectStore, get_typed};

#[instrument(skip_all, fields(ns = %obj.namespace().unwrap_or_default(), name = %obj.name_any()))]
pub async fn reconcile_connection<S>(
    obj: Arc<DBaaSConnection>,
    ctx: Arc<ControllerContext<S>>,
) -> Result<Action, ReconcileErr>
where
    S: ObjectStore + 'static,
{
    let store = &ctx.store;
    let mut connection = (*obj).clone();
    let ns = connection.namespace().unwrap_or_else(|| "default".to_string());
    let inventory_name = connection.spec.inventory_ref.name.clone();

    let inventory = match get_typed::<DBaaSInventory, S>(
        store,
        Some(&ns),
        &inventory_name,
    )
    .await
    {
        Ok(inventory) => inventory,
        Err(e) if e.is_not_found() => {
            info!(inventory = %inventory_name, "inventory not found");
            mark_not_synced(
                store,
                &mut connection,
                REASON_INVENTORY_NOT_FOUND,
                format!("DBaaSInventory {ns}/{inventory_name} not found"),
            )
            .await;
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    let provider_name = &inventory.spec.provider_ref.name;
    let provider = match get_provider(store, provider_name).await {
        Ok(provider) => provider,
        Err(e) if e.is_not_found() => {
            info!(provider = %provider_name, "provider not registered yet");
            mark_not_synced(
                store,
                &mut connection,
                REASON_PROVIDER_NOT_FOUND,
                format!("DBaaSProvider {provider_name} not found"),
            )
            .await;
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    let kind = provider.spec.kind_for(ProviderRole::Connection);
    let (result, child) =
        reconcile_child(store, &connection, &connection.spec, kind).await?;
    let observed: DBaaSConnectionStatus = decode_status(&child)?;

    sync_status(store, &mut connection, |conn| {
        let previous = conn.status.take().unwrap_or_default();
        let synced = Condition::new(
            CONDITION_SPEC_SYNCED,
            ConditionStatus::True,
            REASON_SYNCED,
            format!("{kind} spec synced"),
        );
        conn.status = Some(DBaaSConnectionStatus {
            conditions: merge_spec_synced(
                &previous.conditions,
                observed.conditions,
                synced,
            ),
            credentials_ref: observed.credentials_ref,
            connection_info_ref: observed.connection_info_ref,
        });
        Ok(())
    })
    .await?;

    info!(%kind, ?result, "reconcile: connection synced");
    Ok(Action::await_change())
}

async fn mark_not_synced<S>(
    store: &S,
    connection: &mut DBaaSConnection,
    reason: &str,
    message: String,
) where
    S: ObjectStore + ?Sized,
{
    let res = sync_status(store, connection, |conn| {
        let status = conn.status.get_or_insert_with(Default::default);
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
