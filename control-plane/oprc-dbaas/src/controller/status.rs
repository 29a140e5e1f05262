use kube::Resource;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::crd::{CONDITION_SPEC_SYNCED, Condition, set_condition};
use crate::error::Result;
use crate::store::{ObjectStore, update_status_typed};

/// Run `mutate` against `owner` and persist its status only if it succeeded.
/// On success `owner` is refreshed with the stored copy.
pub async fn sync_status<K, S, F>(store: &S, owner: &mut K, mutate: F) -> Result<()>
where
    K: Resource<DynamicType = ()> + Serialize + DeserializeOwned,
    S: ObjectStore + ?Sized,
    F: FnOnce(&mut K) -> Result<()>,
{
    mutate(owner)?;
    let stored = update_status_typed(store, owner).await?;
    *owner = stored;
    Ok(())
}

/// Combine conditions reported by the provider with our own `SpecSynced`
/// condition, keeping its previous transition time when the status holds.
pub fn merge_spec_synced(
    previous: &[Condition],
    observed: Vec<Condition>,
    synced: Condition,
) -> Vec<Condition> {
    let mut conditions: Vec<Condition> = observed
        .into_iter()
        .filter(|c| c.type_ != CONDITION_SPEC_SYNCED)
        .collect();
    if let Some(prev) = previous.iter().find(|c| c.type_ == CONDITION_SPEC_SYNCED) {
        conditions.push(prev.clone());
    }
    set_condition(&mut conditions, synced);
    conditions
}
