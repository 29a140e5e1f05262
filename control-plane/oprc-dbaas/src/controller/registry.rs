use tracing::debug;

use crate::crd::provider::DBaaSProvider;
use crate::error::Result;
use crate::store::{ObjectStore, get_typed};

/// Look up a provider by name. Always a fresh read; a missing provider is
/// `NotFound` and is expected to resolve once the provider registers.
pub async fn get_provider<S>(store: &S, provider_name: &str) -> Result<DBaaSProvider>
where
    S: ObjectStore + ?Sized,
{
    let provider = get_typed::<DBaaSProvider, S>(store, None, provider_name).await?;
    debug!(provider = %provider_name, inventory_kind = %provider.spec.inventory_kind, connection_kind = %provider.spec.connection_kind, "resolved provider");
    Ok(provider)
}
