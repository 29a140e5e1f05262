use std::collections::BTreeMap;
use std::fmt::Debug;
use std::pin::pin;
use std::time::Duration;

use futures_util::StreamExt;
use kube::api::{Api, DynamicObject};
use kube::discovery::ApiResource;
use kube::runtime::{Controller, WatchStreamExt, watcher};
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::ProviderKinds;
use super::ownership::controller_owner;
use crate::crd::provider::DBaaSProvider;

/// Watch every object of the provider resource `ar` and requeue the owner of
/// type `K` recorded as its controller. Objects without such an owner are ignored.
pub fn watch_provider_kind<K>(
    controller: Controller<K>,
    client: &Client,
    ar: ApiResource,
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
    let api: Api<DynamicObject> = Api::all_with(client.clone(), &ar);
    info!(kind = %ar.kind, plural = %ar.plural, owner = %K::kind(&()), "watching provider objects");
    controller.watches_with(
        api,
        ar,
        watcher::Config::default(),
        |obj: DynamicObject| controller_owner::<K>(&obj),
    )
}

/// Registered providers as seen through a watch stream.
///
/// Kinds are only reported once a complete listing has been seen; objects
/// received during a (re)list are buffered until it completes.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, DBaaSProvider>,
    relisting: Option<BTreeMap<String, DBaaSProvider>>,
    listed: bool,
}

impl ProviderRegistry {
    /// Fold one watch event in. Returns the current kinds when they are known.
    pub fn apply(
        &mut self,
        event: watcher::Event<DBaaSProvider>,
    ) -> Option<ProviderKinds> {
        match event {
            watcher::Event::Init => {
                self.relisting = Some(BTreeMap::new());
                return None;
            }
            watcher::Event::InitApply(p) => {
                if let Some(buf) = self.relisting.as_mut() {
                    buf.insert(p.name_any(), p);
                }
                return None;
            }
            watcher::Event::InitDone => {
                self.providers = self.relisting.take().unwrap_or_default();
                self.listed = true;
            }
            watcher::Event::Apply(p) => {
                self.providers.insert(p.name_any(), p);
            }
            watcher::Event::Delete(p) => {
                self.providers.remove(&p.name_any());
            }
        }
        self.listed.then(|| self.kinds())
    }

    pub fn kinds(&self) -> ProviderKinds {
        ProviderKinds::from_providers(self.providers.values())
    }
}

/// Follow the provider registry until the kinds it declares differ from
/// `bound`, then cancel `token` and return the new kinds. Also returns
/// (with `bound`) once `retry_after` elapses or `token` is cancelled elsewhere.
pub async fn watch_provider_registry(
    client: Client,
    bound: ProviderKinds,
    retry_after: Option<Duration>,
    token: CancellationToken,
) -> ProviderKinds {
    let api: Api<DBaaSProvider> = Api::all(client);
    let mut events =
        pin!(watcher(api, watcher::Config::default()).default_backoff());
    let mut registry = ProviderRegistry::default();
    let mut retry = pin!(async move {
        match retry_after {
            Some(delay) => tokio::time::sleep(delay).await,
            None => std::future::pending::<()>().await,
        }
    });

    let next = loop {
        tokio::select! {
            _ = token.cancelled() => return bound,
            _ = &mut retry => {
                info!("retrying provider kinds that could not be resolved");
                break bound;
            }
            event = events.next() => match event {
                Some(Ok(event)) => {
                    if let Some(kinds) = registry.apply(event) {
                        if !kinds.same_kinds(&bound) {
                            info!(inventory_kinds = ?kinds.inventory, connection_kinds = ?kinds.connection, "provider kinds changed");
                            break kinds;
                        }
                    }
                }
                Some(Err(e)) => warn!(error = %e, "provider registry watch error"),
                None => break bound,
            }
        }
    };
    token.cancel();
    next
}
