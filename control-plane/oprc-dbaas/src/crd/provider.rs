use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Registry entry published by a database provider operator. Cluster-scoped;
/// the object name is the provider name referenced by inventories.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[kube(
    group = "dbaas.oaas.io",
    version = "v1alpha1",
    kind = "DBaaSProvider",
    plural = "dbaasproviders"
)]
#[serde(rename_all = "camelCase")]
pub struct DBaaSProviderSpec {
    pub provider: DatabaseProvider,
    /// Kind implementing the inventory role, e.g. "CrunchyBridgeInventory"
    pub inventory_kind: String,
    /// Kind implementing the connection role, e.g. "CrunchyBridgeConnection"
    pub connection_kind: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseProvider {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderRole {
    Inventory,
    Connection,
}

impl DBaaSProviderSpec {
    pub fn kind_for(&self, role: ProviderRole) -> &str {
        match role {
            ProviderRole::Inventory => &self.inventory_kind,
            ProviderRole::Connection => &self.connection_kind,
        }
    }
}
