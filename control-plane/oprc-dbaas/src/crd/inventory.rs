use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Condition, NamedRef};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[kube(
    group = "dbaas.oaas.io",
    version = "v1alpha1",
    kind = "DBaaSInventory",
    plural = "dbaasinventories",
    namespaced,
    status = "DBaaSInventoryStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct DBaaSInventorySpec {
    /// Name of the cluster-scoped DBaaSProvider backing this inventory
    pub provider_ref: NamedRef,
    /// Provider-facing part of the spec; projected verbatim into the provider object
    #[serde(flatten)]
    pub inventory: ProviderInventorySpec,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInventorySpec {
    /// Secret holding provider account credentials
    pub credentials_ref: NamedRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<InventoryPolicy>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryPolicy {
    /// Namespaces allowed to create connections against this inventory; "*" allows all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_namespaces: Option<Vec<String>>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DBaaSInventoryStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    /// Database instances discovered by the provider
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instances: Vec<Instance>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub instance_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub instance_info: BTreeMap<String, String>,
}
