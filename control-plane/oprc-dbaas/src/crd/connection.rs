use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Condition, NamedRef};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[kube(
    group = "dbaas.oaas.io",
    version = "v1alpha1",
    kind = "DBaaSConnection",
    plural = "dbaasconnections",
    namespaced,
    status = "DBaaSConnectionStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct DBaaSConnectionSpec {
    /// Inventory in the same namespace that lists the target instance
    pub inventory_ref: NamedRef,
    pub instance_id: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DBaaSConnectionStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    /// Secret with the database user credentials, written by the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_ref: Option<NamedRef>,
    /// ConfigMap with host/port/database details, written by the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_info_ref: Option<NamedRef>,
}
