pub mod connection;
pub mod inventory;
pub mod provider;

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const GROUP: &str = "dbaas.oaas.io";
pub const VERSION: &str = "v1alpha1";

pub const CONDITION_SPEC_SYNCED: &str = "SpecSynced";
pub const REASON_SYNCED: &str = "SyncOK";
pub const REASON_PROVIDER_NOT_FOUND: &str = "DBaaSProviderNotFound";
pub const REASON_INVENTORY_NOT_FOUND: &str = "DBaaSInventoryNotFound";

/// Reference to an object by name; the namespace is implied by the referrer.
#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default, PartialEq, Eq)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl Condition {
    pub fn new(
        type_: &str,
        status: ConditionStatus,
        reason: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            type_: type_.to_string(),
            status,
            reason: Some(reason.to_string()),
            message: Some(message.into()),
            last_transition_time: None,
        }
    }
}

/// Insert or replace the condition of the same type. The transition time
/// only moves when the status actually flips.
pub fn set_condition(conditions: &mut Vec<Condition>, mut cond: Condition) {
    match conditions.iter_mut().find(|c| c.type_ == cond.type_) {
        Some(existing) => {
            cond.last_transition_time = if existing.status == cond.status {
                existing.last_transition_time.take()
            } else {
                Some(Utc::now().to_rfc3339())
            };
            *existing = cond;
        }
        None => {
            cond.last_transition_time = Some(Utc::now().to_rfc3339());
            conditions.push(cond);
        }
    }
}
