use std::time::Duration;

use envconfig::Envconfig;

use crate::error::{ReconcileErr, Result};

pub const INSTALL_NAMESPACE_ENV: &str = "INSTALL_NAMESPACE";

#[derive(Envconfig, Clone, Debug)]
pub struct OperatorConfig {
    /// Namespace the operator is installed into. Required.
    /// Env: INSTALL_NAMESPACE
    #[envconfig(from = "INSTALL_NAMESPACE")]
    pub install_namespace: String,

    /// Requeue delay after a failed reconcile.
    /// Env: OPRC_DBAAS_ERROR_REQUEUE_SECS
    #[envconfig(from = "OPRC_DBAAS_ERROR_REQUEUE_SECS", default = "60")]
    pub error_requeue_secs: u64,

    /// Requeue delay when a referenced provider or inventory is not registered yet.
    /// Env: OPRC_DBAAS_NOT_FOUND_REQUEUE_SECS
    #[envconfig(from = "OPRC_DBAAS_NOT_FOUND_REQUEUE_SECS", default = "15")]
    pub not_found_requeue_secs: u64,
}

impl OperatorConfig {
    /// Load from the process environment. A missing install namespace is fatal.
    pub fn load() -> Result<Self> {
        let cfg = Self::init_from_env()?;
        cfg.validate()
    }

    fn validate(self) -> Result<Self> {
        if self.install_namespace.trim().is_empty() {
            return Err(ReconcileErr::Configuration(format!(
                "{INSTALL_NAMESPACE_ENV} must be set"
            )));
        }
        Ok(self)
    }

    pub fn error_requeue(&self) -> Duration {
        Duration::from_secs(self.error_requeue_secs)
    }

    pub fn not_found_requeue(&self) -> Duration {
        Duration::from_secs(self.not_found_requeue_secs)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn install_namespace_is_required() {
        let err = OperatorConfig::init_from_hashmap(&env(&[])).unwrap_err();
        assert!(matches!(
            ReconcileErr::from(err),
            ReconcileErr::Configuration(_)
        ));
    }

    #[test]
    fn blank_install_namespace_rejected() {
        let cfg =
            OperatorConfig::init_from_hashmap(&env(&[("INSTALL_NAMESPACE", " ")]))
                .unwrap();
        assert!(matches!(
            cfg.validate(),
            Err(ReconcileErr::Configuration(_))
        ));
    }

    #[test]
    fn defaults_applied() {
        let cfg = OperatorConfig::init_from_hashmap(&env(&[(
            "INSTALL_NAMESPACE",
            "dbaas-system",
        )]))
        .unwrap()
        .validate()
        .unwrap();
        assert_eq!(cfg.install_namespace, "dbaas-system");
        assert_eq!(cfg.error_requeue(), Duration::from_secs(60));
        assert_eq!(cfg.not_found_requeue(), Duration::from_secs(15));
    }

    #[test]
    fn overrides_respected() {
        let cfg = OperatorConfig::init_from_hashmap(&env(&[
            ("INSTALL_NAMESPACE", "ops"),
            ("OPRC_DBAAS_ERROR_REQUEUE_SECS", "5"),
            ("OPRC_DBAAS_NOT_FOUND_REQUEUE_SECS", "2"),
        ]))
        .unwrap();
        assert_eq!(cfg.error_requeue_secs, 5);
        assert_eq!(cfg.not_found_requeue_secs, 2);
    }
}
