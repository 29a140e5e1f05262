use kube::error::{DiscoveryError, ErrorResponse};

pub type Result<T, E = ReconcileErr> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum ReconcileErr {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("ownership error: {0}")]
    Ownership(String),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid kind: {0:?}")]
    InvalidKind(String),
}

impl ReconcileErr {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReconcileErr::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, ReconcileErr::AlreadyExists(_))
    }
}

impl From<kube::Error> for ReconcileErr {
    fn from(e: kube::Error) -> Self {
        match e {
            kube::Error::Api(ErrorResponse {
                code: 404, message, ..
            }) => ReconcileErr::NotFound(message),
            // provider CRD not installed (yet)
            kube::Error::Discovery(DiscoveryError::MissingKind(kind)) => {
                ReconcileErr::NotFound(format!("kind {kind} is not served"))
            }
            kube::Error::Api(ErrorResponse {
                code: 409,
                ref reason,
                ref message,
                ..
            }) if reason == "AlreadyExists" => {
                ReconcileErr::AlreadyExists(message.clone())
            }
            other => ReconcileErr::Transport(other.to_string()),
        }
    }
}

impl From<envconfig::Error> for ReconcileErr {
    fn from(e: envconfig::Error) -> Self {
        ReconcileErr::Configuration(e.to_string())
    }
}
