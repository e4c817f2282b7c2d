use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing {name}: pass it as an argument or set {env_var}")]
    MissingCredential {
        name: &'static str,
        env_var: &'static str,
    },
    #[error("invalid tenant `{0}`, expected one of: default, eu, au")]
    InvalidTenant(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest_middleware::Error),
    #[error("HTTP {status}: {detail}")]
    Status { status: StatusCode, detail: String },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Transient errors were already retried once by the HTTP middleware.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => {
                status.is_server_error()
                    || *status == StatusCode::REQUEST_TIMEOUT
                    || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::Decode(_) => false,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == StatusCode::CONFLICT)
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("unable to retrieve integrations for Snyk org {org_id}: {source}")]
    Integrations { org_id: String, source: ApiError },
    #[error("unable to list targets for Snyk org {org_id}: {source}")]
    Enumeration { org_id: String, source: ApiError },
    #[error(
        "no {integration} integration detected for Snyk org {org_id}, \
         please set it up before migrating GitHub or GitHub Enterprise targets"
    )]
    MissingDestinationIntegration {
        org_id: String,
        integration: &'static str,
    },
}
