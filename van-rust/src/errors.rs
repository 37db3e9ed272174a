use thiserror::Error;

#[derive(Error, Debug)]
pub enum VanError {
    /// Organization or environment configuration could not be interpreted
    /// (e.g. `NGP_VAN_INSTANCES` is not a JSON array).
    #[error("Configuration error: {0}")]
    Config(String),
    /// The requested instance name is not configured for the organization.
    #[error("NGP VAN Instance {0} not found")]
    InstanceNotFound(String),
    /// The instance exists but lacks an app name and/or an API key. Holds the
    /// names of the missing fields.
    #[error("Environment missing {}", .0.join(" and "))]
    MissingCredentials(Vec<&'static str>),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The request to VAN failed or the parsing of the response failed.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The request returned a status other than the one expected
    #[error("Status error: {1} (Status {0})")]
    StatusCode(reqwest::StatusCode, String),
}

pub type VanResult<T> = Result<T, VanError>;
