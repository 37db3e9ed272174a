use thiserror::Error;
use van_sdk::VanError;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("NGP VAN error: {0}")]
    Van(#[from] VanError),
    /// One of the catalog endpoints failed. Names which one.
    #[error("Error retrieving {endpoint} from VAN: {source}")]
    CatalogFetch {
        endpoint: &'static str,
        #[source]
        source: VanError,
    },
    /// A failure from the host's data loader, passed through as is.
    #[error(transparent)]
    Loader(BoxedError),
    #[error("{0} not found")]
    NotFound(String),
    /// The interaction step's stored answer action could not be read.
    #[error("Invalid answer action: {0}")]
    InvalidAnswerAction(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

pub type ActionResult<T> = Result<T, ActionError>;
