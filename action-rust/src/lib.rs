pub mod choice;
mod contact_loader;
mod errors;
mod handler;
pub mod loader;
mod ngpvan;
mod opentelemetry;
mod registry;
mod types;

pub use choice::{ActionCatalog, ChoiceDetails, ChoiceRecord, ChoiceType};
pub use contact_loader::{NgpVanContactLoader, NGPVAN_CONTACT_LOADER_NAME};
pub use errors::{ActionError, ActionResult, BoxedError};
pub use handler::ActionHandler;
pub use loader::{DataLoader, InMemoryDataLoader};
pub use ngpvan::{NgpVanAction, NGPVAN_ACTION_NAME, NGPVAN_AVAILABILITY_TTL};
pub use registry::ActionHandlerRegistry;
pub use types::*;
