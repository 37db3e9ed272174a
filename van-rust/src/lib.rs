pub mod api;
mod client;
pub mod client_utils;
pub mod config;
mod errors;
pub mod instances;
pub mod opentelemetry;

pub use client::{VanClient, VanClientOptions, DEFAULT_WRITE_TIMEOUT};
pub use config::{Environment, Organization, OrganizationConfig};
pub use errors::*;
pub use instances::{
    get_auth, get_instances, make_url, AuthToken, DatabaseMode, InstanceCredentials, Instances,
    DEFAULT_INSTANCE_NAME,
};
