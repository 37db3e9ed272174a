use crate::{
    config::{keys, OrganizationConfig},
    VanError, VanResult,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::HeaderValue;
use serde_json::{Map, Value};
use std::{collections::BTreeMap, fmt};

pub const DEFAULT_INSTANCE_NAME: &str = "Default";
pub const DEFAULT_NGP_VAN_API_BASE_URL: &str = "https://api.securevan.com";

const INSTANCE_NAME_KEY: &str = "NAME";
const REQUIRED_INSTANCE_KEYS: [&str; 4] = [
    INSTANCE_NAME_KEY,
    keys::NGP_VAN_API_KEY,
    keys::NGP_VAN_APP_NAME,
    keys::NGP_VAN_DATABASE_MODE,
];

/// VAN database mode appended to the API key. `0` is the voter file, `1` is
/// `MyCampaign`. Kept as configured and sent to VAN verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatabaseMode(pub String);

impl Default for DatabaseMode {
    fn default() -> Self {
        Self("0".to_string())
    }
}

impl From<u32> for DatabaseMode {
    fn from(mode: u32) -> Self {
        Self(mode.to_string())
    }
}

impl From<&str> for DatabaseMode {
    fn from(mode: &str) -> Self {
        Self(mode.to_string())
    }
}

impl fmt::Display for DatabaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One named set of VAN API credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceCredentials {
    pub app_name: Option<String>,
    pub api_key: Option<String>,
    pub database_mode: DatabaseMode,
}

impl InstanceCredentials {
    /// Build the Basic auth token. Fails when the app name or the API key is
    /// unset, null or empty.
    pub fn auth(&self) -> VanResult<AuthToken> {
        let app_name = self.app_name.as_deref().filter(|value| !value.is_empty());
        let api_key = self.api_key.as_deref().filter(|value| !value.is_empty());

        match (app_name, api_key) {
            (Some(app_name), Some(api_key)) => {
                Ok(AuthToken::basic(app_name, api_key, &self.database_mode))
            }
            _ => {
                let mut missing = Vec::new();
                if app_name.is_none() {
                    missing.push(keys::NGP_VAN_APP_NAME);
                }
                if api_key.is_none() {
                    missing.push(keys::NGP_VAN_API_KEY);
                }
                Err(VanError::MissingCredentials(missing))
            }
        }
    }
}

/// All instances of an organization keyed by name. Always contains
/// [`DEFAULT_INSTANCE_NAME`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instances(BTreeMap<String, InstanceCredentials>);

impl Instances {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&InstanceCredentials> {
        self.0.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InstanceCredentials)> {
        self.0.iter().map(|(name, credentials)| (name.as_str(), credentials))
    }

    /// Instance names with `Default` first, the rest in lexicographic order.
    #[must_use]
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.0.keys().map(String::as_str).collect();
        names.sort_by(|left, right| {
            match (*left == DEFAULT_INSTANCE_NAME, *right == DEFAULT_INSTANCE_NAME) {
                (true, false) => std::cmp::Ordering::Less,
                (false, true) => std::cmp::Ordering::Greater,
                _ => left.cmp(right),
            }
        });
        names
    }
}

impl<K: Into<String>> FromIterator<(K, InstanceCredentials)> for Instances {
    fn from_iter<I: IntoIterator<Item = (K, InstanceCredentials)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, credentials)| (name.into(), credentials))
                .collect(),
        )
    }
}

/// An HTTP Basic credential for VAN, `Basic base64(appName:apiKey|databaseMode)`.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    #[must_use]
    pub fn basic(app_name: &str, api_key: &str, database_mode: &DatabaseMode) -> Self {
        let encoded = STANDARD.encode(format!("{app_name}:{api_key}|{database_mode}"));
        Self(format!("Basic {encoded}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn header_value(&self) -> VanResult<HeaderValue> {
        let mut value = HeaderValue::from_str(&self.0).map_err(|error| {
            VanError::InvalidInput(format!("Invalid NGP VAN authorization header value: {error}"))
        })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(Basic ***)")
    }
}

/// Resolve every VAN instance configured for the organization.
///
/// Instances come from the JSON array in `NGP_VAN_INSTANCES`. An entry without
/// all of the `NAME`, `NGP_VAN_API_KEY`, `NGP_VAN_APP_NAME` and
/// `NGP_VAN_DATABASE_MODE` keys is dropped with a warning. Values are not
/// checked here; unusable credentials fail in [`get_auth`]. A `Default`
/// instance built from the top-level keys is always added, even when those
/// keys are unset.
pub fn get_instances(config: &OrganizationConfig<'_>) -> VanResult<Instances> {
    let organization_id = config.organization().id;
    let mut instances = BTreeMap::new();

    for raw_instance in raw_instances(config)? {
        match parse_instance(&raw_instance) {
            Ok((name, credentials)) => {
                instances.insert(name, credentials);
            }
            Err(reason) => {
                let name = raw_instance
                    .get(INSTANCE_NAME_KEY)
                    .map(value_to_string)
                    .unwrap_or_default();
                tracing::warn!(
                    organization_id,
                    instance = %name,
                    "Ignoring NGP_VAN_INSTANCE because {reason}"
                );
            }
        }
    }

    let default_instance = InstanceCredentials {
        app_name: config.get_string(keys::NGP_VAN_APP_NAME),
        api_key: config.get_string(keys::NGP_VAN_API_KEY),
        database_mode: default_database_mode(config),
    };
    instances.insert(DEFAULT_INSTANCE_NAME.to_string(), default_instance);

    Ok(Instances(instances))
}

/// Build the Basic auth token for the named instance.
pub fn get_auth(config: &OrganizationConfig<'_>, instance_name: &str) -> VanResult<AuthToken> {
    let instances = get_instances(config)?;
    let instance = instances
        .get(instance_name)
        .ok_or_else(|| VanError::InstanceNotFound(instance_name.to_string()))?;
    instance.auth()
}

/// Join the configured API base URL (or the public default) with a path.
/// The path is appended verbatim.
#[must_use]
pub fn make_url(path_and_query: &str, config: &OrganizationConfig<'_>) -> String {
    let base_url = config
        .get_string(keys::NGP_VAN_API_BASE_URL)
        .unwrap_or_else(|| DEFAULT_NGP_VAN_API_BASE_URL.to_string());
    format!("{base_url}/{path_and_query}")
}

fn raw_instances(config: &OrganizationConfig<'_>) -> VanResult<Vec<Map<String, Value>>> {
    let entries = match config.get(keys::NGP_VAN_INSTANCES) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::String(encoded)) if encoded.trim().is_empty() => return Ok(Vec::new()),
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(&encoded) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                return Err(VanError::Config(
                    "NGP_VAN_INSTANCES must be a JSON array".to_string(),
                ))
            }
            Err(error) => {
                return Err(VanError::Config(format!(
                    "NGP_VAN_INSTANCES is not valid JSON: {error}"
                )))
            }
        },
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(VanError::Config(
                "NGP_VAN_INSTANCES must be a JSON array".to_string(),
            ))
        }
    };

    let organization_id = config.organization().id;
    Ok(entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::Object(raw_instance) => Some(raw_instance),
            other => {
                tracing::warn!(
                    organization_id,
                    entry = %other,
                    "Ignoring NGP_VAN_INSTANCE because it is not an object"
                );
                None
            }
        })
        .collect())
}

fn parse_instance(raw_instance: &Map<String, Value>) -> Result<(String, InstanceCredentials), String> {
    let missing: Vec<&str> = REQUIRED_INSTANCE_KEYS
        .into_iter()
        .filter(|key| !raw_instance.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(format!("it's missing required keys: {}", missing.join(", ")));
    }

    Ok((
        value_to_string(&raw_instance[INSTANCE_NAME_KEY]),
        InstanceCredentials {
            app_name: credential(&raw_instance[keys::NGP_VAN_APP_NAME]),
            api_key: credential(&raw_instance[keys::NGP_VAN_API_KEY]),
            database_mode: DatabaseMode(value_to_string(
                &raw_instance[keys::NGP_VAN_DATABASE_MODE],
            )),
        },
    ))
}

fn credential(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(value_to_string(other)),
    }
}

/// Falsy values (unset, null, `false`, `0` or an empty string) mean `0`.
/// Anything else is used as configured.
fn default_database_mode(config: &OrganizationConfig<'_>) -> DatabaseMode {
    match config.get(keys::NGP_VAN_DATABASE_MODE) {
        None | Some(Value::Null | Value::Bool(false)) => DatabaseMode::default(),
        Some(Value::String(mode)) if mode.is_empty() => DatabaseMode::default(),
        Some(Value::Number(mode)) if mode.as_u64() == Some(0) => DatabaseMode::default(),
        Some(value) => DatabaseMode(value_to_string(&value)),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(value) => value.clone(),
        other => other.to_string(),
    }
}
