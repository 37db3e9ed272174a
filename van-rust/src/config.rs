use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Configuration keys read by the VAN integration.
pub mod keys {
    pub const NGP_VAN_API_BASE_URL: &str = "NGP_VAN_API_BASE_URL";
    pub const NGP_VAN_APP_NAME: &str = "NGP_VAN_APP_NAME";
    pub const NGP_VAN_API_KEY: &str = "NGP_VAN_API_KEY";
    pub const NGP_VAN_DATABASE_MODE: &str = "NGP_VAN_DATABASE_MODE";
    pub const NGP_VAN_INSTANCES: &str = "NGP_VAN_INSTANCES";
    pub const NGP_VAN_CACHE_TTL: &str = "NGP_VAN_CACHE_TTL";
    pub const ACTION_HANDLERS: &str = "ACTION_HANDLERS";
}

pub const DEFAULT_NGP_VAN_CACHE_TTL: u64 = 300;

/// A read-only snapshot of environment configuration.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Snapshot the process environment, loading a `.env` file first when one
    /// is present.
    #[must_use]
    pub fn from_process() -> Self {
        dotenvy::dotenv().ok();
        Self {
            vars: std::env::vars().collect(),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for Environment
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// An organization record as loaded by the host application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// JSON-encoded object of organization feature flags. Keys in here
    /// override the environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<String>,
}

impl Organization {
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_features(mut self, features: &Value) -> Self {
        self.features = Some(features.to_string());
        self
    }
}

/// Configuration as seen by one organization: its feature flags layered over
/// the environment. The features JSON is parsed once, on construction.
#[derive(Debug, Clone)]
pub struct OrganizationConfig<'a> {
    organization: &'a Organization,
    environment: &'a Environment,
    features: Map<String, Value>,
}

impl<'a> OrganizationConfig<'a> {
    #[must_use]
    pub fn new(organization: &'a Organization, environment: &'a Environment) -> Self {
        Self {
            organization,
            environment,
            features: parse_features(organization),
        }
    }

    #[must_use]
    pub fn organization(&self) -> &'a Organization {
        self.organization
    }

    #[must_use]
    pub fn environment(&self) -> &'a Environment {
        self.environment
    }

    /// Resolve a key. An organization feature with the key wins, even when its
    /// value is falsy; otherwise the environment value is returned as a JSON
    /// string.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.features.get(key) {
            return Some(value.clone());
        }
        self.environment
            .get(key)
            .map(|value| Value::String(value.to_string()))
    }

    /// Resolve a key as a string. Empty strings and nulls count as unset.
    #[must_use]
    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::Null => None,
            Value::String(value) if value.is_empty() => None,
            Value::String(value) => Some(value),
            other => Some(other.to_string()),
        }
    }

    /// Seconds the client may cache VAN-derived choice data for.
    /// Unset, zero, negative or non-numeric values fall back to 300.
    #[must_use]
    pub fn cache_ttl(&self) -> u64 {
        let ttl = match self.get(keys::NGP_VAN_CACHE_TTL) {
            Some(Value::Number(number)) => number.as_u64(),
            Some(Value::String(value)) => value.trim().parse::<u64>().ok(),
            _ => None,
        };
        ttl.filter(|ttl| *ttl > 0)
            .unwrap_or(DEFAULT_NGP_VAN_CACHE_TTL)
    }

}

fn parse_features(organization: &Organization) -> Map<String, Value> {
    let Some(features) = organization.features.as_deref() else {
        return Map::new();
    };
    match serde_json::from_str::<Value>(features) {
        Ok(Value::Object(map)) => map,
        _ => {
            tracing::warn!(
                organization_id = organization.id,
                "Ignoring organization features that are not a JSON object"
            );
            Map::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::{
        io,
        sync::{Arc, Mutex},
    };

    #[test]
    fn organization_features_override_environment() {
        let environment = Environment::from_iter([(keys::NGP_VAN_APP_NAME, "from_env")]);
        let organization =
            Organization::new(77).with_features(&json!({ "NGP_VAN_APP_NAME": "from_org" }));
        let config = OrganizationConfig::new(&organization, &environment);

        assert_eq!(
            config.get_string(keys::NGP_VAN_APP_NAME).as_deref(),
            Some("from_org")
        );
    }

    #[test]
    fn falls_back_to_environment() {
        let environment = Environment::from_iter([(keys::NGP_VAN_APP_NAME, "from_env")]);
        let organization = Organization::new(77).with_features(&json!({ "OTHER": 1 }));
        let config = OrganizationConfig::new(&organization, &environment);

        assert_eq!(
            config.get(keys::NGP_VAN_APP_NAME),
            Some(Value::String("from_env".to_string()))
        );
        assert_eq!(config.get(keys::NGP_VAN_API_KEY), None);
    }

    #[test]
    fn malformed_features_are_ignored() {
        let environment = Environment::from_iter([(keys::NGP_VAN_API_KEY, "k")]);
        let organization = Organization {
            id: 3,
            name: None,
            features: Some("{not json".to_string()),
        };
        let config = OrganizationConfig::new(&organization, &environment);

        assert_eq!(config.get_string(keys::NGP_VAN_API_KEY).as_deref(), Some("k"));
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn malformed_features_are_reported_once_per_config() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let environment = Environment::from_iter([
            (keys::NGP_VAN_APP_NAME, "spoke"),
            (keys::NGP_VAN_API_KEY, "topsecret"),
        ]);
        let organization = Organization {
            id: 3,
            name: None,
            features: Some("[1, 2".to_string()),
        };

        tracing::subscriber::with_default(subscriber, || {
            let config = OrganizationConfig::new(&organization, &environment);
            for key in [
                keys::NGP_VAN_APP_NAME,
                keys::NGP_VAN_API_KEY,
                keys::NGP_VAN_DATABASE_MODE,
                keys::NGP_VAN_INSTANCES,
                keys::NGP_VAN_API_BASE_URL,
            ] {
                let _ = config.get(key);
            }
            assert_eq!(config.cache_ttl(), 300);
        });

        assert_eq!(
            logs.contents()
                .matches("Ignoring organization features that are not a JSON object")
                .count(),
            1
        );
    }

    #[test]
    fn cache_ttl_defaults_and_parses() {
        let organization = Organization::new(1);

        let environment = Environment::default();
        let config = OrganizationConfig::new(&organization, &environment);
        assert_eq!(config.cache_ttl(), 300);

        let environment = Environment::from_iter([(keys::NGP_VAN_CACHE_TTL, "30")]);
        let config = OrganizationConfig::new(&organization, &environment);
        assert_eq!(config.cache_ttl(), 30);

        let environment = Environment::from_iter([(keys::NGP_VAN_CACHE_TTL, "0")]);
        let config = OrganizationConfig::new(&organization, &environment);
        assert_eq!(config.cache_ttl(), 300);

        let environment = Environment::from_iter([(keys::NGP_VAN_CACHE_TTL, "soon")]);
        let config = OrganizationConfig::new(&organization, &environment);
        assert_eq!(config.cache_ttl(), 300);

        let organization =
            Organization::new(1).with_features(&json!({ "NGP_VAN_CACHE_TTL": 45 }));
        let config = OrganizationConfig::new(&organization, &environment);
        assert_eq!(config.cache_ttl(), 45);
    }
}
