use crate::{
    opentelemetry::{trace_action, ActionSpan, ActionSpanMethod},
    types::{ClientChoiceData, User},
    ActionResult,
};
use futures::future::join_all;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use van_sdk::{get_instances, Environment, Organization, OrganizationConfig, VanClient};

pub const NGPVAN_CONTACT_LOADER_NAME: &str = "ngpvan";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SavedListChoice<'a> {
    saved_list_id: i64,
    name: &'a str,
}

/// Offers the saved lists of every VAN instance an organization has
/// configured, for importing contacts.
pub struct NgpVanContactLoader {
    client: VanClient,
    environment: Arc<Environment>,
}

impl NgpVanContactLoader {
    #[must_use]
    pub fn new(client: VanClient, environment: Arc<Environment>) -> Self {
        Self {
            client,
            environment,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        NGPVAN_CONTACT_LOADER_NAME
    }

    /// Saved lists keyed by instance name, `Default` first. Each instance
    /// carries its own `{data}` payload so one instance with bad credentials
    /// or a failing fetch does not hide the others.
    pub async fn get_client_choice_data(
        &self,
        organization: &Organization,
        user: &User,
    ) -> ActionResult<ClientChoiceData> {
        let span = ActionSpan::new(
            self.name(),
            Some(organization.id),
            ActionSpanMethod::GetClientChoiceData,
        );

        trace_action(span, async {
            let config = OrganizationConfig::new(organization, &self.environment);
            let instances = get_instances(&config)?;
            let names = instances.sorted_names();

            let fetched = join_all(
                names
                    .iter()
                    .map(|name| self.instance_choice_data(&config, name, user)),
            )
            .await;

            let mut by_instance = Map::new();
            for (name, choice_data) in names.into_iter().zip(fetched) {
                by_instance.insert(name.to_string(), serde_json::to_value(choice_data)?);
            }

            Ok(ClientChoiceData {
                data: Value::Object(by_instance).to_string(),
                expires_seconds: Some(config.cache_ttl()),
            })
        })
        .await
    }

    async fn instance_choice_data(
        &self,
        config: &OrganizationConfig<'_>,
        instance: &str,
        user: &User,
    ) -> ClientChoiceData {
        match self.client.saved_lists(config, instance).await {
            Ok(page) => {
                let items: Vec<SavedListChoice<'_>> = page
                    .items
                    .iter()
                    .map(|list| SavedListChoice {
                        saved_list_id: list.saved_list_id,
                        name: &list.name,
                    })
                    .collect();
                ClientChoiceData {
                    data: json!({ "items": items }).to_string(),
                    expires_seconds: None,
                }
            }
            Err(error) => {
                let message = format!("Error retrieving saved lists from VAN: {error}");
                tracing::error!(
                    organization_id = config.organization().id,
                    user_id = user.id,
                    instance,
                    "{message}"
                );
                ClientChoiceData::error(&message)
            }
        }
    }
}
