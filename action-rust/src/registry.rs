use crate::{
    handler::ActionHandler,
    types::{ClientChoiceData, InteractionStep, QuestionResponse, User},
    ActionError, ActionResult,
};
use std::sync::Arc;
use van_sdk::{config::keys, Environment, Organization, OrganizationConfig};

/// Store all registered action handlers and pick the ones an organization has
/// enabled through `ACTION_HANDLERS`.
pub struct ActionHandlerRegistry {
    handlers: Vec<Arc<dyn ActionHandler>>,
    environment: Arc<Environment>,
}

impl ActionHandlerRegistry {
    #[must_use]
    pub fn new(environment: Arc<Environment>) -> Self {
        Self {
            handlers: Vec::new(),
            environment,
        }
    }

    #[must_use]
    pub fn add_handler(mut self, handler: Arc<dyn ActionHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn ActionHandler> {
        self.handlers
            .iter()
            .find(|handler| handler.name() == name)
            .map(AsRef::as_ref)
    }

    /// Handlers named in the organization's comma-separated `ACTION_HANDLERS`.
    #[must_use]
    pub fn enabled(&self, organization: &Organization) -> Vec<&dyn ActionHandler> {
        let config = OrganizationConfig::new(organization, &self.environment);
        let Some(enabled) = config.get_string(keys::ACTION_HANDLERS) else {
            return Vec::new();
        };
        let names: Vec<&str> = enabled
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect();

        self.handlers
            .iter()
            .filter(|handler| names.contains(&handler.name()))
            .map(AsRef::as_ref)
            .collect()
    }

    /// Enabled handlers that report themselves available, i.e. the ones the
    /// admin UI offers as options.
    pub async fn available(&self, organization: &Organization, user: &User) -> Vec<&dyn ActionHandler> {
        let mut available = Vec::new();
        for handler in self.enabled(organization) {
            if handler.available(organization, user).await.result {
                available.push(handler);
            }
        }
        available
    }

    /// Choice data for one enabled handler. A failed fetch is turned into the
    /// `{"error": ...}` payload the admin UI shows instead of a menu.
    pub async fn client_choice_data(
        &self,
        name: &str,
        organization: &Organization,
        user: &User,
    ) -> ActionResult<ClientChoiceData> {
        let handler = self.enabled_handler(name, organization)?;
        match handler.get_client_choice_data(organization, user).await {
            Ok(choice_data) => Ok(choice_data),
            Err(error) => Ok(ClientChoiceData::error(&error.to_string())),
        }
    }

    /// Run the handler attached to the interaction step's answer.
    pub async fn process_action(
        &self,
        organization: &Organization,
        question_response: &QuestionResponse,
        interaction_step: &InteractionStep,
        campaign_contact_id: i64,
    ) -> ActionResult<()> {
        let name = interaction_step
            .answer_actions
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                ActionError::InvalidAnswerAction(format!(
                    "interaction step {} has no answer action",
                    interaction_step.id
                ))
            })?;
        let handler = self.enabled_handler(name, organization)?;
        handler
            .process_action(question_response, interaction_step, campaign_contact_id)
            .await
    }

    fn enabled_handler(&self, name: &str, organization: &Organization) -> ActionResult<&dyn ActionHandler> {
        self.enabled(organization)
            .into_iter()
            .find(|handler| handler.name() == name)
            .ok_or_else(|| ActionError::NotFound(format!("Action handler {name}")))
    }
}
