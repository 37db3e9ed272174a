use crate::{
    choice::{ActionCatalog, ChoiceDetails},
    handler::ActionHandler,
    loader::{resolve_contact_context, DataLoader},
    opentelemetry::{trace_action, ActionSpan, ActionSpanMethod},
    types::{Availability, ClientChoiceData, InteractionStep, QuestionResponse, User},
    ActionError, ActionResult,
};
use async_trait::async_trait;
use std::sync::Arc;
use van_sdk::{Environment, Organization, OrganizationConfig, VanClient, DEFAULT_INSTANCE_NAME};

pub const NGPVAN_ACTION_NAME: &str = "ngpvan-action";
/// How long callers may cache [`ActionHandler::available`].
pub const NGPVAN_AVAILABILITY_TTL: u64 = 60;

/// Reports texter interaction results to NGP VAN as survey responses,
/// activist codes or canvass result codes.
pub struct NgpVanAction {
    client: VanClient,
    loader: Arc<dyn DataLoader>,
    environment: Arc<Environment>,
}

impl NgpVanAction {
    #[must_use]
    pub fn new(client: VanClient, loader: Arc<dyn DataLoader>, environment: Arc<Environment>) -> Self {
        Self {
            client,
            loader,
            environment,
        }
    }

    /// Fetch the three catalogs concurrently and normalize them into one menu.
    /// Fails as a whole when any fetch fails; the first failure in menu order
    /// is reported.
    ///
    /// Only the first page of each catalog is read.
    pub async fn build_catalog(&self, config: &OrganizationConfig<'_>) -> ActionResult<ActionCatalog> {
        let (survey_questions, activist_codes, result_codes) = futures::join!(
            self.client.survey_questions(config, DEFAULT_INSTANCE_NAME),
            self.client.activist_codes(config, DEFAULT_INSTANCE_NAME),
            self.client.canvass_result_codes(config, DEFAULT_INSTANCE_NAME),
        );

        let survey_questions = survey_questions.map_err(|source| ActionError::CatalogFetch {
            endpoint: "survey questions",
            source,
        })?;
        let activist_codes = activist_codes.map_err(|source| ActionError::CatalogFetch {
            endpoint: "activist codes",
            source,
        })?;
        let result_codes = result_codes.map_err(|source| ActionError::CatalogFetch {
            endpoint: "canvass result codes",
            source,
        })?;

        ActionCatalog::build(&survey_questions.items, &activist_codes.items, &result_codes)
    }

    async fn post_choice(
        &self,
        interaction_step: &InteractionStep,
        campaign_contact_id: i64,
    ) -> ActionResult<()> {
        let context = resolve_contact_context(self.loader.as_ref(), campaign_contact_id).await?;

        let reference = interaction_step.answer_action_reference()?;
        let body = ChoiceDetails::from_answer_action(&reference)?.into_request()?;

        let config = OrganizationConfig::new(&context.organization, &self.environment);
        let result = self
            .client
            .post_canvass_responses(
                &config,
                DEFAULT_INSTANCE_NAME,
                &context.contact.external_id,
                &body,
            )
            .await;

        if let Err(error) = result {
            tracing::error!(
                campaign_contact_id,
                external_id = %context.contact.external_id,
                body = %serde_json::to_string(&body).unwrap_or_default(),
                "Failed to send canvass responses to NGP VAN: {error}"
            );
            return Err(error.into());
        }
        Ok(())
    }
}

#[async_trait]
impl ActionHandler for NgpVanAction {
    fn name(&self) -> &'static str {
        NGPVAN_ACTION_NAME
    }

    fn display_name(&self) -> String {
        "NGPVAN action".to_string()
    }

    fn instructions(&self) -> String {
        "This action is for reporting the results of interactions with contacts to NGPVAN"
            .to_string()
    }

    async fn available(&self, _organization: &Organization, _user: &User) -> Availability {
        Availability {
            result: true,
            expires_seconds: NGPVAN_AVAILABILITY_TTL,
        }
    }

    async fn get_client_choice_data(
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
            match self.build_catalog(&config).await {
                Ok(catalog) => Ok(ClientChoiceData {
                    data: catalog.to_data()?,
                    expires_seconds: Some(config.cache_ttl()),
                }),
                Err(error) => {
                    tracing::error!(
                        organization_id = organization.id,
                        user_id = user.id,
                        "Failed to build the NGP VAN action catalog: {error}"
                    );
                    Err(error)
                }
            }
        })
        .await
    }

    async fn process_action(
        &self,
        question_response: &QuestionResponse,
        interaction_step: &InteractionStep,
        campaign_contact_id: i64,
    ) -> ActionResult<()> {
        let span = ActionSpan::new(self.name(), None, ActionSpanMethod::ProcessAction);
        span.set_attribute("van_action.campaign_contact_id", campaign_contact_id);
        span.set_attribute("van_action.interaction_step_id", interaction_step.id);

        trace_action(span, async {
            let result = self.post_choice(interaction_step, campaign_contact_id).await;
            if let Err(error) = &result {
                tracing::error!(
                    campaign_contact_id,
                    interaction_step_id = interaction_step.id,
                    answer = %question_response.value,
                    "NGP VAN action failed: {error}"
                );
            }
            result
        })
        .await
    }
}
