use crate::{
    types::{Availability, ClientChoiceData, InteractionStep, QuestionResponse, User},
    ActionResult,
};
use async_trait::async_trait;
use std::fmt::Debug;
use van_sdk::Organization;

/**
 * An integration that reacts when a texter saves an answer. Any type that
 * implements the `ActionHandler` trait can be registered with the
 * [`crate::ActionHandlerRegistry`].
 */
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Name the handler is enabled by in `ACTION_HANDLERS` and stored under
    /// in `answer_actions`.
    fn name(&self) -> &'static str;
    /// What the admin sees as the option.
    fn display_name(&self) -> String;
    /// Help text shown after the admin selects the action.
    fn instructions(&self) -> String;
    /// Whether the handler can be used by the organization. The caller may
    /// cache the answer for `expires_seconds`.
    async fn available(&self, organization: &Organization, user: &User) -> Availability;
    /// Data for the admin UI to build the handler's choice menu.
    async fn get_client_choice_data(
        &self,
        organization: &Organization,
        user: &User,
    ) -> ActionResult<ClientChoiceData>;
    /// Perform the action for a saved answer. Errors must be surfaced to the
    /// texter.
    async fn process_action(
        &self,
        question_response: &QuestionResponse,
        interaction_step: &InteractionStep,
        campaign_contact_id: i64,
    ) -> ActionResult<()>;
}

impl Debug for dyn ActionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionHandler")
            .field("name", &self.name())
            .field("display_name", &self.display_name())
            .finish_non_exhaustive()
    }
}
