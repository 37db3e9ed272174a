use crate::{ActionError, ActionResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The user (usually an admin) the action menu is being built for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignContact {
    pub id: i64,
    pub campaign_id: i64,
    /// The person's VAN id.
    #[serde(default)]
    pub external_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub organization_id: i64,
}

/// A scripted question/branch whose answer may trigger an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionStep {
    pub id: i64,
    /// Name of the action handler attached to the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_actions: Option<String>,
    /// Serialized [`AnswerActionReference`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_actions_data: Option<String>,
}

impl InteractionStep {
    /// Read the answer action the admin chose from the action menu.
    pub fn answer_action_reference(&self) -> ActionResult<AnswerActionReference> {
        let data = self
            .answer_actions_data
            .as_deref()
            .filter(|data| !data.trim().is_empty())
            .ok_or_else(|| {
                ActionError::InvalidAnswerAction(format!(
                    "interaction step {} has no answer action data",
                    self.id
                ))
            })?;
        serde_json::from_str(data).map_err(|error| {
            ActionError::InvalidAnswerAction(format!(
                "interaction step {} answer action data is malformed: {error}",
                self.id
            ))
        })
    }
}

/// The choice saved against an interaction-step answer. `value` holds the
/// serialized choice details, usually as a JSON string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerActionReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub campaign_contact_id: i64,
    pub interaction_step_id: i64,
    pub value: String,
}

/// Whether a handler may be offered, and for how long the answer may be cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub result: bool,
    pub expires_seconds: u64,
}

/// Opaque data handed to the admin UI to build a handler's choice menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientChoiceData {
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_seconds: Option<u64>,
}

impl ClientChoiceData {
    /// The payload the UI renders as a failed menu: `{"error": message}`.
    #[must_use]
    pub fn error(message: &str) -> Self {
        Self {
            data: json!({ "error": message }).to_string(),
            expires_seconds: None,
        }
    }
}
