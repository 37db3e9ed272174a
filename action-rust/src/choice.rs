use crate::{types::AnswerActionReference, ActionError, ActionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use van_sdk::api::{
    ActivistCode, CanvassContext, CanvassResponseRequest, ResultCode, SurveyQuestion,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChoiceType {
    SurveyResponse,
    ActivistCode,
    CanvassResponse,
}

/// Activist codes chosen from the menu are always applied to the person.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivistCodeAction {
    #[default]
    Apply,
}

/// What to report to VAN when the answer is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChoiceDetails {
    #[serde(rename_all = "camelCase")]
    SurveyResponse {
        survey_question_id: i64,
        survey_response_id: i64,
    },
    #[serde(rename_all = "camelCase")]
    ActivistCode {
        activist_code_id: i64,
        #[serde(default)]
        action: ActivistCodeAction,
    },
    #[serde(rename_all = "camelCase")]
    CanvassResponse { result_code_id: i64 },
}

impl ChoiceDetails {
    #[must_use]
    pub fn choice_type(&self) -> ChoiceType {
        match self {
            Self::SurveyResponse { .. } => ChoiceType::SurveyResponse,
            Self::ActivistCode { .. } => ChoiceType::ActivistCode,
            Self::CanvassResponse { .. } => ChoiceType::CanvassResponse,
        }
    }

    /// Recover the details from a saved answer action. The value may be the
    /// serialized details string or the details object itself.
    pub fn from_answer_action(reference: &AnswerActionReference) -> ActionResult<Self> {
        let parsed = match &reference.value {
            Value::String(details) => serde_json::from_str(details),
            details => serde_json::from_value(details.clone()),
        };
        parsed.map_err(|error| {
            ActionError::InvalidAnswerAction(format!("unrecognized choice details: {error}"))
        })
    }

    /// Build the canvass response body. A result code is reported on its own;
    /// survey responses and activist codes go in the `responses` list.
    pub fn into_request(self) -> ActionResult<CanvassResponseRequest> {
        let canvass_context = CanvassContext::default();
        match self {
            Self::CanvassResponse { result_code_id } => Ok(CanvassResponseRequest {
                canvass_context,
                result_code_id: Some(result_code_id),
                responses: None,
            }),
            response @ (Self::SurveyResponse { .. } | Self::ActivistCode { .. }) => {
                Ok(CanvassResponseRequest {
                    canvass_context,
                    result_code_id: None,
                    responses: Some(vec![serde_json::to_value(response)?]),
                })
            }
        }
    }
}

/// One entry of the action menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceRecord {
    #[serde(rename = "type")]
    pub choice_type: ChoiceType,
    pub name: String,
    /// Serialized [`ChoiceDetails`]. Stored verbatim as the answer action value.
    pub details: String,
}

impl ChoiceRecord {
    pub fn new(name: impl Into<String>, details: &ChoiceDetails) -> ActionResult<Self> {
        Ok(Self {
            choice_type: details.choice_type(),
            name: name.into(),
            details: serde_json::to_string(details)?,
        })
    }
}

/// The action menu: survey responses, then activist codes, then canvass
/// result codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCatalog {
    pub items: Vec<ChoiceRecord>,
}

impl ActionCatalog {
    pub fn build(
        survey_questions: &[SurveyQuestion],
        activist_codes: &[ActivistCode],
        result_codes: &[ResultCode],
    ) -> ActionResult<Self> {
        let survey_responses = survey_questions.iter().flat_map(|question| {
            question.responses.iter().map(move |response| {
                ChoiceRecord::new(
                    format!("{} - {}", question.name, response.name),
                    &ChoiceDetails::SurveyResponse {
                        survey_question_id: question.survey_question_id,
                        survey_response_id: response.survey_response_id,
                    },
                )
            })
        });

        let activist_codes = activist_codes.iter().map(|code| {
            ChoiceRecord::new(
                code.name.clone(),
                &ChoiceDetails::ActivistCode {
                    activist_code_id: code.activist_code_id,
                    action: ActivistCodeAction::Apply,
                },
            )
        });

        let canvass_responses = result_codes.iter().map(|code| {
            ChoiceRecord::new(
                code.name.clone(),
                &ChoiceDetails::CanvassResponse {
                    result_code_id: code.result_code_id,
                },
            )
        });

        let items = survey_responses
            .chain(activist_codes)
            .chain(canvass_responses)
            .collect::<ActionResult<Vec<_>>>()?;

        Ok(Self { items })
    }

    /// Serialize into the opaque string the admin UI caches.
    pub fn to_data(&self) -> ActionResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
