use serde::{Deserialize, Serialize};

pub const CANVASS_CONTACT_TYPE_ID: i64 = 37;
pub const CANVASS_INPUT_TYPE_ID: i64 = 11;

/// A page of a paginated VAN collection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemsPage<T> {
    pub items: Vec<T>,
    /// Link to the next page. Only the first page is ever requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SurveyQuestion {
    pub survey_question_id: i64,
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub question_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub responses: Vec<SurveyResponse>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SurveyResponse {
    pub survey_response_id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ActivistCode {
    pub activist_code_id: i64,
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub code_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// A canvass result code (e.g. "Busy", "Moved"). The endpoint returns a bare
/// array of these rather than an [`ItemsPage`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ResultCode {
    pub result_code_id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SavedList {
    pub saved_list_id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub door_count: Option<i64>,
}

/// How the contact was made. Texting always reports the same context.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CanvassContext {
    pub contact_type_id: i64,
    pub input_type_id: i64,
}

impl Default for CanvassContext {
    fn default() -> Self {
        Self {
            contact_type_id: CANVASS_CONTACT_TYPE_ID,
            input_type_id: CANVASS_INPUT_TYPE_ID,
        }
    }
}

/// Body of `POST /v4/people/{vanId}/canvassResponses`.
///
/// Either `result_code_id` is set (the contact was not canvassed, e.g. wrong
/// number) or `responses` carries survey responses and activist codes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CanvassResponseRequest {
    pub canvass_context: CanvassContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_code_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "utoipa", schema(value_type = Option<Vec<Object>>))]
    pub responses: Option<Vec<serde_json::Value>>,
}
