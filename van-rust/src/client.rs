use crate::{
    api::{ActivistCode, CanvassResponseRequest, ItemsPage, ResultCode, SavedList, SurveyQuestion},
    client_utils::{self, RetryPolicy},
    config::OrganizationConfig,
    instances::{get_auth, make_url, AuthToken},
    opentelemetry::{trace_request, RequestInfo},
    VanError, VanResult,
};
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Writes to VAN are never retried and give up after this long.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// A client for the NGP VAN v4 API.
///
/// The client holds no credentials. Every call resolves the base URL and the
/// Basic auth token from the organization configuration it is given, so one
/// client can serve every organization and instance.
#[derive(Debug, Clone)]
pub struct VanClient {
    client: Client,
    read_policy: RetryPolicy,
    write_policy: RetryPolicy,
}

#[derive(Clone, Default)]
pub struct VanClientOptions {
    pub client: Option<Client>,
    /// Retry policy for catalog reads. Defaults to [`RetryPolicy::default`].
    pub read_policy: Option<RetryPolicy>,
    /// Timeout for writes. Defaults to [`DEFAULT_WRITE_TIMEOUT`].
    pub write_timeout: Option<Duration>,
}

impl Default for VanClient {
    fn default() -> Self {
        Self::new(VanClientOptions::default())
    }
}

impl VanClient {
    #[must_use]
    pub fn new(options: VanClientOptions) -> Self {
        let VanClientOptions {
            client,
            read_policy,
            write_timeout,
        } = options;

        Self {
            client: client.unwrap_or_default(),
            read_policy: read_policy.unwrap_or_default(),
            write_policy: RetryPolicy::no_retries(write_timeout.unwrap_or(DEFAULT_WRITE_TIMEOUT)),
        }
    }

    /// First page of active survey questions.
    pub async fn survey_questions(
        &self,
        config: &OrganizationConfig<'_>,
        instance: &str,
    ) -> VanResult<ItemsPage<SurveyQuestion>> {
        self.get(config, instance, "surveyQuestions", "v4/surveyQuestions")
            .await
    }

    /// First page of active activist codes.
    pub async fn activist_codes(
        &self,
        config: &OrganizationConfig<'_>,
        instance: &str,
    ) -> VanResult<ItemsPage<ActivistCode>> {
        self.get(config, instance, "activistCodes", "v4/activistCodes")
            .await
    }

    pub async fn canvass_result_codes(
        &self,
        config: &OrganizationConfig<'_>,
        instance: &str,
    ) -> VanResult<Vec<ResultCode>> {
        self.get(
            config,
            instance,
            "canvassResponses/resultCodes",
            "v4/canvassResponses/resultCodes",
        )
        .await
    }

    /// First page of saved lists.
    pub async fn saved_lists(
        &self,
        config: &OrganizationConfig<'_>,
        instance: &str,
    ) -> VanResult<ItemsPage<SavedList>> {
        self.get(config, instance, "savedLists", "v4/savedLists").await
    }

    /// Report a canvass result for a person. Only `204 No Content` counts as
    /// success and the request is sent exactly once.
    pub async fn post_canvass_responses(
        &self,
        config: &OrganizationConfig<'_>,
        instance: &str,
        external_id: &str,
        body: &CanvassResponseRequest,
    ) -> VanResult<()> {
        if external_id.is_empty() {
            return Err(VanError::InvalidInput(
                "Contact has no external id to report canvass responses for".to_string(),
            ));
        }

        let url = make_url(&format!("v4/people/{external_id}/canvassResponses"), config);
        let headers = request_headers(&get_auth(config, instance)?)?;

        trace_request(
            RequestInfo {
                method: Method::POST,
                endpoint: "people/canvassResponses",
                url: &url,
                instance,
                expected_status: StatusCode::NO_CONTENT,
            },
            || {
                client_utils::post_json(
                    &self.client,
                    &url,
                    body,
                    headers,
                    StatusCode::NO_CONTENT,
                    &self.write_policy,
                )
            },
        )
        .await
    }

    async fn get<R: DeserializeOwned>(
        &self,
        config: &OrganizationConfig<'_>,
        instance: &str,
        endpoint: &'static str,
        path: &str,
    ) -> VanResult<R> {
        let url = make_url(path, config);
        let headers = request_headers(&get_auth(config, instance)?)?;

        trace_request(
            RequestInfo {
                method: Method::GET,
                endpoint,
                url: &url,
                instance,
                expected_status: StatusCode::OK,
            },
            || client_utils::get_json(&self.client, &url, headers, &self.read_policy),
        )
        .await
    }
}

fn request_headers(auth: &AuthToken) -> VanResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, auth.header_value()?);
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    Ok(headers)
}
