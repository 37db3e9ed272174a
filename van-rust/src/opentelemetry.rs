use crate::{VanError, VanResult};
use opentelemetry::trace::Status;
use reqwest::{Method, StatusCode};
use std::time::Instant;
use tracing::{info_span, Span};
use tracing_futures::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// What is being requested from VAN, recorded on the request span.
#[derive(Debug, Clone)]
pub struct RequestInfo<'a> {
    pub method: Method,
    /// Short endpoint name, e.g. `surveyQuestions`.
    pub endpoint: &'static str,
    pub url: &'a str,
    pub instance: &'a str,
    pub expected_status: StatusCode,
}

pub struct VanSpan {
    span: Span,
    start_time: Instant,
    status_code: Option<StatusCode>,
}

impl VanSpan {
    pub fn new(info: &RequestInfo<'_>) -> Self {
        let span = info_span!("van_sdk.request");
        span.set_attribute("http.request.method", info.method.to_string());
        span.set_attribute("url.full", info.url.to_string());
        span.set_attribute("van.endpoint", info.endpoint);
        span.set_attribute("van.instance", info.instance.to_string());

        Self {
            span,
            start_time: Instant::now(),
            status_code: None,
        }
    }

    fn span(&self) -> Span {
        self.span.clone()
    }

    pub async fn instrument_future<F>(&self, future: F) -> F::Output
    where
        F: std::future::Future,
    {
        future.instrument(self.span()).await
    }

    pub fn on_success(&mut self, status_code: StatusCode) {
        self.status_code = Some(status_code);
    }

    pub fn on_error(&mut self, error: &VanError) {
        if let VanError::StatusCode(status_code, _) = error {
            self.status_code = Some(*status_code);
        }
        self.span
            .set_attribute("exception.message", error.to_string());
        self.span.set_status(Status::error(error.to_string()));
    }

    pub fn on_end(&mut self) {
        if let Some(status_code) = self.status_code {
            self.span.set_attribute(
                "http.response.status_code",
                i64::from(status_code.as_u16()),
            );
        }
        self.span.set_attribute(
            "van.duration_seconds",
            self.start_time.elapsed().as_secs_f64(),
        );
    }
}

/// Run one VAN request inside a `van_sdk.request` span.
pub async fn trace_request<F, Fut, T>(info: RequestInfo<'_>, f: F) -> VanResult<T>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = VanResult<T>>,
{
    let mut span = VanSpan::new(&info);
    let result = span.instrument_future(f()).await;

    match &result {
        Ok(_) => span.on_success(info.expected_status),
        Err(error) => span.on_error(error),
    }

    span.on_end();
    result
}
