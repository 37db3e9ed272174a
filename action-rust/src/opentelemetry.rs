use crate::ActionResult;
use opentelemetry::trace::Status;
use std::{error::Error, future::Future};
use tracing::{info_span, Span};
use tracing_futures::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

#[derive(Clone, Copy)]
pub enum ActionSpanMethod {
    GetClientChoiceData,
    ProcessAction,
}

impl ActionSpanMethod {
    fn as_str(self) -> &'static str {
        match self {
            Self::GetClientChoiceData => "get_client_choice_data",
            Self::ProcessAction => "process_action",
        }
    }
}

pub struct ActionSpan {
    span: Span,
}

impl ActionSpan {
    pub fn new(handler_name: &str, organization_id: Option<i64>, method: ActionSpanMethod) -> Self {
        let span = match method {
            ActionSpanMethod::GetClientChoiceData => {
                info_span!("van_action.get_client_choice_data")
            }
            ActionSpanMethod::ProcessAction => info_span!("van_action.process_action"),
        };
        span.set_attribute("van_action.handler", handler_name.to_string());
        span.set_attribute("van_action.method", method.as_str());
        if let Some(organization_id) = organization_id {
            span.set_attribute("van_action.organization_id", organization_id);
        }

        Self { span }
    }

    pub fn span(&self) -> Span {
        self.span.clone()
    }

    pub fn set_attribute(&self, key: &'static str, value: i64) {
        self.span.set_attribute(key, value);
    }

    pub fn on_error(&self, error: &(dyn Error + 'static)) {
        self.span
            .set_attribute("exception.message", error.to_string());
        self.span.set_status(Status::error(error.to_string()));
    }
}

/// Run a handler operation inside its span, recording a failure on the span.
pub async fn trace_action<T, Fut>(span: ActionSpan, future: Fut) -> ActionResult<T>
where
    Fut: Future<Output = ActionResult<T>>,
{
    let result = future.instrument(span.span()).await;
    if let Err(error) = &result {
        span.on_error(error);
    }
    result
}
