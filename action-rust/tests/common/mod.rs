#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::Value;
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{net::TcpListener, sync::oneshot};

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
    pub delay: Option<Duration>,
}

impl StubResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status: StatusCode::from_u16(status).expect("valid status"),
            body: Some(body),
            delay: None,
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status: StatusCode::from_u16(status).expect("valid status"),
            body: None,
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct SharedState {
    routes: Mutex<HashMap<(Method, String), VecDeque<StubResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl SharedState {
    /// Queued responses are served in order; the last one is repeated.
    fn next_response(&self, method: &Method, path: &str) -> Option<StubResponse> {
        let mut routes = self.routes.lock().unwrap();
        let queue = routes.get_mut(&(method.clone(), path.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

/// An in-process stand-in for the VAN API.
pub struct StubVan {
    url: String,
    state: Arc<SharedState>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

impl StubVan {
    pub async fn start() -> Result<Self, BoxedError> {
        let state = Arc::new(SharedState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("http://{}", listener.local_addr()?);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });

            if let Err(err) = server.await {
                eprintln!("VAN stub server error: {err}");
            }
        });

        Ok(Self {
            url,
            state,
            shutdown: Some(shutdown_tx),
            handle,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn on(&self, method: Method, path: &str, responses: Vec<StubResponse>) {
        self.state
            .routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), responses.into());
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }

    pub async fn stop(mut self) -> Result<(), BoxedError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await?;
        Ok(())
    }
}

async fn handle(
    State(state): State<Arc<SharedState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        authorization: headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string),
        body: serde_json::from_slice(&body).ok(),
    });

    let Some(response) = state.next_response(&method, &path) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if let Some(delay) = response.delay {
        tokio::time::sleep(delay).await;
    }

    match response.body {
        Some(body) => (response.status, Json(body)).into_response(),
        None => response.status.into_response(),
    }
}

pub fn survey_questions_fixture() -> Value {
    serde_json::json!({
        "items": [
            {
                "surveyQuestionId": 378552,
                "type": "GOTV",
                "cycle": 2020,
                "name": "2020VotePPE",
                "mediumName": "2020VoteP",
                "shortName": "2020",
                "scriptQuestion": "Can we count on you to vote in the 2020 Presidential Primary Election? How do you plan to vote?",
                "status": "Active",
                "responses": [
                    { "surveyResponseId": 1555791, "name": "Yes - Early", "mediumName": "YEa", "shortName": "E" },
                    { "surveyResponseId": 1555792, "name": "Yes - Eday", "mediumName": "YEd", "shortName": "D" },
                    { "surveyResponseId": 1555793, "name": "Yes - Absentee", "mediumName": "YAb", "shortName": "A" },
                    { "surveyResponseId": 1555794, "name": "Maybe", "mediumName": "May", "shortName": "M" },
                    { "surveyResponseId": 1555795, "name": "No", "mediumName": "No", "shortName": "N" }
                ]
            },
            {
                "surveyQuestionId": 381390,
                "type": "GOTV",
                "cycle": 2020,
                "name": "2020VoteTime",
                "mediumName": "2020VoteT",
                "shortName": "2020",
                "scriptQuestion": "What time of the day do you plan to vote?",
                "status": "Active",
                "responses": [
                    { "surveyResponseId": 1566012, "name": "Morning", "mediumName": "Mor", "shortName": "M" },
                    { "surveyResponseId": 1566013, "name": "Afternoon", "mediumName": "Aft", "shortName": "A" },
                    { "surveyResponseId": 1566014, "name": "Evening", "mediumName": "Eve", "shortName": "E" }
                ]
            }
        ],
        "nextPageLink": null,
        "count": 2
    })
}

pub fn activist_codes_fixture() -> Value {
    serde_json::json!({
        "items": [
            {
                "activistCodeId": 4482459,
                "type": "Constituency/Issue",
                "name": "EdayIssue-PollWorker",
                "mediumName": "EdayIssue",
                "shortName": "Eda",
                "description": null,
                "scriptQuestion": null,
                "status": "Active"
            },
            {
                "activistCodeId": 4153148,
                "type": "Constituency/Issue",
                "name": "Opt-In: Cell Phone",
                "mediumName": "Cell Phon",
                "shortName": "Cel",
                "description": "Opt-In: Cell Phone",
                "scriptQuestion": null,
                "status": "Active"
            }
        ],
        "nextPageLink": null,
        "count": 2
    })
}

pub fn result_codes_fixture() -> Value {
    serde_json::json!([
        { "resultCodeId": 18, "name": "Busy", "mediumName": "Busy", "shortName": "BZ" },
        { "resultCodeId": 17, "name": "Call Back", "mediumName": "CB", "shortName": "CB" },
        { "resultCodeId": 14, "name": "Canvassed", "mediumName": "Canv", "shortName": "CV" }
    ])
}
