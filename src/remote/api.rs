use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Body of `GET /api/disassemble`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailResponse {
    Success { code: String },
    Failure { message: String },
}

/// The answer to a detail request for the cell at column `x`, row `y`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailOutcome {
    pub x: usize,
    pub y: usize,
    pub result: Result<String, String>,
}

impl DetailOutcome {
    fn from_response(x: usize, y: usize, response: DetailResponse) -> Self {
        let result = match response {
            DetailResponse::Success { code } => Ok(code),
            DetailResponse::Failure { message } => Err(message),
        };
        DetailOutcome { x, y, result }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiEvent {
    Detail(DetailOutcome),
    Observed(usize),
    ObserveFailed { island: usize, error: String },
}

/// Blocking HTTP client whose calls run on worker threads.
///
/// Results come back through [`RemoteApi::poll`], so the UI loop never waits
/// on the network.
pub struct RemoteApi {
    base: String,
    client: Client,
    events_tx: Sender<ApiEvent>,
    events: Receiver<ApiEvent>,
}

impl RemoteApi {
    pub fn new(base: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        let (events_tx, events) = mpsc::channel();
        Ok(RemoteApi {
            base: base.into().trim_end_matches('/').to_string(),
            client,
            events_tx,
            events,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Ask the server for the program of the computer at column `x`, row `y`.
    pub fn request_detail(&self, x: usize, y: usize) {
        let client = self.client.clone();
        let url = format!("{}/api/disassemble", self.base);
        let tx = self.events_tx.clone();
        self.spawn("detail-request", move || {
            let outcome = match fetch_detail(&client, &url, x, y) {
                Ok(response) => DetailOutcome::from_response(x, y, response),
                Err(err) => {
                    warn!(x, y, error = %format!("{err:#}"), "detail request failed");
                    DetailOutcome {
                        x,
                        y,
                        result: Err(format!("{err:#}")),
                    }
                }
            };
            let _ = tx.send(ApiEvent::Detail(outcome));
        });
    }

    /// Tell the server which island the snapshot feed should describe.
    pub fn observe(&self, island: usize) {
        let client = self.client.clone();
        let url = format!("{}/api/observe", self.base);
        let tx = self.events_tx.clone();
        self.spawn("observe-request", move || {
            let event = match post_observe(&client, &url, island) {
                Ok(()) => ApiEvent::Observed(island),
                Err(err) => {
                    warn!(island, error = %format!("{err:#}"), "observe request failed");
                    ApiEvent::ObserveFailed {
                        island,
                        error: format!("{err:#}"),
                    }
                }
            };
            let _ = tx.send(event);
        });
    }

    pub fn poll(&self) -> Vec<ApiEvent> {
        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        events
    }

    fn spawn(&self, name: &str, job: impl FnOnce() + Send + 'static) {
        if let Err(err) = thread::Builder::new().name(name.into()).spawn(job) {
            warn!(%err, name, "could not spawn request thread");
        }
    }
}

fn fetch_detail(client: &Client, url: &str, x: usize, y: usize) -> Result<DetailResponse> {
    debug!(x, y, "requesting cell detail");
    let response = client
        .get(url)
        .query(&[("x", x), ("y", y)])
        .send()
        .context("detail request failed")?
        .error_for_status()?;
    response.json().context("unexpected detail response")
}

fn post_observe(client: &Client, url: &str, island: usize) -> Result<()> {
    debug!(island, "requesting observed island");
    client
        .post(url)
        .query(&[("island_id", island)])
        .send()
        .context("observe request failed")?
        .error_for_status()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_response_is_externally_tagged() {
        let ok: DetailResponse = serde_json::from_str(r#"{"Success":{"code":"mov r0, 1"}}"#).unwrap();
        assert_eq!(
            DetailOutcome::from_response(4, 3, ok).result,
            Ok("mov r0, 1".to_string())
        );

        let failed: DetailResponse =
            serde_json::from_str(r#"{"Failure":{"message":"no computer at 4,3"}}"#).unwrap();
        let outcome = DetailOutcome::from_response(4, 3, failed);
        assert_eq!((outcome.x, outcome.y), (4, 3));
        assert_eq!(outcome.result, Err("no computer at 4,3".to_string()));
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let api = RemoteApi::new("http://localhost:3000/").unwrap();
        assert_eq!(api.base(), "http://localhost:3000");
        assert!(api.poll().is_empty());
    }

    #[test]
    fn unreachable_server_reports_failure() {
        // Port 9 (discard) is closed on test machines; the request fails fast.
        let api = RemoteApi::new("http://127.0.0.1:9").unwrap();
        api.request_detail(1, 2);
        let deadline = std::time::Instant::now() + Duration::from_secs(15);
        let event = loop {
            if let Some(event) = api.poll().into_iter().next() {
                break event;
            }
            assert!(std::time::Instant::now() < deadline, "no detail outcome");
            thread::sleep(Duration::from_millis(10));
        };
        match event {
            ApiEvent::Detail(outcome) => {
                assert_eq!((outcome.x, outcome.y), (1, 2));
                assert!(outcome.result.is_err());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
