//! Long-running operation pollers
//!
//! ARM reports asynchronous work in one of three ways: an
//! `Azure-AsyncOperation` status URL, a `Location` URL that answers 202 until
//! done, or a `provisioningState` on the resource itself. A [`Poller`] picks
//! the strategy from the initial response and implements [`PollSource`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use stratus_core::poll::{PollOutcome, PollSource, PollState, poll_until_done};
use stratus_core::timeouts::OperationContext;
use url::Url;

use super::client::{ArmClient, decode};
use super::error::{ApiError, ErrorDetail};
use super::transport::HttpResponse;

#[derive(Debug, Clone)]
enum Strategy {
    /// Nothing left to wait for
    Finished(PollState),
    AsyncOperation(Url),
    Location(Url),
    ProvisioningState(Url),
}

/// Handle on a mutating call that may still be running remotely
#[derive(Debug)]
pub struct Poller {
    client: ArmClient,
    strategy: Strategy,
    tolerate_not_found: bool,
    retry_after: Option<Duration>,
}

#[derive(Debug, Default, Deserialize)]
struct OperationStatus {
    #[serde(default)]
    status: String,
    error: Option<ErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProvisioningProperties {
    provisioning_state: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProvisioningEnvelope {
    properties: Option<ProvisioningProperties>,
}

fn provisioning_state(body: &str) -> Option<String> {
    serde_json::from_str::<ProvisioningEnvelope>(body)
        .ok()
        .and_then(|e| e.properties)
        .and_then(|p| p.provisioning_state)
}

fn classify(status: &str, error: Option<ErrorDetail>) -> PollState {
    match status.to_ascii_lowercase().as_str() {
        "" | "succeeded" => PollState::Succeeded,
        "failed" | "canceled" | "cancelled" => PollState::Failed {
            message: match error {
                Some(detail) if !detail.message.is_empty() => {
                    format!("{}: {}", detail.code, detail.message)
                }
                _ => format!("operation finished with status {:?}", status),
            },
        },
        _ => PollState::Pending { retry_after: None },
    }
}

fn retry_after(response: &HttpResponse) -> Option<Duration> {
    response
        .header("retry-after")
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

impl Poller {
    /// A poller for a call that completed synchronously
    pub fn done(client: ArmClient) -> Self {
        Self {
            client,
            strategy: Strategy::Finished(PollState::Succeeded),
            tolerate_not_found: false,
            retry_after: None,
        }
    }

    pub(crate) fn from_response(
        client: ArmClient,
        method: &Method,
        request_url: Url,
        response: &HttpResponse,
        tolerate_not_found: bool,
    ) -> Self {
        let header_url = |name: &str| response.header(name).and_then(|v| Url::parse(v).ok());

        let strategy = if let Some(url) = header_url("azure-asyncoperation") {
            Strategy::AsyncOperation(url)
        } else if let Some(url) = header_url("location").filter(|_| response.status == 202) {
            Strategy::Location(url)
        } else if *method == Method::PUT || *method == Method::PATCH {
            match provisioning_state(&response.body) {
                Some(state) => match classify(&state, None) {
                    PollState::Pending { .. } => Strategy::ProvisioningState(request_url),
                    terminal => Strategy::Finished(terminal),
                },
                None => Strategy::Finished(PollState::Succeeded),
            }
        } else {
            Strategy::Finished(PollState::Succeeded)
        };

        Self {
            client,
            strategy,
            tolerate_not_found,
            retry_after: retry_after(response),
        }
    }

    /// True when there is nothing to poll
    pub fn is_finished(&self) -> bool {
        matches!(self.strategy, Strategy::Finished(_))
    }

    /// Poll until a terminal state, the deadline or cancellation
    pub async fn wait(mut self, ctx: &OperationContext) -> Result<PollOutcome, ApiError> {
        poll_until_done(&mut self, ctx).await
    }

    async fn fetch(&self, url: &Url) -> Result<Option<HttpResponse>, ApiError> {
        match self.client.get_url(url.clone()).await {
            Ok(response) => Ok(Some(response)),
            Err(e) if e.was_not_found() && self.tolerate_not_found => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl PollSource for Poller {
    type Error = ApiError;

    async fn poll(&mut self) -> Result<PollState, ApiError> {
        let url = match &self.strategy {
            Strategy::Finished(state) => return Ok(state.clone()),
            Strategy::AsyncOperation(url)
            | Strategy::Location(url)
            | Strategy::ProvisioningState(url) => url.clone(),
        };

        // The first poll honors the hint on the initial response
        if let Some(delay) = self.retry_after.take() {
            return Ok(PollState::Pending {
                retry_after: Some(delay),
            });
        }

        let Some(response) = self.fetch(&url).await? else {
            return Ok(PollState::Succeeded);
        };
        let hint = retry_after(&response);

        let state = match &self.strategy {
            Strategy::AsyncOperation(_) => {
                let status: OperationStatus = decode(&url, &response.body)?;
                if status.status.is_empty() {
                    PollState::Pending { retry_after: None }
                } else {
                    classify(&status.status, status.error)
                }
            }
            Strategy::Location(_) => {
                if response.status == 202 {
                    PollState::Pending { retry_after: None }
                } else {
                    PollState::Succeeded
                }
            }
            Strategy::ProvisioningState(_) => {
                classify(&provisioning_state(&response.body).unwrap_or_default(), None)
            }
            Strategy::Finished(state) => state.clone(),
        };

        Ok(match state {
            PollState::Pending { .. } => PollState::Pending { retry_after: hint },
            terminal => terminal,
        })
    }
}
