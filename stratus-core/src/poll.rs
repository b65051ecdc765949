//! Poll - Drive long-running operations to a terminal state
//!
//! Mutating calls against the remote API may hand back an operation that
//! finishes later. A [`PollSource`] reports where such an operation is; the
//! loop in [`poll_until_done`] keeps asking until it reaches a terminal state,
//! the deadline in the [`OperationContext`] passes, or the caller cancels.

use std::time::Duration;

use async_trait::async_trait;

use crate::provider::{ErrorKind, ProviderError};
use crate::timeouts::{Interrupted, OperationContext};

/// State reported by one poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// Still running; the remote may suggest when to ask again
    Pending { retry_after: Option<Duration> },
    Succeeded,
    Failed { message: String },
}

/// Terminal result of a poll loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Succeeded,
    Failed(String),
    TimedOut,
    Cancelled,
}

impl PollOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PollOutcome::Succeeded)
    }

    /// Map anything but success to a [`ProviderError`]
    pub fn into_result(self) -> Result<(), ProviderError> {
        match self {
            PollOutcome::Succeeded => Ok(()),
            PollOutcome::Failed(message) => Err(ProviderError::new(
                ErrorKind::OperationFailed,
                format!("long-running operation failed: {}", message),
            )),
            PollOutcome::TimedOut => Err(Interrupted::TimedOut.into()),
            PollOutcome::Cancelled => Err(Interrupted::Cancelled.into()),
        }
    }
}

impl From<Interrupted> for PollOutcome {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::TimedOut => PollOutcome::TimedOut,
            Interrupted::Cancelled => PollOutcome::Cancelled,
        }
    }
}

/// Something that can report the state of a long-running operation
#[async_trait]
pub trait PollSource: Send {
    type Error: Send;

    /// Ask the remote once
    async fn poll(&mut self) -> Result<PollState, Self::Error>;
}

/// Poll `source` until it is done, honoring the deadline and cancellation of `ctx`
///
/// Errors from the source itself are returned as-is; everything else ends up
/// in the [`PollOutcome`].
pub async fn poll_until_done<S>(source: &mut S, ctx: &OperationContext) -> Result<PollOutcome, S::Error>
where
    S: PollSource + ?Sized,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let state = match ctx.run(source.poll()).await {
            Ok(state) => state?,
            Err(interrupted) => return Ok(interrupted.into()),
        };
        log::debug!("Poll attempt {} ({}): {:?}", attempt, ctx.operation(), state);

        match state {
            PollState::Succeeded => return Ok(PollOutcome::Succeeded),
            PollState::Failed { message } => return Ok(PollOutcome::Failed(message)),
            PollState::Pending { retry_after } => {
                let delay = retry_after.unwrap_or_else(|| ctx.poll_interval());
                if let Err(interrupted) = ctx.sleep(delay).await {
                    return Ok(interrupted.into());
                }
            }
        }
    }
}
