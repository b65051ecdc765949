//! Operation deadlines and cancellation

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::provider::{ErrorKind, Operation, ProviderError};

/// Deadline used when a timeout does not fit on the clock
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Per-operation time limits of a resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceTimeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl ResourceTimeouts {
    pub const fn minutes(create: u64, read: u64, update: u64, delete: u64) -> Self {
        Self {
            create: Duration::from_secs(create * 60),
            read: Duration::from_secs(read * 60),
            update: Duration::from_secs(update * 60),
            delete: Duration::from_secs(delete * 60),
        }
    }

    pub fn for_operation(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }

    /// Replace the create, update and delete limits when an override is set
    pub fn with_override(self, mutating: Option<Duration>) -> Self {
        match mutating {
            Some(limit) => Self {
                create: limit,
                update: limit,
                delete: limit,
                ..self
            },
            None => self,
        }
    }
}

impl Default for ResourceTimeouts {
    fn default() -> Self {
        Self::minutes(30, 5, 30, 30)
    }
}

/// Why a wait was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Interrupted {
    #[error("deadline exceeded")]
    TimedOut,
    #[error("cancelled")]
    Cancelled,
}

impl From<Interrupted> for ProviderError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::TimedOut => ProviderError::new(ErrorKind::Timeout, "operation timed out"),
            Interrupted::Cancelled => {
                ProviderError::new(ErrorKind::Cancelled, "operation was cancelled")
            }
        }
    }
}

/// Deadline, poll cadence and cancellation of one handler invocation
#[derive(Debug, Clone)]
pub struct OperationContext {
    operation: Operation,
    deadline: Instant,
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl OperationContext {
    pub fn new(operation: Operation, timeout: Duration, poll_interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            operation,
            deadline: now
                .checked_add(timeout)
                .unwrap_or_else(|| now + FAR_FUTURE),
            poll_interval,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Drive `fut` unless the deadline passes or the token fires first
    pub async fn run<F, T>(&self, fut: F) -> Result<T, Interrupted>
    where
        F: Future<Output = T>,
    {
        if self.cancel.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Interrupted::Cancelled),
            _ = tokio::time::sleep_until(self.deadline) => Err(Interrupted::TimedOut),
            out = fut => Ok(out),
        }
    }

    /// Sleep for `delay`, capped at the deadline
    pub async fn sleep(&self, delay: Duration) -> Result<(), Interrupted> {
        let remaining = self.remaining();
        if remaining.is_zero() {
            return Err(Interrupted::TimedOut);
        }
        if delay >= remaining {
            self.run(tokio::time::sleep(remaining)).await?;
            return Err(Interrupted::TimedOut);
        }
        self.run(tokio::time::sleep(delay)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeouts() {
        let t = ResourceTimeouts::default();
        assert_eq!(t.for_operation(Operation::Create), Duration::from_secs(1800));
        assert_eq!(t.for_operation(Operation::Read), Duration::from_secs(300));
    }

    #[test]
    fn override_keeps_read() {
        let t = ResourceTimeouts::default().with_override(Some(Duration::from_secs(60)));
        assert_eq!(t.create, Duration::from_secs(60));
        assert_eq!(t.delete, Duration::from_secs(60));
        assert_eq!(t.read, Duration::from_secs(300));
    }

    #[tokio::test(start_paused = true)]
    async fn run_times_out() {
        let ctx = OperationContext::new(
            Operation::Create,
            Duration::from_secs(10),
            Duration::from_secs(1),
        );
        let result = ctx.run(std::future::pending::<()>()).await;
        assert_eq!(result, Err(Interrupted::TimedOut));
    }

    #[tokio::test(start_paused = true)]
    async fn run_observes_cancellation() {
        let token = CancellationToken::new();
        let ctx = OperationContext::new(
            Operation::Delete,
            Duration::from_secs(60),
            Duration::from_secs(1),
        )
        .with_cancellation(token.clone());

        let cancel = async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            token.cancel();
        };
        let (result, _) = tokio::join!(ctx.run(std::future::pending::<()>()), cancel);
        assert_eq!(result, Err(Interrupted::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_is_capped_at_deadline() {
        let ctx = OperationContext::new(
            Operation::Update,
            Duration::from_secs(5),
            Duration::from_secs(1),
        );
        let start = Instant::now();
        assert_eq!(
            ctx.sleep(Duration::from_secs(60)).await,
            Err(Interrupted::TimedOut)
        );
        assert_eq!(start.elapsed(), Duration::from_secs(5));
        assert!(ctx.remaining().is_zero());
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_timeout_uses_far_deadline() {
        let ctx = OperationContext::new(Operation::Create, Duration::MAX, Duration::from_secs(1));
        assert!(ctx.remaining() > Duration::from_secs(86_400 * 365));
        assert_eq!(ctx.run(async { 7 }).await, Ok(7));
    }

    #[test]
    fn interrupted_maps_to_error_kind() {
        let err: ProviderError = Interrupted::TimedOut.into();
        assert_eq!(err.kind, ErrorKind::Timeout);
        let err: ProviderError = Interrupted::Cancelled.into();
        assert_eq!(err.kind, ErrorKind::Cancelled);
    }
}
