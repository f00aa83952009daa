//! Relay — inject a command, await one outcome, reconcile it into state.
//!
//! ARCHITECTURE
//! ============
//! `execute` is the only road across the boundary. It raises the loading
//! flag, hands the request to the `ScriptExecutor`, waits (bounded) for the
//! execution-result list, inspects exactly one entry, and either returns the
//! success payload or dispatches the terminal failure transitions itself.
//!
//! DESIGN
//! ======
//! - Success returns the payload and leaves loading raised: what "done"
//!   means (replace a list, show a banner, chain another command) belongs
//!   to the caller, which clears loading as part of it.
//! - Every failure path is terminal: loading cleared, danger banner
//!   dispatched, typed error returned. A hung or vanished target becomes
//!   `E_TARGET_UNREACHABLE` when the outcome timeout lapses; there is no
//!   wait without a bound.
//! - `execute_settled` layers the write-consistency loop on top: delay,
//!   re-query, back off, give up after a fixed attempt budget and use the
//!   last payload anyway.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::envelope::{CommandRequest, ErrorCode};
use crate::executor::{ExecutorError, ScriptExecutor};
use crate::store::{AppMessage, Dispatcher};

// =============================================================================
// ERRORS
// =============================================================================

/// Failures surfaced by one relay execution.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The command ran and reported a structured failure. Display is the
    /// command's own message, shown to the user verbatim.
    #[error("{message}")]
    Command { message: String },

    /// The boundary returned no structured outcome. Usually the destination
    /// was torn down or navigated away mid-call.
    #[error("no structured outcome from target {target}; the context may be gone")]
    NoResult { target: String },

    /// Nothing at all came back before the bounded wait lapsed.
    #[error("target {target} unreachable: no outcome within {waited:?}")]
    TargetUnreachable { target: String, waited: Duration },

    /// The injection mechanism failed outright.
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl ErrorCode for RelayError {
    fn error_code(&self) -> &'static str {
        match self {
            RelayError::Command { .. } => "E_COMMAND_FAILED",
            RelayError::NoResult { .. } => "E_NO_RESULT",
            RelayError::TargetUnreachable { .. } => "E_TARGET_UNREACHABLE",
            RelayError::Executor(err) => err.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            RelayError::TargetUnreachable { .. } => true,
            RelayError::Executor(err) => err.retryable(),
            RelayError::Command { .. } | RelayError::NoResult { .. } => false,
        }
    }
}

// =============================================================================
// RELAY
// =============================================================================

/// Bridges callers to a destination context through a `ScriptExecutor`.
pub struct Relay {
    executor: Arc<dyn ScriptExecutor>,
    dispatcher: Dispatcher,
    config: RelayConfig,
}

impl Relay {
    #[must_use]
    pub fn new(executor: Arc<dyn ScriptExecutor>, dispatcher: Dispatcher, config: RelayConfig) -> Self {
        Self { executor, dispatcher, config }
    }

    /// The dispatcher this relay reports through. Callers use the same one
    /// so their transitions interleave in dispatch order.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Execute one command and wait for its single outcome.
    ///
    /// Raises loading first, then resolves to exactly one of:
    /// - `Ok(payload)`: structured success. Loading stays raised; the
    ///   caller dispatches its own tail and clears it.
    /// - `Err(_)`: any failure. Loading is already cleared and a danger
    ///   banner dispatched before this returns.
    ///
    /// # Errors
    /// [`RelayError::Command`] for structured failures,
    /// [`RelayError::NoResult`] when the boundary produced no outcome,
    /// [`RelayError::TargetUnreachable`] when the wait lapsed, and
    /// [`RelayError::Executor`] for mechanism failures.
    pub async fn execute(&self, request: &CommandRequest) -> Result<Option<Value>, RelayError> {
        self.dispatcher.set_loading(true).await;
        info!(id = %request.id, op = %request.op, target = %request.target, "relay: execute");

        let injections = match timeout(self.config.result_timeout, self.executor.execute(request)).await {
            Ok(Ok(injections)) => injections,
            Ok(Err(err)) => return Err(self.fail(request, RelayError::Executor(err)).await),
            Err(_) => {
                let err = RelayError::TargetUnreachable {
                    target: request.target.to_string(),
                    waited: self.config.result_timeout,
                };
                return Err(self.fail(request, err).await);
            }
        };

        let Some(outcome) = injections.into_iter().next().and_then(|entry| entry.result) else {
            let err = RelayError::NoResult { target: request.target.to_string() };
            return Err(self.fail(request, err).await);
        };

        if outcome.success {
            debug!(id = %request.id, op = %request.op, "relay: success");
            return Ok(outcome.result);
        }

        let message = outcome
            .error_message
            .unwrap_or_else(|| format!("{} failed without a message", request.op));
        Err(self.fail(request, RelayError::Command { message }).await)
    }

    /// Execute a query until `accept` passes on its payload or the attempt
    /// budget runs out.
    ///
    /// Used after writes: the destination acknowledges before the written
    /// record is visible to reads, so the caller waits the settle delay,
    /// queries, and backs off between re-queries. The last payload is
    /// returned even when never accepted, so state still reconciles to
    /// whatever the destination can currently see.
    ///
    /// # Errors
    /// Any attempt failing propagates its [`RelayError`]; the terminal
    /// transitions have already been dispatched by [`Relay::execute`].
    pub async fn execute_settled<F>(
        &self,
        request: &CommandRequest,
        accept: F,
    ) -> Result<Option<Value>, RelayError>
    where
        F: Fn(Option<&Value>) -> bool + Send,
    {
        let settle = self.config.settle;
        sleep(settle.initial_delay).await;

        let mut attempt = 1u32;
        loop {
            let attempt_request = if attempt == 1 { request.clone() } else { request.reissue() };
            let payload = self.execute(&attempt_request).await?;

            if accept(payload.as_ref()) {
                if attempt > 1 {
                    info!(op = %request.op, attempt, "relay: settled after re-query");
                }
                return Ok(payload);
            }
            if attempt >= settle.max_attempts {
                warn!(op = %request.op, attempt, "relay: settle budget spent, using last payload");
                return Ok(payload);
            }

            let delay = settle.backoff_delay(attempt);
            debug!(op = %request.op, attempt, ?delay, "relay: record not visible yet, backing off");
            sleep(delay).await;
            attempt += 1;
        }
    }

    /// Terminal failure: clear loading, surface a danger banner, hand the
    /// error back. Every failing execution funnels through here, so no
    /// path can leave the loading flag stuck.
    async fn fail(&self, request: &CommandRequest, err: RelayError) -> RelayError {
        warn!(
            id = %request.id,
            op = %request.op,
            code = err.error_code(),
            retryable = err.retryable(),
            error = %err,
            "relay: command failed"
        );
        self.dispatcher.set_loading(false).await;
        self.dispatcher.set_app_message(AppMessage::danger(err.to_string())).await;
        err
    }
}

#[cfg(test)]
#[path = "relay_test.rs"]
mod tests;
