//! Executor — the seam between the relay and the injection mechanism.
//!
//! DESIGN
//! ======
//! The relay never talks to a destination directly; it hands a
//! `CommandRequest` to a `ScriptExecutor` and gets back the raw
//! execution-result list. Failures split in two: the mechanism failing to
//! deliver or run the command at all is an `ExecutorError`, while a command
//! that ran and reported a problem arrives as a structured `Outcome` with
//! `success: false`. The split matters because only mechanism failures say
//! anything about the target's health.

use async_trait::async_trait;

use crate::envelope::{CommandRequest, ErrorCode, Injection, World};

// =============================================================================
// ERRORS
// =============================================================================

/// Mechanism failures raised by the injection boundary itself.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// No command with the requested name exists in the destination.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The destination document is gone, detached, or never existed.
    #[error("target {0} unreachable")]
    TargetUnreachable(String),

    /// The destination cannot host the requested execution world.
    #[error("world {world:?} unavailable on target {target}")]
    WorldUnavailable { target: String, world: World },

    /// Delivery failed for another reason, e.g. a teardown race.
    #[error("execution failed: {0}")]
    Failed(String),
}

impl ErrorCode for ExecutorError {
    fn error_code(&self) -> &'static str {
        match self {
            ExecutorError::UnknownCommand(_) => "E_UNKNOWN_COMMAND",
            ExecutorError::TargetUnreachable(_) => "E_TARGET_UNREACHABLE",
            ExecutorError::WorldUnavailable { .. } => "E_WORLD_UNAVAILABLE",
            ExecutorError::Failed(_) => "E_EXECUTOR_FAILED",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, ExecutorError::TargetUnreachable(_))
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// Runs one command inside a destination context.
///
/// Implementations return the execution-result list as the boundary
/// produced it; interpreting the entries is the relay's job.
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    /// # Errors
    /// Returns [`ExecutorError`] when the command cannot be delivered or
    /// run. Commands that ran and failed report through their `Outcome`
    /// instead.
    async fn execute(&self, request: &CommandRequest) -> Result<Vec<Injection>, ExecutorError>;
}

// =============================================================================
// TESTS
// =============================================================================
