//! Host — an in-process destination context for command execution.
//!
//! ARCHITECTURE
//! ============
//! `ScriptHost` plays the destination side of the boundary: a registry of
//! named commands bound to one `SiteDocument`, addressed by one `Target`.
//! The relay stays oblivious; it sees only the `ScriptExecutor` trait.
//!
//! DESIGN
//! ======
//! - Commands resolve by name in the registry. Nothing re-evaluates source
//!   text; an unregistered name is `E_UNKNOWN_COMMAND`.
//! - Each call runs in its own spawned task. A panicking command therefore
//!   yields an entry with no structured outcome, the same face a torn-down
//!   page shows the caller.
//! - `detach` models the document going away: subsequent calls fail with
//!   `E_TARGET_UNREACHABLE` instead of hanging.

mod commands;
mod document;

pub use document::{DocumentError, SiteDocument};

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::envelope::{CommandRequest, Injection, Outcome, Target, World};
use crate::executor::{ExecutorError, ScriptExecutor};

// =============================================================================
// COMMANDS
// =============================================================================

/// Boxed future every command returns.
pub type CommandFuture = Pin<Box<dyn Future<Output = Outcome> + Send>>;

/// Context handed to a command at call time.
pub struct CommandEnv {
    /// The document the command runs against.
    pub document: Arc<SiteDocument>,
    /// Caller-provided base for resolving caller-bundled resources from
    /// inside the destination. Passed through untouched.
    pub resource_base: Option<String>,
}

/// A named command the host can resolve and run.
pub trait CommandFn: Send + Sync {
    fn call(&self, args: Vec<Value>, env: CommandEnv) -> CommandFuture;
}

impl<F> CommandFn for F
where
    F: Fn(Vec<Value>, CommandEnv) -> CommandFuture + Send + Sync,
{
    fn call(&self, args: Vec<Value>, env: CommandEnv) -> CommandFuture {
        self(args, env)
    }
}

// =============================================================================
// HOST
// =============================================================================

/// One destination context: a command registry bound to a document.
pub struct ScriptHost {
    target: Target,
    document: Arc<SiteDocument>,
    commands: RwLock<HashMap<String, Arc<dyn CommandFn>>>,
    attached: AtomicBool,
}

impl ScriptHost {
    /// Host with an empty registry.
    #[must_use]
    pub fn new(target: Target, document: Arc<SiteDocument>) -> Self {
        Self {
            target,
            document,
            commands: RwLock::new(HashMap::new()),
            attached: AtomicBool::new(true),
        }
    }

    /// Host with the site-property and site-search commands registered.
    #[must_use]
    pub fn with_builtin_commands(target: Target, document: Arc<SiteDocument>) -> Self {
        let host = Self::new(target, document);
        commands::register_builtins(&host);
        host
    }

    /// Register `command` under `op`, replacing any previous registration.
    pub fn register(&self, op: impl Into<String>, command: impl CommandFn + 'static) {
        let mut commands = self
            .commands
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        commands.insert(op.into(), Arc::new(command));
    }

    #[must_use]
    pub fn target(&self) -> &Target {
        &self.target
    }

    #[must_use]
    pub fn document(&self) -> &Arc<SiteDocument> {
        &self.document
    }

    /// Tear the context down. Models the document closing or navigating;
    /// every later call fails fast as unreachable.
    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    fn command(&self, op: &str) -> Option<Arc<dyn CommandFn>> {
        let commands = self
            .commands
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        commands.get(op).cloned()
    }
}

#[async_trait]
impl ScriptExecutor for ScriptHost {
    async fn execute(&self, request: &CommandRequest) -> Result<Vec<Injection>, ExecutorError> {
        if !self.is_attached() || request.target != self.target {
            return Err(ExecutorError::TargetUnreachable(request.target.to_string()));
        }
        if request.world != World::Main {
            return Err(ExecutorError::WorldUnavailable {
                target: request.target.to_string(),
                world: request.world,
            });
        }
        let Some(command) = self.command(&request.op) else {
            return Err(ExecutorError::UnknownCommand(request.op.clone()));
        };

        debug!(op = %request.op, target = %request.target, "host: run command");
        let env = CommandEnv {
            document: Arc::clone(&self.document),
            resource_base: request.resource_base.clone(),
        };
        let args = request.args.clone();
        let handle = tokio::spawn(async move { command.call(args, env).await });

        match handle.await {
            Ok(outcome) => Ok(vec![Injection::of(outcome)]),
            Err(err) => {
                warn!(op = %request.op, error = %err, "host: command crashed without an outcome");
                Ok(vec![Injection::empty()])
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
