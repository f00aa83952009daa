//! Panel services — the caller-side halves of the boundary operations.
//!
//! ARCHITECTURE
//! ============
//! Service functions own what "done" means for each operation: which list
//! replaces, which panel closes, which banner shows. They execute commands
//! through the relay and dispatch their tail transitions through the same
//! dispatcher, so observed event order is exactly dispatch order.
//!
//! ERROR HANDLING
//! ==============
//! Relay failures arrive already terminal (loading cleared, banner shown)
//! and just propagate. The one failure born here, an undecodable payload,
//! gets the same terminal treatment before it propagates.

pub mod site;
pub mod siteproperty;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::envelope::{CommandRequest, EnvelopeError, ErrorCode, Target};
use crate::relay::{Relay, RelayError};
use crate::store::{AppMessage, Dispatcher};

// =============================================================================
// ERRORS
// =============================================================================

/// Failures surfaced by panel operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    /// The command succeeded but its payload does not decode into the
    /// records the panel expected.
    #[error("{op} returned an undecodable payload: {source}")]
    Decode {
        op: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ErrorCode for ServiceError {
    fn error_code(&self) -> &'static str {
        match self {
            ServiceError::Envelope(err) => err.error_code(),
            ServiceError::Relay(err) => err.error_code(),
            ServiceError::Decode { .. } => "E_DECODE",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            ServiceError::Relay(err) => err.retryable(),
            ServiceError::Envelope(_) | ServiceError::Decode { .. } => false,
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Everything one panel needs to reach its inspected document: the relay,
/// the target address, and the resource base forwarded on every command.
pub struct PanelSession {
    relay: Relay,
    target: Target,
    resource_base: Option<String>,
}

impl PanelSession {
    #[must_use]
    pub fn new(relay: Relay, target: Target) -> Self {
        Self { relay, target, resource_base: None }
    }

    #[must_use]
    pub fn with_resource_base(mut self, base: impl Into<String>) -> Self {
        self.resource_base = Some(base.into());
        self
    }

    #[must_use]
    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        self.relay.dispatcher()
    }

    #[must_use]
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Start a request against this session's target.
    fn request(&self, op: &str) -> CommandRequest {
        let request = CommandRequest::new(op, self.target.clone());
        match &self.resource_base {
            Some(base) => request.with_resource_base(base.clone()),
            None => request,
        }
    }
}

// =============================================================================
// SHARED HELPERS
// =============================================================================

/// Decode a list payload. `None` and `null` both mean an empty list.
fn decode_list<T: DeserializeOwned>(
    op: &'static str,
    payload: Option<Value>,
) -> Result<Vec<T>, ServiceError> {
    match payload {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => {
            serde_json::from_value(value).map_err(|source| ServiceError::Decode { op, source })
        }
    }
}

/// Terminal treatment for failures born on the service side. The relay
/// never saw them, so loading is cleared and the banner surfaced here.
async fn fail_terminal(dispatcher: &Dispatcher, err: ServiceError) -> ServiceError {
    dispatcher.set_loading(false).await;
    dispatcher.set_app_message(AppMessage::danger(err.to_string())).await;
    err
}

// =============================================================================
// TEST HELPERS
// =============================================================================
