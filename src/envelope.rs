//! Envelope — the message types crossing the injection boundary.
//!
//! ARCHITECTURE
//! ============
//! Every panel operation becomes a `CommandRequest`: a named command injected
//! into a destination document's world. The destination answers with a list
//! of `Injection` entries, each optionally carrying a structured `Outcome`
//! (`success` plus `result` or `error_message`). The relay inspects exactly
//! one entry and reconciles it into state transitions.
//!
//! DESIGN
//! ======
//! - Arguments are JSON values, serialized at build time. A handle that
//!   cannot cross the boundary fails here, before any loading state is
//!   touched.
//! - An `Injection` with no `result` means the destination threw or was torn
//!   down before producing a structured outcome. That is a mechanism
//!   failure, distinct from a structured `success: false`.
//! - Wire field names are camelCase to match the destination side.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// =============================================================================
// COMMAND NAMES
// =============================================================================

/// List every property of one site's bag. Args: site key.
pub const OP_PROPERTY_LIST: &str = "siteproperty:list";

/// Create or update one property. Args: property, site.
pub const OP_PROPERTY_CREATE: &str = "siteproperty:create";

/// Search sites by text. Args: query.
pub const OP_SITE_SEARCH: &str = "site:search";

// =============================================================================
// TARGET AND WORLD
// =============================================================================

/// Opaque identifier of the destination document a command is injected into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target(String);

impl Target {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Target {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Execution world inside the destination document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum World {
    /// The document's own world, sharing its live session and data.
    Main,
    /// A sandboxed world, cut off from the document's scripts.
    Isolated,
}

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag for surfaced failures.
pub trait ErrorCode: fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Failures raised while building an envelope.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// An argument cannot be represented as boundary-safe JSON.
    #[error("argument for {op} is not JSON-serializable: {source}")]
    Serialize {
        op: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ErrorCode for EnvelopeError {
    fn error_code(&self) -> &'static str {
        match self {
            EnvelopeError::Serialize { .. } => "E_ARG_SERIALIZE",
        }
    }
}

// =============================================================================
// COMMAND REQUEST
// =============================================================================

/// Current time as milliseconds since Unix epoch.
fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

/// A single command bound for a destination document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    pub id: Uuid,
    /// Namespaced command name, e.g. `"siteproperty:list"`.
    pub op: String,
    pub target: Target,
    pub world: World,
    /// Ordered arguments, already serialized.
    pub args: Vec<Value>,
    /// Base token the command uses to resolve caller-bundled resources
    /// from inside the destination context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_base: Option<String>,
    /// Milliseconds since Unix epoch. Set automatically at construction.
    pub ts: i64,
}

impl CommandRequest {
    /// Create a request for `op` against `target`, in the main world.
    pub fn new(op: impl Into<String>, target: Target) -> Self {
        Self {
            id: Uuid::new_v4(),
            op: op.into(),
            target,
            world: World::Main,
            args: Vec::new(),
            resource_base: None,
            ts: now_ms(),
        }
    }

    /// Append one serialized argument.
    ///
    /// # Errors
    /// Returns [`EnvelopeError::Serialize`] when `value` has no JSON
    /// representation. Callers get this before the command is dispatched,
    /// never a hung call after.
    pub fn arg<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, EnvelopeError> {
        let json = serde_json::to_value(value).map_err(|source| EnvelopeError::Serialize {
            op: self.op.clone(),
            source,
        })?;
        self.args.push(json);
        Ok(self)
    }

    /// Clone into a fresh request with a new id and timestamp. A re-issued
    /// query is a new command, not a retry of the old identity.
    #[must_use]
    pub fn reissue(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            ts: now_ms(),
            ..self.clone()
        }
    }
}

// =============================================================================
// BUILDERS
// =============================================================================

impl CommandRequest {
    #[must_use]
    pub fn with_world(mut self, world: World) -> Self {
        self.world = world;
        self
    }

    #[must_use]
    pub fn with_resource_base(mut self, base: impl Into<String>) -> Self {
        self.resource_base = Some(base.into());
        self
    }
}

// =============================================================================
// OUTCOME AND INJECTION
// =============================================================================

/// Structured outcome a command produces inside the destination.
///
/// Exactly one of `result` / `error_message` is meaningful, selected by
/// `success`. Absent fields stay off the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Outcome {
    /// Successful outcome carrying a payload.
    #[must_use]
    pub fn ok(result: Value) -> Self {
        Self { success: true, result: Some(result), error_message: None }
    }

    /// Successful outcome with nothing to report.
    #[must_use]
    pub fn ok_empty() -> Self {
        Self { success: true, result: None, error_message: None }
    }

    /// Failed outcome with a caller-facing message.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self { success: false, result: None, error_message: Some(message.into()) }
    }
}

/// One entry of the execution-result list returned by the boundary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Injection {
    /// The structured outcome, or `None` when the destination never
    /// produced one (threw, navigated away, was torn down).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Outcome>,
}

impl Injection {
    #[must_use]
    pub fn of(outcome: Outcome) -> Self {
        Self { result: Some(outcome) }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self { result: None }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serializer;

    #[test]
    fn request_sets_fields() {
        let req = CommandRequest::new("siteproperty:list", Target::from("doc-1"));
        assert_eq!(req.op, "siteproperty:list");
        assert_eq!(req.target.as_str(), "doc-1");
        assert_eq!(req.world, World::Main);
        assert!(req.args.is_empty());
        assert!(req.resource_base.is_none());
        assert!(req.ts > 0);
    }

    #[test]
    fn arg_appends_serialized_values() {
        let req = CommandRequest::new("siteproperty:list", Target::from("doc-1"))
            .arg("site-a")
            .expect("string arg")
            .arg(&42u32)
            .expect("number arg");

        assert_eq!(req.args, vec![Value::from("site-a"), Value::from(42)]);
    }

    #[test]
    fn arg_rejects_unserializable_values() {
        struct LiveHandle;

        impl Serialize for LiveHandle {
            fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("live handle cannot cross the boundary"))
            }
        }

        let err = CommandRequest::new("siteproperty:create", Target::from("doc-1"))
            .arg(&LiveHandle)
            .expect_err("serialization must fail before dispatch");

        assert_eq!(err.error_code(), "E_ARG_SERIALIZE");
        assert!(!err.retryable());
        assert!(err.to_string().contains("siteproperty:create"));
    }

    #[test]
    fn reissue_refreshes_identity_only() {
        let req = CommandRequest::new("siteproperty:list", Target::from("doc-1"))
            .arg("site-a")
            .expect("arg")
            .with_resource_base("ext://bundle/");
        let again = req.reissue();

        assert_ne!(again.id, req.id);
        assert_eq!(again.op, req.op);
        assert_eq!(again.args, req.args);
        assert_eq!(again.target, req.target);
        assert_eq!(again.resource_base, req.resource_base);
    }

    #[test]
    fn outcome_wire_shape_is_camel_case() {
        let json = serde_json::to_string(&Outcome::fail("denied")).expect("serialize");
        assert!(json.contains(r#""errorMessage":"denied""#));
        assert!(!json.contains("result"));

        let json = serde_json::to_string(&Outcome::ok(Value::from(vec![1, 2]))).expect("serialize");
        assert!(json.contains(r#""result":[1,2]"#));
        assert!(!json.contains("errorMessage"));
    }

    #[test]
    fn injection_without_result_deserializes() {
        let bare: Injection = serde_json::from_str("{}").expect("deserialize");
        assert!(bare.result.is_none());

        // On the wire, a null payload and an absent one are the same thing.
        let full: Injection =
            serde_json::from_str(r#"{"result":{"success":true,"result":null}}"#).expect("deserialize");
        let outcome = full.result.expect("outcome present");
        assert!(outcome.success);
        assert_eq!(outcome.result, None);
    }

    #[test]
    fn world_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&World::Main).expect("serialize"), r#""main""#);
        assert_eq!(
            serde_json::from_str::<World>(r#""isolated""#).expect("deserialize"),
            World::Isolated
        );
    }
}
