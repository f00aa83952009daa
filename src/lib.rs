//! propscope — an inject-execute-dispatch relay for site-property panels.
//!
//! ARCHITECTURE
//! ============
//! A panel never touches its inspected document directly. It builds a
//! `CommandRequest`, the `Relay` pushes it through a `ScriptExecutor` into
//! the destination context, exactly one structured `Outcome` comes back,
//! and the result reconciles into `StateEvent` transitions applied by a
//! single-writer `Store`. The `services` modules compose the relay into
//! the operations a panel performs: list properties, save one, search
//! sites.
//!
//! The `host` module is an in-process destination used by the demo binary
//! and the test suite; real embeddings bring their own `ScriptExecutor`.
//!
//! DESIGN
//! ======
//! - Exactly one outcome per execution, inspected from the first entry of
//!   the execution-result list.
//! - Every wait is bounded and every failure is terminal: loading cleared,
//!   danger banner dispatched, typed error returned.
//! - Writes settle through bounded re-query with backoff, never through a
//!   fixed sleep alone.

pub mod config;
pub mod envelope;
pub mod executor;
pub mod host;
pub mod model;
pub mod relay;
pub mod services;
pub mod store;

pub use config::{RelayConfig, SettleConfig};
pub use envelope::{CommandRequest, ErrorCode, Injection, Outcome, Target, World};
pub use executor::{ExecutorError, ScriptExecutor};
pub use relay::{Relay, RelayError};
pub use store::{AppMessage, Dispatcher, Panel, PanelState, Severity, StateEvent, Store};
