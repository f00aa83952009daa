//! Store — panel state and the single-writer reducer.
//!
//! DESIGN
//! ======
//! Nothing mutates `PanelState` directly. Callers emit `StateEvent`
//! transition requests through a cloneable `Dispatcher`; one spawned reducer
//! task applies them in channel order and publishes snapshots through a
//! watch channel. List-bearing events replace the whole list, never append,
//! so re-running a fetch is idempotent.

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::model::{Site, SiteProperty};

/// Queue depth for pending state events.
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 256;

// =============================================================================
// EVENTS
// =============================================================================

/// Severity of a transient banner message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Danger,
    Warning,
    Info,
}

/// A transient, dismissible banner shown by the embedding UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppMessage {
    pub visible: bool,
    pub message: String,
    pub severity: Severity,
}

impl AppMessage {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self { visible: true, message: message.into(), severity: Severity::Success }
    }

    #[must_use]
    pub fn danger(message: impl Into<String>) -> Self {
        Self { visible: true, message: message.into(), severity: Severity::Danger }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self { visible: true, message: message.into(), severity: Severity::Warning }
    }

    /// Dismissed banner. Clears whatever is showing.
    #[must_use]
    pub fn hidden() -> Self {
        Self { visible: false, message: String::new(), severity: Severity::Info }
    }
}

/// Panels the embedding UI can open or close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    NewProperty,
    EditProperty,
}

/// State-transition request consumed by the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    SetLoading(bool),
    /// Replace the property list. Never appends.
    SetAllProperties(Vec<SiteProperty>),
    /// Replace the site list. Never appends.
    SetAllSites(Vec<Site>),
    SetSelectedSite(Option<String>),
    SetAppMessage(AppMessage),
    SetPanel(Panel, bool),
    SetConfirmEdit(bool),
}

// =============================================================================
// STATE
// =============================================================================

/// Authoritative panel state. Written only by the reducer task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelState {
    pub loading: bool,
    pub properties: Vec<SiteProperty>,
    pub sites: Vec<Site>,
    pub selected_site: Option<String>,
    pub message: Option<AppMessage>,
    pub new_panel_open: bool,
    pub edit_panel_open: bool,
    pub confirm_edit_open: bool,
}

/// Apply one event to the state. Pure, so tests can drive it directly.
pub fn reduce(state: &mut PanelState, event: StateEvent) {
    match event {
        StateEvent::SetLoading(on) => state.loading = on,
        StateEvent::SetAllProperties(properties) => state.properties = properties,
        StateEvent::SetAllSites(sites) => state.sites = sites,
        StateEvent::SetSelectedSite(selected) => state.selected_site = selected,
        StateEvent::SetAppMessage(message) => state.message = Some(message),
        StateEvent::SetPanel(Panel::NewProperty, open) => state.new_panel_open = open,
        StateEvent::SetPanel(Panel::EditProperty, open) => state.edit_panel_open = open,
        StateEvent::SetConfirmEdit(open) => state.confirm_edit_open = open,
    }
}

// =============================================================================
// DISPATCHER
// =============================================================================

/// Cheap-clone handle that emits state-transition requests.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<StateEvent>,
}

impl Dispatcher {
    /// Queue one event for the reducer. Best effort after shutdown: a
    /// dropped store logs and discards instead of failing the caller.
    pub async fn dispatch(&self, event: StateEvent) {
        if let Err(err) = self.tx.send(event).await {
            warn!(event = ?err.0, "store: dispatch after close, event dropped");
        }
    }

    pub async fn set_loading(&self, on: bool) {
        self.dispatch(StateEvent::SetLoading(on)).await;
    }

    pub async fn set_all_properties(&self, properties: Vec<SiteProperty>) {
        self.dispatch(StateEvent::SetAllProperties(properties)).await;
    }

    pub async fn set_all_sites(&self, sites: Vec<Site>) {
        self.dispatch(StateEvent::SetAllSites(sites)).await;
    }

    pub async fn set_selected_site(&self, selected: Option<String>) {
        self.dispatch(StateEvent::SetSelectedSite(selected)).await;
    }

    pub async fn set_app_message(&self, message: AppMessage) {
        self.dispatch(StateEvent::SetAppMessage(message)).await;
    }

    pub async fn set_panel(&self, panel: Panel, open: bool) {
        self.dispatch(StateEvent::SetPanel(panel, open)).await;
    }

    pub async fn set_confirm_edit(&self, open: bool) {
        self.dispatch(StateEvent::SetConfirmEdit(open)).await;
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Handle to the spawned reducer: event intake plus state snapshots.
pub struct Store {
    dispatcher: Dispatcher,
    state_rx: watch::Receiver<PanelState>,
    handle: JoinHandle<()>,
}

impl Store {
    /// Spawn the reducer task with the default queue capacity.
    #[must_use]
    pub fn spawn() -> Self {
        Self::spawn_inner(DEFAULT_EVENT_QUEUE_CAPACITY, None)
    }

    /// Spawn the reducer and tap the applied-event stream. Each event is
    /// forwarded in application order; the demo binary and tests use this
    /// to observe dispatch sequences.
    #[must_use]
    pub fn spawn_with_tap() -> (Self, mpsc::UnboundedReceiver<StateEvent>) {
        let (tap_tx, tap_rx) = mpsc::unbounded_channel();
        (Self::spawn_inner(DEFAULT_EVENT_QUEUE_CAPACITY, Some(tap_tx)), tap_rx)
    }

    fn spawn_inner(capacity: usize, tap: Option<mpsc::UnboundedSender<StateEvent>>) -> Self {
        let (tx, mut rx) = mpsc::channel::<StateEvent>(capacity);
        let (state_tx, state_rx) = watch::channel(PanelState::default());

        let handle = tokio::spawn(async move {
            let mut state = PanelState::default();
            while let Some(event) = rx.recv().await {
                debug!(?event, "store: apply");
                if let Some(tap) = &tap {
                    let _ = tap.send(event.clone());
                }
                reduce(&mut state, event);
                state_tx.send_replace(state.clone());
            }
            debug!("store: all dispatchers dropped, reducer exiting");
        });

        Self { dispatcher: Dispatcher { tx }, state_rx, handle }
    }

    #[must_use]
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    /// Watch state snapshots as the reducer publishes them.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<PanelState> {
        self.state_rx.clone()
    }

    /// Latest published state.
    #[must_use]
    pub fn snapshot(&self) -> PanelState {
        self.state_rx.borrow().clone()
    }

    /// Drop this handle's dispatcher and wait for the reducer to drain.
    /// Blocks until every cloned `Dispatcher` is gone.
    pub async fn join(self) {
        let Self { dispatcher, state_rx, handle } = self;
        drop(dispatcher);
        drop(state_rx);
        let _ = handle.await;
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
