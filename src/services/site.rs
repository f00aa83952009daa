//! Site search.
//!
//! The destination distinguishes "nothing searched" (null payload) from
//! "searched, zero hits" (empty list). Null clears the selection and both
//! lists; a list, even an empty one, replaces the site list and drops the
//! now-stale property list.

use serde_json::Value;
use tracing::info;

use crate::envelope::OP_SITE_SEARCH;
use crate::model::Site;

use super::{PanelSession, ServiceError, fail_terminal};

/// Search sites by `query` and reconcile the site list.
///
/// Returns the matched sites, or `None` when the destination reported
/// nothing searchable.
///
/// # Errors
/// Propagates envelope, relay, and decode failures, all terminal by the
/// time they arrive.
pub async fn search(session: &PanelSession, query: &str) -> Result<Option<Vec<Site>>, ServiceError> {
    let request = session.request(OP_SITE_SEARCH).arg(query)?;
    let payload = session.relay().execute(&request).await?;
    let dispatcher = session.dispatcher();

    let value = match payload {
        None | Some(Value::Null) => {
            dispatcher.set_selected_site(None).await;
            dispatcher.set_all_properties(Vec::new()).await;
            dispatcher.set_all_sites(Vec::new()).await;
            dispatcher.set_loading(false).await;
            info!(query, "site: nothing searchable, panel cleared");
            return Ok(None);
        }
        Some(value) => value,
    };

    let sites: Vec<Site> = match serde_json::from_value(value) {
        Ok(sites) => sites,
        Err(source) => {
            let err = ServiceError::Decode { op: OP_SITE_SEARCH, source };
            return Err(fail_terminal(dispatcher, err).await);
        }
    };

    dispatcher.set_all_sites(sites.clone()).await;
    dispatcher.set_all_properties(Vec::new()).await;
    dispatcher.set_loading(false).await;
    info!(query, count = sites.len(), "site: search reconciled");
    Ok(Some(sites))
}

#[cfg(test)]
#[path = "site_test.rs"]
mod tests;
