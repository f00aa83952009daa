//! Site-property operations: list and create/update.
//!
//! DESIGN
//! ======
//! `load_all` owns the read tail: replace the list, clear loading. `save`
//! owns the write chain: close the originating panel, create, wait out the
//! destination's write lag, re-list, then banner. By the time a failure
//! propagates out of either, loading has been cleared and the error
//! surfaced; no path leaves the panel spinning.

use serde_json::Value;
use tracing::info;

use crate::envelope::{OP_PROPERTY_CREATE, OP_PROPERTY_LIST};
use crate::model::{Site, SiteProperty};
use crate::store::{AppMessage, Panel};

use super::{PanelSession, ServiceError, decode_list, fail_terminal};

/// Fetch every property of `site_key` and reconcile the panel list.
///
/// # Errors
/// Propagates envelope, relay, and decode failures, all terminal by the
/// time they arrive.
pub async fn load_all(
    session: &PanelSession,
    site_key: &str,
) -> Result<Vec<SiteProperty>, ServiceError> {
    let request = session.request(OP_PROPERTY_LIST).arg(site_key)?;
    let payload = session.relay().execute(&request).await?;

    let properties = match decode_list::<SiteProperty>(OP_PROPERTY_LIST, payload) {
        Ok(properties) => properties,
        Err(err) => return Err(fail_terminal(session.dispatcher(), err).await),
    };

    session.dispatcher().set_all_properties(properties.clone()).await;
    session.dispatcher().set_loading(false).await;
    info!(site = site_key, count = properties.len(), "siteproperty: list reconciled");
    Ok(properties)
}

/// Create or update `property` on `site`, wait for the write to become
/// visible, and reconcile the re-listed bag.
///
/// The originating panel closes before execution: on `update` the edit
/// panel yields to its confirmation dialog, otherwise the new-property
/// panel just closes. The success banner comes last, after the list is
/// replaced and loading cleared.
///
/// # Errors
/// Propagates envelope, relay, and decode failures, all terminal by the
/// time they arrive. A failed create never chains into a re-list.
pub async fn save(
    session: &PanelSession,
    property: &SiteProperty,
    site: &Site,
    update: bool,
) -> Result<Vec<SiteProperty>, ServiceError> {
    let dispatcher = session.dispatcher();
    if update {
        dispatcher.set_confirm_edit(true).await;
        dispatcher.set_panel(Panel::EditProperty, false).await;
    } else {
        dispatcher.set_panel(Panel::NewProperty, false).await;
    }

    let create = session.request(OP_PROPERTY_CREATE).arg(property)?.arg(site)?;
    session.relay().execute(&create).await?;

    let list = session.request(OP_PROPERTY_LIST).arg(&site.key)?;
    let written_key = property.key.as_str();
    let payload = session
        .relay()
        .execute_settled(&list, |payload| bag_contains(payload, written_key))
        .await?;

    let properties = match decode_list::<SiteProperty>(OP_PROPERTY_LIST, payload) {
        Ok(properties) => properties,
        Err(err) => return Err(fail_terminal(dispatcher, err).await),
    };

    dispatcher.set_all_properties(properties.clone()).await;
    dispatcher.set_loading(false).await;
    let banner = if update {
        "Site property updated successfully!"
    } else {
        "Site property added successfully!"
    };
    dispatcher.set_app_message(AppMessage::success(banner)).await;
    info!(site = %site.key, key = %property.key, update, "siteproperty: saved");
    Ok(properties)
}

/// Whether the listed bag already shows `key`.
fn bag_contains(payload: Option<&Value>, key: &str) -> bool {
    payload
        .and_then(Value::as_array)
        .is_some_and(|items| items.iter().any(|item| item["key"] == key))
}

#[cfg(test)]
#[path = "siteproperty_test.rs"]
mod tests;
