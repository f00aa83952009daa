//! Built-in commands, the destination-side halves of the panel operations.
//!
//! Each one follows the same discipline: validate arguments, touch the
//! document, and always return a structured `Outcome`. Failure text is
//! user-facing; the relay surfaces it verbatim.

use serde_json::Value;

use crate::envelope::{OP_PROPERTY_CREATE, OP_PROPERTY_LIST, OP_SITE_SEARCH, Outcome};
use crate::model::{Site, SiteProperty};

use super::{CommandEnv, CommandFuture, ScriptHost};

pub(super) fn register_builtins(host: &ScriptHost) {
    host.register(OP_PROPERTY_LIST, list_site_properties);
    host.register(OP_PROPERTY_CREATE, create_site_property);
    host.register(OP_SITE_SEARCH, search_sites);
}

/// `siteproperty:list` — every property of the site's bag, in key order.
fn list_site_properties(args: Vec<Value>, env: CommandEnv) -> CommandFuture {
    Box::pin(async move {
        let Some(site_key) = args.first().and_then(Value::as_str).map(str::to_owned) else {
            return Outcome::fail("siteproperty:list needs a site key");
        };
        match env.document.properties(&site_key).await {
            Ok(properties) => match serde_json::to_value(properties) {
                Ok(payload) => Outcome::ok(payload),
                Err(err) => Outcome::fail(format!("property list not serializable: {err}")),
            },
            Err(err) => Outcome::fail(err.to_string()),
        }
    })
}

/// `siteproperty:create` — insert or replace one property.
fn create_site_property(args: Vec<Value>, env: CommandEnv) -> CommandFuture {
    Box::pin(async move {
        let property = match args.first().cloned().map(serde_json::from_value::<SiteProperty>) {
            Some(Ok(property)) => property,
            Some(Err(err)) => return Outcome::fail(format!("malformed property argument: {err}")),
            None => return Outcome::fail("siteproperty:create needs a property argument"),
        };
        let site = match args.get(1).cloned().map(serde_json::from_value::<Site>) {
            Some(Ok(site)) => site,
            Some(Err(err)) => return Outcome::fail(format!("malformed site argument: {err}")),
            None => return Outcome::fail("siteproperty:create needs a site argument"),
        };
        match env.document.upsert_property(&site.key, property).await {
            Ok(()) => Outcome::ok_empty(),
            Err(err) => Outcome::fail(err.to_string()),
        }
    })
}

/// `site:search` — sites matching the query text. An empty query returns a
/// null payload: nothing searched, nothing to show.
fn search_sites(args: Vec<Value>, env: CommandEnv) -> CommandFuture {
    Box::pin(async move {
        let query = args.first().and_then(Value::as_str).unwrap_or("").to_owned();
        if query.trim().is_empty() {
            return Outcome::ok(Value::Null);
        }
        let sites = env.document.search_sites(&query).await;
        match serde_json::to_value(sites) {
            Ok(payload) => Outcome::ok(payload),
            Err(err) => Outcome::fail(format!("site list not serializable: {err}")),
        }
    })
}
