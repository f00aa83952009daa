//! Demo binary: one full panel session against the in-process host.
//!
//! Seeds a document, runs the happy path (search, select, list, save),
//! then the two failure faces: a denied write and a torn-down target.
//! State transitions stream to the log; the final state prints as JSON.

use std::sync::Arc;

use propscope::host::{ScriptHost, SiteDocument};
use propscope::model::{Site, SiteProperty};
use propscope::services::{PanelSession, site, siteproperty};
use propscope::{AppMessage, ErrorCode, Relay, RelayConfig, Store, Target};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = RelayConfig::from_env();

    let document = Arc::new(SiteDocument::new());
    document
        .add_site(Site::new("site-contoso", "Contoso Home", "https://contoso.example/sites/home"))
        .await;
    document
        .add_site(Site::new("site-tailspin", "Tailspin Wiki", "https://tailspin.example/sites/wiki"))
        .await;
    document
        .upsert_property("site-contoso", SiteProperty::new("vti_defaultlanguage", "en-us"))
        .await
        .expect("seed property");

    let host = Arc::new(ScriptHost::with_builtin_commands(
        Target::from("tab-1"),
        Arc::clone(&document),
    ));

    let (store, mut tap) = Store::spawn_with_tap();
    let transitions = tokio::spawn(async move {
        while let Some(event) = tap.recv().await {
            tracing::info!(?event, "state transition");
        }
    });

    let executor: Arc<dyn propscope::ScriptExecutor> = host.clone();
    let relay = Relay::new(executor, store.dispatcher(), config);
    let session =
        PanelSession::new(relay, Target::from("tab-1")).with_resource_base("panel://resources/");
    tracing::info!(target = %session.target(), "panel session ready");

    let sites = site::search(&session, "contoso")
        .await
        .expect("search")
        .unwrap_or_default();
    let Some(selected) = sites.first().cloned() else {
        tracing::error!("no site matched, nothing to demo");
        return;
    };
    session.dispatcher().set_selected_site(Some(selected.key.clone())).await;

    siteproperty::load_all(&session, &selected.key).await.expect("list properties");

    siteproperty::save(
        &session,
        &SiteProperty::new("zz_theme", "midnight").with_indexed(true),
        &selected,
        false,
    )
    .await
    .expect("save property");

    host.document().set_writable(false).await;
    if let Err(err) = siteproperty::save(&session, &SiteProperty::new("zz_blocked", "1"), &selected, false).await
    {
        tracing::warn!(code = err.error_code(), "write denied, banner shown");
    }
    session.dispatcher().set_app_message(AppMessage::hidden()).await;

    host.detach();
    if let Err(err) = siteproperty::load_all(&session, &selected.key).await {
        tracing::warn!(code = err.error_code(), "target gone, banner shown");
    }
    session
        .dispatcher()
        .set_app_message(AppMessage::warning("Inspected page went away; reload it to reconnect."))
        .await;

    let watch = store.watch();
    drop(session);
    store.join().await;
    transitions.await.expect("transition logger");

    let state = watch.borrow().clone();
    println!("{}", serde_json::to_string_pretty(&state).expect("state serializes"));
}
