use super::*;
use std::time::Instant;

use serde_json::json;
use tokio::time::{Duration, timeout};

use crate::envelope::{ErrorCode, Outcome};
use crate::host::{CommandEnv, CommandFuture};
use crate::services::test_helpers::{assert_no_more_events, collect_events, next_event, seeded_rig};
use crate::store::{Severity, StateEvent};

fn site_a() -> Site {
    Site::new("site-a", "Team Alpha", "https://alpha.example/sites/a")
}

#[tokio::test]
async fn load_reconciles_the_list_then_clears_loading() {
    let mut rig = seeded_rig().await;

    let properties = load_all(&rig.session, "site-a").await.expect("load");
    assert_eq!(properties, vec![SiteProperty::new("vti_defaultlanguage", "en-us")]);

    let events = collect_events(&mut rig.tap, 3).await;
    assert_eq!(
        events,
        vec![
            StateEvent::SetLoading(true),
            StateEvent::SetAllProperties(vec![SiteProperty::new("vti_defaultlanguage", "en-us")]),
            StateEvent::SetLoading(false),
        ]
    );
    assert_no_more_events(&mut rig.tap).await;
}

#[tokio::test]
async fn structured_failure_terminates_loading_and_shows_the_banner() {
    let mut rig = seeded_rig().await;

    let err = load_all(&rig.session, "site-x").await.expect_err("unknown site");
    assert_eq!(err.error_code(), "E_COMMAND_FAILED");

    let events = collect_events(&mut rig.tap, 3).await;
    assert_eq!(
        events,
        vec![
            StateEvent::SetLoading(true),
            StateEvent::SetLoading(false),
            StateEvent::SetAppMessage(AppMessage::danger("site not found: site-x")),
        ]
    );
    assert_no_more_events(&mut rig.tap).await;
    assert!(!rig.store.snapshot().loading);
}

#[tokio::test]
async fn garbage_list_payload_is_a_terminal_decode_failure() {
    let mut rig = seeded_rig().await;
    rig.host.register(OP_PROPERTY_LIST, |_args: Vec<Value>, _env: CommandEnv| -> CommandFuture {
        Box::pin(async { Outcome::ok(json!({"rows": 3})) })
    });

    let err = load_all(&rig.session, "site-a").await.expect_err("undecodable");
    assert_eq!(err.error_code(), "E_DECODE");

    assert_eq!(next_event(&mut rig.tap).await, StateEvent::SetLoading(true));
    assert_eq!(next_event(&mut rig.tap).await, StateEvent::SetLoading(false));
    match next_event(&mut rig.tap).await {
        StateEvent::SetAppMessage(message) => {
            assert_eq!(message.severity, Severity::Danger);
            assert!(
                message.message.starts_with("siteproperty:list returned an undecodable payload")
            );
        }
        other => panic!("expected a danger banner, got {other:?}"),
    }
    assert_no_more_events(&mut rig.tap).await;
    assert!(!rig.store.snapshot().loading);
}

#[tokio::test]
async fn reload_replaces_the_list_instead_of_appending() {
    let rig = seeded_rig().await;

    load_all(&rig.session, "site-a").await.expect("first load");
    load_all(&rig.session, "site-a").await.expect("second load");

    let mut watch = rig.store.watch();
    let state = timeout(
        Duration::from_millis(200),
        watch.wait_for(|state| !state.loading && !state.properties.is_empty()),
    )
    .await
    .expect("state settle timed out")
    .expect("reducer gone");

    assert_eq!(state.properties.len(), 1);
}

#[tokio::test]
async fn save_closes_the_panel_waits_out_the_lag_and_reconciles() {
    let mut rig = seeded_rig().await;
    let property = SiteProperty::new("zz_custom", "on");

    let started = Instant::now();
    let properties = save(&rig.session, &property, &site_a(), false).await.expect("save");
    assert!(
        started.elapsed() >= Duration::from_millis(20),
        "re-list must wait out the settle delay"
    );

    let expected = vec![SiteProperty::new("vti_defaultlanguage", "en-us"), property];
    assert_eq!(properties, expected);

    let events = collect_events(&mut rig.tap, 6).await;
    assert_eq!(
        events,
        vec![
            StateEvent::SetPanel(Panel::NewProperty, false),
            StateEvent::SetLoading(true),
            StateEvent::SetLoading(true),
            StateEvent::SetAllProperties(expected),
            StateEvent::SetLoading(false),
            StateEvent::SetAppMessage(AppMessage::success("Site property added successfully!")),
        ]
    );
    assert_no_more_events(&mut rig.tap).await;
}

#[tokio::test]
async fn update_confirms_the_edit_and_banners_as_updated() {
    let mut rig = seeded_rig().await;
    let property = SiteProperty::new("vti_defaultlanguage", "de-de");

    let properties = save(&rig.session, &property, &site_a(), true).await.expect("update");
    assert_eq!(properties, vec![property.clone()]);

    let events = collect_events(&mut rig.tap, 7).await;
    assert_eq!(
        events,
        vec![
            StateEvent::SetConfirmEdit(true),
            StateEvent::SetPanel(Panel::EditProperty, false),
            StateEvent::SetLoading(true),
            StateEvent::SetLoading(true),
            StateEvent::SetAllProperties(vec![property]),
            StateEvent::SetLoading(false),
            StateEvent::SetAppMessage(AppMessage::success("Site property updated successfully!")),
        ]
    );
    assert_no_more_events(&mut rig.tap).await;
}

#[tokio::test]
async fn denied_save_terminates_without_chaining_a_relist() {
    let mut rig = seeded_rig().await;
    rig.document.set_writable(false).await;

    let err = save(&rig.session, &SiteProperty::new("k", "v"), &site_a(), false)
        .await
        .expect_err("denied");
    assert_eq!(err.error_code(), "E_COMMAND_FAILED");

    let events = collect_events(&mut rig.tap, 4).await;
    assert_eq!(
        events,
        vec![
            StateEvent::SetPanel(Panel::NewProperty, false),
            StateEvent::SetLoading(true),
            StateEvent::SetLoading(false),
            StateEvent::SetAppMessage(AppMessage::danger(
                "access denied: property bag is read-only for this session"
            )),
        ]
    );
    assert_no_more_events(&mut rig.tap).await;
    assert!(!rig.store.snapshot().loading);
}

#[tokio::test]
async fn detached_target_fails_fast_as_unreachable() {
    let mut rig = seeded_rig().await;
    rig.host.detach();

    let err = save(&rig.session, &SiteProperty::new("k", "v"), &site_a(), false)
        .await
        .expect_err("unreachable");
    assert_eq!(err.error_code(), "E_TARGET_UNREACHABLE");
    assert!(err.retryable());

    let events = collect_events(&mut rig.tap, 4).await;
    assert_eq!(
        events,
        vec![
            StateEvent::SetPanel(Panel::NewProperty, false),
            StateEvent::SetLoading(true),
            StateEvent::SetLoading(false),
            StateEvent::SetAppMessage(AppMessage::danger("target doc-1 unreachable")),
        ]
    );
    assert_no_more_events(&mut rig.tap).await;
}
