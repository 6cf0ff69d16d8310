//! Device → package → database cascade, pulls and the package catalog.

use super::harness::{pulled_session, session, BridgeCall, Endpoint, Failure};
use crate::{Region, SessionError, ViewEvent};
use bridge_client::{DatabaseSnapshotToken, Debuggable, PackageEntry, PullResponse, PullTarget};

#[tokio::test]
async fn refresh_devices_replaces_list() {
    let (manager, bridge) = session();
    manager.refresh_devices().await;

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.devices.len(), 2);
    assert_eq!(bridge.calls(), vec![BridgeCall::ListDevices]);
}

#[tokio::test]
async fn refresh_devices_failure_is_inline() {
    let (manager, bridge) = session();
    bridge.fail(Endpoint::Devices, Failure::Transport("adb not found".to_string()));
    manager.refresh_devices().await;

    let message = manager.inline_error(&Region::Devices).unwrap();
    assert!(message.starts_with("Error loading devices"));

    bridge.heal(Endpoint::Devices);
    manager.refresh_devices().await;
    assert!(manager.inline_error(&Region::Devices).is_none());
}

#[tokio::test]
async fn unrooted_device_lists_debuggable_packages() {
    let (manager, bridge) = session();
    manager.refresh_devices().await;
    manager.select_device("deviceA").await;

    assert!(bridge.calls().contains(&BridgeCall::ListPackages {
        device_id: "deviceA".to_string(),
        filter: "debuggable",
    }));
    let snapshot = manager.snapshot();
    assert_eq!(
        snapshot.root_status.as_deref(),
        Some("Not rooted (only debuggable apps supported)")
    );
    assert_eq!(snapshot.package_count, 2);
}

#[tokio::test]
async fn rooted_device_lists_all_packages() {
    let (manager, bridge) = session();
    manager.refresh_devices().await;
    manager.select_device("rooted-1").await;

    assert!(bridge.calls().contains(&BridgeCall::ListPackages {
        device_id: "rooted-1".to_string(),
        filter: "all",
    }));
    assert_eq!(manager.snapshot().root_status.as_deref(), Some("Rooted"));
}

#[tokio::test]
async fn package_list_failure_renders_inline_without_retry() {
    let (manager, bridge) = session();
    bridge.fail(
        Endpoint::Packages,
        Failure::Remote("device offline".to_string()),
    );
    manager.select_device("deviceA").await;

    assert_eq!(
        manager.inline_error(&Region::Packages).as_deref(),
        Some("device offline")
    );
    let listings = bridge
        .calls()
        .iter()
        .filter(|call| matches!(call, BridgeCall::ListPackages { .. }))
        .count();
    assert_eq!(listings, 1);
}

#[tokio::test]
async fn select_device_resets_token_but_keeps_tabs() {
    let (manager, _bridge) = pulled_session().await;
    manager.open_table("users").await.unwrap();
    assert!(manager.current_token().is_some());

    manager.select_device("deviceA").await;

    let snapshot = manager.snapshot();
    assert!(snapshot.token.is_none());
    assert!(snapshot.selected_package.is_none());
    assert!(snapshot.databases.is_none());
    assert!(snapshot.tables.is_none());
    assert_eq!(manager.open_tabs(), vec!["users"]);
}

#[tokio::test]
async fn select_package_requires_device() {
    let (manager, bridge) = session();
    let err = manager.select_package("pkg.b").await.unwrap_err();

    assert_eq!(
        err,
        SessionError::Validation("Please select a device first.".to_string())
    );
    assert_eq!(manager.prompt().as_deref(), Some("Please select a device first."));
    assert!(bridge.calls().is_empty());

    manager.dismiss_prompt();
    assert!(manager.prompt().is_none());
}

#[tokio::test]
async fn empty_database_list_shows_notice() {
    let (manager, bridge) = session();
    bridge.set_databases(&[]);
    manager.select_device("deviceA").await;
    manager.select_package("pkg.b").await.unwrap();

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.databases, Some(Vec::new()));
    assert_eq!(
        snapshot.database_notice.as_deref(),
        Some("No databases found or permission denied.")
    );
}

#[tokio::test]
async fn successful_pull_sets_token_target_and_tables() {
    let (manager, bridge) = session();
    bridge.add_table("orders", &["order_id", "total"], 3);
    let mut events = manager.subscribe();

    let target = PullTarget::new("deviceA", "pkg.b", "app.db");
    manager.pull_database(target.clone()).await;

    assert_eq!(manager.current_token(), Some(DatabaseSnapshotToken::new("T1")));
    assert_eq!(manager.pull_target(), Some(target.clone()));

    let snapshot = manager.snapshot();
    assert_eq!(
        snapshot.tables,
        Some(vec!["users".to_string(), "orders".to_string()])
    );
    assert_eq!(snapshot.column_hints["orders"], vec!["order_id", "total"]);

    let calls = bridge.calls();
    assert_eq!(calls[0], BridgeCall::Pull(target));
    assert_eq!(calls[1], BridgeCall::ListTables("T1".to_string()));
    assert!(calls.contains(&BridgeCall::ReadTable {
        token: "T1".to_string(),
        table: "orders".to_string(),
        limit: 1,
        offset: 0,
    }));

    let mut saw_token = false;
    while let Ok(event) = events.try_recv() {
        if let ViewEvent::TokenChanged { token } = event {
            assert_eq!(token, Some(DatabaseSnapshotToken::new("T1")));
            saw_token = true;
        }
    }
    assert!(saw_token);
}

#[tokio::test]
async fn column_sampling_tolerates_failures() {
    let (manager, bridge) = session();
    bridge.add_table("broken", &["x"], 1);
    bridge.fail_table("broken", Failure::Remote("malformed".to_string()));

    manager
        .pull_database(PullTarget::new("deviceA", "pkg.b", "app.db"))
        .await;

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.tables.as_ref().map(Vec::len), Some(2));
    assert!(snapshot.column_hints.contains_key("users"));
    assert!(!snapshot.column_hints.contains_key("broken"));
    assert!(manager.inline_error(&Region::Tables).is_none());
}

#[tokio::test]
async fn failed_pull_keeps_previous_token() {
    let (manager, bridge) = pulled_session().await;
    bridge.set_pull_response(PullResponse::failed("Failed to pull database"));

    manager
        .pull_database(PullTarget::new("deviceA", "pkg.b", "other.db"))
        .await;

    assert_eq!(manager.current_token(), Some(DatabaseSnapshotToken::new("T1")));
    assert_eq!(
        manager.pull_target(),
        Some(PullTarget::new("deviceA", "pkg.b", "app.db"))
    );
    assert_eq!(
        manager.inline_error(&Region::Databases).as_deref(),
        Some("Failed to pull database")
    );
}

#[tokio::test]
async fn remote_pull_error_is_shown_verbatim() {
    let (manager, bridge) = session();
    bridge.fail(
        Endpoint::Pull,
        Failure::Remote("Failed to pull database".to_string()),
    );
    manager
        .pull_database(PullTarget::new("deviceA", "pkg.b", "app.db"))
        .await;

    assert!(manager.current_token().is_none());
    assert_eq!(
        manager.inline_error(&Region::Databases).as_deref(),
        Some("Failed to pull database")
    );
}

#[tokio::test]
async fn token_follows_most_recent_successful_pull() {
    let (manager, bridge) = session();
    manager
        .pull_database(PullTarget::new("deviceA", "pkg.b", "app.db"))
        .await;

    bridge.set_pull_response(PullResponse::succeeded("T2"));
    manager
        .pull_database(PullTarget::new("deviceA", "pkg.b", "cache.db"))
        .await;

    assert_eq!(manager.current_token(), Some(DatabaseSnapshotToken::new("T2")));
    assert_eq!(manager.pull_target().unwrap().db_name, "cache.db");
}

#[tokio::test]
async fn open_database_uses_current_selection() {
    let (manager, bridge) = session();
    assert!(matches!(
        manager.open_database("app.db").await,
        Err(SessionError::Validation(_))
    ));

    manager.select_device("deviceA").await;
    assert_eq!(
        manager.open_database("app.db").await,
        Err(SessionError::Validation(
            "Please select a package first.".to_string()
        ))
    );

    manager.select_package("pkg.b").await.unwrap();
    manager.open_database("app.db").await.unwrap();
    assert!(bridge
        .calls()
        .contains(&BridgeCall::Pull(PullTarget::new("deviceA", "pkg.b", "app.db"))));
    assert!(manager.current_token().is_some());
}

#[tokio::test]
async fn package_catalog_filters_and_resolves() {
    let (manager, bridge) = session();
    bridge.set_packages(vec![
        PackageEntry::new("com.example.Notes", Debuggable::Unknown),
        PackageEntry::new("com.example.mail", Debuggable::No),
        PackageEntry::new("org.sample.notes", Debuggable::Unknown),
    ]);
    bridge.set_debuggable("com.example.Notes", true);
    manager.select_device("deviceA").await;

    manager.set_package_search("notes");
    let visible: Vec<String> = manager
        .visible_packages()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(visible, vec!["com.example.Notes", "org.sample.notes"]);

    // org.sample.notes has no scripted answer and stays unknown.
    manager.resolve_visible_debuggable().await;
    let resolves = bridge
        .calls()
        .iter()
        .filter(|call| matches!(call, BridgeCall::ResolveDebuggable { .. }))
        .count();
    assert_eq!(resolves, 2);

    manager.set_only_debuggable(true);
    let visible = manager.visible_packages();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].name, "com.example.Notes");
    assert_eq!(visible[0].debuggable, Debuggable::Yes);
}

#[tokio::test]
async fn list_tables_without_token_prompts() {
    let (manager, bridge) = session();
    assert!(matches!(
        manager.list_tables().await,
        Err(SessionError::Validation(_))
    ));
    assert!(bridge.calls().is_empty());
}
