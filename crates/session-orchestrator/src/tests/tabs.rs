//! Tab lifecycle and pagination.

use super::harness::{pulled_session, session, Endpoint, Failure};
use crate::{ActiveView, PageDirection, Region, SessionError, TabView, ViewEvent};
use bridge_client::{PullResponse, PullTarget};

fn read(token: &str, table: &str, limit: u64, offset: u64) -> (String, String, u64, u64) {
    (token.to_string(), table.to_string(), limit, offset)
}

#[tokio::test]
async fn pull_open_and_page_scenario() {
    let (manager, bridge) = pulled_session().await;

    manager.open_table("users").await.unwrap();
    assert_eq!(bridge.page_reads(), vec![read("T1", "users", 50, 0)]);

    manager.change_page("users", PageDirection::Next).await.unwrap();
    assert_eq!(bridge.page_reads()[1], read("T1", "users", 50, 50));

    manager.change_page("users", PageDirection::Previous).await.unwrap();
    manager.change_page("users", PageDirection::Previous).await.unwrap();

    let tab = manager.tab("users").unwrap();
    assert_eq!(tab.offset, 0);
    let offsets: Vec<u64> = bridge.page_reads().iter().map(|r| r.3).collect();
    assert_eq!(offsets, vec![0, 50, 0, 0]);
}

#[tokio::test]
async fn open_renders_rows_and_pagination() {
    let (manager, _bridge) = pulled_session().await;
    manager.open_table("users").await.unwrap();

    let tab = manager.tab("users").unwrap();
    match &tab.view {
        TabView::Rows { columns, rows } => {
            assert_eq!(columns, &["id", "name"]);
            assert_eq!(rows.len(), 50);
        }
        other => panic!("expected rows, got {:?}", other),
    }
    assert!(tab.pagination.visible);
    assert_eq!(tab.pagination.label(), "Page 1 (Total: 120)");
    assert!(!tab.pagination.has_previous);
    assert!(tab.pagination.has_next);
    assert_eq!(manager.active_view(), ActiveView::Table("users".to_string()));
}

#[tokio::test]
async fn reopen_reactivates_without_refetch() {
    let (manager, bridge) = pulled_session().await;
    manager.open_table("users").await.unwrap();
    manager.change_page("users", PageDirection::Next).await.unwrap();
    manager.activate_console();
    let reads_before = bridge.page_reads().len();

    manager.open_table("users").await.unwrap();

    assert_eq!(bridge.page_reads().len(), reads_before);
    assert_eq!(manager.open_tabs(), vec!["users"]);
    assert_eq!(manager.tab("users").unwrap().offset, 50);
    assert_eq!(manager.active_view(), ActiveView::Table("users".to_string()));
}

#[tokio::test]
async fn next_overshoots_and_renders_empty() {
    let (manager, bridge) = pulled_session().await;
    manager.open_table("users").await.unwrap();

    for _ in 0..3 {
        manager.change_page("users", PageDirection::Next).await.unwrap();
    }

    let tab = manager.tab("users").unwrap();
    assert_eq!(tab.offset, 150);
    assert_eq!(tab.view, TabView::Empty);
    assert!(!tab.pagination.has_next);
    assert!(tab.pagination.has_previous);
    assert_eq!(tab.pagination.page_number, 4);
    assert_eq!(bridge.page_reads().last().unwrap().3, 150);
}

#[tokio::test]
async fn small_table_hides_pagination() {
    let (manager, bridge) = pulled_session().await;
    bridge.add_table("settings", &["key", "value"], 7);
    manager.open_table("settings").await.unwrap();

    let tab = manager.tab("settings").unwrap();
    assert!(!tab.pagination.visible);
    assert_eq!(tab.last_total, Some(7));
}

#[tokio::test]
async fn close_active_tab_returns_to_console() {
    let (manager, _bridge) = pulled_session().await;
    manager.open_table("users").await.unwrap();
    let mut events = manager.subscribe();

    manager.close_table("users").unwrap();

    assert!(manager.tab("users").is_none());
    assert_eq!(manager.active_view(), ActiveView::QueryConsole);
    assert_eq!(
        events.try_recv().unwrap(),
        ViewEvent::TabClosed {
            table: "users".to_string()
        }
    );
}

#[tokio::test]
async fn close_background_tab_keeps_active_view() {
    let (manager, bridge) = pulled_session().await;
    bridge.add_table("orders", &["id"], 3);
    manager.open_table("users").await.unwrap();
    manager.open_table("orders").await.unwrap();

    manager.close_table("users").unwrap();
    assert_eq!(manager.active_view(), ActiveView::Table("orders".to_string()));
    assert_eq!(manager.open_tabs(), vec!["orders"]);
}

#[tokio::test]
async fn operations_on_unknown_tab_fail() {
    let (manager, bridge) = pulled_session().await;
    let missing = SessionError::TabNotOpen("ghost".to_string());

    assert_eq!(manager.close_table("ghost"), Err(missing.clone()));
    assert_eq!(
        manager.change_page("ghost", PageDirection::Next).await,
        Err(missing.clone())
    );
    assert_eq!(manager.fetch_table("ghost").await, Err(missing.clone()));
    assert_eq!(manager.set_monitor("ghost", true).await, Err(missing));
    assert!(bridge.calls().is_empty());
}

#[tokio::test]
async fn fetch_before_any_pull_renders_error_and_sends_nothing() {
    let (manager, bridge) = session();
    manager.open_table("users").await.unwrap();

    let tab = manager.tab("users").unwrap();
    assert!(matches!(tab.view, TabView::Error { .. }));
    assert_eq!(
        manager.inline_error(&Region::Tab("users".to_string())).as_deref(),
        Some("Please select a database first.")
    );
    assert!(bridge.calls().is_empty());
}

#[tokio::test]
async fn tab_keeps_superseded_token_after_device_reselect() {
    let (manager, bridge) = pulled_session().await;
    manager.open_table("users").await.unwrap();
    manager.select_device("rooted-1").await;
    assert!(manager.current_token().is_none());

    bridge.clear_calls();
    bridge.fail(
        Endpoint::Read,
        Failure::Remote("Database session expired or invalid".to_string()),
    );
    let mut events = manager.subscribe();
    manager.fetch_table("users").await.unwrap();

    assert_eq!(bridge.page_reads(), vec![read("T1", "users", 50, 0)]);
    assert_eq!(
        manager.tab("users").unwrap().view,
        TabView::Error {
            message: "Database session expired or invalid".to_string()
        }
    );
    assert_eq!(
        manager.inline_error(&Region::Tab("users".to_string())).as_deref(),
        Some("Database session expired or invalid")
    );
    let mut saw_tab_error = false;
    while let Ok(event) = events.try_recv() {
        if let ViewEvent::InlineError { region, .. } = event {
            assert_eq!(region, Region::Tab("users".to_string()));
            saw_tab_error = true;
        }
    }
    assert!(saw_tab_error);
}

#[tokio::test]
async fn new_pull_replaces_superseded_token() {
    let (manager, bridge) = pulled_session().await;
    manager.open_table("users").await.unwrap();
    manager.select_device("deviceA").await;

    bridge.set_pull_response(PullResponse::succeeded("T2"));
    manager
        .pull_database(PullTarget::new("deviceA", "pkg.b", "app.db"))
        .await;
    bridge.clear_calls();
    manager.fetch_table("users").await.unwrap();

    assert_eq!(bridge.page_reads(), vec![read("T2", "users", 50, 0)]);
    assert!(matches!(
        manager.tab("users").unwrap().view,
        TabView::Rows { .. }
    ));
    assert!(manager.inline_error(&Region::Tab("users".to_string())).is_none());
}

#[tokio::test]
async fn go_to_page_reads_once() {
    let (manager, bridge) = pulled_session().await;
    manager.open_table("users").await.unwrap();
    bridge.clear_calls();

    manager.go_to_page("users", 3).await.unwrap();

    assert_eq!(bridge.page_reads(), vec![read("T1", "users", 50, 100)]);
    let tab = manager.tab("users").unwrap();
    assert_eq!(tab.offset, 100);
    assert_eq!(tab.pagination.page_number, 3);
    assert!(matches!(tab.view, TabView::Rows { ref rows, .. } if rows.len() == 20));
}

#[tokio::test]
async fn closing_tab_clears_its_inline_error() {
    let (manager, bridge) = pulled_session().await;
    bridge.fail_table("users", Failure::Transport("timeout".to_string()));
    manager.open_table("users").await.unwrap();
    let region = Region::Tab("users".to_string());
    assert!(manager.inline_error(&region).is_some());

    manager.close_table("users").unwrap();
    assert!(manager.inline_error(&region).is_none());
}

#[tokio::test]
async fn fetch_failure_is_inline_and_keeps_cursor() {
    let (manager, bridge) = pulled_session().await;
    manager.open_table("users").await.unwrap();
    bridge.fail(Endpoint::Read, Failure::Transport("timeout".to_string()));

    manager.change_page("users", PageDirection::Next).await.unwrap();

    let tab = manager.tab("users").unwrap();
    assert_eq!(tab.offset, 50);
    match tab.view {
        TabView::Error { message } => assert!(message.starts_with("Error loading data")),
        other => panic!("expected error, got {:?}", other),
    }
    assert_eq!(manager.open_tabs(), vec!["users"]);

    bridge.heal(Endpoint::Read);
    manager.fetch_table("users").await.unwrap();
    assert!(matches!(
        manager.tab("users").unwrap().view,
        TabView::Rows { .. }
    ));
}

#[tokio::test]
async fn manual_refresh_pulls_then_fetches() {
    let (manager, bridge) = pulled_session().await;
    manager.open_table("users").await.unwrap();
    bridge.clear_calls();

    manager.refresh_table("users").await.unwrap();

    assert_eq!(bridge.pull_count(), 1);
    assert_eq!(bridge.page_reads(), vec![read("T1", "users", 50, 0)]);
}

#[tokio::test]
async fn tabs_are_independent() {
    let (manager, bridge) = pulled_session().await;
    bridge.add_table("orders", &["id"], 500);
    manager.open_table("users").await.unwrap();
    manager.open_table("orders").await.unwrap();

    manager.change_page("orders", PageDirection::Next).await.unwrap();
    manager.change_page("orders", PageDirection::Next).await.unwrap();

    assert_eq!(manager.tab("users").unwrap().offset, 0);
    assert_eq!(manager.tab("orders").unwrap().offset, 100);
}
