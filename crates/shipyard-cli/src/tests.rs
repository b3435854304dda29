use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration as StdDuration, SystemTime, UNIX_EPOCH};

use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use shipyard_core::config::SyncSettings;
use shipyard_core::db::{LibSqlLocalStore, LocalStore};
use shipyard_core::models::{AppStatus, TaskPriority, TaskStatus};
use shipyard_core::sync::{FailedEntry, SyncReport, SyncQueueWriter};
use shipyard_core::{App, EntityKind, Note, SyncAction, Task};
use tokio::time::sleep;

use crate::commands::common::{
    format_relative_time, join_words, resolve_record, resolve_user_id, short_id,
};
use crate::commands::queue::{format_queue_lines, list_queue};
use crate::commands::sync::{format_sync_report, run_sync};
use crate::commands::watch::run_watch;
use crate::commands::{app, idea, note, task};
use crate::error::CliError;

#[test]
fn join_words_trims_and_rejects_empty() {
    let parts = vec!["  Launch".to_string(), "pad  ".to_string()];
    assert_eq!(join_words(&parts, "App name").unwrap(), "Launch pad");

    let error = join_words(&[" ".to_string()], "App name").unwrap_err();
    assert!(matches!(error, CliError::EmptyValue("App name")));
}

#[test]
fn resolve_user_id_prefers_flag_then_settings() {
    let settings = SyncSettings {
        user_id: Some("from-env".to_string()),
        ..SyncSettings::default()
    };
    assert_eq!(resolve_user_id(Some("cli".to_string()), &settings), "cli");
    assert_eq!(resolve_user_id(Some("  ".to_string()), &settings), "from-env");
    assert_eq!(resolve_user_id(None, &SyncSettings::default()), "local");
}

#[test]
fn format_relative_time_units() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    assert_eq!(format_relative_time(now - Duration::seconds(30), now), "just now");
    assert_eq!(format_relative_time(now - Duration::minutes(2), now), "2m ago");
    assert_eq!(format_relative_time(now - Duration::hours(2), now), "2h ago");
    assert_eq!(format_relative_time(now - Duration::days(3), now), "3d ago");
    assert_eq!(format_relative_time(now + Duration::hours(1), now), "just now");
}

#[test]
fn format_sync_report_lists_failures_and_remaining() {
    assert_eq!(
        format_sync_report(&SyncReport::default()),
        vec!["Nothing to sync.".to_string()]
    );

    let report = SyncReport {
        attempted: 3,
        applied: 2,
        failed: vec![FailedEntry {
            log_id: 7,
            kind: EntityKind::Tasks,
            action: SyncAction::Update,
            entity_id: "task-1".to_string(),
            error: "Remote API error (500): boom".to_string(),
        }],
        remaining: 1,
    };
    let lines = format_sync_report(&report);
    assert_eq!(lines[0], "Pushed 2 of 3 queued change(s)");
    assert!(lines[1].contains("#7 update tasks task-1"));
    assert!(lines[2].starts_with("1 change(s) remain queued"));
}

#[test]
fn task_line_marks_done_and_due_date() {
    let mut task = Task::new("user-1", "app-1", "Ship pricing page");
    task.status = TaskStatus::Done;
    task.priority = TaskPriority::High;
    task.due_date = chrono::NaiveDate::from_ymd_opt(2026, 4, 1);

    let line = task::format_task_line(&task);
    assert!(line.starts_with('*'));
    assert!(line.contains("[x] Ship pricing page (high) due 2026-04-01"));
}

#[test]
fn note_line_shows_pin_and_preview() {
    let mut note = Note::new("user-1", "Launch checklist");
    note.content = "Domain, DNS, SSL\nsecond line".to_string();
    note.pinned = true;

    let line = note::format_note_line(&note);
    assert!(line.contains(&short_id(&note.id)));
    assert!(line.ends_with("^ Launch checklist - Domain, DNS, SSL"));
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn add_commands_write_locally_and_queue() {
    let db_path = unique_test_db_path();

    let created = app::add_app(
        &["Launchpad".to_string()],
        Some("  Landing pages  "),
        Some("https://launchpad.dev"),
        "user-1",
        &db_path,
    )
    .await
    .unwrap();
    assert_eq!(created.description.as_deref(), Some("Landing pages"));

    idea::add_idea(&["Pet".to_string(), "CRM".to_string()], None, "user-1", &db_path)
        .await
        .unwrap();
    let created_task = task::add_task(
        &short_id(&created.id),
        &["Pricing".to_string()],
        Some(TaskPriority::High),
        None,
        "user-1",
        &db_path,
    )
    .await
    .unwrap();
    assert_eq!(created_task.app_id, created.id);

    let apps = app::list_apps(None, 10, "user-1", &db_path).await.unwrap();
    assert_eq!(apps.len(), 1);
    assert!(!apps[0].synced);

    let queued = list_queue(&db_path).await.unwrap();
    let kinds: Vec<_> = queued.iter().map(|item| (item.action, item.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            (SyncAction::Create, EntityKind::Apps),
            (SyncAction::Create, EntityKind::Ideas),
            (SyncAction::Create, EntityKind::Tasks),
        ]
    );
    assert_eq!(format_queue_lines(&queued, Utc::now()).len(), 3);

    cleanup_db_files(&db_path);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn add_app_rejects_non_http_url() {
    let db_path = unique_test_db_path();

    let error = app::add_app(
        &["Launchpad".to_string()],
        None,
        Some("launchpad.dev"),
        "user-1",
        &db_path,
    )
    .await
    .unwrap_err();
    assert!(matches!(
        error,
        CliError::Core(shipyard_core::Error::InvalidInput(_))
    ));

    cleanup_db_files(&db_path);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn list_filters_by_owner_and_status() {
    let db_path = unique_test_db_path();
    let mine = app::add_app(&["Mine".to_string()], None, None, "user-1", &db_path)
        .await
        .unwrap();
    app::add_app(&["Theirs".to_string()], None, None, "user-2", &db_path)
        .await
        .unwrap();

    app::set_app_status(&mine.id, AppStatus::Launched, &db_path)
        .await
        .unwrap();

    let live = app::list_apps(Some(AppStatus::Launched), 10, "user-1", &db_path)
        .await
        .unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].name, "Mine");

    let ideas = app::list_apps(Some(AppStatus::Idea), 10, "user-1", &db_path)
        .await
        .unwrap();
    assert!(ideas.is_empty());

    cleanup_db_files(&db_path);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn resolve_record_supports_exact_and_prefix_id() {
    let db_path = unique_test_db_path();
    let writer = open_test_writer(&db_path).await;
    writer
        .create_app(app_with_id("11111111-1111-7111-8111-111111111111", "A"))
        .await
        .unwrap();
    writer
        .create_app(app_with_id("11111111-1111-7111-8111-222222222222", "B"))
        .await
        .unwrap();

    let by_exact: App = resolve_record(writer.store(), "11111111-1111-7111-8111-111111111111")
        .await
        .unwrap();
    assert_eq!(by_exact.name, "A");

    let by_prefix: App = resolve_record(writer.store(), "11111111-1111-7111-8111-2")
        .await
        .unwrap();
    assert_eq!(by_prefix.name, "B");

    cleanup_db_files(&db_path);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn resolve_record_rejects_ambiguous_and_missing() {
    let db_path = unique_test_db_path();
    let writer = open_test_writer(&db_path).await;
    writer
        .create_app(app_with_id("aaaaaaaa-aaaa-7aaa-8aaa-aaaaaaaaaaaa", "Left"))
        .await
        .unwrap();
    writer
        .create_app(app_with_id("aaaaaaaa-aaaa-7aaa-8aaa-bbbbbbbbbbbb", "Right"))
        .await
        .unwrap();

    let error = resolve_record::<App, _>(writer.store(), "aaaaaaaa-aaaa-7aaa-8aaa")
        .await
        .unwrap_err();
    assert!(matches!(error, CliError::AmbiguousId(_)));

    let error = resolve_record::<App, _>(writer.store(), "does-not-exist")
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        CliError::NotFound {
            kind: EntityKind::Apps,
            ..
        }
    ));

    cleanup_db_files(&db_path);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn done_and_delete_queue_follow_up_entries() {
    let db_path = unique_test_db_path();
    let owner = app::add_app(&["Launchpad".to_string()], None, None, "user-1", &db_path)
        .await
        .unwrap();
    let created = task::add_task(
        &owner.id,
        &["Pricing".to_string()],
        None,
        None,
        "user-1",
        &db_path,
    )
    .await
    .unwrap();

    let done = task::complete_task(&short_id(&created.id), &db_path)
        .await
        .unwrap();
    assert!(done.is_done());

    task::run_delete(&created.id, &db_path).await.unwrap();
    let remaining = task::list_tasks(Some(owner.id.as_str()), None, 10, "user-1", &db_path)
        .await
        .unwrap();
    assert!(remaining.is_empty());

    let actions: Vec<_> = list_queue(&db_path)
        .await
        .unwrap()
        .into_iter()
        .filter(|item| item.kind == EntityKind::Tasks)
        .map(|item| item.action)
        .collect();
    assert_eq!(
        actions,
        vec![SyncAction::Create, SyncAction::Update, SyncAction::Delete]
    );

    let store = LibSqlLocalStore::open_path(&db_path).await.unwrap();
    assert_eq!(store.count_log().await.unwrap(), 4);

    cleanup_db_files(&db_path);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn notes_list_pinned_first() {
    let db_path = unique_test_db_path();
    note::add_note(&["Pinned".to_string()], "body", None, true, "user-1", &db_path)
        .await
        .unwrap();
    sleep(StdDuration::from_millis(10)).await;
    note::add_note(&["Older".to_string()], "", None, false, "user-1", &db_path)
        .await
        .unwrap();
    sleep(StdDuration::from_millis(10)).await;
    note::add_note(&["Newest".to_string()], "", None, false, "user-1", &db_path)
        .await
        .unwrap();

    let titles: Vec<_> = note::list_notes(None, 2, "user-1", &db_path)
        .await
        .unwrap()
        .into_iter()
        .map(|note| note.title)
        .collect();
    assert_eq!(titles, vec!["Pinned".to_string(), "Newest".to_string()]);

    cleanup_db_files(&db_path);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn run_sync_requires_sync_configuration() {
    let db_path = unique_test_db_path();

    let error = run_sync(false, false, &SyncSettings::default(), &db_path)
        .await
        .unwrap_err();
    assert!(matches!(error, CliError::SyncNotConfigured));

    cleanup_db_files(&db_path);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn run_sync_refuses_while_offline() {
    let db_path = unique_test_db_path();
    idea::add_idea(&["Pet CRM".to_string()], None, "user-1", &db_path)
        .await
        .unwrap();
    let settings = SyncSettings {
        supabase_url: Some("https://example.supabase.co".to_string()),
        supabase_anon_key: Some("anon".to_string()),
        ..SyncSettings::default()
    };

    let error = run_sync(false, true, &settings, &db_path)
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        CliError::Core(shipyard_core::Error::Offline)
    ));
    assert_eq!(list_queue(&db_path).await.unwrap().len(), 1);

    cleanup_db_files(&db_path);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn run_watch_requires_sync_configuration() {
    let db_path = unique_test_db_path();

    let error = run_watch(false, &SyncSettings::default(), &db_path)
        .await
        .unwrap_err();
    assert!(matches!(error, CliError::SyncNotConfigured));

    cleanup_db_files(&db_path);
}

async fn open_test_writer(db_path: &Path) -> SyncQueueWriter<LibSqlLocalStore> {
    SyncQueueWriter::with_system_clock(LibSqlLocalStore::open_path(db_path).await.unwrap())
}

fn app_with_id(id: &str, name: &str) -> App {
    let mut app = App::new("user-1", name);
    app.id = id.to_string();
    app
}

fn unique_test_db_path() -> PathBuf {
    static NEXT_TEST_DB_ID: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    let sequence = NEXT_TEST_DB_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("shipyard-cli-test-{timestamp}-{sequence}.db"))
}

fn cleanup_db_files(path: &Path) {
    let _ = std::fs::remove_file(path);
    let _ = std::fs::remove_file(path.with_extension("db-wal"));
    let _ = std::fs::remove_file(path.with_extension("db-shm"));
}
