//! Scheduler + repository against the in-memory SurrealDB engine
//! Run: cargo test -p store-server --test availability_scheduler

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use tokio_util::sync::CancellationToken;

use store_server::availability::{AvailabilityScheduler, SchedulerConfig};
use store_server::db::DbService;
use store_server::db::models::{NewStore, StoreConfigUpdate};
use store_server::db::repository::{RepoError, StoreRepository};

async fn setup() -> StoreRepository {
    let db: Surreal<Db> = Surreal::new::<Mem>(()).await.unwrap();
    let service = DbService::init(db, "test", "test").await.unwrap();
    StoreRepository::new(service.db)
}

fn scheduler(repo: &StoreRepository) -> AvailabilityScheduler<StoreRepository> {
    AvailabilityScheduler::new(
        Arc::new(repo.clone()),
        SchedulerConfig::default(),
        CancellationToken::new(),
    )
}

/// 2024-01-01 is a Monday, 2024-01-06 a Saturday
fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

/// The same wall-clock time in Asia/Seoul, the default business timezone
fn seoul(day: u32, h: u32, m: u32, s: u32) -> DateTime<Utc> {
    chrono_tz::Asia::Seoul
        .from_local_datetime(&at(day, h, m, s))
        .single()
        .unwrap()
        .with_timezone(&Utc)
}

const MONDAY: u32 = 1;
const SATURDAY: u32 = 6;

fn open_until_nine_pm() -> NewStore {
    NewStore {
        open_state: true,
        is_auto: true,
        open_time: Some("10:00".into()),
        close_time: Some("21:00".into()),
        sale_start: Some("10:00".into()),
        sale_end: Some("20:30".into()),
        open_day_of_week: vec![1, 2, 3, 4, 5, 6, 7],
        store_name: Some("Mayo Gangnam".into()),
        address: Some("Seoul".into()),
        store_number: Some("02-000-0000".into()),
        ..Default::default()
    }
}

fn weekday_auto_opener() -> NewStore {
    NewStore {
        open_state: false,
        is_auto: true,
        open_time: Some("09:00".into()),
        close_time: Some("18:00".into()),
        sale_start: Some("09:00".into()),
        sale_end: Some("17:30".into()),
        open_day_of_week: vec![1, 2, 3, 4, 5],
        store_name: Some("Mayo Jongno".into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn closes_at_close_time_and_opens_on_allowed_weekday() {
    let repo = setup().await;
    repo.create("s1", open_until_nine_pm()).await.unwrap();
    repo.create("s2", weekday_auto_opener()).await.unwrap();
    let scheduler = scheduler(&repo);

    let report = scheduler.tick(at(MONDAY, 21, 0, 0)).await;
    assert_eq!(report.closed, vec!["s1".to_string()]);
    assert!(!repo.get("s1").await.unwrap().open_state);

    // Saturday is not in s2's open days
    let report = scheduler.tick(at(SATURDAY, 9, 0, 0)).await;
    assert!(report.opened.is_empty());
    assert!(!repo.get("s2").await.unwrap().open_state);

    let report = scheduler.tick(at(MONDAY, 9, 0, 0)).await;
    assert_eq!(report.opened, vec!["s2".to_string()]);
    assert!(repo.get("s2").await.unwrap().open_state);
}

#[tokio::test]
async fn automatic_close_changes_only_open_state() {
    let repo = setup().await;
    let before = repo.create("s1", open_until_nine_pm()).await.unwrap();

    scheduler(&repo).tick(at(MONDAY, 21, 0, 30)).await;

    let after = repo.get("s1").await.unwrap();
    assert!(!after.open_state);
    assert_eq!(after, store_server::db::models::Store { open_state: false, ..before });
}

#[tokio::test]
async fn manual_store_is_never_opened_automatically() {
    let repo = setup().await;
    repo.create(
        "manual",
        NewStore {
            is_auto: false,
            ..weekday_auto_opener()
        },
    )
    .await
    .unwrap();

    let report = scheduler(&repo).tick(at(MONDAY, 9, 0, 0)).await;

    assert!(report.opened.is_empty());
    assert!(!repo.get("manual").await.unwrap().open_state);
}

#[tokio::test]
async fn non_matching_minute_leaves_stores_alone() {
    let repo = setup().await;
    repo.create("s1", open_until_nine_pm()).await.unwrap();
    repo.create("s2", weekday_auto_opener()).await.unwrap();

    let report = scheduler(&repo).tick(at(MONDAY, 20, 59, 59)).await;

    assert!(report.is_empty());
    assert!(repo.get("s1").await.unwrap().open_state);
    assert!(!repo.get("s2").await.unwrap().open_state);
}

#[tokio::test]
async fn late_wake_catches_up_missed_minute() {
    let repo = setup().await;
    repo.create("s2", weekday_auto_opener()).await.unwrap();
    let mut scheduler = scheduler(&repo);

    scheduler.run_due(seoul(MONDAY, 8, 59, 30)).await;
    // trigger fired late: 09:00 was never observed directly
    let reports = scheduler.run_due(seoul(MONDAY, 9, 1, 10)).await;

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].opened, vec!["s2".to_string()]);
    assert!(repo.get("s2").await.unwrap().open_state);
}

#[tokio::test]
async fn clock_step_back_keeps_manual_close() {
    let repo = setup().await;
    repo.create("s2", weekday_auto_opener()).await.unwrap();
    let mut scheduler = scheduler(&repo);

    let reports = scheduler.run_due(seoul(MONDAY, 9, 0, 5)).await;
    assert_eq!(reports[0].opened, vec!["s2".to_string()]);

    // operator closes by hand, then the system clock steps back across 09:00
    repo.close("s2").await.unwrap();
    assert!(scheduler.run_due(seoul(MONDAY, 8, 59, 58)).await.is_empty());
    assert!(scheduler.run_due(seoul(MONDAY, 9, 0, 20)).await.is_empty());

    assert!(!repo.get("s2").await.unwrap().open_state);
}

#[tokio::test]
async fn open_store_is_not_due_to_open() {
    let repo = setup().await;
    repo.create(
        "already_open",
        NewStore {
            open_state: true,
            ..weekday_auto_opener()
        },
    )
    .await
    .unwrap();
    let now = at(MONDAY, 9, 0, 0);

    assert!(repo.find_due_to_open(now).await.unwrap().is_empty());

    let report = scheduler(&repo).tick(now).await;
    assert!(report.is_empty());
    assert!(repo.get("already_open").await.unwrap().open_state);
}

#[tokio::test]
async fn closed_store_is_not_due_to_close() {
    let repo = setup().await;
    repo.create(
        "already_closed",
        NewStore {
            open_state: false,
            ..open_until_nine_pm()
        },
    )
    .await
    .unwrap();
    let now = at(MONDAY, 21, 0, 0);

    assert!(repo.find_due_to_close(now).await.unwrap().is_empty());

    let report = scheduler(&repo).tick(now).await;
    assert!(report.is_empty());
    assert!(!repo.get("already_closed").await.unwrap().open_state);
}

#[tokio::test]
async fn manual_transitions_are_idempotent() {
    let repo = setup().await;
    repo.create("s2", weekday_auto_opener()).await.unwrap();

    // already closed: nothing written
    assert!(!repo.close("s2").await.unwrap());
    assert!(!repo.get("s2").await.unwrap().open_state);

    assert!(repo.open("s2").await.unwrap());
    assert!(!repo.open("s2").await.unwrap());
    assert!(repo.get("s2").await.unwrap().open_state);
}

#[tokio::test]
async fn manual_transition_on_missing_store_is_noop() {
    let repo = setup().await;

    assert!(!repo.open("ghost").await.unwrap());
    assert!(!repo.close("ghost").await.unwrap());

    assert!(repo.find_by_id("ghost").await.unwrap().is_none());
}

fn config_update() -> StoreConfigUpdate {
    StoreConfigUpdate {
        address: Some("Busan".into()),
        store_name: Some("Mayo Haeundae".into()),
        store_number: Some("051-000-0000".into()),
        open_time: "08:00".into(),
        close_time: "22:00".into(),
        sale_start: "08:30".into(),
        sale_end: "21:30".into(),
        additional_comment: None,
    }
}

#[tokio::test]
async fn update_missing_store_fails_without_writing() {
    let repo = setup().await;

    let result = repo.update("ghost", config_update()).await;

    assert!(matches!(result, Err(RepoError::StoreNotFound(id)) if id == "ghost"));
    assert!(repo.find_by_id("ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn update_replaces_config_but_keeps_state() {
    let repo = setup().await;
    repo.create("s1", open_until_nine_pm()).await.unwrap();

    let id = repo.update("s1", config_update()).await.unwrap();
    assert_eq!(id, "s1");

    let store = repo.get("s1").await.unwrap();
    assert!(store.open_state);
    assert!(store.is_auto);
    assert_eq!(store.store_name.as_deref(), Some("Mayo Haeundae"));
    assert_eq!(store.close_time.as_deref(), Some("22:00"));
    assert_eq!(store.sale_start.as_deref(), Some("08:30"));
    assert_eq!(store.open_day_of_week, vec![1, 2, 3, 4, 5, 6, 7]);

    // the new close time drives the next automatic close
    let report = scheduler(&repo).tick(at(MONDAY, 22, 0, 0)).await;
    assert_eq!(report.closed, vec!["s1".to_string()]);
}

#[tokio::test]
async fn get_missing_store_is_not_found() {
    let repo = setup().await;
    assert!(matches!(
        repo.get("ghost").await,
        Err(RepoError::StoreNotFound(_))
    ));
}

#[tokio::test]
async fn rocksdb_backed_service_runs_a_tick() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = store_server::Config::in_memory();
    config.db_path = Some(tmp.path().join("database").to_string_lossy().into_owned());

    let service = DbService::new(&config).await.unwrap();
    let repo = StoreRepository::new(service.db);
    repo.create("s1", open_until_nine_pm()).await.unwrap();

    let report = scheduler(&repo).tick(at(MONDAY, 21, 0, 0)).await;

    assert_eq!(report.closed, vec!["s1".to_string()]);
    assert!(!repo.get("s1").await.unwrap().open_state);
}
