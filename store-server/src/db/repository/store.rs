//! Store Repository
//!
//! 店铺营业状态的查询与更新：
//! - 开关店 (`open` / `close`)：先读后写，店铺不存在或已处于目标状态时跳过，
//!   返回值表示是否真正写入
//! - 配置更新 (`update`)：店铺不存在时返回 [`RepoError::StoreNotFound`]
//! - 调度查询 (`find_due_to_close` / `find_due_to_open`)：按 `HH:mm` 精确匹配

use async_trait::async_trait;
use chrono::NaiveDateTime;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoResult};
use crate::availability::AvailabilityRepository;
use crate::db::models::{NewStore, Store, StoreConfigUpdate};
use crate::db::repository::RepoError;
use crate::utils::time::{format_time_of_day, iso_weekday};

pub const TABLE: &str = "store";

const SELECT_BY_ID: &str =
    "SELECT *, record::id(id) AS store_id FROM type::thing($table, $id)";

const SELECT_DUE_TO_CLOSE: &str = r#"
    SELECT *, record::id(id) AS store_id
    FROM type::table($table)
    WHERE open_state = true
      AND close_time = $time
"#;

const SELECT_DUE_TO_OPEN: &str = r#"
    SELECT *, record::id(id) AS store_id
    FROM type::table($table)
    WHERE open_state = false
      AND sale_start = $time
      AND is_auto = true
      AND open_day_of_week CONTAINS $day
"#;

const UPDATE_OPEN_STATE: &str =
    "UPDATE type::thing($table, $id) SET open_state = $open_state RETURN NONE";

const UPDATE_CONFIG: &str = r#"
    UPDATE type::thing($table, $id) SET
        address = $address,
        store_name = $store_name,
        store_number = $store_number,
        open_time = $open_time,
        close_time = $close_time,
        sale_start = $sale_start,
        sale_end = $sale_end,
        additional_comment = $additional_comment
    RETURN NONE
"#;

const CREATE_STORE: &str = "CREATE type::thing($table, $id) CONTENT $data RETURN NONE";

#[derive(Clone)]
pub struct StoreRepository {
    base: BaseRepository,
}

impl StoreRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find a store by its key
    pub async fn find_by_id(&self, store_id: &str) -> RepoResult<Option<Store>> {
        let mut result = self
            .base
            .db()
            .query(SELECT_BY_ID)
            .bind(("table", TABLE))
            .bind(("id", store_id.to_string()))
            .await?;
        let stores: Vec<Store> = result.take(0)?;
        Ok(stores.into_iter().next())
    }

    /// Get a store, failing with `StoreNotFound` when absent
    pub async fn get(&self, store_id: &str) -> RepoResult<Store> {
        self.find_by_id(store_id)
            .await?
            .ok_or_else(|| RepoError::StoreNotFound(store_id.to_string()))
    }

    /// 关店 (店铺不存在时为空操作)，返回是否写入
    pub async fn close(&self, store_id: &str) -> RepoResult<bool> {
        self.set_open_state(store_id, false).await
    }

    /// 开店 (店铺不存在时为空操作)，返回是否写入
    pub async fn open(&self, store_id: &str) -> RepoResult<bool> {
        self.set_open_state(store_id, true).await
    }

    async fn set_open_state(&self, store_id: &str, open_state: bool) -> RepoResult<bool> {
        let Some(store) = self.find_by_id(store_id).await? else {
            tracing::debug!(
                store_id = %store_id,
                open_state,
                "Store not found, skipping state change"
            );
            return Ok(false);
        };

        if store.open_state == open_state {
            return Ok(false);
        }

        self.base
            .db()
            .query(UPDATE_OPEN_STATE)
            .bind(("table", TABLE))
            .bind(("id", store_id.to_string()))
            .bind(("open_state", open_state))
            .await?
            .check()?;
        Ok(true)
    }

    /// Apply a full configuration update, returning the updated store id
    pub async fn update(&self, store_id: &str, data: StoreConfigUpdate) -> RepoResult<String> {
        if self.find_by_id(store_id).await?.is_none() {
            return Err(RepoError::StoreNotFound(store_id.to_string()));
        }

        self.base
            .db()
            .query(UPDATE_CONFIG)
            .bind(("table", TABLE))
            .bind(("id", store_id.to_string()))
            .bind(("address", data.address))
            .bind(("store_name", data.store_name))
            .bind(("store_number", data.store_number))
            .bind(("open_time", data.open_time))
            .bind(("close_time", data.close_time))
            .bind(("sale_start", data.sale_start))
            .bind(("sale_end", data.sale_end))
            .bind(("additional_comment", data.additional_comment))
            .await?
            .check()?;

        Ok(store_id.to_string())
    }

    /// Stores open right now whose `close_time` is the current minute
    pub async fn find_due_to_close(&self, now: NaiveDateTime) -> RepoResult<Vec<Store>> {
        let mut result = self
            .base
            .db()
            .query(SELECT_DUE_TO_CLOSE)
            .bind(("table", TABLE))
            .bind(("time", format_time_of_day(now)))
            .await?;
        let stores: Vec<Store> = result.take(0)?;
        Ok(stores)
    }

    /// Closed auto stores whose `sale_start` is the current minute on an allowed weekday
    pub async fn find_due_to_open(&self, now: NaiveDateTime) -> RepoResult<Vec<Store>> {
        let mut result = self
            .base
            .db()
            .query(SELECT_DUE_TO_OPEN)
            .bind(("table", TABLE))
            .bind(("time", format_time_of_day(now)))
            .bind(("day", iso_weekday(now)))
            .await?;
        let stores: Vec<Store> = result.take(0)?;
        Ok(stores)
    }

    /// Provision a new store document under the given key
    pub async fn create(&self, store_id: &str, data: NewStore) -> RepoResult<Store> {
        self.base
            .db()
            .query(CREATE_STORE)
            .bind(("table", TABLE))
            .bind(("id", store_id.to_string()))
            .bind(("data", data))
            .await?
            .check()?;

        self.get(store_id).await
    }
}

#[async_trait]
impl AvailabilityRepository for StoreRepository {
    async fn find_due_to_close(&self, now: NaiveDateTime) -> RepoResult<Vec<Store>> {
        StoreRepository::find_due_to_close(self, now).await
    }

    async fn find_due_to_open(&self, now: NaiveDateTime) -> RepoResult<Vec<Store>> {
        StoreRepository::find_due_to_open(self, now).await
    }

    async fn close(&self, store_id: &str) -> RepoResult<bool> {
        StoreRepository::close(self, store_id).await
    }

    async fn open(&self, store_id: &str) -> RepoResult<bool> {
        StoreRepository::open(self, store_id).await
    }
}
