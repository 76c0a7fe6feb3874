//! Postgres 设备记录存储实现
//!
//! 设计要点：
//! - 惰性创建使用 `insert ... on conflict do nothing` 再回读，
//!   两个进程同时首启也只会创建一行
//! - 时长计数器使用 `set total = total + $n` 原子自增，
//!   并发提交不会丢失增量
//! - 所有 SQL 参数化，防止注入

use crate::connection::connect_pool;
use crate::device::DeviceStore;
use crate::error::StorageError;
use crate::models::DeviceRecord;
use domain::DeviceState;
use sqlx::{PgPool, Row};

pub struct PgDeviceStore {
    pub pool: PgPool,
}

impl PgDeviceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 连接数据库并确保 devices 表存在。
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = connect_pool(database_url).await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// 建表（幂等）。单表服务，不引入独立的 migration 流程。
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            "create table if not exists devices (\
                device_id text primary key, \
                state text not null, \
                state_changed_at_ms bigint not null, \
                last_seen_at_ms bigint, \
                total_outage_duration_ms bigint not null default 0, \
                total_online_duration_ms bigint not null default 0, \
                last_outage_started_at_ms bigint, \
                last_online_started_at_ms bigint)",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> Result<DeviceRecord, StorageError> {
    let state_text: String = row.try_get("state")?;
    let state = DeviceState::parse(&state_text)
        .ok_or_else(|| StorageError::new(format!("invalid persisted state: {state_text}")))?;
    Ok(DeviceRecord {
        device_id: row.try_get("device_id")?,
        state,
        state_changed_at_ms: row.try_get("state_changed_at_ms")?,
        last_seen_at_ms: row.try_get("last_seen_at_ms")?,
        total_outage_duration_ms: row.try_get("total_outage_duration_ms")?,
        total_online_duration_ms: row.try_get("total_online_duration_ms")?,
        last_outage_started_at_ms: row.try_get("last_outage_started_at_ms")?,
        last_online_started_at_ms: row.try_get("last_online_started_at_ms")?,
    })
}

#[async_trait::async_trait]
impl DeviceStore for PgDeviceStore {
    async fn load_or_create(
        &self,
        device_id: &str,
        now_ms: i64,
    ) -> Result<DeviceRecord, StorageError> {
        sqlx::query(
            "insert into devices \
             (device_id, state, state_changed_at_ms, last_seen_at_ms, \
              total_outage_duration_ms, total_online_duration_ms, \
              last_outage_started_at_ms, last_online_started_at_ms) \
             values ($1, $2, $3, null, 0, 0, $3, null) \
             on conflict (device_id) do nothing",
        )
        .bind(device_id)
        .bind(DeviceState::Outage.as_str())
        .bind(now_ms)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            "select device_id, state, state_changed_at_ms, last_seen_at_ms, \
             total_outage_duration_ms, total_online_duration_ms, \
             last_outage_started_at_ms, last_online_started_at_ms \
             from devices where device_id = $1",
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;
        let row = row.ok_or_else(|| StorageError::device_not_found(device_id))?;
        record_from_row(&row)
    }

    async fn update_last_seen(&self, device_id: &str, at_ms: i64) -> Result<(), StorageError> {
        let result = sqlx::query("update devices set last_seen_at_ms = $2 where device_id = $1")
            .bind(device_id)
            .bind(at_ms)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::device_not_found(device_id));
        }
        Ok(())
    }

    async fn commit_transition(
        &self,
        device_id: &str,
        new_state: DeviceState,
        changed_at_ms: i64,
        duration_delta_ms: i64,
        started_at_ms: i64,
    ) -> Result<(), StorageError> {
        // 进入 ON 累加断电时长，进入 OUTAGE 累加在线时长；
        // 单条 update 保证状态、切换时间、计数器、本轮开始时间原子落盘。
        let sql = match new_state {
            DeviceState::On => {
                "update devices set state = $2, state_changed_at_ms = $3, \
                 total_outage_duration_ms = total_outage_duration_ms + $4, \
                 last_online_started_at_ms = $5 \
                 where device_id = $1"
            }
            DeviceState::Outage => {
                "update devices set state = $2, state_changed_at_ms = $3, \
                 total_online_duration_ms = total_online_duration_ms + $4, \
                 last_outage_started_at_ms = $5 \
                 where device_id = $1"
            }
        };
        let result = sqlx::query(sql)
            .bind(device_id)
            .bind(new_state.as_str())
            .bind(changed_at_ms)
            .bind(duration_delta_ms)
            .bind(started_at_ms)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::device_not_found(device_id));
        }
        Ok(())
    }
}
