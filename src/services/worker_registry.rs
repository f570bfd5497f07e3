//! Worker registry (C7): desired state, per-binding config, distributed
//! lock, and heartbeat, all held in Redis. Mirrors the key layout in
//! spec.md §6 exactly so an operator can inspect it with `redis-cli`.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::{AsyncCommands, Script};
use serde::{Deserialize, Serialize};

use crate::services::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkerState {
    Idle,
    Running,
    Paused,
    Stopped,
}

impl WorkerState {
    fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Idle => "IDLE",
            WorkerState::Running => "RUNNING",
            WorkerState::Paused => "PAUSED",
            WorkerState::Stopped => "STOPPED",
        }
    }

    fn parse(value: &str) -> Self {
        match value {
            "RUNNING" => WorkerState::Running,
            "PAUSED" => WorkerState::Paused,
            "STOPPED" => WorkerState::Stopped,
            _ => WorkerState::Idle,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerStateRecord {
    pub binding_id: i32,
    pub state: WorkerState,
    pub reason: Option<String>,
    pub updated_at: String,
    pub owner: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub interval_ms: u64,
    pub max_retry_status: u32,
    pub cooldown_on_error_ms: u64,
    pub extra: HashMap<String, String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            max_retry_status: 2,
            cooldown_on_error_ms: 1500,
            extra: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerHeartbeat {
    pub binding_id: i32,
    pub owner: String,
    pub cycle: u64,
    pub last_action: String,
    pub updated_at: String,
}

#[async_trait]
pub trait WorkerRegistry: Send + Sync {
    async fn start(&self, binding_id: i32, owner: &str, config: WorkerConfig) -> Result<bool, AppError>;
    async fn pause(&self, binding_id: i32, reason: Option<&str>) -> Result<bool, AppError>;
    async fn resume(&self, binding_id: i32) -> Result<bool, AppError>;
    async fn stop(&self, binding_id: i32, reason: Option<&str>) -> Result<bool, AppError>;
    async fn get_state(&self, binding_id: i32) -> Result<Option<WorkerStateRecord>, AppError>;
    async fn get_config(&self, binding_id: i32) -> Result<Option<WorkerConfig>, AppError>;
    async fn acquire_lock(&self, binding_id: i32, owner: &str) -> Result<bool, AppError>;
    async fn refresh_lock(&self, binding_id: i32, owner: &str) -> Result<bool, AppError>;
    async fn release_lock(&self, binding_id: i32, owner: &str) -> Result<bool, AppError>;
    async fn heartbeat(&self, payload: WorkerHeartbeat) -> Result<(), AppError>;
    async fn get_heartbeat(&self, binding_id: i32) -> Result<Option<WorkerHeartbeat>, AppError>;
    async fn get_lock_owner(&self, binding_id: i32) -> Result<Option<String>, AppError>;
    async fn list_states(&self) -> Result<Vec<WorkerStateRecord>, AppError>;
}

pub struct RedisWorkerRegistry {
    conn: redis::aio::ConnectionManager,
    lock_ttl_seconds: u64,
    heartbeat_ttl_seconds: u64,
}

impl RedisWorkerRegistry {
    pub async fn connect(url: &str, lock_ttl_seconds: u64, heartbeat_ttl_seconds: u64) -> Result<Self, AppError> {
        let client = redis::Client::open(url).map_err(AppError::from)?;
        let conn = client.get_connection_manager().await.map_err(AppError::from)?;
        Ok(Self { conn, lock_ttl_seconds, heartbeat_ttl_seconds })
    }

    fn state_key(binding_id: i32) -> String {
        format!("wrk:state:{binding_id}")
    }

    fn config_key(binding_id: i32) -> String {
        format!("wrk:cfg:{binding_id}")
    }

    fn lock_key(binding_id: i32) -> String {
        format!("wrk:lock:{binding_id}")
    }

    fn heartbeat_key(binding_id: i32) -> String {
        format!("wrk:hb:{binding_id}")
    }

    fn now_iso() -> String {
        chrono::Utc::now().to_rfc3339()
    }

    async fn set_state(
        &self,
        binding_id: i32,
        state: WorkerState,
        reason: Option<&str>,
        owner: Option<&str>,
    ) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();
        let mut fields: Vec<(&str, String)> = vec![
            ("binding_id", binding_id.to_string()),
            ("state", state.as_str().to_string()),
            ("reason", reason.unwrap_or("").to_string()),
            ("updated_at", Self::now_iso()),
        ];
        if let Some(owner) = owner {
            fields.push(("owner", owner.to_string()));
        }
        let _: () = conn.hset_multiple(Self::state_key(binding_id), &fields).await.map_err(AppError::from)?;
        Ok(true)
    }
}

#[async_trait]
impl WorkerRegistry for RedisWorkerRegistry {
    async fn start(&self, binding_id: i32, owner: &str, config: WorkerConfig) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();
        let current: Option<String> = conn.hget(Self::state_key(binding_id), "state").await.map_err(AppError::from)?;
        if current.as_deref() == Some(WorkerState::Running.as_str()) {
            return Ok(false);
        }

        self.set_state(binding_id, WorkerState::Running, Some(""), Some(owner)).await?;

        let extra_json = serde_json::to_string(&config.extra).unwrap_or_else(|_| "{}".to_string());
        let cfg_fields = [
            ("interval_ms", config.interval_ms.to_string()),
            ("max_retry_status", config.max_retry_status.to_string()),
            ("cooldown_on_error_ms", config.cooldown_on_error_ms.to_string()),
            ("extra_json", extra_json),
        ];
        let _: () = conn.hset_multiple(Self::config_key(binding_id), &cfg_fields).await.map_err(AppError::from)?;
        Ok(true)
    }

    async fn pause(&self, binding_id: i32, reason: Option<&str>) -> Result<bool, AppError> {
        self.set_state(binding_id, WorkerState::Paused, Some(reason.unwrap_or("manual_pause")), None).await
    }

    async fn resume(&self, binding_id: i32) -> Result<bool, AppError> {
        self.set_state(binding_id, WorkerState::Running, None, None).await
    }

    async fn stop(&self, binding_id: i32, reason: Option<&str>) -> Result<bool, AppError> {
        self.set_state(binding_id, WorkerState::Stopped, Some(reason.unwrap_or("manual_stop")), None).await
    }

    async fn get_state(&self, binding_id: i32) -> Result<Option<WorkerStateRecord>, AppError> {
        let mut conn = self.conn.clone();
        let raw: HashMap<String, String> = conn.hgetall(Self::state_key(binding_id)).await.map_err(AppError::from)?;
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(Some(WorkerStateRecord {
            binding_id,
            state: WorkerState::parse(raw.get("state").map(String::as_str).unwrap_or("IDLE")),
            reason: raw.get("reason").filter(|s| !s.is_empty()).cloned(),
            updated_at: raw.get("updated_at").cloned().unwrap_or_else(Self::now_iso),
            owner: raw.get("owner").filter(|s| !s.is_empty()).cloned(),
        }))
    }

    async fn get_config(&self, binding_id: i32) -> Result<Option<WorkerConfig>, AppError> {
        let mut conn = self.conn.clone();
        let raw: HashMap<String, String> = conn.hgetall(Self::config_key(binding_id)).await.map_err(AppError::from)?;
        if raw.is_empty() {
            return Ok(None);
        }
        let extra: HashMap<String, String> = raw
            .get("extra_json")
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default();
        Ok(Some(WorkerConfig {
            interval_ms: raw.get("interval_ms").and_then(|s| s.parse().ok()).unwrap_or(500),
            max_retry_status: raw.get("max_retry_status").and_then(|s| s.parse().ok()).unwrap_or(2),
            cooldown_on_error_ms: raw.get("cooldown_on_error_ms").and_then(|s| s.parse().ok()).unwrap_or(1500),
            extra,
        }))
    }

    async fn acquire_lock(&self, binding_id: i32, owner: &str) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();
        let acquired: bool = redis::cmd("SET")
            .arg(Self::lock_key(binding_id))
            .arg(owner)
            .arg("NX")
            .arg("EX")
            .arg(self.lock_ttl_seconds)
            .query_async::<_, Option<String>>(&mut conn)
            .await
            .map_err(AppError::from)?
            .is_some();
        Ok(acquired)
    }

    async fn refresh_lock(&self, binding_id: i32, owner: &str) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();
        const LUA: &str = r"
            if redis.call('GET', KEYS[1]) == ARGV[1] then
              return redis.call('EXPIRE', KEYS[1], ARGV[2])
            else
              return 0
            end
        ";
        let refreshed: i64 = Script::new(LUA)
            .key(Self::lock_key(binding_id))
            .arg(owner)
            .arg(self.lock_ttl_seconds)
            .invoke_async(&mut conn)
            .await
            .map_err(AppError::from)?;
        Ok(refreshed != 0)
    }

    async fn release_lock(&self, binding_id: i32, owner: &str) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();
        const LUA: &str = r"
            if redis.call('GET', KEYS[1]) == ARGV[1] then
              return redis.call('DEL', KEYS[1])
            else
              return 0
            end
        ";
        let deleted: i64 = Script::new(LUA)
            .key(Self::lock_key(binding_id))
            .arg(owner)
            .invoke_async(&mut conn)
            .await
            .map_err(AppError::from)?;
        Ok(deleted != 0)
    }

    async fn heartbeat(&self, payload: WorkerHeartbeat) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let key = Self::heartbeat_key(payload.binding_id);
        let fields = [
            ("binding_id", payload.binding_id.to_string()),
            ("owner", payload.owner),
            ("cycle", payload.cycle.to_string()),
            ("last_action", payload.last_action),
            ("updated_at", Self::now_iso()),
        ];
        let _: () = conn.hset_multiple(&key, &fields).await.map_err(AppError::from)?;
        let _: () = conn.expire(&key, self.heartbeat_ttl_seconds as i64).await.map_err(AppError::from)?;
        Ok(())
    }

    async fn get_heartbeat(&self, binding_id: i32) -> Result<Option<WorkerHeartbeat>, AppError> {
        let mut conn = self.conn.clone();
        let raw: HashMap<String, String> = conn.hgetall(Self::heartbeat_key(binding_id)).await.map_err(AppError::from)?;
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(Some(WorkerHeartbeat {
            binding_id,
            owner: raw.get("owner").cloned().unwrap_or_default(),
            cycle: raw.get("cycle").and_then(|s| s.parse().ok()).unwrap_or(0),
            last_action: raw.get("last_action").cloned().unwrap_or_default(),
            updated_at: raw.get("updated_at").cloned().unwrap_or_else(Self::now_iso),
        }))
    }

    async fn get_lock_owner(&self, binding_id: i32) -> Result<Option<String>, AppError> {
        let mut conn = self.conn.clone();
        let owner: Option<String> = conn.get(Self::lock_key(binding_id)).await.map_err(AppError::from)?;
        Ok(owner.filter(|s| !s.is_empty()))
    }

    async fn list_states(&self) -> Result<Vec<WorkerStateRecord>, AppError> {
        let mut conn = self.conn.clone();
        let mut items = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg("wrk:state:*")
                .arg("COUNT")
                .arg(200)
                .query_async(&mut conn)
                .await
                .map_err(AppError::from)?;

            for key in keys {
                let raw: HashMap<String, String> = conn.hgetall(&key).await.map_err(AppError::from)?;
                let Some(binding_raw) = raw.get("binding_id") else { continue };
                let Ok(binding_id) = binding_raw.parse::<i32>() else { continue };
                items.push(WorkerStateRecord {
                    binding_id,
                    state: WorkerState::parse(raw.get("state").map(String::as_str).unwrap_or("IDLE")),
                    reason: raw.get("reason").filter(|s| !s.is_empty()).cloned(),
                    updated_at: raw.get("updated_at").cloned().unwrap_or_else(Self::now_iso),
                    owner: raw.get("owner").filter(|s| !s.is_empty()).cloned(),
                });
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }
        items.sort_by_key(|i| i.binding_id);
        Ok(items)
    }
}
