//! Orchestration control (C8 surface): start/pause/resume/stop/status/monitor
//! over the worker registry and runtime, one item per requested binding.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::services::errors::AppError;
use crate::services::orchestration_runtime::{validate_binding_startable, OrchestrationRuntime};
use crate::services::worker_registry::WorkerState;
use sea_orm::DatabaseConnection;

#[derive(Debug, Deserialize)]
pub struct OrchestrationStartRequest {
    pub binding_ids: Vec<i32>,
    pub product_id: String,
    pub email: String,
    pub limit_harga: i64,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_max_retry_status")]
    pub max_retry_status: u32,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_on_error_ms: u64,
}

fn default_interval_ms() -> u64 {
    800
}
fn default_max_retry_status() -> u32 {
    2
}
fn default_cooldown_ms() -> u64 {
    1500
}

#[derive(Debug, Deserialize)]
pub struct OrchestrationControlRequest {
    pub binding_ids: Vec<i32>,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrchestrationItemResult {
    pub binding_id: i32,
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct OrchestrationControlResult {
    pub action: String,
    pub items: Vec<OrchestrationItemResult>,
}

#[derive(Debug, Serialize)]
pub struct OrchestrationStatusItem {
    pub binding_id: i32,
    pub state: WorkerState,
    pub reason: Option<String>,
    pub owner: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrchestrationStatusResult {
    pub items: Vec<OrchestrationStatusItem>,
}

#[derive(Debug, Serialize)]
pub struct OrchestrationMonitorItem {
    pub binding_id: i32,
    pub state: WorkerState,
    pub owner: Option<String>,
    pub lock_owner: Option<String>,
    pub cycle: Option<u64>,
    pub last_action: Option<String>,
    pub heartbeat_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrchestrationMonitorResult {
    pub active_workers: usize,
    pub items: Vec<OrchestrationMonitorItem>,
}

pub struct OrchestrationControlService {
    db: DatabaseConnection,
    runtime: Arc<OrchestrationRuntime>,
}

impl OrchestrationControlService {
    pub fn new(db: DatabaseConnection, runtime: Arc<OrchestrationRuntime>) -> Self {
        Self { db, runtime }
    }

    pub async fn start(&self, payload: OrchestrationStartRequest) -> Result<OrchestrationControlResult, AppError> {
        let mut items = Vec::with_capacity(payload.binding_ids.len());
        for binding_id in payload.binding_ids {
            let (startable, reason) = validate_binding_startable(&self.db, binding_id).await?;
            if !startable {
                items.push(OrchestrationItemResult { binding_id, ok: false, message: reason.to_string() });
                continue;
            }

            let (ok, message) = self
                .runtime
                .start_worker(
                    binding_id,
                    &payload.product_id,
                    &payload.email,
                    payload.limit_harga,
                    payload.interval_ms,
                    payload.max_retry_status,
                    payload.cooldown_on_error_ms,
                )
                .await?;
            items.push(OrchestrationItemResult { binding_id, ok, message });
        }
        Ok(OrchestrationControlResult { action: "start".to_string(), items })
    }

    pub async fn pause(&self, payload: OrchestrationControlRequest) -> Result<OrchestrationControlResult, AppError> {
        let mut items = Vec::with_capacity(payload.binding_ids.len());
        for binding_id in payload.binding_ids {
            let (ok, message) = self.runtime.pause_worker(binding_id, payload.reason.as_deref()).await?;
            items.push(OrchestrationItemResult { binding_id, ok, message });
        }
        Ok(OrchestrationControlResult { action: "pause".to_string(), items })
    }

    pub async fn resume(&self, payload: OrchestrationControlRequest) -> Result<OrchestrationControlResult, AppError> {
        let mut items = Vec::with_capacity(payload.binding_ids.len());
        for binding_id in payload.binding_ids {
            let (ok, message) = self.runtime.resume_worker(binding_id).await?;
            items.push(OrchestrationItemResult { binding_id, ok, message });
        }
        Ok(OrchestrationControlResult { action: "resume".to_string(), items })
    }

    pub async fn stop(&self, payload: OrchestrationControlRequest) -> Result<OrchestrationControlResult, AppError> {
        let mut items = Vec::with_capacity(payload.binding_ids.len());
        for binding_id in payload.binding_ids {
            let (ok, message) = self.runtime.stop_worker(binding_id, payload.reason.as_deref()).await?;
            items.push(OrchestrationItemResult { binding_id, ok, message });
        }
        Ok(OrchestrationControlResult { action: "stop".to_string(), items })
    }

    pub async fn status(&self, binding_ids: Vec<i32>) -> Result<OrchestrationStatusResult, AppError> {
        let registry = self.runtime.registry();
        let mut items = Vec::with_capacity(binding_ids.len());
        for binding_id in binding_ids {
            let state = registry.get_state(binding_id).await?;
            match state {
                None => items.push(OrchestrationStatusItem {
                    binding_id,
                    state: WorkerState::Idle,
                    reason: Some("not_found".to_string()),
                    owner: None,
                    updated_at: None,
                }),
                Some(record) => items.push(OrchestrationStatusItem {
                    binding_id,
                    state: record.state,
                    reason: record.reason,
                    owner: record.owner,
                    updated_at: Some(record.updated_at),
                }),
            }
        }
        Ok(OrchestrationStatusResult { items })
    }

    pub async fn monitor(&self) -> Result<OrchestrationMonitorResult, AppError> {
        let registry = self.runtime.registry();
        let states = registry.list_states().await?;
        let active_workers = states
            .iter()
            .filter(|s| matches!(s.state, WorkerState::Running | WorkerState::Paused))
            .count();

        let mut items = Vec::with_capacity(states.len());
        for state in states {
            let heartbeat = registry.get_heartbeat(state.binding_id).await?;
            let lock_owner = registry.get_lock_owner(state.binding_id).await?;
            items.push(OrchestrationMonitorItem {
                binding_id: state.binding_id,
                state: state.state,
                owner: state.owner,
                lock_owner,
                cycle: heartbeat.as_ref().map(|h| h.cycle),
                last_action: heartbeat.as_ref().map(|h| h.last_action.clone()),
                heartbeat_at: heartbeat.map(|h| h.updated_at),
            });
        }

        Ok(OrchestrationMonitorResult { active_workers, items })
    }
}
