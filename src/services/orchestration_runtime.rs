//! Orchestration runtime (C8): the cooperative worker loop that drives a
//! binding's transaction cycles forward for as long as its desired state
//! (in the registry) says `RUNNING`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, warn};
use uuid::Uuid;

use crate::models::enums::{BindingStep, TransactionStatus};
use crate::models::Binding;
use crate::services::errors::AppError;
use crate::services::transaction_service::TransactionService;
use crate::services::worker_registry::{WorkerConfig, WorkerHeartbeat, WorkerRegistry, WorkerState};

pub struct OrchestrationRuntime {
    db: DatabaseConnection,
    registry: Arc<dyn WorkerRegistry>,
    tasks: Mutex<HashMap<i32, JoinHandle<()>>>,
    instance_id: String,
}

impl OrchestrationRuntime {
    pub fn new(db: DatabaseConnection, registry: Arc<dyn WorkerRegistry>) -> Arc<Self> {
        Arc::new(Self {
            db,
            registry,
            tasks: Mutex::new(HashMap::new()),
            instance_id: Uuid::new_v4().simple().to_string()[..8].to_string(),
        })
    }

    pub fn registry(&self) -> &Arc<dyn WorkerRegistry> {
        &self.registry
    }

    fn owner(&self, binding_id: i32) -> String {
        format!("{}:{binding_id}", self.instance_id)
    }

    /// Starts a worker loop for a binding, storing its config and spawning
    /// the local task right away rather than waiting for the next reconcile tick.
    pub async fn start_worker(
        self: &Arc<Self>,
        binding_id: i32,
        product_id: &str,
        email: &str,
        limit_harga: i64,
        interval_ms: u64,
        max_retry_status: u32,
        cooldown_on_error_ms: u64,
    ) -> Result<(bool, String), AppError> {
        let owner = self.owner(binding_id);
        let mut extra = HashMap::new();
        extra.insert("product_id".to_string(), product_id.to_string());
        extra.insert("email".to_string(), email.to_string());
        extra.insert("limit_harga".to_string(), limit_harga.to_string());
        let config = WorkerConfig { interval_ms, max_retry_status, cooldown_on_error_ms, extra };

        let started = self.registry.start(binding_id, &owner, config).await?;
        if !started {
            return Ok((false, "worker_already_running".to_string()));
        }
        self.ensure_local_worker(binding_id).await;
        Ok((true, "started".to_string()))
    }

    pub async fn pause_worker(&self, binding_id: i32, reason: Option<&str>) -> Result<(bool, String), AppError> {
        let ok = self.registry.pause(binding_id, reason).await?;
        Ok((ok, if ok { "paused".to_string() } else { "pause_failed".to_string() }))
    }

    pub async fn resume_worker(&self, binding_id: i32) -> Result<(bool, String), AppError> {
        let ok = self.registry.resume(binding_id).await?;
        Ok((ok, if ok { "resumed".to_string() } else { "resume_failed".to_string() }))
    }

    pub async fn stop_worker(&self, binding_id: i32, reason: Option<&str>) -> Result<(bool, String), AppError> {
        let ok = self.registry.stop(binding_id, reason).await?;
        Ok((ok, if ok { "stopped".to_string() } else { "stop_failed".to_string() }))
    }

    /// Ensures a local task exists for a running/paused binding; no-op if
    /// one is already running (cooperative, not preemptive — the existing
    /// task keeps its lock ownership).
    pub async fn ensure_local_worker(self: &Arc<Self>, binding_id: i32) -> bool {
        let mut tasks = self.tasks.lock().await;
        if let Some(existing) = tasks.get(&binding_id) {
            if !existing.is_finished() {
                return false;
            }
        }

        let owner = self.owner(binding_id);
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move { this.worker_loop(binding_id, owner).await });
        tasks.insert(binding_id, handle);
        true
    }

    /// One reconcile cycle: spawn local workers for every RUNNING/PAUSED binding.
    pub async fn tick(self: &Arc<Self>) -> Result<(), AppError> {
        let states = self.registry.list_states().await?;
        for state in states {
            if matches!(state.state, WorkerState::Running | WorkerState::Paused) {
                self.ensure_local_worker(state.binding_id).await;
            }
        }
        Ok(())
    }

    /// Runs the reconcile loop until the process exits.
    pub async fn run_forever(self: Arc<Self>, interval: Duration) {
        loop {
            if let Err(err) = self.tick().await {
                error!(error = %err, "orchestrator tick failed");
            }
            tokio::time::sleep(interval).await;
        }
    }

    async fn worker_loop(self: Arc<Self>, binding_id: i32, owner: String) {
        let lock_ok = match self.registry.acquire_lock(binding_id, &owner).await {
            Ok(ok) => ok,
            Err(err) => {
                error!(binding_id, error = %err, "failed to acquire worker lock");
                false
            }
        };
        if !lock_ok {
            self.tasks.lock().await.remove(&binding_id);
            return;
        }

        let mut cycle: u64 = 0;
        let outcome = self.run_worker_cycles(binding_id, &owner, &mut cycle).await;
        if let Err(err) = outcome {
            warn!(binding_id, owner, error = %err, "worker loop exited with error");
        }

        let _ = self.registry.release_lock(binding_id, &owner).await;
        self.tasks.lock().await.remove(&binding_id);
    }

    async fn run_worker_cycles(&self, binding_id: i32, owner: &str, cycle: &mut u64) -> Result<(), AppError> {
        let cfg = match self.registry.get_config(binding_id).await? {
            Some(cfg) => cfg,
            None => {
                self.registry.stop(binding_id, Some("missing_worker_config")).await?;
                return Ok(());
            }
        };

        loop {
            let state_record = match self.registry.get_state(binding_id).await? {
                Some(state) => state,
                None => break,
            };
            if state_record.state == WorkerState::Stopped {
                break;
            }

            self.registry.refresh_lock(binding_id, owner).await?;
            self.registry
                .heartbeat(WorkerHeartbeat {
                    binding_id,
                    owner: owner.to_string(),
                    cycle: *cycle,
                    last_action: format!("state:{:?}", state_record.state),
                    updated_at: state_record.updated_at.clone(),
                })
                .await?;

            if state_record.state == WorkerState::Paused {
                tokio::time::sleep(Duration::from_millis(500)).await;
                continue;
            }

            let product_id = cfg.extra.get("product_id").cloned().unwrap_or_default();
            let email = cfg.extra.get("email").cloned().unwrap_or_default();
            let limit_harga: i64 = cfg.extra.get("limit_harga").and_then(|s| s.parse().ok()).unwrap_or(0);

            match self.run_single_cycle(binding_id, &product_id, &email, limit_harga).await {
                Ok((status, error_message)) => {
                    if status == TransactionStatus::Gagal
                        && error_message.as_deref().unwrap_or("").contains("insufficient_balance_before_start")
                    {
                        self.registry.stop(binding_id, error_message.as_deref()).await?;
                        break;
                    }
                }
                Err(err) => {
                    warn!(binding_id, owner, error = %err, "worker cycle failed");
                    self.registry
                        .heartbeat(WorkerHeartbeat {
                            binding_id,
                            owner: owner.to_string(),
                            cycle: *cycle,
                            last_action: format!("cycle_error:{}", err),
                            updated_at: state_record.updated_at.clone(),
                        })
                        .await?;
                    tokio::time::sleep(Duration::from_millis(cfg.cooldown_on_error_ms)).await;
                    continue;
                }
            }

            *cycle += 1;
            if let Some(state_after) = self.registry.get_state(binding_id).await? {
                if state_after.state == WorkerState::Stopped {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(cfg.interval_ms)).await;
        }

        Ok(())
    }

    /// Runs one start/check cycle and returns the resulting status/error.
    async fn run_single_cycle(
        &self,
        binding_id: i32,
        product_id: &str,
        email: &str,
        limit_harga: i64,
    ) -> Result<(TransactionStatus, Option<String>), AppError> {
        let trx_service = TransactionService::new(&self.db);
        let trx = trx_service.start_transaction(binding_id, product_id, email, limit_harga).await?;

        if trx.status == TransactionStatus::Processing {
            let (updated, _action) = trx_service.check_balance_and_continue_or_stop(trx.id).await?;
            return Ok((updated.status, updated.error_message));
        }

        Ok((trx.status, trx.error_message))
    }
}

/// Validates binding eligibility before a worker start (§4.6).
pub async fn validate_binding_startable(db: &DatabaseConnection, binding_id: i32) -> Result<(bool, &'static str), AppError> {
    let binding = match Binding::find_by_id(db, binding_id).await? {
        Some(binding) => binding,
        None => return Ok((false, "binding_not_found")),
    };
    if binding.unbound_at.is_some() {
        return Ok((false, "binding_logged_out"));
    }
    if binding.step != BindingStep::TokenLoginFetched {
        return Ok((false, "binding_step_not_ready"));
    }
    Ok((true, "ok"))
}
