pub mod binding_service;
pub mod errors;
pub mod idv_client;
pub mod idv_interpret;
pub mod orchestration_control;
pub mod orchestration_runtime;
pub mod transaction_service;
pub mod worker_registry;
pub mod workflow_guard;
