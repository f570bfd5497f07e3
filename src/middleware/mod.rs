pub mod cors;
pub mod trace_id;

pub use cors::{create_cors_config, CorsConfig};
pub use trace_id::{trace_id_middleware, TraceId};
