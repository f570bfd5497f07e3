//! Typed, environment-driven config groups layered on top of Loco.rs's own
//! `config/*.yaml` + `AppContext.config` (which remains authoritative for
//! `DB_URL` and the server bind address). Mirrors the teacher's `config.rs`
//! extension-trait style, generalized from one group (JWT) to the several
//! groups this service needs.

use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct HttpxSettings {
    pub timeout_seconds: u64,
    pub max_connections: usize,
    pub max_keepalive: usize,
    pub retries: u32,
    pub backoff_factor: f64,
}

impl Default for HttpxSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: env_u64("HTTPX_TIMEOUT_SECONDS", 10),
            max_connections: env_usize("HTTPX_MAX_CONNECTIONS", 100),
            max_keepalive: env_usize("HTTPX_MAX_KEEPALIVE", 20),
            retries: env_u32("HTTPX_RETRIES", 3),
            backoff_factor: env_f64("HTTPX_BACKOFF_FACTOR", 0.5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RedisSettings {
    pub url: String,
    pub lock_ttl_seconds: u64,
    pub heartbeat_ttl_seconds: u64,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            lock_ttl_seconds: env_u64("REDIS_LOCK_TTL_SECONDS", 30),
            heartbeat_ttl_seconds: env_u64("REDIS_HEARTBEAT_TTL_SECONDS", 15),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        let raw = std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string());
        Self {
            allowed_origins: raw.split(',').map(|s| s.trim().to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    pub httpx: HttpxSettings,
    pub redis: RedisSettings,
    pub cors: CorsSettings,
    pub debug: bool,
}

impl SharedConfig {
    fn load() -> Self {
        Self {
            httpx: HttpxSettings::default(),
            redis: RedisSettings::default(),
            cors: CorsSettings::default(),
            debug: std::env::var("DEBUG").map(|v| v == "true" || v == "1").unwrap_or(false),
        }
    }
}

static SHARED_CONFIG: OnceLock<SharedConfig> = OnceLock::new();

/// Process-wide settings, loaded once at first access (see Design Notes
/// "process-wide state").
pub fn shared() -> &'static SharedConfig {
    SHARED_CONFIG.get_or_init(SharedConfig::load)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
