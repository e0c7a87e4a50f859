//! Environment-variable driven configuration for all three binaries.
//!
//! Nothing here reads a config file — each service pulls its knobs from the
//! environment at startup, falling back to the defaults spec'd in §6/§10.3.

use std::time::Duration;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Logging knobs, read by every binary before [`crate::logging::init`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_dir: String,
    pub log_file: String,
    pub log_level: String,
    pub use_json: bool,
    pub rotation: String,
}

impl LogConfig {
    pub fn from_env(service: &str) -> Self {
        Self {
            log_dir: env_or("LOG_DIR", "logs"),
            log_file: env_or("LOG_FILE", &format!("{service}.log")),
            log_level: env_or("RUST_LOG", "info"),
            use_json: env_parse_or("LOG_JSON", false),
            rotation: env_or("LOG_ROTATION", "daily"),
        }
    }
}

/// Catalog service configuration (used by the `catalog` binary and by
/// clients in `order`/`frontend` that need to dial it). `ip` is the
/// client-dial target (mirrors `OrderReplicaConfig`'s `ORDER_IP`);
/// `bind_ip` is the address the process itself listens on (mirrors
/// `ORDER_BIND_IP`) — the two differ whenever `CATALOG_IP` is set to a
/// host's externally-reachable address for other services to dial.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub ip: String,
    pub bind_ip: String,
    pub port: u16,
    pub data_path: String,
    pub flush_interval: Duration,
}

impl CatalogConfig {
    pub fn from_env() -> Self {
        Self {
            ip: env_or("CATALOG_IP", "localhost"),
            bind_ip: env_or("CATALOG_BIND_IP", "0.0.0.0"),
            port: env_parse_or("CATALOG_PORT", 50052),
            data_path: env_or("CATALOG_DATA_PATH", "data/catalog_database.csv"),
            flush_interval: Duration::from_secs(env_parse_or("CATALOG_FLUSH_SECS", 5)),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

/// Order replica configuration. `replica_id` is supplied on the command
/// line (`--replica_id`), not via environment, per spec §6.
#[derive(Debug, Clone)]
pub struct OrderReplicaConfig {
    pub replica_id: u32,
    pub bind_ip: String,
    pub data_dir: String,
    pub flush_interval: Duration,
}

impl OrderReplicaConfig {
    pub fn from_env(replica_id: u32) -> Self {
        Self {
            replica_id,
            bind_ip: env_or("ORDER_BIND_IP", "0.0.0.0"),
            data_dir: env_or("ORDER_DATA_DIR", "data"),
            flush_interval: Duration::from_secs(env_parse_or("ORDER_FLUSH_SECS", 5)),
        }
    }

    /// Port for a given replica id: `50000 + 53 + replica_id`, per spec §6.
    pub fn port_for(replica_id: u32) -> u16 {
        (50053 + replica_id) as u16
    }

    pub fn port(&self) -> u16 {
        Self::port_for(self.replica_id)
    }

    pub fn data_path(&self) -> String {
        format!("{}/order_database_{}.csv", self.data_dir, self.replica_id)
    }
}

/// One statically-configured replica the frontend dials.
#[derive(Debug, Clone)]
pub struct ReplicaTarget {
    pub replica_id: u32,
    pub address: String,
}

/// Frontend configuration: its own bind port, the cache capacity, the
/// static replica roster, and RPC tuning.
#[derive(Debug, Clone)]
pub struct FrontendConfig {
    pub port: u16,
    pub cache_capacity: usize,
    pub replicas: Vec<ReplicaTarget>,
    pub catalog: CatalogConfig,
    pub rpc_timeout: Duration,
    pub health_sweep_interval: Duration,
}

impl FrontendConfig {
    pub fn from_env() -> Self {
        let order_ip = env_or("ORDER_IP", "localhost");
        let replica_ids = env_or("REPLICA_IDS", "1,2,3");
        let replicas = replica_ids
            .split(',')
            .filter_map(|s| s.trim().parse::<u32>().ok())
            .map(|replica_id| ReplicaTarget {
                replica_id,
                address: format!("{}:{}", order_ip, OrderReplicaConfig::port_for(replica_id)),
            })
            .collect();

        Self {
            port: env_parse_or("FRONTEND_PORT", 8081),
            cache_capacity: env_parse_or("CACHE_CAPACITY", 10),
            replicas,
            catalog: CatalogConfig::from_env(),
            rpc_timeout: Duration::from_millis(env_parse_or("RPC_TIMEOUT_MS", 3000)),
            health_sweep_interval: Duration::from_millis(env_parse_or(
                "HEALTH_SWEEP_INTERVAL_MS",
                2000,
            )),
        }
    }
}
