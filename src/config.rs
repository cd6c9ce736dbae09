use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const USERS_FILE: &str = "users.json";
pub const RECORDS_FILE: &str = "tareas.json";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub service: ServiceConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    /// HMAC secret for session tokens. Generated per process when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,
    #[serde(default = "default_hash_cost")]
    pub hash_cost: u32,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ServiceConfig {
    #[serde(default)]
    pub kind: ServiceKind,
}

/// Which resource collection this deployment serves.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    #[default]
    Tasks,
    Orders,
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceKind::Tasks => write!(f, "tasks"),
            ServiceKind::Orders => write!(f, "orders"),
        }
    }
}

impl std::str::FromStr for ServiceKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tasks" | "tareas" => Ok(ServiceKind::Tasks),
            "orders" | "pedidos" => Ok(ServiceKind::Orders),
            _ => Err(format!("Invalid service: {}. Allowed: tasks, orders", s)),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_hash_cost() -> u32 {
    10
}

fn default_token_ttl() -> u64 {
    3600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            hash_cost: default_hash_cost(),
            token_ttl_secs: default_token_ttl(),
        }
    }
}

impl AppConfig {
    /// Read the TOML file at `path`, writing a default one when it does not exist.
    /// Environment overrides are applied on top in both cases.
    ///
    /// Runs before the tracing subscriber exists, so it reports on stdout/stderr.
    pub fn load_or_default(path: &str) -> Self {
        let mut config = if Path::new(path).exists() {
            match std::fs::read_to_string(path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(c) => {
                        println!("Config loaded from {}", path);
                        c
                    }
                    Err(e) => {
                        eprintln!("Error parsing config: {}. Using defaults.", e);
                        Self::default()
                    }
                },
                Err(e) => {
                    eprintln!("Error reading config: {}. Using defaults.", e);
                    Self::default()
                }
            }
        } else {
            println!("Config file not found at '{}'. Creating default.", path);
            let config = Self::default();
            match toml::to_string_pretty(&config) {
                Ok(s) => {
                    if let Err(e) = std::fs::write(path, s) {
                        eprintln!("Could not write default config to {}: {}", path, e);
                    }
                }
                Err(e) => eprintln!("Could not render default config: {}", e),
            }
            config
        };

        for warning in config.apply_env(|key| std::env::var(key).ok()) {
            eprintln!("{}", warning);
        }
        config
    }

    /// Overlay `COMANDA_*` variables. `lookup` is injected so tests need not touch the process env.
    /// Returns one message per variable that was present but rejected.
    pub fn apply_env<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut rejected = Vec::new();
        if let Some(host) = lookup("COMANDA_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("COMANDA_PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => rejected.push(format!("Ignoring invalid COMANDA_PORT={}", port)),
            }
        }
        if let Some(dir) = lookup("COMANDA_DATA_DIR") {
            self.server.data_dir = dir;
        }
        if let Some(level) = lookup("COMANDA_LOG") {
            self.server.log_level = level;
        }
        if let Some(secret) = lookup("COMANDA_JWT_SECRET") {
            if !secret.is_empty() {
                self.auth.jwt_secret = Some(secret);
            }
        }
        if let Some(cost) = lookup("COMANDA_HASH_COST") {
            match cost.parse() {
                Ok(c) => self.auth.hash_cost = c,
                Err(_) => rejected.push(format!("Ignoring invalid COMANDA_HASH_COST={}", cost)),
            }
        }
        if let Some(kind) = lookup("COMANDA_SERVICE") {
            match kind.parse() {
                Ok(k) => self.service.kind = k,
                Err(e) => rejected.push(format!("Ignoring COMANDA_SERVICE: {}", e)),
            }
        }
        rejected
    }

    pub fn users_path(&self) -> PathBuf {
        Path::new(&self.server.data_dir).join(USERS_FILE)
    }

    pub fn records_path(&self) -> PathBuf {
        Path::new(&self.server.data_dir).join(RECORDS_FILE)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
