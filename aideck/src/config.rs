use serde::Deserialize;
use std::env;

use crate::models::Plan;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_in_range<T>(var: &str, default: T, range: std::ops::RangeInclusive<T>) -> T
where
    T: std::str::FromStr + PartialOrd + std::fmt::Display + Copy,
    T::Err: std::fmt::Display,
{
    let value = parse_env_or(var, default);
    if range.contains(&value) {
        value
    } else {
        tracing::warn!(
            "Value {} for {} is outside {}..={}. Using default.",
            value,
            var,
            range.start(),
            range.end()
        );
        default
    }
}

fn parse_env_list(var: &str) -> Vec<String> {
    env::var(var)
        .map(|val| {
            val.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Parse `AIDECK_API_KEYS`.
/// Format: comma-separated `token:user_id[:plan]` triples, e.g. `k1:alice:pro,k2:bob`
fn parse_api_keys() -> Vec<ApiKey> {
    parse_env_list("AIDECK_API_KEYS")
        .iter()
        .filter_map(|entry| match ApiKey::parse(entry) {
            Some(key) => Some(key),
            None => {
                tracing::warn!("Invalid API key entry in AIDECK_API_KEYS, skipping");
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub uploads: UploadConfig,
    pub maintenance: MaintenanceConfig,
    pub plans: PlanLimitsTable,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_keys: Vec<ApiKey>,
}

/// A pre-provisioned bearer token bound to one user and plan.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiKey {
    pub token: String,
    pub user_id: String,
    pub plan: Plan,
}

impl ApiKey {
    pub fn parse(entry: &str) -> Option<Self> {
        let mut parts = entry.splitn(3, ':');
        let token = parts.next()?.trim();
        let user_id = parts.next()?.trim();
        if token.is_empty() || user_id.is_empty() {
            return None;
        }
        let plan = match parts.next() {
            Some(plan) => plan.trim().parse().ok()?,
            None => Plan::Free,
        };
        Some(Self {
            token: token.to_string(),
            user_id: user_id.to_string(),
            plan,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub auth_token: Option<String>,
    pub local_path: Option<String>,
    pub busy_timeout_ms: u64,
    pub journal_mode: String,
    pub synchronous: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "file:aideck.db".to_string(),
            auth_token: None,
            local_path: None,
            busy_timeout_ms: 5000,
            journal_mode: "WAL".to_string(),
            synchronous: "NORMAL".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub max_file_size: u64,
    /// Empty means any mime type is accepted. Entries may be `type/*` wildcards.
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: 52_428_800,
            allowed_mime_types: Vec::new(),
        }
    }
}

/// One hour up to one year.
pub const STUCK_THRESHOLD_HOURS_RANGE: std::ops::RangeInclusive<i64> = 1..=8760;

#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceConfig {
    /// Zero disables the in-process sweeper loop.
    pub interval_secs: u64,
    pub design_stuck_threshold_hours: i64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            design_stuck_threshold_hours: 24,
        }
    }
}

/// Per-plan ceilings. A value of 0 means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PlanLimits {
    pub max_conversations: u64,
    pub max_memory_entries: u64,
    /// Design projects that may be created per rolling 30 days.
    pub design_credits: u64,
    pub max_tasks: u64,
    pub storage_bytes: u64,
}

impl PlanLimits {
    fn from_env(prefix: &str, defaults: PlanLimits) -> Self {
        Self {
            max_conversations: parse_env_or(
                &format!("{prefix}_MAX_CONVERSATIONS"),
                defaults.max_conversations,
            ),
            max_memory_entries: parse_env_or(
                &format!("{prefix}_MAX_MEMORY_ENTRIES"),
                defaults.max_memory_entries,
            ),
            design_credits: parse_env_or(
                &format!("{prefix}_DESIGN_CREDITS"),
                defaults.design_credits,
            ),
            max_tasks: parse_env_or(&format!("{prefix}_MAX_TASKS"), defaults.max_tasks),
            storage_bytes: parse_env_or(
                &format!("{prefix}_STORAGE_BYTES"),
                defaults.storage_bytes,
            ),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanLimitsTable {
    pub free: PlanLimits,
    pub pro: PlanLimits,
    pub enterprise: PlanLimits,
}

impl PlanLimitsTable {
    pub fn for_plan(&self, plan: Plan) -> PlanLimits {
        match plan {
            Plan::Free => self.free,
            Plan::Pro => self.pro,
            Plan::Enterprise => self.enterprise,
        }
    }
}

impl Default for PlanLimitsTable {
    fn default() -> Self {
        Self {
            free: PlanLimits {
                max_conversations: 50,
                max_memory_entries: 100,
                design_credits: 10,
                max_tasks: 100,
                storage_bytes: 104_857_600,
            },
            pro: PlanLimits {
                max_conversations: 1000,
                max_memory_entries: 5000,
                design_credits: 200,
                max_tasks: 5000,
                storage_bytes: 10_737_418_240,
            },
            enterprise: PlanLimits {
                max_conversations: 0,
                max_memory_entries: 0,
                design_credits: 0,
                max_tasks: 0,
                storage_bytes: 0,
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let plan_defaults = PlanLimitsTable::default();
        let upload_defaults = UploadConfig::default();
        let maintenance_defaults = MaintenanceConfig::default();
        let database_defaults = DatabaseConfig::default();

        Self {
            server: ServerConfig {
                host: env::var("AIDECK_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("AIDECK_PORT", 3000),
                api_keys: parse_api_keys(),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(database_defaults.url),
                auth_token: env::var("DATABASE_AUTH_TOKEN").ok(),
                local_path: env::var("DATABASE_LOCAL_PATH").ok(),
                busy_timeout_ms: parse_env_or(
                    "DATABASE_BUSY_TIMEOUT_MS",
                    database_defaults.busy_timeout_ms,
                ),
                journal_mode: env::var("DATABASE_JOURNAL_MODE")
                    .unwrap_or(database_defaults.journal_mode),
                synchronous: env::var("DATABASE_SYNCHRONOUS")
                    .unwrap_or(database_defaults.synchronous),
            },
            uploads: UploadConfig {
                max_file_size: parse_env_or("UPLOAD_MAX_FILE_SIZE", upload_defaults.max_file_size),
                allowed_mime_types: parse_env_list("UPLOAD_ALLOWED_MIME_TYPES"),
            },
            maintenance: MaintenanceConfig {
                interval_secs: parse_env_or(
                    "MAINTENANCE_INTERVAL_SECS",
                    maintenance_defaults.interval_secs,
                ),
                design_stuck_threshold_hours: parse_env_in_range(
                    "DESIGN_STUCK_THRESHOLD_HOURS",
                    maintenance_defaults.design_stuck_threshold_hours,
                    STUCK_THRESHOLD_HOURS_RANGE,
                ),
            },
            plans: PlanLimitsTable {
                free: PlanLimits::from_env("PLAN_FREE", plan_defaults.free),
                pro: PlanLimits::from_env("PLAN_PRO", plan_defaults.pro),
                enterprise: PlanLimits::from_env("PLAN_ENTERPRISE", plan_defaults.enterprise),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Look up the API key entry matching a bearer token.
    pub fn find_api_key(&self, token: &str) -> Option<&ApiKey> {
        self.server.api_keys.iter().find(|key| key.token == token)
    }
}
