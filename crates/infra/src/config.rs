//! Process configuration loaded from environment variables.

use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

use ecosmart_swap::AlertPolicy;

pub const BIND_ADDR_VAR: &str = "ECOSMART_BIND_ADDR";
pub const CO2E_GOAL_VAR: &str = "ECOSMART_CO2E_GOAL_KG";
pub const ALERT_THRESHOLD_VAR: &str = "ECOSMART_ALERT_THRESHOLD_KG";
pub const SWAP_THRESHOLD_VAR: &str = "ECOSMART_SWAP_THRESHOLD_KG";
pub const HISTORY_LIMIT_VAR: &str = "ECOSMART_HISTORY_LIMIT";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_CO2E_GOAL_KG: f64 = 15.0;
const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub co2e_goal_kg: f64,
    pub alert_policy: AlertPolicy,
    /// Enables the Postgres catalog and scan history when set.
    pub database_url: Option<String>,
    pub history_limit: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or blank keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = match get(BIND_ADDR_VAR) {
            Some(raw) => parse::<SocketAddr>(BIND_ADDR_VAR, &raw)?,
            None => parse::<SocketAddr>(BIND_ADDR_VAR, DEFAULT_BIND_ADDR)?,
        };

        let defaults = AlertPolicy::default();
        let alert_policy = AlertPolicy {
            high_impact_threshold_kg: kilograms(ALERT_THRESHOLD_VAR, get(ALERT_THRESHOLD_VAR), defaults.high_impact_threshold_kg)?,
            swap_prompt_threshold_kg: kilograms(SWAP_THRESHOLD_VAR, get(SWAP_THRESHOLD_VAR), defaults.swap_prompt_threshold_kg)?,
        };

        let history_limit = match get(HISTORY_LIMIT_VAR) {
            Some(raw) => match parse::<usize>(HISTORY_LIMIT_VAR, &raw)? {
                0 => return Err(ConfigError::invalid(HISTORY_LIMIT_VAR, &raw, "must be positive")),
                n => n,
            },
            None => DEFAULT_HISTORY_LIMIT,
        };

        Ok(Self {
            bind_addr,
            co2e_goal_kg: kilograms(CO2E_GOAL_VAR, get(CO2E_GOAL_VAR), DEFAULT_CO2E_GOAL_KG)?,
            alert_policy,
            database_url: get(DATABASE_URL_VAR),
            history_limit,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            co2e_goal_kg: DEFAULT_CO2E_GOAL_KG,
            alert_policy: AlertPolicy::default(),
            database_url: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::invalid(key, raw, e.to_string()))
}

fn kilograms(key: &'static str, raw: Option<String>, default: f64) -> Result<f64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value = parse::<f64>(key, &raw)?;
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::invalid(key, &raw, "must be a non-negative number"));
    }
    Ok(value)
}
