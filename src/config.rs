use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

use crate::allocation::RuleSet;
use crate::models::PREFERENCE_SLOTS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub rules: RuleSet,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = RuleSet::default();

        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| "sqlite://allocation.db?mode=rwc".to_string());
        let bind_addr = parse_var(&lookup, "BIND_ADDR")?
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));
        let max_connections = parse_var(&lookup, "DB_MAX_CONNECTIONS")?.unwrap_or(5);

        let rules = RuleSet {
            // Only three slots exist, so the limit can tighten but never widen.
            max_preferences: parse_var(&lookup, "MAX_PREFERENCES")?
                .unwrap_or(defaults.max_preferences)
                .min(PREFERENCE_SLOTS),
            senior_lab_limit: parse_var(&lookup, "SENIOR_LAB_LIMIT")?
                .unwrap_or(defaults.senior_lab_limit),
            graduate_limit_per_rank: parse_var(&lookup, "GRADUATE_LIMIT_PER_RANK")?,
        };

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            rules,
        })
    }
}

/// Unset or blank variables yield `None`; anything unparsable is an error.
fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config(&[]).unwrap();
        assert_eq!(config.database_url, "sqlite://allocation.db?mode=rwc");
        assert_eq!(config.bind_addr, SocketAddr::from(([127, 0, 0, 1], 3000)));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.rules, RuleSet::default());
        assert_eq!(config.rules.graduate_limit_per_rank, None);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config(&[
            ("DATABASE_URL", ""),
            ("DB_MAX_CONNECTIONS", "   "),
            ("GRADUATE_LIMIT_PER_RANK", ""),
        ])
        .unwrap();
        assert_eq!(config.database_url, "sqlite://allocation.db?mode=rwc");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.rules.graduate_limit_per_rank, None);
    }

    #[test]
    fn unparsable_value_names_the_variable() {
        let err = config(&[("SENIOR_LAB_LIMIT", "two")]).unwrap_err();
        let ConfigError::Invalid { name, value } = err;
        assert_eq!(name, "SENIOR_LAB_LIMIT");
        assert_eq!(value, "two");

        assert!(config(&[("BIND_ADDR", "localhost")]).is_err());
    }

    #[test]
    fn max_preferences_is_capped_at_the_slot_count() {
        let widened = config(&[("MAX_PREFERENCES", "5")]).unwrap();
        assert_eq!(widened.rules.max_preferences, PREFERENCE_SLOTS);

        let tightened = config(&[("MAX_PREFERENCES", " 2 ")]).unwrap();
        assert_eq!(tightened.rules.max_preferences, 2);
    }

    #[test]
    fn graduate_limit_turns_the_rule_on() {
        let config = config(&[
            ("GRADUATE_LIMIT_PER_RANK", "1"),
            ("SENIOR_LAB_LIMIT", "2"),
            ("BIND_ADDR", "0.0.0.0:8080"),
        ])
        .unwrap();
        assert_eq!(config.rules.graduate_limit_per_rank, Some(1));
        assert_eq!(config.rules.senior_lab_limit, 2);
        assert_eq!(config.bind_addr.port(), 8080);
    }
}
