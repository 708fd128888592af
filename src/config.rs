use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::services::eda::AnalysisOptions;

fn default_max_file_size() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub max_file_size: usize,
    pub analysis: AnalysisOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_file_size: default_max_file_size(),
            analysis: AnalysisOptions::default(),
        }
    }
}

impl Config {
    /// Builds the config from `EDA_*` variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();
        let analysis = AnalysisOptions {
            top_k: parse_var(&lookup, "EDA_TOP_K")?.unwrap_or(defaults.analysis.top_k),
            max_category_columns: parse_var(&lookup, "EDA_MAX_CATEGORY_COLUMNS")?
                .unwrap_or(defaults.analysis.max_category_columns),
            ..defaults.analysis
        };

        Ok(Config {
            bind_addr: parse_var(&lookup, "EDA_BIND_ADDR")?.unwrap_or(defaults.bind_addr),
            max_file_size: parse_var(&lookup, "EDA_MAX_FILE_SIZE")?
                .unwrap_or(defaults.max_file_size),
            analysis,
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("invalid value for {}: '{}'", key, raw))
        })
        .transpose()
}

/// Loads `.env` if present, then reads the environment.
pub fn load_config() -> Result<Config> {
    dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!("Loaded configuration: {:?}", config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.analysis, AnalysisOptions::default());
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("EDA_BIND_ADDR", "0.0.0.0:8080"),
            ("EDA_MAX_FILE_SIZE", "2048"),
            ("EDA_TOP_K", "3"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.max_file_size, 2048);
        assert_eq!(config.analysis.top_k, 3);
        assert_eq!(config.analysis.max_category_columns, 5);
    }

    #[test]
    fn rejects_garbage() {
        let err = Config::from_lookup(lookup(&[("EDA_TOP_K", "many")])).unwrap_err();
        assert!(err.to_string().contains("EDA_TOP_K"));
    }
}
