//! Runtime configuration read from the environment.

use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_DATA_FILE: &str = "data/qa-data.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address the HTTP server binds to (`QA_BIND_ADDR`).
    pub bind_addr: String,
    /// JSON document holding every record (`QA_DATA_FILE`).
    pub data_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.  Unset or blank
    /// variables fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();
        Config {
            bind_addr: read("QA_BIND_ADDR").unwrap_or(defaults.bind_addr),
            data_file: read("QA_DATA_FILE").map(PathBuf::from).unwrap_or(defaults.data_file),
        }
    }
}
