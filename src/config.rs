use crate::ledger::DEFAULT_MAX_ATTEMPTS;
use std::{env, path::PathBuf};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/state.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub port: u16,
    pub ledger_max_attempts: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_path = lookup("APP_DATA_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let ledger_max_attempts = lookup("LEDGER_MAX_ATTEMPTS")
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_ATTEMPTS)
            .max(1);

        Self {
            data_path,
            port,
            ledger_max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]);
        assert_eq!(cfg.data_path, PathBuf::from("data/state.json"));
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.ledger_max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn reads_values_and_ignores_garbage() {
        let cfg = config(&[
            ("APP_DATA_PATH", "/tmp/pets.json"),
            ("PORT", "not-a-port"),
            ("LEDGER_MAX_ATTEMPTS", "0"),
        ]);
        assert_eq!(cfg.data_path, PathBuf::from("/tmp/pets.json"));
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.ledger_max_attempts, 1);
    }
}
