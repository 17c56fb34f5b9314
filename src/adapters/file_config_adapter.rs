//! INI file configuration with environment overrides.
//!
//! `STOCKFOLIO_<SECTION>_<KEY>` (e.g. `STOCKFOLIO_AUTH_JWT_SECRET`) takes
//! precedence over the file, so secrets can stay out of it.

use std::collections::HashMap;
use std::path::Path;

use configparser::ini::Ini;

use crate::domain::error::StockfolioError;
use crate::ports::config_port::ConfigPort;

const ENV_PREFIX: &str = "STOCKFOLIO_";

pub struct FileConfigAdapter {
    ini: Ini,
    overrides: HashMap<String, String>,
}

fn env_key(section: &str, key: &str) -> String {
    format!("{}_{}", section, key).to_uppercase()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

impl FileConfigAdapter {
    /// Loads `path` and applies overrides from the process environment.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StockfolioError> {
        let path = path.as_ref();
        let mut ini = Ini::new();
        ini.load(path).map_err(|reason| StockfolioError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self {
            ini,
            overrides: HashMap::new(),
        }
        .with_env(std::env::vars()))
    }

    /// Parses inline INI text. The environment is not consulted.
    pub fn from_string(content: &str) -> Result<Self, StockfolioError> {
        let mut ini = Ini::new();
        ini.read(content.to_string())
            .map_err(|reason| StockfolioError::ConfigParse {
                file: "<inline>".to_string(),
                reason,
            })?;
        Ok(Self {
            ini,
            overrides: HashMap::new(),
        })
    }

    pub fn with_env(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        for (name, value) in vars {
            if let Some(rest) = name.strip_prefix(ENV_PREFIX) {
                self.overrides.insert(rest.to_uppercase(), value);
            }
        }
        self
    }

    fn lookup(&self, section: &str, key: &str) -> Option<String> {
        self.overrides
            .get(&env_key(section, key))
            .cloned()
            .or_else(|| self.ini.get(section, key))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.lookup(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.lookup(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.lookup(section, key)
            .as_deref()
            .and_then(parse_bool)
            .unwrap_or(default)
    }
}
