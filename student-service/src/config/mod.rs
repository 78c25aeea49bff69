use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct StudentConfig {
    pub common: core_config::Config,
    pub store: StoreConfig,
    pub diagnostics: DiagnosticsConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub mongodb: Option<MongoConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    MongoDb,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

/// Extra fields attached to the student list response.
#[derive(Debug, Clone)]
pub struct DiagnosticsConfig {
    pub enabled: bool,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            message: default_banner(),
        }
    }
}

fn default_banner() -> String {
    format!("student-service v{}", env!("CARGO_PKG_VERSION"))
}

impl StudentConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;
        Self::from_lookup(common_config, |key| env::var(key).ok())
    }

    /// Build the service settings from a variable lookup.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_prod = lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string()) == "prod";
        let get_env = |key: &str, default: Option<&str>| get_env(&lookup, key, default, is_prod);

        let backend: StoreBackend = get_env("STORE_BACKEND", Some("memory"))?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let mongodb = match backend {
            StoreBackend::MongoDb => Some(MongoConfig {
                uri: get_env("MONGODB_URI", None)?,
                database: get_env("MONGODB_DATABASE", Some("student_db"))?,
            }),
            StoreBackend::Memory => None,
        };

        let diagnostics_enabled = match lookup("LIST_DIAGNOSTICS_ENABLED") {
            Some(value) => value.trim().parse().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!(
                    "Invalid LIST_DIAGNOSTICS_ENABLED '{}': {}",
                    value,
                    e
                ))
            })?,
            None => true,
        };

        Ok(StudentConfig {
            common,
            store: StoreConfig { backend, mongodb },
            diagnostics: DiagnosticsConfig {
                enabled: diagnostics_enabled,
                message: lookup("LIST_DIAGNOSTICS_MESSAGE").unwrap_or_else(default_banner),
            },
            observability: ObservabilityConfig {
                log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                otlp_endpoint: lookup("OTLP_ENDPOINT").filter(|s| !s.is_empty()),
            },
        })
    }

    /// In-memory configuration on a random port, used by tests.
    pub fn in_memory() -> Self {
        StudentConfig {
            common: core_config::Config {
                port: 0,
                ..Default::default()
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                mongodb: None,
            },
            diagnostics: DiagnosticsConfig::default(),
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                otlp_endpoint: None,
            },
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "mongodb" | "mongo" => Ok(StoreBackend::MongoDb),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::MongoDb => write!(f, "mongodb"),
        }
    }
}

fn get_env<F>(lookup: &F, key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => Ok(val),
        None => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_from(vars: &[(&str, &str)]) -> Result<StudentConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        StudentConfig::from_lookup(core_config::Config::default(), |key| vars.get(key).cloned())
    }

    #[test]
    fn load_without_variables_uses_defaults() {
        let config = load_from(&[]).unwrap();

        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert!(config.store.mongodb.is_none());
        assert!(config.diagnostics.enabled);
        assert_eq!(config.observability.log_level, "info");
        assert!(config.observability.otlp_endpoint.is_none());
    }

    #[test]
    fn diagnostics_flag_is_honoured() {
        let off = load_from(&[("LIST_DIAGNOSTICS_ENABLED", "false")]).unwrap();
        assert!(!off.diagnostics.enabled);

        let on = load_from(&[
            ("LIST_DIAGNOSTICS_ENABLED", "true"),
            ("LIST_DIAGNOSTICS_MESSAGE", "hello"),
        ])
        .unwrap();
        assert!(on.diagnostics.enabled);
        assert_eq!(on.diagnostics.message, "hello");
    }

    #[test]
    fn invalid_diagnostics_flag_fails_startup() {
        for value in ["0", "no", "off"] {
            let result = load_from(&[("LIST_DIAGNOSTICS_ENABLED", value)]);
            assert!(
                matches!(result, Err(AppError::ConfigError(_))),
                "value {:?} should be rejected",
                value
            );
        }
    }

    #[test]
    fn invalid_backend_fails_startup() {
        let result = load_from(&[("STORE_BACKEND", "postgres")]);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn mongodb_backend_requires_uri() {
        assert!(load_from(&[("STORE_BACKEND", "mongodb")]).is_err());

        let config = load_from(&[
            ("STORE_BACKEND", "mongodb"),
            ("MONGODB_URI", "mongodb://localhost:27017"),
        ])
        .unwrap();
        let mongo = config.store.mongodb.expect("mongodb settings");
        assert_eq!(mongo.database, "student_db");
    }

    #[test]
    fn production_requires_explicit_backend() {
        let result = load_from(&[("ENVIRONMENT", "prod")]);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("Memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert_eq!("MONGODB".parse::<StoreBackend>(), Ok(StoreBackend::MongoDb));
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn in_memory_config_binds_random_port() {
        let config = StudentConfig::in_memory();

        assert_eq!(config.common.port, 0);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert!(config.diagnostics.enabled);
        assert!(config.diagnostics.message.starts_with("student-service v"));
    }
}
