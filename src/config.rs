use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Log output format: "pretty" or "json"
    pub log_format: LogFormat,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/gatekeep.db".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations) - higher = more CPU work
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

impl SecurityConfig {
    /// Build the argon2 parameter set, failing on out-of-range values.
    pub fn argon2_params(&self) -> Result<argon2::Params> {
        argon2::Params::new(
            self.argon2_memory_cost_kib,
            self.argon2_time_cost,
            self.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))
    }
}

impl Config {
    /// Config file to load: an explicit path, then `GATEKEEP_CONFIG`, then the
    /// first existing file in the standard locations. `None` means defaults.
    #[must_use]
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        pick_config_path(
            explicit,
            std::env::var("GATEKEEP_CONFIG").ok(),
            &Self::config_paths(),
        )
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("gatekeep").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".gatekeep").join("config.toml"));
        }

        paths
    }

    pub fn create_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_path.trim().is_empty() {
            anyhow::bail!("Database path cannot be empty");
        }

        if self.general.max_db_connections == 0 {
            anyhow::bail!("max_db_connections must be > 0");
        }

        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!(
                "min_db_connections ({}) cannot exceed max_db_connections ({})",
                self.general.min_db_connections,
                self.general.max_db_connections
            );
        }

        self.security.argon2_params()?;

        Ok(())
    }
}

fn pick_config_path(
    explicit: Option<&Path>,
    from_env: Option<String>,
    candidates: &[PathBuf],
) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| from_env.filter(|p| !p.is_empty()).map(PathBuf::from))
        .or_else(|| candidates.iter().find(|p| p.exists()).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, LogFormat::Pretty);
        assert_eq!(config.security.argon2_memory_cost_kib, 8192);
        assert_eq!(config.security.argon2_time_cost, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[security]"));
        assert!(toml_str.contains("log_format = \"pretty\""));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"
            log_format = "json"

            [security]
            argon2_time_cost = 2
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.log_format, LogFormat::Json);
        assert_eq!(config.security.argon2_time_cost, 2);

        assert_eq!(config.security.argon2_parallelism, 1);
        assert_eq!(config.general.database_path, "sqlite:data/gatekeep.db");
    }

    #[test]
    fn test_validate_rejects_bad_pool_and_params() {
        let mut config = Config::default();
        config.general.min_db_connections = 10;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.security.argon2_time_cost = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir()
            .join(format!("gatekeep-config-{}", uuid::Uuid::new_v4()))
            .join("config.toml");

        let mut config = Config::default();
        config.general.log_level = "warn".to_string();
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.general.log_level, "warn");

        assert!(!Config::create_default_if_missing(&path).unwrap());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_config_path_precedence() {
        let existing = std::env::temp_dir();
        let missing = existing.join(format!("missing-{}.toml", uuid::Uuid::new_v4()));
        let candidates = vec![missing.clone(), existing.clone()];

        assert_eq!(
            pick_config_path(Some(&missing), Some("env.toml".into()), &candidates),
            Some(missing.clone())
        );
        assert_eq!(
            pick_config_path(None, Some("env.toml".into()), &candidates),
            Some(PathBuf::from("env.toml"))
        );
        assert_eq!(
            pick_config_path(None, Some(String::new()), &candidates),
            Some(existing)
        );
        assert_eq!(pick_config_path(None, None, &[missing]), None);
    }
}
