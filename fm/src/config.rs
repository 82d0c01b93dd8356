//! FMAP engine configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the default jar location
pub const FMAP_JAR_ENV: &str = "FMAP_JAR";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Solver invocation settings
    pub solver: SolverConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this before solving to fail fast with a clear message instead of
    /// an INTERNAL_ERROR from java.
    pub fn validate(&self) -> Result<()> {
        if !self.solver.jar.is_file() {
            return Err(eyre::eyre!(
                "FMAP jar not found at {}. Set solver.jar or the {} environment variable.",
                self.solver.jar.display(),
                FMAP_JAR_ENV
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .fmap.yml
        let local_config = PathBuf::from(".fmap.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/fmap/fmap.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("fmap").join("fmap.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed: a broken config is reported later by `load`.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => {
                let mut paths = vec![PathBuf::from(".fmap.yml")];
                if let Some(config_dir) = dirs::config_dir() {
                    paths.push(config_dir.join("fmap").join("fmap.yml"));
                }
                paths
            }
        };

        candidates
            .iter()
            .find(|p| p.exists())
            .and_then(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Solver invocation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Java executable
    pub java: String,

    /// Path to FMAP.jar
    pub jar: PathBuf,

    /// Default search algorithm passed as `-s`
    #[serde(rename = "search-algorithm")]
    pub search_algorithm: Option<String>,

    /// Default heuristic passed as `-h`
    pub heuristic: Option<String>,

    /// Default wall-clock limit in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: Option<u64>,

    /// Terminate the solver when the timeout fires
    #[serde(rename = "kill-on-timeout")]
    pub kill_on_timeout: bool,

    /// Time between SIGTERM and SIGKILL in milliseconds
    #[serde(rename = "kill-grace-ms")]
    pub kill_grace_ms: u64,

    /// Parent directory for per-call scratch directories (system temp if unset)
    #[serde(rename = "scratch-dir")]
    pub scratch_dir: Option<PathBuf>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let jar = std::env::var_os(FMAP_JAR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("FMAP").join("FMAP.jar"));

        Self {
            java: "java".to_string(),
            jar,
            search_algorithm: None,
            heuristic: None,
            timeout_ms: None,
            kill_on_timeout: true,
            kill_grace_ms: 2000,
            scratch_dir: None,
        }
    }
}

impl SolverConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn test_default_config() {
        // SAFETY: serialized with the other tests touching the environment
        unsafe { std::env::remove_var(FMAP_JAR_ENV) };
        let config = Config::default();

        assert_eq!(config.solver.java, "java");
        assert_eq!(config.solver.jar, PathBuf::from("FMAP/FMAP.jar"));
        assert!(config.solver.kill_on_timeout);
        assert_eq!(config.solver.kill_grace(), Duration::from_secs(2));
        assert_eq!(config.solver.timeout(), None);
        assert!(config.log_level.is_none());
    }

    #[test]
    #[serial]
    fn test_jar_env_override() {
        // SAFETY: serialized with the other tests touching the environment
        unsafe { std::env::set_var(FMAP_JAR_ENV, "/opt/fmap/FMAP.jar") };
        let config = SolverConfig::default();
        unsafe { std::env::remove_var(FMAP_JAR_ENV) };

        assert_eq!(config.jar, PathBuf::from("/opt/fmap/FMAP.jar"));
    }

    #[test]
    #[serial]
    fn test_deserialize_config() {
        let yaml = r#"
log-level: debug
solver:
  java: /usr/lib/jvm/bin/java
  jar: /opt/fmap/FMAP.jar
  search-algorithm: astar
  heuristic: "2"
  timeout-ms: 60000
  kill-on-timeout: false
  kill-grace-ms: 500
  scratch-dir: /var/tmp
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.solver.java, "/usr/lib/jvm/bin/java");
        assert_eq!(config.solver.search_algorithm.as_deref(), Some("astar"));
        assert_eq!(config.solver.heuristic.as_deref(), Some("2"));
        assert_eq!(config.solver.timeout(), Some(Duration::from_secs(60)));
        assert!(!config.solver.kill_on_timeout);
        assert_eq!(config.solver.scratch_dir, Some(PathBuf::from("/var/tmp")));
    }

    #[test]
    #[serial]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
solver:
  heuristic: "1"
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.solver.heuristic.as_deref(), Some("1"));
        assert_eq!(config.solver.java, "java");
        assert_eq!(config.solver.kill_grace_ms, 2000);
    }

    #[test]
    #[serial]
    fn test_load_explicit_path_and_log_level() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("fmap.yml");
        fs::write(&path, "log-level: TRACE\nsolver:\n  java: myjava\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.solver.java, "myjava");
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("TRACE"));
    }

    #[test]
    #[serial]
    fn test_load_explicit_missing_path_fails() {
        let missing = PathBuf::from("/nonexistent/fmap.yml");
        assert!(Config::load(Some(&missing)).is_err());
        assert!(Config::load_log_level(Some(&missing)).is_none());
    }

    #[test]
    #[serial]
    fn test_validate_requires_jar() {
        let temp = tempdir().unwrap();
        let mut config = Config::default();
        config.solver.jar = temp.path().join("FMAP.jar");
        assert!(config.validate().is_err());

        fs::write(&config.solver.jar, b"PK").unwrap();
        assert!(config.validate().is_ok());
    }
}
