//! Configuration loading
//!
//! Bootstrap configuration is a single TOML file. Resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`PAES_CONFIG`, `PAES_DATABASE`)
//! 3. TOML config file (explicit path, or `<user config dir>/paes/config.toml`)
//! 4. Compiled default (fallback)
//!
//! Every section is optional; a missing file yields the defaults.

use crate::models::Difficulty;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "PAES_CONFIG";

/// Environment variable overriding the database path
pub const DATABASE_ENV_VAR: &str = "PAES_DATABASE";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub coherence: CoherenceConfig,

    #[serde(default)]
    pub distribution: DistributionThresholds,

    /// Exercise generation service; generation is disabled when absent
    #[serde(default)]
    pub generator: Option<GeneratorConfig>,

    /// Catalog override file; the embedded catalog is used when absent
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Thematic coherence thresholds
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CoherenceConfig {
    /// Best-subject score at or above which the keyword signal counts as strong
    #[serde(default = "default_strong_signal_threshold")]
    pub strong_signal_threshold: f64,

    /// Confidence the declared subject must exceed under a strong signal
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

/// Distribution gap thresholds and difficulty targets
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DistributionThresholds {
    /// Relative deviation from the per-subject mean before a subject is flagged
    #[serde(default = "default_subject_tolerance")]
    pub subject_tolerance: f64,

    /// Relative shortfall from a difficulty target before it is flagged
    #[serde(default = "default_difficulty_tolerance")]
    pub difficulty_tolerance: f64,

    /// Minimum exercises every node should have
    #[serde(default = "default_min_exercises_per_node")]
    pub min_exercises_per_node: u32,

    #[serde(default = "default_target_basico")]
    pub target_basico: f64,

    #[serde(default = "default_target_intermedio")]
    pub target_intermedio: f64,

    #[serde(default = "default_target_avanzado")]
    pub target_avanzado: f64,
}

/// HTTP exercise generation service
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    /// Full URL of the generation endpoint
    pub endpoint: String,

    /// Bearer key sent with every request
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_generator_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_port() -> u16 {
    5740
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_strong_signal_threshold() -> f64 {
    2.0
}

fn default_min_confidence() -> f64 {
    0.5
}

fn default_subject_tolerance() -> f64 {
    0.30
}

fn default_difficulty_tolerance() -> f64 {
    0.20
}

fn default_min_exercises_per_node() -> u32 {
    10
}

fn default_target_basico() -> f64 {
    0.40
}

fn default_target_intermedio() -> f64 {
    0.45
}

fn default_target_avanzado() -> f64 {
    0.15
}

fn default_generator_timeout_secs() -> u64 {
    30
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("paes").join("paes.db"))
        .unwrap_or_else(|| PathBuf::from("./paes_data/paes.db"))
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            port: default_port(),
            logging: LoggingConfig::default(),
            coherence: CoherenceConfig::default(),
            distribution: DistributionThresholds::default(),
            generator: None,
            catalog_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for CoherenceConfig {
    fn default() -> Self {
        Self {
            strong_signal_threshold: default_strong_signal_threshold(),
            min_confidence: default_min_confidence(),
        }
    }
}

impl Default for DistributionThresholds {
    fn default() -> Self {
        Self {
            subject_tolerance: default_subject_tolerance(),
            difficulty_tolerance: default_difficulty_tolerance(),
            min_exercises_per_node: default_min_exercises_per_node(),
            target_basico: default_target_basico(),
            target_intermedio: default_target_intermedio(),
            target_avanzado: default_target_avanzado(),
        }
    }
}

impl DistributionThresholds {
    /// Target share of a difficulty tier
    pub fn target_ratio(&self, difficulty: Difficulty) -> f64 {
        match difficulty {
            Difficulty::Basico => self.target_basico,
            Difficulty::Intermedio => self.target_intermedio,
            Difficulty::Avanzado => self.target_avanzado,
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("subject_tolerance", self.subject_tolerance),
            ("difficulty_tolerance", self.difficulty_tolerance),
        ] {
            if !(0.0..1.0).contains(&value) {
                return Err(Error::Config(format!("distribution.{} must be in [0, 1), got {}", name, value)));
            }
        }
        let targets = [self.target_basico, self.target_intermedio, self.target_avanzado];
        if targets.iter().any(|t| !(0.0..=1.0).contains(t)) {
            return Err(Error::Config("distribution targets must be in [0, 1]".to_string()));
        }
        let sum: f64 = targets.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(Error::Config(format!("distribution targets must sum to 1.0, got {}", sum)));
        }
        Ok(())
    }
}

impl TomlConfig {
    /// Parse and validate a config document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(content).map_err(|e| Error::Config(format!("Parse config failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read config {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.coherence.min_confidence) {
            return Err(Error::Config(format!(
                "coherence.min_confidence must be in [0, 1], got {}",
                self.coherence.min_confidence
            )));
        }
        if self.coherence.strong_signal_threshold < 0.0 {
            return Err(Error::Config("coherence.strong_signal_threshold must not be negative".to_string()));
        }
        if let Some(generator) = &self.generator {
            if generator.endpoint.trim().is_empty() {
                return Err(Error::Config("generator.endpoint must not be empty".to_string()));
            }
        }
        self.distribution.validate()
    }
}

/// Locate the config file: CLI → `PAES_CONFIG` → user config dir
///
/// Returns `None` when no file is named and none exists in the user config dir.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: User config dir (only if present)
    dirs::config_dir()
        .map(|d| d.join("paes").join("config.toml"))
        .filter(|p| p.exists())
}

/// Load the bootstrap configuration with all overrides applied
pub fn load_config(cli_config: Option<&Path>, cli_database: Option<&Path>) -> Result<TomlConfig> {
    let mut config = match resolve_config_path(cli_config) {
        Some(path) => {
            let config = TomlConfig::from_file(&path)?;
            info!("Loaded configuration from {}", path.display());
            config
        }
        None => {
            info!("No configuration file found, using defaults");
            TomlConfig::default()
        }
    };

    if let Some(path) = cli_database {
        config.database_path = path.to_path_buf();
    } else if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
        if !path.trim().is_empty() {
            config.database_path = PathBuf::from(path);
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.port, 5740);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.coherence.strong_signal_threshold, 2.0);
        assert_eq!(config.coherence.min_confidence, 0.5);
        assert_eq!(config.distribution, DistributionThresholds::default());
        assert!(config.generator.is_none());
    }

    #[test]
    fn test_target_ratio_lookup() {
        let thresholds = DistributionThresholds::default();
        assert_eq!(thresholds.target_ratio(Difficulty::Basico), 0.40);
        assert_eq!(thresholds.target_ratio(Difficulty::Intermedio), 0.45);
        assert_eq!(thresholds.target_ratio(Difficulty::Avanzado), 0.15);
    }

    #[test]
    fn test_targets_must_sum_to_one() {
        let err = TomlConfig::from_toml_str("[distribution]\ntarget_basico = 0.9\n").unwrap_err();
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn test_generator_section() {
        let config = TomlConfig::from_toml_str(
            "[generator]\nendpoint = \"http://localhost:9000/generate\"\napi_key = \"k\"\n",
        )
        .unwrap();
        let generator = config.generator.unwrap();
        assert_eq!(generator.timeout_secs, 30);
        assert_eq!(generator.api_key.as_deref(), Some("k"));
    }
}
