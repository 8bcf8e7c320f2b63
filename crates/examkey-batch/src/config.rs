//! examkey configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use examkey_core::ingest::IngestOptions;

/// Top-level examkey configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamkeyConfig {
    /// Max submissions scored concurrently.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for batch reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Import normalization settings.
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// The `[ingest]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Option cells treated as empty.
    #[serde(default = "default_placeholders")]
    pub placeholders: Vec<String>,
    /// Lettered options read per question (`A`..).
    #[serde(default = "default_max_options")]
    pub max_options: usize,
}

fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./examkey-results")
}
fn default_placeholders() -> Vec<String> {
    vec!["-".to_string()]
}
fn default_max_options() -> usize {
    5
}

impl Default for ExamkeyConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
            ingest: IngestConfig::default(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            placeholders: default_placeholders(),
            max_options: default_max_options(),
        }
    }
}

impl IngestConfig {
    pub fn options(&self) -> IngestOptions {
        IngestOptions {
            placeholders: self.placeholders.clone(),
            max_options: self.max_options,
        }
    }
}

impl ExamkeyConfig {
    /// Reject settings the batch layer cannot run with.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.parallelism >= 1, "parallelism must be at least 1");
        anyhow::ensure!(
            (1..=26).contains(&self.ingest.max_options),
            "ingest.max_options must be between 1 and 26, got {}",
            self.ingest.max_options
        );
        Ok(())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
/// Unset variables resolve to the empty string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examkey.toml` in the current directory
/// 2. `~/.config/examkey/config.toml`
///
/// Environment variable overrides: `EXAMKEY_PARALLELISM`, `EXAMKEY_OUTPUT_DIR`.
pub fn load_config() -> Result<ExamkeyConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamkeyConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examkey.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            parse_config_file(&path)?
        }
        None => ExamkeyConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<ExamkeyConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<ExamkeyConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn apply_env_overrides(config: &mut ExamkeyConfig) -> Result<()> {
    if let Ok(value) = std::env::var("EXAMKEY_PARALLELISM") {
        config.parallelism = value
            .trim()
            .parse()
            .with_context(|| format!("invalid EXAMKEY_PARALLELISM: '{value}'"))?;
    }
    if let Ok(dir) = std::env::var("EXAMKEY_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }

    let output_dir = config.output_dir.to_string_lossy().into_owned();
    if output_dir.contains("${") {
        config.output_dir = PathBuf::from(resolve_env_vars(&output_dir));
    }
    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examkey"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_EXAMKEY_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_EXAMKEY_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_EXAMKEY_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${_EXAMKEY_UNSET_VAR}/x"), "/x");
        assert_eq!(resolve_env_vars("${unterminated"), "${unterminated");
        std::env::remove_var("_EXAMKEY_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = ExamkeyConfig::default();
        assert_eq!(config.parallelism, 4);
        assert_eq!(config.output_dir, PathBuf::from("./examkey-results"));
        assert_eq!(config.ingest.options(), IngestOptions::default());
    }

    #[test]
    fn parse_partial_config() {
        let toml_str = r#"
parallelism = 8

[ingest]
placeholders = ["-", "n/a"]
"#;
        let config: ExamkeyConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.parallelism, 8);
        assert_eq!(config.output_dir, PathBuf::from("./examkey-results"));
        assert_eq!(config.ingest.placeholders, vec!["-", "n/a"]);
        assert_eq!(config.ingest.max_options, 5);
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut config = ExamkeyConfig::default();
        config.parallelism = 0;
        assert!(config.validate().is_err());

        let mut config = ExamkeyConfig::default();
        config.ingest.max_options = 27;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_options"));
    }

    #[test]
    fn explicit_path_must_exist() {
        let err = load_config_from(Some(Path::new("/nonexistent/examkey.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn load_from_file_resolves_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("examkey.toml");
        std::fs::write(
            &path,
            "output_dir = \"${_EXAMKEY_CONFIG_TEST_ROOT}/results\"\n[ingest]\nmax_options = 4\n",
        )
        .unwrap();
        std::env::set_var("_EXAMKEY_CONFIG_TEST_ROOT", "/srv/exams");

        let config = parse_config_file(&path).unwrap();
        assert_eq!(config.ingest.max_options, 4);

        let mut resolved = config.clone();
        apply_env_overrides(&mut resolved).unwrap();
        std::env::remove_var("_EXAMKEY_CONFIG_TEST_ROOT");
        assert_eq!(resolved.output_dir, PathBuf::from("/srv/exams/results"));
    }
}
