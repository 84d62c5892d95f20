//! Runtime configuration.
//!
//! Sources, lowest to highest precedence: built-in defaults, an optional TOML
//! file, then environment variables. Loaded once at startup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{LivedocError, Result};
use crate::evaluator::HeuristicPolicy;
use crate::generator::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use crate::orchestrator::PipelineConfig;
use crate::sandbox::ExecutionControls;

const REDACTED: &str = "<redacted>";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivedocConfig {
    pub quality: PipelineConfig,
    pub generator: GeneratorConfig,
    pub sandbox: SandboxSettings,
    pub evaluator: EvaluatorConfig,
    pub git: GitConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub gemini_api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }
}

impl GeneratorConfig {
    /// The Gemini key, if one is set and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.gemini_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SandboxBackendKind {
    /// No sandbox; every snippet is reported as not run.
    #[default]
    None,
    /// Interpreters on this machine, in a temporary directory.
    Local,
    /// Hosted sandbox service.
    Remote,
}

impl std::str::FromStr for SandboxBackendKind {
    type Err = LivedocError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "disabled" | "off" => Ok(Self::None),
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            other => Err(LivedocError::InvalidConfig(format!(
                "unknown sandbox backend '{other}' (expected none, local or remote)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSettings {
    pub backend: SandboxBackendKind,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    #[serde(flatten)]
    pub controls: ExecutionControls,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorKind {
    #[default]
    Heuristic,
    Remote,
}

impl std::str::FromStr for EvaluatorKind {
    type Err = LivedocError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heuristic" => Ok(Self::Heuristic),
            "remote" => Ok(Self::Remote),
            other => Err(LivedocError::InvalidConfig(format!(
                "unknown evaluator '{other}' (expected heuristic or remote)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    pub kind: EvaluatorKind,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub heuristic: HeuristicPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    pub repo_path: PathBuf,
    pub branch: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            repo_path: PathBuf::from("."),
            branch: "main".to_string(),
        }
    }
}

impl LivedocConfig {
    /// Defaults, then `path` if given, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Overlay values from environment-style lookups. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("MIN_DOC_QUALITY_SCORE") {
            self.quality.min_quality_threshold = parse_env("MIN_DOC_QUALITY_SCORE", &v)?;
        }
        if let Some(v) = get("MAX_SELF_CORRECTION_ATTEMPTS") {
            self.quality.max_self_correction_attempts =
                parse_env("MAX_SELF_CORRECTION_ATTEMPTS", &v)?;
        }
        if let Some(v) = get("GEMINI_API_KEY") {
            self.generator.gemini_api_key = Some(v);
        }
        if let Some(v) = get("GEMINI_MODEL") {
            self.generator.model = v;
        }
        if let Some(v) = get("SANDBOX_BACKEND") {
            self.sandbox.backend = v.parse()?;
        }
        if let Some(v) = get("SANDBOX_API_URL") {
            self.sandbox.api_url = Some(v);
        }
        if let Some(v) = get("SANDBOX_API_KEY") {
            self.sandbox.api_key = Some(v);
        }
        if let Some(v) = get("EVALUATOR_BACKEND") {
            self.evaluator.kind = v.parse()?;
        }
        if let Some(v) = get("EVALUATOR_API_URL") {
            self.evaluator.api_url = Some(v);
        }
        if let Some(v) = get("EVALUATOR_API_KEY") {
            self.evaluator.api_key = Some(v);
        }
        if let Some(v) = get("GIT_REPO_PATH") {
            self.git.repo_path = PathBuf::from(v);
        }
        if let Some(v) = get("GIT_BRANCH") {
            self.git.branch = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.quality.validate()?;
        self.sandbox
            .controls
            .validate()
            .map_err(|e| LivedocError::InvalidConfig(e.to_string()))?;

        if self.sandbox.backend == SandboxBackendKind::Remote && is_blank(&self.sandbox.api_url) {
            return Err(LivedocError::InvalidConfig(
                "remote sandbox requires sandbox.api_url (SANDBOX_API_URL)".into(),
            ));
        }
        if self.evaluator.kind == EvaluatorKind::Remote && is_blank(&self.evaluator.api_url) {
            return Err(LivedocError::InvalidConfig(
                "remote evaluator requires evaluator.api_url (EVALUATOR_API_URL)".into(),
            ));
        }
        if self.git.branch.trim().is_empty() {
            return Err(LivedocError::InvalidConfig("git.branch must not be empty".into()));
        }
        Ok(())
    }

    /// Copy with every secret replaced, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for secret in [
            &mut copy.generator.gemini_api_key,
            &mut copy.sandbox.api_key,
            &mut copy.evaluator.api_key,
        ] {
            if secret.is_some() {
                *secret = Some(REDACTED.to_string());
            }
        }
        copy
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| LivedocError::InvalidConfig(format!("{key}={value}: {e}")))
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LivedocConfig::default();
        assert_eq!(config.quality.min_quality_threshold, 0.7);
        assert_eq!(config.quality.max_self_correction_attempts, 3);
        assert_eq!(config.sandbox.backend, SandboxBackendKind::None);
        assert_eq!(config.evaluator.kind, EvaluatorKind::Heuristic);
        assert_eq!(config.git.branch, "main");
        assert!(config.generator.api_key().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config = LivedocConfig::from_toml_str(
            r#"
            [quality]
            min_quality_threshold = 0.8

            [sandbox]
            backend = "local"
            timeout_ms = 5000
            max_concurrency = 2

            [evaluator.heuristic]
            accuracy_base = 0.9

            [git]
            branch = "develop"
            "#,
        )
        .unwrap();

        assert_eq!(config.quality.min_quality_threshold, 0.8);
        assert_eq!(config.quality.max_self_correction_attempts, 3);
        assert_eq!(config.sandbox.backend, SandboxBackendKind::Local);
        assert_eq!(config.sandbox.controls.timeout_ms, 5000);
        assert_eq!(config.sandbox.controls.max_concurrency, 2);
        assert_eq!(config.sandbox.controls.max_retries, 2);
        assert_eq!(config.evaluator.heuristic.accuracy_base, 0.9);
        assert_eq!(config.evaluator.heuristic.tone_base, 0.7);
        assert_eq!(config.git.branch, "develop");
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = LivedocConfig::from_toml_str("[quality\nmin = ").unwrap_err();
        assert!(matches!(err, LivedocError::ConfigParse(_)));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = LivedocConfig::from_toml_str("[git]\nbranch = \"develop\"").unwrap();
        config
            .apply_env(env(&[
                ("MIN_DOC_QUALITY_SCORE", "0.85"),
                ("MAX_SELF_CORRECTION_ATTEMPTS", "5"),
                ("GEMINI_API_KEY", "g-key"),
                ("SANDBOX_BACKEND", "remote"),
                ("SANDBOX_API_URL", "https://sandbox.example"),
                ("GIT_BRANCH", "release"),
                ("GIT_REPO_PATH", "  "),
            ]))
            .unwrap();

        assert_eq!(config.quality.min_quality_threshold, 0.85);
        assert_eq!(config.quality.max_self_correction_attempts, 5);
        assert_eq!(config.generator.api_key(), Some("g-key"));
        assert_eq!(config.sandbox.backend, SandboxBackendKind::Remote);
        assert_eq!(config.git.branch, "release");
        assert_eq!(config.git.repo_path, PathBuf::from("."));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_parse_failures() {
        let mut config = LivedocConfig::default();
        let err = config
            .apply_env(env(&[("MIN_DOC_QUALITY_SCORE", "high")]))
            .unwrap_err();
        assert!(err.to_string().contains("MIN_DOC_QUALITY_SCORE"));

        let err = config
            .apply_env(env(&[("SANDBOX_BACKEND", "docker")]))
            .unwrap_err();
        assert!(matches!(err, LivedocError::InvalidConfig(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = LivedocConfig::default();
        config.quality.min_quality_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = LivedocConfig::default();
        config.evaluator.kind = EvaluatorKind::Remote;
        assert!(config.validate().is_err());
        config.evaluator.api_url = Some("https://eval.example".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_redacted_hides_secrets() {
        let mut config = LivedocConfig::default();
        config.generator.gemini_api_key = Some("secret".into());
        let shown = config.redacted();
        assert_eq!(shown.generator.gemini_api_key.as_deref(), Some(REDACTED));
        assert!(shown.sandbox.api_key.is_none());
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("livedoc.toml");
        std::fs::write(&path, "[quality]\nmax_self_correction_attempts = 1\n").unwrap();
        let config = LivedocConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.quality.max_self_correction_attempts, 1);
    }
}
