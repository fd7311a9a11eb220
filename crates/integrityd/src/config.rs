use crate::error::CliError;
use qsig_core::{VerifierPolicy, DEFAULT_TOLERANCE_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_SCHEMA: &str = "integrityd.config.v1";
pub const RUNTIME_ROOT_ENV: &str = "QSIG_RUNTIME_ROOT";

const DEFAULT_REGISTRY_FILE: &str = "fingerprints.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct IntegrityConfig {
    pub schema: String,
    #[serde(default = "default_tolerance_threshold")]
    pub tolerance_threshold: f64,
    #[serde(default = "default_registry_file")]
    pub registry_file: String,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            schema: CONFIG_SCHEMA.to_string(),
            tolerance_threshold: default_tolerance_threshold(),
            registry_file: default_registry_file(),
        }
    }
}

impl IntegrityConfig {
    /// Verifier policy, with `override_tolerance` taking precedence.
    pub fn policy(&self, override_tolerance: Option<f64>) -> Result<VerifierPolicy, CliError> {
        let tolerance = override_tolerance.unwrap_or(self.tolerance_threshold);
        VerifierPolicy::new(tolerance)
            .map_err(|e| CliError::with_detail("config_invalid", e.to_string()))
    }

    pub fn registry_path(&self, runtime_root: &Path) -> PathBuf {
        runtime_root.join(&self.registry_file)
    }
}

pub fn config_path(runtime_root: &Path) -> PathBuf {
    runtime_root.join("config.json")
}

pub fn audit_log_path(runtime_root: &Path) -> PathBuf {
    runtime_root.join("logs").join("audit.jsonl")
}

/// Runtime root from the environment, else `./runtime`.
pub fn default_runtime_root() -> PathBuf {
    if let Some(v) = std::env::var_os(RUNTIME_ROOT_ENV) {
        return PathBuf::from(v);
    }
    PathBuf::from("runtime")
}

pub fn load_config(runtime_root: &Path) -> Result<IntegrityConfig, CliError> {
    let path = config_path(runtime_root);
    if !path.exists() {
        return Ok(IntegrityConfig::default());
    }
    let bytes = fs::read(&path)
        .map_err(|e| CliError::with_detail("config_read_failed", e.to_string()))?;
    let mut config: IntegrityConfig = serde_json::from_slice(&bytes)
        .map_err(|e| CliError::with_detail("config_invalid", e.to_string()))?;
    if config.schema != CONFIG_SCHEMA {
        return Err(CliError::with_detail(
            "config_invalid",
            format!("expected schema {}, got {}", CONFIG_SCHEMA, config.schema),
        ));
    }
    normalize_config(&mut config)?;
    Ok(config)
}

fn normalize_config(config: &mut IntegrityConfig) -> Result<(), CliError> {
    config.policy(None)?;
    config.registry_file = normalize_registry_file(&config.registry_file)?;
    Ok(())
}

fn normalize_registry_file(value: &str) -> Result<String, CliError> {
    let input = value.trim().replace('\\', "/");
    if input.is_empty() || input.starts_with('/') {
        return Err(CliError::with_detail(
            "config_invalid",
            "registry_file must be a relative path".to_string(),
        ));
    }
    let mut segments = Vec::new();
    for segment in input.split('/') {
        let trimmed = segment.trim();
        if trimmed.is_empty() || trimmed == "." {
            continue;
        }
        if trimmed == ".." {
            return Err(CliError::with_detail(
                "config_invalid",
                "registry_file must stay inside the runtime root".to_string(),
            ));
        }
        segments.push(trimmed.to_string());
    }
    if segments.is_empty() {
        return Err(CliError::new("config_invalid"));
    }
    Ok(segments.join("/"))
}

fn default_tolerance_threshold() -> f64 {
    DEFAULT_TOLERANCE_THRESHOLD
}

fn default_registry_file() -> String {
    DEFAULT_REGISTRY_FILE.to_string()
}
