use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::AppConfig;
use crate::core::errors::PipelineError;

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("JUPITERBOT_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    /// Loads `config.yml` deep-merged with `secrets.yml` and validates the
    /// result. Absent files fall back to defaults; malformed files are a
    /// configuration error rather than a silent default.
    pub fn load(&self) -> Result<AppConfig, PipelineError> {
        let public_config = load_yaml_file(&self.config_path())?;
        let secrets_config = load_yaml_file(&self.secrets_path())?;
        let merged = deep_merge(&public_config, &secrets_config);

        let config: AppConfig = serde_json::from_value(merged)
            .map_err(|err| PipelineError::Configuration(format!("invalid config: {err}")))?;
        config.validate()?;
        Ok(config)
    }
}

fn load_yaml_file(path: &Path) -> Result<Value, PipelineError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path).map_err(|err| {
        PipelineError::Configuration(format!("cannot read {}: {err}", path.display()))
    })?;

    let value: Value = serde_yaml::from_str(&contents).map_err(|err| {
        PipelineError::Configuration(format!("cannot parse {}: {err}", path.display()))
    })?;

    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        _ => Err(PipelineError::Configuration(format!(
            "{} must contain a mapping",
            path.display()
        ))),
    }
}

fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut merged = base_map.clone();
            for (key, overlay_value) in overlay_map {
                let entry = merged
                    .get(key)
                    .map(|base_value| deep_merge(base_value, overlay_value))
                    .unwrap_or_else(|| overlay_value.clone());
                merged.insert(key.clone(), entry);
            }
            Value::Object(merged)
        }
        _ => overlay.clone(),
    }
}
