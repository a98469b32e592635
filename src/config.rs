use serde::Deserialize;
use std::{
    env, fs,
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::model::ArtifactSource;
use crate::predict::SignPolicy;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config JSON at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid value for {key}: {message}")]
    Value { key: &'static str, message: String },
}

/// Service settings: an optional JSON file (`REWARD_CONFIG`) overlaid with
/// environment variables.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub model_path: PathBuf,
    pub meta_path: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    pub sign_policy: SignPolicy,
    pub log_predictions: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model.json"),
            meta_path: None,
            host: "0.0.0.0".to_string(),
            port: 8080,
            sign_policy: SignPolicy::default(),
            log_predictions: false,
        }
    }
}

impl ServiceConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// File (if `REWARD_CONFIG` is set), then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = match env::var_os("REWARD_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        cfg.apply_overrides(|key| env::var(key).ok())?;
        Ok(cfg)
    }

    /// Applies `MODEL_PATH`, `META_PATH`, `HOST`, `PORT`,
    /// `REWARD_SIGN_POLICY` and `LOG_PRED` from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MODEL_PATH") {
            self.model_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("META_PATH") {
            self.meta_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("HOST") {
            self.host = v;
        }
        if let Some(v) = lookup("PORT") {
            self.port = v.trim().parse().map_err(|_| ConfigError::Value {
                key: "PORT",
                message: format!("'{v}' is not a port number"),
            })?;
        }
        if let Some(v) = lookup("REWARD_SIGN_POLICY") {
            self.sign_policy = v.parse().map_err(|message| ConfigError::Value {
                key: "REWARD_SIGN_POLICY",
                message,
            })?;
        }
        if let Some(v) = lookup("LOG_PRED") {
            self.log_predictions = v.trim() == "1";
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.host.parse().map_err(|_| ConfigError::Value {
            key: "HOST",
            message: format!("'{}' is not an IP address", self.host),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn artifact(&self) -> ArtifactSource {
        let mut src = ArtifactSource::new(resolve_artifact_path(&self.model_path));
        if let Some(meta) = &self.meta_path {
            src = src.with_meta(resolve_artifact_path(meta));
        }
        src
    }
}

/// Relative paths are tried against the working directory, then next to the
/// executable. Falls back to the working-directory join so the loader reports
/// a path the operator recognises.
pub fn resolve_artifact_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let candidates = [
        cwd.join(path),
        {
            let mut p = env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
            p.pop(); // exe dir
            p.join(path)
        },
    ];

    for c in &candidates {
        if c.exists() {
            return c.clone();
        }
    }
    cwd.join(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = ServiceConfig::default();
        assert_eq!(cfg.model_path, PathBuf::from("model.json"));
        assert_eq!(cfg.bind_addr().unwrap(), "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.sign_policy, SignPolicy::Absolute);
        assert!(!cfg.log_predictions);
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = ServiceConfig::default();
        cfg.apply_overrides(lookup(&[
            ("MODEL_PATH", "/models/reward.json"),
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("REWARD_SIGN_POLICY", "clamp"),
            ("LOG_PRED", "1"),
        ]))
        .unwrap();
        assert_eq!(cfg.model_path, PathBuf::from("/models/reward.json"));
        assert_eq!(cfg.bind_addr().unwrap(), "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.sign_policy, SignPolicy::ClampZero);
        assert!(cfg.log_predictions);
        assert_eq!(cfg.artifact().path, PathBuf::from("/models/reward.json"));
    }

    #[test]
    fn bad_values_are_rejected() {
        let mut cfg = ServiceConfig::default();
        let err = cfg.apply_overrides(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));

        let err = cfg
            .apply_overrides(lookup(&[("REWARD_SIGN_POLICY", "round")]))
            .unwrap_err();
        assert!(err.to_string().contains("REWARD_SIGN_POLICY"));

        cfg.host = "localhost:80".into();
        assert!(cfg.bind_addr().is_err());
    }

    #[test]
    fn file_config_with_partial_fields() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("service.json");
        fs::write(&path, r#"{"port": 8000, "sign_policy": "clamp_zero"}"#).unwrap();
        let cfg = ServiceConfig::from_file(&path).unwrap();
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.sign_policy, SignPolicy::ClampZero);
        assert_eq!(cfg.host, "0.0.0.0");

        fs::write(&path, "{port: 1").unwrap();
        assert!(matches!(
            ServiceConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            ServiceConfig::from_file(&dir.path().join("absent.json")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn relative_paths_resolve_against_cwd() {
        let resolved = resolve_artifact_path(Path::new("definitely-not-here.json"));
        assert!(resolved.is_absolute() || resolved.starts_with("."));
        assert!(resolved.ends_with("definitely-not-here.json"));
    }
}
