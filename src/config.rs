//! Service configuration.
//!
//! Everything is read from the environment, best-effort: a malformed value
//! is logged and the default kept.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogMode {
    Stdout,
    File(PathBuf),
}

impl LogMode {
    /// Read `MEDPREDICT_LOG_MODE` and `MEDPREDICT_LOG_FILE` only.
    ///
    /// Logging is set up from this before the rest of the configuration is
    /// read, so that warnings about the other variables are not lost.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let log_file = lookup("MEDPREDICT_LOG_FILE")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
        match lookup("MEDPREDICT_LOG_MODE").as_deref().map(str::trim) {
            Some("file") => Self::File(PathBuf::from(log_file)),
            Some("stdout") | None => Self::Stdout,
            Some(other) => {
                tracing::warn!("Unknown MEDPREDICT_LOG_MODE={:?}; logging to stdout", other);
                Self::Stdout
            }
        }
    }
}

/// Configuration for the prediction service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Listen address
    pub bind: SocketAddr,

    /// Directory holding the model artifacts
    pub model_dir: PathBuf,

    /// Symptom knowledge base (vocabulary, descriptions, precautions)
    pub knowledge_file: PathBuf,

    /// Keep successfully loaded models in memory
    pub cache_models: bool,

    pub log_mode: LogMode,
}

pub const DEFAULT_BIND: &str = "0.0.0.0:8000";
pub const DEFAULT_MODEL_DIR: &str = "saved_models";
pub const DEFAULT_KNOWLEDGE_FILE: &str = "symptom_knowledge.json";
pub const DEFAULT_LOG_FILE: &str = "medpredict.log";

impl Default for ServiceConfig {
    fn default() -> Self {
        let model_dir = PathBuf::from(DEFAULT_MODEL_DIR);
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
            knowledge_file: model_dir.join(DEFAULT_KNOWLEDGE_FILE),
            model_dir,
            cache_models: false,
            log_mode: LogMode::Stdout,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

impl ServiceConfig {
    /// Load config overrides from environment (best-effort).
    ///
    /// Supported:
    /// - MEDPREDICT_BIND (e.g. `127.0.0.1:8080`)
    /// - MEDPREDICT_MODEL_DIR
    /// - MEDPREDICT_KNOWLEDGE_FILE (defaults to `symptom_knowledge.json`
    ///   inside the model directory)
    /// - MEDPREDICT_CACHE_MODELS=1|true|yes
    /// - MEDPREDICT_LOG_MODE=stdout|file, MEDPREDICT_LOG_FILE
    #[must_use]
    pub fn from_env_or_default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env_or_default`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(v) = lookup("MEDPREDICT_BIND") {
            match v.trim().parse::<SocketAddr>() {
                Ok(addr) => cfg.bind = addr,
                Err(e) => tracing::warn!(
                    "Ignoring MEDPREDICT_BIND={:?}: {}; using {}",
                    v,
                    e,
                    DEFAULT_BIND
                ),
            }
        }

        if let Some(v) = lookup("MEDPREDICT_MODEL_DIR") {
            if !v.trim().is_empty() {
                cfg.model_dir = PathBuf::from(v.trim());
            }
        }

        cfg.knowledge_file = match lookup("MEDPREDICT_KNOWLEDGE_FILE") {
            Some(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
            _ => cfg.model_dir.join(DEFAULT_KNOWLEDGE_FILE),
        };

        if let Some(v) = lookup("MEDPREDICT_CACHE_MODELS") {
            match parse_bool(&v) {
                Some(flag) => cfg.cache_models = flag,
                None => tracing::warn!("Ignoring MEDPREDICT_CACHE_MODELS={:?}", v),
            }
        }

        cfg.log_mode = LogMode::from_lookup(&lookup);

        cfg
    }
}
