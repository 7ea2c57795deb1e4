//! Loader for client configuration with YAML + environment overlays.
//!
//! Precedence, lowest first: built-in defaults, the YAML file (optional
//! unless passed explicitly), inline YAML snippets, then `SENTI_`-prefixed
//! environment variables using `__` as the section separator
//! (`SENTI_UI__FEEDBACK_DELAY_MS=1500`). `${VAR}` placeholders inside string
//! values are expanded after merging.
//!
//! The backend base URL has its own, documented override:
//! `SENTI_API_BASE_URL` beats `api.base_url`, which beats the `/api`
//! fallback. See [`ApiBase::resolve`].
use config::{Config, ConfigError, Environment, File, FileFormat};
use senti_common::Model;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use url::Url;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Environment variable that overrides the configured API base.
pub const API_BASE_ENV: &str = "SENTI_API_BASE_URL";
/// Base used when neither the environment nor the file names one.
pub const DEFAULT_API_BASE: &str = "/api";
/// Upper bound on non-blank lines per batch request.
pub const MAX_BATCH_LINES: usize = 10;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SentiConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Absolute URL or a path prefix such as `/api`.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Origin a relative `base_url` is resolved against.
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            origin: default_origin(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub default_model: Model,
    #[serde(default = "default_feedback_delay_ms")]
    pub feedback_delay_ms: u64,
    #[serde(default = "default_max_batch_lines")]
    pub max_batch_lines: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            default_model: Model::default(),
            feedback_delay_ms: default_feedback_delay_ms(),
            max_batch_lines: default_max_batch_lines(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            filter: default_log_filter(),
            dir: None,
        }
    }
}

fn default_origin() -> String {
    "http://localhost:5173".into()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_feedback_delay_ms() -> u64 {
    3000
}
fn default_max_batch_lines() -> usize {
    MAX_BATCH_LINES
}
fn default_log_format() -> String {
    "text".into()
}
fn default_log_filter() -> String {
    "info".into()
}

/// Failure to turn configuration into a usable backend URL.
#[derive(Debug, Error)]
pub enum BaseUrlError {
    #[error("invalid API origin {origin:?}: {source}")]
    Origin {
        origin: String,
        source: url::ParseError,
    },
    #[error("invalid API base URL {base:?}: {source}")]
    Base {
        base: String,
        source: url::ParseError,
    },
}

/// Backend base URL, resolved once at startup and injected into the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiBase(String);

impl ApiBase {
    /// Resolve from the process environment and the loaded config.
    pub fn resolve(api: &ApiConfig) -> Result<Self, BaseUrlError> {
        let from_env = std::env::var(API_BASE_ENV).ok();
        Self::resolve_with(from_env.as_deref(), api)
    }

    /// Pure resolution step used by [`ApiBase::resolve`].
    ///
    /// ```
    /// use senti_config::{ApiBase, ApiConfig};
    ///
    /// let api = ApiConfig::default();
    /// let base = ApiBase::resolve_with(None, &api).unwrap();
    /// assert_eq!(base.as_str(), "http://localhost:5173/api");
    ///
    /// let base = ApiBase::resolve_with(Some("https://senti.example.com//"), &api).unwrap();
    /// assert_eq!(base.as_str(), "https://senti.example.com");
    /// ```
    pub fn resolve_with(env_override: Option<&str>, api: &ApiConfig) -> Result<Self, BaseUrlError> {
        let chosen = env_override
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| api.base_url.as_deref().map(str::trim).filter(|s| !s.is_empty()))
            .unwrap_or(DEFAULT_API_BASE);
        let chosen = chosen.trim_end_matches('/');

        let resolved = if chosen.is_empty() || chosen.starts_with('/') {
            let origin = Url::parse(&api.origin).map_err(|source| BaseUrlError::Origin {
                origin: api.origin.clone(),
                source,
            })?;
            let origin = origin.as_str().trim_end_matches('/');
            format!("{origin}{chosen}")
        } else {
            Url::parse(chosen).map_err(|source| BaseUrlError::Base {
                base: chosen.to_string(),
                source,
            })?;
            chosen.to_string()
        };

        tracing::debug!(base = %resolved, "api.base.resolved");
        Ok(Self(resolved))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ApiBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct SentiConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env_prefix: String,
}

impl Default for SentiConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SentiConfigLoader {
    /// Start with defaults only; `SENTI_` env overrides are applied last.
    ///
    /// ```
    /// use senti_config::SentiConfigLoader;
    ///
    /// let config = SentiConfigLoader::new()
    ///     .with_yaml_str("ui:\n  feedback_delay_ms: 1200")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.ui.feedback_delay_ms, 1200);
    /// assert_eq!(config.ui.max_batch_lines, 10);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            env_prefix: "SENTI".into(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; the `config` crate infers
    /// format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when absent, so a bare
    /// environment is enough to run the client.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use senti_common::Model;
    /// use senti_config::SentiConfigLoader;
    ///
    /// let cfg = SentiConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// api:
    ///   base_url: "http://localhost:8000"
    /// ui:
    ///   default_model: bertweet2L
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.api.base_url.as_deref(), Some("http://localhost:8000"));
    /// assert_eq!(cfg.ui.default_model, Model::Bertweet2L);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly
    /// typed config, expanding `${VAR}` placeholders on the way.
    pub fn load(self) -> Result<SentiConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: SentiConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        if !(1..=MAX_BATCH_LINES).contains(&typed.ui.max_batch_lines) {
            return Err(ConfigError::Message(format!(
                "ui.max_batch_lines must be between 1 and {MAX_BATCH_LINES}, got {}",
                typed.ui.max_batch_lines
            )));
        }

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("HOST", Some("example.org")), ("PORT", Some("8000"))], || {
            let mut v = json!([
                "http://$HOST",
                { "base_url": "http://${HOST}:${PORT}" },
                42,
                true,
                null
            ]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!([
                    "http://example.org",
                    { "base_url": "http://example.org:8000" },
                    42,
                    true,
                    null
                ])
            );
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("FOO", Some("start-${BAR}-end")),
            ],
            || {
                let mut v = json!("X=${FOO}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST_SENTI}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST_SENTI}"));
    }

    #[test]
    fn env_override_beats_file_base() {
        let api = ApiConfig {
            base_url: Some("http://from-file:8000".into()),
            ..ApiConfig::default()
        };
        let base = ApiBase::resolve_with(Some("http://from-env:9000/"), &api).unwrap();
        assert_eq!(base.as_str(), "http://from-env:9000");
    }

    #[test]
    fn blank_env_override_is_ignored() {
        let api = ApiConfig {
            base_url: Some("http://from-file:8000".into()),
            ..ApiConfig::default()
        };
        let base = ApiBase::resolve_with(Some("   "), &api).unwrap();
        assert_eq!(base.as_str(), "http://from-file:8000");
    }

    #[test]
    fn relative_base_joins_origin() {
        let api = ApiConfig {
            base_url: Some("/backend/".into()),
            origin: "http://127.0.0.1:3000/".into(),
            ..ApiConfig::default()
        };
        let base = ApiBase::resolve_with(None, &api).unwrap();
        assert_eq!(base.as_str(), "http://127.0.0.1:3000/backend");
    }

    #[test]
    fn garbage_base_is_rejected() {
        let api = ApiConfig::default();
        assert!(matches!(
            ApiBase::resolve_with(Some("not a url"), &api),
            Err(BaseUrlError::Base { .. })
        ));
    }
}
