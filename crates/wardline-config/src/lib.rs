use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config failed: {0}")]
    Read(String),
    #[error("parse config failed: {0}")]
    Parse(String),
    #[error("schema load failed: {0}")]
    SchemaLoad(String),
    #[error("schema validation failed: {0}")]
    SchemaValidation(String),
    #[error("unsupported config: {0}")]
    UnsupportedConfig(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: Server,
    pub store: Store,
    pub guard: Guard,
    #[serde(default)]
    pub language: LanguageSettings,
    #[serde(default)]
    pub menu: Menu,
    pub ward: Ward,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub listen_addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    #[serde(rename = "type")]
    pub kind: String,
    pub sqlite_path: Option<String>,
    #[serde(default = "default_store_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guard {
    pub phone_max_requests: usize,
    pub phone_window_ms: u64,
    pub session_max_requests: usize,
    pub session_window_ms: u64,
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageSettings {
    #[serde(default = "default_language_ttl_ms")]
    pub ttl_ms: u64,
}

impl Default for LanguageSettings {
    fn default() -> Self {
        Self {
            ttl_ms: default_language_ttl_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Menu {
    /// Hide issue reporting and bursary applications from callers whose
    /// registration is not verified. Off by default: every caller gets the
    /// full menu.
    #[serde(default)]
    pub gate_unverified: bool,
    #[serde(default = "default_page_budget")]
    pub page_budget: usize,
    #[serde(default = "default_listing_limit")]
    pub listing_limit: usize,
    #[serde(default = "default_listing_ttl_ms")]
    pub listing_ttl_ms: u64,
}

impl Default for Menu {
    fn default() -> Self {
        Self {
            gate_unverified: false,
            page_budget: default_page_budget(),
            listing_limit: default_listing_limit(),
            listing_ttl_ms: default_listing_ttl_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ward {
    pub name: String,
    pub locations: Vec<String>,
    #[serde(default = "default_country_code")]
    pub default_country_code: String,
}

fn default_store_timeout_ms() -> u64 {
    1_500
}

fn default_sweep_interval_ms() -> u64 {
    60_000
}

fn default_language_ttl_ms() -> u64 {
    5 * 60 * 1000
}

fn default_page_budget() -> usize {
    182
}

fn default_listing_limit() -> usize {
    3
}

fn default_listing_ttl_ms() -> u64 {
    10 * 60 * 1000
}

fn default_country_code() -> String {
    "254".to_string()
}

pub fn load_and_validate(path: &str) -> Result<Config, ConfigError> {
    let config_text =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
    let value: serde_yaml::Value =
        serde_yaml::from_str(&config_text).map_err(|e| ConfigError::Parse(e.to_string()))?;

    let instance = serde_json::to_value(value).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_against_schema(&instance)?;

    let cfg: Config =
        serde_json::from_value(instance).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_runtime_support(&cfg)?;
    Ok(cfg)
}

fn validate_against_schema(instance: &serde_json::Value) -> Result<(), ConfigError> {
    let schema_path = [
        std::path::PathBuf::from("config/config.schema.json"),
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../..")
            .join("config/config.schema.json"),
    ]
    .into_iter()
    .find(|p| p.exists())
    .ok_or_else(|| {
        ConfigError::SchemaLoad(
            "config schema not found at config/config.schema.json or workspace config path"
                .to_string(),
        )
    })?;

    let schema_text =
        std::fs::read_to_string(schema_path).map_err(|e| ConfigError::SchemaLoad(e.to_string()))?;
    let schema: serde_json::Value =
        serde_json::from_str(&schema_text).map_err(|e| ConfigError::SchemaLoad(e.to_string()))?;

    let validator =
        jsonschema::validator_for(&schema).map_err(|e| ConfigError::SchemaLoad(e.to_string()))?;
    if let Err(first) = validator.validate(instance) {
        return Err(ConfigError::SchemaValidation(first.to_string()));
    }
    Ok(())
}

pub fn validate_runtime_support(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.store.kind != "memory" && cfg.store.kind != "sqlite" {
        return Err(ConfigError::UnsupportedConfig(format!(
            "store.type={} is not implemented; supported: memory, sqlite",
            cfg.store.kind
        )));
    }
    if cfg.store.kind == "memory" && cfg.store.sqlite_path.is_some() {
        return Err(ConfigError::UnsupportedConfig(
            "store.sqlite_path is not supported when store.type=memory".to_string(),
        ));
    }
    if cfg.store.kind == "sqlite"
        && cfg
            .store
            .sqlite_path
            .as_ref()
            .map(|v| v.trim().is_empty())
            .unwrap_or(true)
    {
        return Err(ConfigError::UnsupportedConfig(
            "store.sqlite_path is required when store.type=sqlite".to_string(),
        ));
    }
    if cfg.store.timeout_ms == 0 {
        return Err(ConfigError::UnsupportedConfig(
            "store.timeout_ms must be >= 1".to_string(),
        ));
    }
    if cfg.guard.phone_max_requests == 0 || cfg.guard.session_max_requests == 0 {
        return Err(ConfigError::UnsupportedConfig(
            "guard limits must be >= 1".to_string(),
        ));
    }
    if cfg.guard.phone_window_ms == 0 || cfg.guard.session_window_ms == 0 {
        return Err(ConfigError::UnsupportedConfig(
            "guard windows must be >= 1ms".to_string(),
        ));
    }
    if cfg.menu.page_budget < 40 {
        return Err(ConfigError::UnsupportedConfig(
            "menu.page_budget must be >= 40".to_string(),
        ));
    }
    if cfg.menu.listing_limit == 0 || cfg.menu.listing_limit > 9 {
        return Err(ConfigError::UnsupportedConfig(
            "menu.listing_limit must be between 1 and 9".to_string(),
        ));
    }
    if cfg.ward.locations.is_empty() || cfg.ward.locations.len() > 9 {
        return Err(ConfigError::UnsupportedConfig(
            "ward.locations must list between 1 and 9 locations".to_string(),
        ));
    }
    if cfg.ward.locations.iter().any(|l| l.trim().is_empty()) {
        return Err(ConfigError::UnsupportedConfig(
            "ward.locations entries must not be blank".to_string(),
        ));
    }
    if cfg.ward.default_country_code.is_empty()
        || !cfg
            .ward
            .default_country_code
            .chars()
            .all(|c| c.is_ascii_digit())
    {
        return Err(ConfigError::UnsupportedConfig(
            "ward.default_country_code must be digits only".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn write_temp_config(contents: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("wardline-config-test-{nanos}.yaml"));
        std::fs::write(&path, contents).expect("write temp config");
        path.to_string_lossy().to_string()
    }

    fn base_yaml() -> String {
        r#"
server:
  listen_addr: "127.0.0.1:0"

store:
  type: "memory"

guard:
  phone_max_requests: 30
  phone_window_ms: 300000
  session_max_requests: 20
  session_window_ms: 120000

ward:
  name: "KYAMATU WARD"
  locations:
    - "Kyamatu"
    - "Nzeluni"
"#
        .to_string()
    }

    #[test]
    fn fills_defaults_for_optional_sections() {
        let path = write_temp_config(&base_yaml());
        let cfg = load_and_validate(&path).expect("base config should load");
        assert_eq!(cfg.store.timeout_ms, 1_500);
        assert_eq!(cfg.language.ttl_ms, 300_000);
        assert!(!cfg.menu.gate_unverified);
        assert_eq!(cfg.menu.page_budget, 182);
        assert_eq!(cfg.ward.default_country_code, "254");
    }

    #[test]
    fn supports_sqlite_store_type_with_path() {
        let path = write_temp_config(&base_yaml().replace(
            "type: \"memory\"",
            "type: \"sqlite\"\n  sqlite_path: \"./a.db\"",
        ));
        let cfg = load_and_validate(&path).expect("sqlite config should be accepted");
        assert_eq!(cfg.store.kind, "sqlite");
        assert_eq!(cfg.store.sqlite_path.as_deref(), Some("./a.db"));
    }

    #[test]
    fn rejects_sqlite_path_even_when_memory() {
        let path = write_temp_config(&base_yaml().replace(
            "type: \"memory\"",
            "type: \"memory\"\n  sqlite_path: \"./a.db\"",
        ));
        let err = load_and_validate(&path).expect_err("expected unsupported config");
        assert!(matches!(
            err,
            ConfigError::SchemaValidation(_) | ConfigError::UnsupportedConfig(_)
        ));
    }

    #[test]
    fn rejects_zero_phone_limit() {
        let path = write_temp_config(
            &base_yaml().replace("phone_max_requests: 30", "phone_max_requests: 0"),
        );
        let err = load_and_validate(&path).expect_err("expected rejection");
        assert!(matches!(
            err,
            ConfigError::SchemaValidation(_) | ConfigError::UnsupportedConfig(_)
        ));
    }

    #[test]
    fn rejects_missing_ward_section() {
        let text = base_yaml();
        let cut = text.find("ward:").expect("ward section");
        let path = write_temp_config(&text[..cut]);
        assert!(load_and_validate(&path).is_err());
    }
}
