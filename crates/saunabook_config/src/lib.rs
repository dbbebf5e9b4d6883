use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::env;
use std::path::PathBuf;
use tracing::warn;

pub mod models;
pub use models::*;

/// Marker value that is replaced by an environment variable named after the
/// key path, e.g. `device.setup_token = "secret_from_env"` reads
/// `DEVICE_SETUP_TOKEN`.
pub const SECRET_FROM_ENV: &str = "secret_from_env";

/// Loads the application configuration.
///
/// Sources, later ones overriding earlier ones:
/// 1. `{config_dir}/default.{toml,yaml,json}` (optional)
/// 2. `{config_dir}/{RUN_ENV}.{toml,yaml,json}` (optional, `RUN_ENV` defaults to `debug`)
/// 3. environment variables prefixed with `SAUNABOOK`, nested keys separated by `__`
///
/// `config_dir` is `SAUNABOOK_CONFIG_DIR` or `./config`.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let config_dir = PathBuf::from(
        env::var("SAUNABOOK_CONFIG_DIR").unwrap_or_else(|_| "config".to_string()),
    );

    let default_path = config_dir.join("default");
    let env_path = config_dir.join(&run_env);

    let builder = Config::builder()
        .add_source(File::with_name(&default_path.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_path.to_string_lossy()).required(false))
        .add_source(
            Environment::with_prefix("SAUNABOOK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    apply_env_overrides_from_marker(raw_config)
}

/// Recursively replaces all "secret_from_env" string values with environment variable values
fn inject_env_secrets(value: &mut Value) {
    fn walk(path: Vec<String>, obj: &mut Value) {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    let mut new_path = path.clone();
                    new_path.push(k.to_string());
                    walk(new_path, v);
                }
            }
            Value::String(s) if s == SECRET_FROM_ENV => {
                let env_key = path.join("_").to_uppercase();
                if let Ok(env_val) = env::var(&env_key) {
                    *obj = Value::String(env_val);
                } else {
                    warn!("env var {} not found for secret_from_env", env_key);
                }
            }
            _ => {}
        }
    }

    walk(vec![], value);
}

/// Applies environment overrides based on "secret_from_env" markers in serialized config
pub fn apply_env_overrides_from_marker(config: AppConfig) -> Result<AppConfig, ConfigError> {
    let mut json = serde_json::to_value(&config)
        .map_err(|err| ConfigError::Message(format!("failed to serialize config: {err}")))?;
    inject_env_secrets(&mut json);
    serde_json::from_value(json)
        .map_err(|err| ConfigError::Message(format!("failed to rebuild config: {err}")))
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads the dotenv file into the process environment exactly once.
///
/// The file is `DOTENV_OVERRIDE` if set, else the first command line argument
/// when it starts with `.env`, else `.env`. Returns the path that was used.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path_override = env::var("DOTENV_OVERRIDE").ok();
    let dotenv_path_arg = env::args().nth(1).filter(|s| s.starts_with(".env"));

    let dotenv_path = dotenv_path_override
        .or(dotenv_path_arg)
        .unwrap_or_else(|| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sources_yield_defaults() {
        let config: AppConfig = Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.time_zone, "Europe/Helsinki");
        assert_eq!(config.booking.buffer_minutes, 15);
        assert_eq!(config.booking.cancellation_cutoff_minutes, 15);
        assert_eq!(config.booking.max_slot_search, 100);
        assert_eq!(config.club_sauna.generator_time, "00:00");
        assert_eq!(config.club_sauna.evaluator_time, "20:00");
        assert_eq!(config.club_sauna.evaluation.min_participants, 1);
        assert!(config.device.is_none());
    }

    #[test]
    fn nested_sections_override_defaults() {
        let config: AppConfig = Config::builder()
            .set_override("club_sauna.defaults.start_hour", 17)
            .unwrap()
            .set_override("booking.shared_counts_toward_daily_limit", false)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.club_sauna.defaults.start_hour, 17);
        assert_eq!(config.club_sauna.defaults.males_duration_hours, 2);
        assert!(!config.booking.shared_counts_toward_daily_limit);
    }

    #[test]
    fn secret_marker_is_replaced_from_env() {
        env::set_var("DEVICE_SETUP_TOKEN", "tok-from-env");
        let config = AppConfig {
            device: Some(DeviceConfig {
                backend_url: "http://localhost:8080/api".to_string(),
                data_dir: "./data".to_string(),
                setup_token: Some(SECRET_FROM_ENV.to_string()),
                device_id: None,
            }),
            ..AppConfig::default()
        };

        let config = apply_env_overrides_from_marker(config).unwrap();
        let device = config.device.unwrap();
        assert_eq!(device.setup_token.as_deref(), Some("tok-from-env"));
    }
}
