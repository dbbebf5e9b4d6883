// --- File: crates/saunabook_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

// --- Database Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite:data/saunabook.db, loaded via SAUNABOOK_DATABASE__URL
}

// --- Booking rules ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BookingConfig {
    /// A free slot closer than this to `now` is skipped.
    #[serde(default = "default_buffer_minutes")]
    pub buffer_minutes: i64,
    /// Cancellation is only allowed while more than this many minutes remain.
    #[serde(default = "default_cancellation_cutoff_minutes")]
    pub cancellation_cutoff_minutes: i64,
    /// Upper bound on hour-by-hour advances when searching a free slot.
    #[serde(default = "default_max_slot_search")]
    pub max_slot_search: u32,
    /// Whether a shared-reservation participation counts toward the
    /// one-commitment-per-island-per-day limit (and vice versa).
    #[serde(default = "default_true")]
    pub shared_counts_toward_daily_limit: bool,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            buffer_minutes: default_buffer_minutes(),
            cancellation_cutoff_minutes: default_cancellation_cutoff_minutes(),
            max_slot_search: default_max_slot_search(),
            shared_counts_toward_daily_limit: true,
        }
    }
}

// --- Club sauna scheduler ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SharedReservationDefaults {
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,
    #[serde(default = "default_segment_hours")]
    pub males_duration_hours: u32,
    #[serde(default = "default_segment_hours")]
    pub females_duration_hours: u32,
    /// "MALES_FIRST" or "FEMALES_FIRST"
    #[serde(default = "default_gender_order")]
    pub gender_order: String,
    #[serde(default = "default_shared_name")]
    pub name: String,
    #[serde(default = "default_created_by")]
    pub created_by: String,
}

impl Default for SharedReservationDefaults {
    fn default() -> Self {
        Self {
            start_hour: default_start_hour(),
            males_duration_hours: default_segment_hours(),
            females_duration_hours: default_segment_hours(),
            gender_order: default_gender_order(),
            name: default_shared_name(),
            created_by: default_created_by(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EvaluationConfig {
    /// Auto-generated reservations with fewer participants are removed.
    #[serde(default = "default_min_participants")]
    pub min_participants: u32,
    /// Kept reservations lose their auto-generated flag.
    #[serde(default = "default_true")]
    pub convert_when_kept: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            min_participants: default_min_participants(),
            convert_when_kept: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClubSaunaConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Local time of the daily generator run, "HH:MM".
    #[serde(default = "default_generator_time")]
    pub generator_time: String,
    /// Local time of the daily evaluator run, "HH:MM".
    #[serde(default = "default_evaluator_time")]
    pub evaluator_time: String,
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,
    #[serde(default)]
    pub defaults: SharedReservationDefaults,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

impl Default for ClubSaunaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            generator_time: default_generator_time(),
            evaluator_time: default_evaluator_time(),
            job_timeout_secs: default_job_timeout_secs(),
            defaults: SharedReservationDefaults::default(),
            evaluation: EvaluationConfig::default(),
        }
    }
}

// --- Island terminal ---
// Only read by the terminal binary. The setup token is a secret; prefer
// SAUNABOOK_DEVICE__SETUP_TOKEN over writing it into a file.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DeviceConfig {
    pub backend_url: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub setup_token: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SyncConfig {
    #[serde(default = "default_sync_interval_secs")]
    pub interval_secs: u64,
    /// How many past days of island rows a pull covers.
    #[serde(default = "default_history_days")]
    pub history_days: i64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_sync_interval_secs(),
            history_days: default_history_days(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// IANA zone used for hour alignment, calendar days and job times.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub club_sauna: ClubSaunaConfig,
    #[serde(default)]
    pub device: Option<DeviceConfig>,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            time_zone: default_time_zone(),
            database: None,
            booking: BookingConfig::default(),
            club_sauna: ClubSaunaConfig::default(),
            device: None,
            sync: SyncConfig::default(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_buffer_minutes() -> i64 {
    15
}
fn default_cancellation_cutoff_minutes() -> i64 {
    15
}
fn default_max_slot_search() -> u32 {
    100
}
fn default_start_hour() -> u32 {
    18
}
fn default_segment_hours() -> u32 {
    2
}
fn default_gender_order() -> String {
    "FEMALES_FIRST".to_string()
}
fn default_shared_name() -> String {
    "Club Sauna".to_string()
}
fn default_created_by() -> String {
    "system".to_string()
}
fn default_min_participants() -> u32 {
    1
}
fn default_generator_time() -> String {
    "00:00".to_string()
}
fn default_evaluator_time() -> String {
    "20:00".to_string()
}
fn default_job_timeout_secs() -> u64 {
    300
}
fn default_data_dir() -> String {
    "./data".to_string()
}
fn default_sync_interval_secs() -> u64 {
    300
}
fn default_history_days() -> i64 {
    7
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_time_zone() -> String {
    "Europe/Helsinki".to_string()
}
