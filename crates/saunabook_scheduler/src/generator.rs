// --- File: crates/saunabook_scheduler/src/generator.rs ---
//! Creates the day's auto-generated club saunas.

use chrono::NaiveDate;
use saunabook_booking::{BookingService, CreateSharedReservationRequest};
use saunabook_common::{config_error, GenderOrder, SaunaError};
use saunabook_config::SharedReservationDefaults;
use saunabook_db::{BookingStore, BookingTransaction};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calendar::is_peak_day;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorResult {
    pub created: u32,
    pub skipped: u32,
}

/// Shape of a generated shared reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorSettings {
    pub start_hour: u32,
    pub males_duration_hours: u32,
    pub females_duration_hours: u32,
    pub gender_order: GenderOrder,
    pub name: String,
    pub created_by: String,
}

impl TryFrom<&SharedReservationDefaults> for GeneratorSettings {
    type Error = SaunaError;

    fn try_from(defaults: &SharedReservationDefaults) -> Result<Self, Self::Error> {
        let gender_order = defaults
            .gender_order
            .parse::<GenderOrder>()
            .map_err(config_error)?;
        Ok(Self {
            start_hour: defaults.start_hour,
            males_duration_hours: defaults.males_duration_hours,
            females_duration_hours: defaults.females_duration_hours,
            gender_order,
            name: defaults.name.clone(),
            created_by: defaults.created_by.clone(),
        })
    }
}

impl GeneratorSettings {
    fn request_for(&self, sauna_id: uuid::Uuid, date: NaiveDate) -> CreateSharedReservationRequest {
        CreateSharedReservationRequest {
            sauna_id,
            date,
            start_hour: self.start_hour,
            males_duration_hours: self.males_duration_hours,
            females_duration_hours: self.females_duration_hours,
            gender_order: self.gender_order,
            name: self.name.clone(),
            created_by: self.created_by.clone(),
            is_auto_generated: true,
        }
    }
}

/// Creates one shared reservation per auto-enabled sauna for `date`, if the
/// date is a peak day.
///
/// Saunas that already have a shared reservation that day count as skipped,
/// as do all saunas off season, so re-running is harmless.
pub async fn generate_for_day<S: BookingStore>(
    service: &BookingService<S>,
    settings: &GeneratorSettings,
    date: NaiveDate,
) -> Result<GeneratorResult, SaunaError> {
    let mut tx = service.store().begin().await?;
    let saunas = tx.list_auto_club_saunas().await?;
    // Each creation opens its own transaction
    drop(tx);

    let mut result = GeneratorResult::default();
    if !is_peak_day(date) {
        debug!(%date, saunas = saunas.len(), "Not a peak day, nothing to generate");
        result.skipped = saunas.len() as u32;
        return Ok(result);
    }

    for sauna in saunas {
        match service.create_shared(settings.request_for(sauna.id, date)).await {
            Ok(_) => result.created += 1,
            Err(SaunaError::SlotConflict) => {
                debug!(sauna_id = %sauna.id, %date, "Shared reservation exists, skipping");
                result.skipped += 1;
            }
            Err(e) => {
                warn!(sauna_id = %sauna.id, %date, error = %e, "Club sauna generation failed");
                return Err(e);
            }
        }
    }

    info!(
        %date,
        created = result.created,
        skipped = result.skipped,
        "Club sauna generation finished"
    );
    Ok(result)
}
