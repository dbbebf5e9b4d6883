// --- File: crates/saunabook_scheduler/src/evaluator.rs ---
//! Decides the fate of the day's auto-generated club saunas.

use chrono::NaiveDate;
use saunabook_common::SaunaError;
use saunabook_config::EvaluationConfig;
use saunabook_db::{BookingStore, BookingTransaction, SharedReservationFilter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorResult {
    pub evaluated: u32,
    pub cancelled: u32,
    pub converted: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationPolicy {
    /// Fewer participants than this and the reservation is removed.
    pub min_participants: u32,
    /// Whether a kept reservation stops being auto-generated.
    pub convert_when_kept: bool,
}

impl From<&EvaluationConfig> for EvaluationPolicy {
    fn from(config: &EvaluationConfig) -> Self {
        Self {
            min_participants: config.min_participants,
            convert_when_kept: config.convert_when_kept,
        }
    }
}

impl Default for EvaluationPolicy {
    fn default() -> Self {
        Self::from(&EvaluationConfig::default())
    }
}

/// Evaluates every auto-generated shared reservation dated `date` in one
/// transaction.
///
/// Converted reservations are no longer auto-generated, so evaluating the
/// same day twice changes nothing.
pub async fn evaluate_day<S: BookingStore>(
    store: &S,
    policy: &EvaluationPolicy,
    date: NaiveDate,
) -> Result<EvaluatorResult, SaunaError> {
    let mut tx = store.begin().await?;
    let filter = SharedReservationFilter {
        date: Some(date),
        is_auto_generated: Some(true),
        ..Default::default()
    };

    let mut result = EvaluatorResult::default();
    for mut shared in tx.list_shared_reservations(&filter).await? {
        result.evaluated += 1;
        let participants = tx.list_participants(shared.id).await?.len() as u32;

        if participants < policy.min_participants {
            tx.delete_shared_reservation(shared.id).await?;
            debug!(shared_id = %shared.id, participants, "Club sauna cancelled");
            result.cancelled += 1;
        } else if policy.convert_when_kept {
            shared.is_auto_generated = false;
            tx.update_shared_reservation(&shared).await?;
            debug!(shared_id = %shared.id, participants, "Club sauna converted");
            result.converted += 1;
        }
    }
    tx.commit().await?;

    info!(
        %date,
        evaluated = result.evaluated,
        cancelled = result.cancelled,
        converted = result.converted,
        "Club sauna evaluation finished"
    );
    Ok(result)
}
