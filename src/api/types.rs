//! API request and response bodies.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::feeding::{FeedingFrequency, FeedingSchedule, UpcomingFeeding};
use crate::model::{CageId, ScheduleId};

/// Error body returned with every non-2xx status.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Field-level failures, when the request was rejected by validation.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldErrorBody>,
}

#[derive(Debug, Serialize)]
pub struct FieldErrorBody {
    pub field: String,
    pub message: String,
}

impl From<&ConfigError> for FieldErrorBody {
    fn from(e: &ConfigError) -> Self {
        Self {
            field: e.field.clone(),
            message: e.message.clone(),
        }
    }
}

/// `GET /dashboard` query string.
///
/// `period` is one of `day`, `week`, `30days` (default), `month` or `custom`.
/// Bounds are only read for `custom`, which is also assumed when bounds are
/// given without a period.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// `POST /schedules/auto-generate` body.
#[derive(Debug, Deserialize)]
pub struct AutoGenerateRequest {
    pub cage_ids: Vec<CageId>,
    #[serde(default)]
    pub overwrite_existing: bool,
}

/// Active schedule in wire form; times are `HH:MM`.
#[derive(Debug, Serialize)]
pub struct ScheduleView {
    pub id: ScheduleId,
    pub schedule_name: String,
    pub frequency: FeedingFrequency,
    pub total_daily_amount: f64,
    pub feeding_times: Vec<String>,
    pub feeding_amounts: Vec<f64>,
    pub next_feeding_time: Option<String>,
    pub notes: Option<String>,
}

impl ScheduleView {
    pub fn new(s: &FeedingSchedule, now: chrono::NaiveDateTime) -> Self {
        Self {
            id: s.id,
            schedule_name: s.name.clone(),
            frequency: s.frequency,
            total_daily_amount: s.total_daily_amount(),
            feeding_times: s
                .slots
                .iter()
                .map(|slot| slot.time.format("%H:%M").to_string())
                .collect(),
            feeding_amounts: s.slots.iter().map(|slot| slot.amount_kg).collect(),
            next_feeding_time: s
                .next_feeding_time(now)
                .map(|t| t.format("%H:%M").to_string()),
            notes: s.notes.clone(),
        }
    }
}

/// `GET /cages/{id}/schedule` body.
#[derive(Debug, Serialize)]
pub struct CageScheduleResponse {
    pub has_schedule: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub cage_id: CageId,
    pub fingerlings: u32,
    pub feed_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleView>,
    pub upcoming_feedings: Vec<UpcomingFeeding>,
}
