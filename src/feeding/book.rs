//! In-memory feeding schedule store.
//!
//! A cage has at most one active schedule. Every operation that can activate
//! a schedule first takes a lock scoped to that cage, so the "is there an
//! active schedule / deactivate it / insert the new one" sequence cannot
//! interleave with another writer for the same cage. Lock order is always
//! cage lock, then the schedule map.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::analytics::series::sampling_point;
use crate::config::FeedingSettings;
use crate::dataset::FarmData;
use crate::error::{GrowoutError, Result};
use crate::feeding::schedule::{CalculationMethod, ScheduleSpec, generate_feeding_schedule};
use crate::feeding::tier::FeedingFrequency;
use crate::model::{CageId, ScheduleId, round2};

/// Most feeding times a schedule can hold.
pub const MAX_SLOTS: usize = 4;
const MAX_NAME_LEN: usize = 255;
const UPCOMING_LIMIT: usize = 5;

/// One feeding time and the feed given then.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedingSlot {
    pub time: NaiveTime,
    pub amount_kg: f64,
}

/// A stored feeding schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedingSchedule {
    pub id: ScheduleId,
    pub cage_id: CageId,
    pub name: String,
    pub frequency: FeedingFrequency,
    pub slots: Vec<FeedingSlot>,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

/// A feeding due within the next day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingFeeding {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub amount_kg: f64,
    /// 12-hour clock, e.g. `7:00 AM`.
    pub formatted_time: String,
}

impl FeedingSchedule {
    /// Sum of the slot amounts (kg).
    pub fn total_daily_amount(&self) -> f64 {
        round2(self.slots.iter().map(|s| s.amount_kg).sum())
    }

    pub fn feeding_times(&self) -> Vec<NaiveTime> {
        self.slots.iter().map(|s| s.time).collect()
    }

    /// First feeding strictly after `now` today, else the first one of the day.
    pub fn next_feeding_time(&self, now: NaiveDateTime) -> Option<NaiveTime> {
        let clock = now.time();
        self.slots
            .iter()
            .map(|s| s.time)
            .find(|&t| t > clock)
            .or_else(|| self.slots.first().map(|s| s.time))
    }

    /// Whether `now` falls within a feeding minute.
    pub fn is_feeding_time(&self, now: NaiveDateTime) -> bool {
        let (h, m) = (now.hour(), now.minute());
        self.slots
            .iter()
            .any(|s| s.time.hour() == h && s.time.minute() == m)
    }

    /// The rest of today's feedings plus all of tomorrow's, soonest first,
    /// capped at five.
    pub fn upcoming_feedings(&self, now: NaiveDateTime) -> Vec<UpcomingFeeding> {
        let today = now.date();
        let mut out: Vec<UpcomingFeeding> = self
            .slots
            .iter()
            .filter(|s| today.and_time(s.time) > now)
            .map(|s| upcoming(today, s))
            .collect();
        if let Some(tomorrow) = today.checked_add_days(Days::new(1)) {
            out.extend(self.slots.iter().map(|s| upcoming(tomorrow, s)));
        }
        out.sort_by_key(|f| (f.date, f.time));
        out.truncate(UPCOMING_LIMIT);
        out
    }
}

fn upcoming(date: NaiveDate, slot: &FeedingSlot) -> UpcomingFeeding {
    UpcomingFeeding {
        date,
        time: slot.time,
        amount_kg: slot.amount_kg,
        formatted_time: slot.time.format("%-I:%M %p").to_string(),
    }
}

/// A feeding time as submitted by a user.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SlotDraft {
    /// `HH:MM`, 24-hour.
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub amount_kg: Option<f64>,
}

/// Editable fields of a manual schedule.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScheduleFields {
    pub schedule_name: String,
    #[serde(default)]
    pub slots: Vec<SlotDraft>,
    pub frequency: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A manual schedule for a cage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScheduleDraft {
    pub cage_id: CageId,
    #[serde(flatten)]
    pub fields: ScheduleFields,
}

struct ValidFields {
    name: String,
    frequency: FeedingFrequency,
    slots: Vec<FeedingSlot>,
    notes: Option<String>,
}

impl ScheduleFields {
    /// Checks the submitted fields; slots without a time are dropped.
    fn validate(&self) -> Result<ValidFields> {
        let name = self.schedule_name.trim();
        if name.is_empty() {
            return Err(GrowoutError::validation("schedule_name", "is required"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(GrowoutError::validation(
                "schedule_name",
                format!("must be at most {MAX_NAME_LEN} characters"),
            ));
        }
        if self.slots.len() > MAX_SLOTS {
            return Err(GrowoutError::validation(
                "slots",
                format!("at most {MAX_SLOTS} feeding times"),
            ));
        }
        let frequency: FeedingFrequency = self.frequency.parse()?;

        let mut slots = Vec::with_capacity(self.slots.len());
        for (idx, draft) in self.slots.iter().enumerate() {
            let n = idx + 1;
            let amount_kg = draft.amount_kg.unwrap_or(0.0);
            if !amount_kg.is_finite() || amount_kg < 0.0 {
                return Err(GrowoutError::validation(
                    format!("feeding_amount_{n}"),
                    "must be a number >= 0",
                ));
            }
            match draft.time.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                Some(raw) => {
                    let time = NaiveTime::parse_from_str(raw, "%H:%M").map_err(|_| {
                        GrowoutError::validation(format!("feeding_time_{n}"), "expected HH:MM")
                    })?;
                    slots.push(FeedingSlot { time, amount_kg });
                }
                None if amount_kg > 0.0 => {
                    return Err(GrowoutError::validation(
                        format!("feeding_time_{n}"),
                        "is required when an amount is given",
                    ));
                }
                None => {}
            }
        }

        Ok(ValidFields {
            name: name.to_string(),
            frequency,
            slots,
            notes: self.notes.clone(),
        })
    }
}

/// Outcome of generating one cage's schedule in a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedSchedule {
    pub id: ScheduleId,
    pub cage_id: CageId,
    pub schedule_name: String,
    pub feeding_frequency: FeedingFrequency,
    pub total_daily_amount: f64,
    pub fish_age_days: i64,
    pub avg_weight_g: Option<f64>,
    pub calculation_method: CalculationMethod,
    pub notes: String,
}

/// Result of [`ScheduleBook::auto_generate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AutoGenerateReport {
    pub message: String,
    pub generated_schedules: Vec<GeneratedSchedule>,
    /// One line per skipped or failed cage.
    pub errors: Vec<String>,
}

/// Feeding schedules of every cage, active and historical.
#[derive(Debug, Default)]
pub struct ScheduleBook {
    next_id: AtomicU64,
    schedules: RwLock<BTreeMap<ScheduleId, FeedingSchedule>>,
    cage_locks: Mutex<HashMap<CageId, Arc<Mutex<()>>>>,
}

impl ScheduleBook {
    pub fn new() -> Self {
        Self::default()
    }

    fn cage_lock(&self, cage_id: CageId) -> Arc<Mutex<()>> {
        let mut locks = self
            .cage_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(cage_id).or_default())
    }

    fn next_id(&self) -> ScheduleId {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Inserts `record` as the cage's active schedule. Caller holds the cage lock.
    fn insert_active(&self, mut record: FeedingSchedule) -> FeedingSchedule {
        let mut schedules = self
            .schedules
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for s in schedules.values_mut() {
            if s.cage_id == record.cage_id && s.is_active {
                s.is_active = false;
                tracing::info!(cage_id = s.cage_id, schedule_id = s.id, "schedule superseded");
            }
        }
        record.is_active = true;
        schedules.insert(record.id, record.clone());
        record
    }

    pub fn get(&self, id: ScheduleId) -> Option<FeedingSchedule> {
        self.schedules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn active_for(&self, cage_id: CageId) -> Option<FeedingSchedule> {
        self.schedules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .find(|s| s.cage_id == cage_id && s.is_active)
            .cloned()
    }

    /// Every schedule of a cage, newest first.
    pub fn schedules_for(&self, cage_id: CageId) -> Vec<FeedingSchedule> {
        self.schedules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .rev()
            .filter(|s| s.cage_id == cage_id)
            .cloned()
            .collect()
    }

    /// Active schedules with a feeding at the current minute.
    pub fn due_at(&self, now: NaiveDateTime) -> Vec<FeedingSchedule> {
        self.schedules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|s| s.is_active && s.is_feeding_time(now))
            .cloned()
            .collect()
    }

    /// Stores a manual schedule as the cage's active one.
    ///
    /// # Errors
    ///
    /// [`GrowoutError::CageNotFound`] for an unknown cage,
    /// [`GrowoutError::Validation`] for malformed fields.
    pub fn create(
        &self,
        data: &FarmData,
        draft: &ScheduleDraft,
        now: NaiveDateTime,
    ) -> Result<FeedingSchedule> {
        if data.cage(draft.cage_id).is_none() {
            return Err(GrowoutError::CageNotFound(draft.cage_id));
        }
        let valid = draft.fields.validate()?;

        let lock = self.cage_lock(draft.cage_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let record = self.insert_active(FeedingSchedule {
            id: self.next_id(),
            cage_id: draft.cage_id,
            name: valid.name,
            frequency: valid.frequency,
            slots: valid.slots,
            is_active: true,
            notes: valid.notes,
            created_at: now,
        });
        tracing::info!(cage_id = record.cage_id, schedule_id = record.id, "schedule created");
        Ok(record)
    }

    /// Replaces the editable fields of a schedule; its active flag is unchanged.
    ///
    /// # Errors
    ///
    /// [`GrowoutError::ScheduleNotFound`] or [`GrowoutError::Validation`].
    pub fn update(&self, id: ScheduleId, fields: &ScheduleFields) -> Result<FeedingSchedule> {
        let valid = fields.validate()?;
        let mut schedules = self
            .schedules
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let record = schedules
            .get_mut(&id)
            .ok_or(GrowoutError::ScheduleNotFound(id))?;
        record.name = valid.name;
        record.frequency = valid.frequency;
        record.slots = valid.slots;
        record.notes = valid.notes;
        Ok(record.clone())
    }

    /// Removes a schedule. Deleting the active one leaves the cage without one.
    ///
    /// # Errors
    ///
    /// [`GrowoutError::ScheduleNotFound`] for an unknown id.
    pub fn delete(&self, id: ScheduleId) -> Result<FeedingSchedule> {
        self.schedules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .ok_or(GrowoutError::ScheduleNotFound(id))
    }

    /// Makes a stored schedule the active one for its cage.
    ///
    /// The flag flips in place inside one write section, so a concurrent
    /// `update` is kept and a concurrent `delete` is not undone.
    ///
    /// # Errors
    ///
    /// [`GrowoutError::ScheduleNotFound`] for an unknown id.
    pub fn activate(&self, id: ScheduleId) -> Result<FeedingSchedule> {
        let cage_id = self
            .get(id)
            .map(|s| s.cage_id)
            .ok_or(GrowoutError::ScheduleNotFound(id))?;
        let lock = self.cage_lock(cage_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut schedules = self
            .schedules
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !schedules.contains_key(&id) {
            return Err(GrowoutError::ScheduleNotFound(id));
        }
        for s in schedules.values_mut() {
            if s.cage_id == cage_id && s.id != id && s.is_active {
                s.is_active = false;
                tracing::info!(cage_id, schedule_id = s.id, "schedule superseded");
            }
        }
        let record = schedules
            .get_mut(&id)
            .ok_or(GrowoutError::ScheduleNotFound(id))?;
        record.is_active = true;
        tracing::info!(cage_id, schedule_id = id, "schedule activated");
        Ok(record.clone())
    }

    fn insert_generated(
        &self,
        cage_id: CageId,
        spec: &ScheduleSpec,
        now: NaiveDateTime,
    ) -> FeedingSchedule {
        let slots = spec
            .times
            .iter()
            .zip(&spec.amounts)
            .map(|(&time, &amount_kg)| FeedingSlot { time, amount_kg })
            .collect();
        self.insert_active(FeedingSchedule {
            id: self.next_id(),
            cage_id,
            name: spec.name.clone(),
            frequency: spec.frequency,
            slots,
            is_active: true,
            notes: Some(spec.notes.clone()),
            created_at: now,
        })
    }

    /// Generates and activates schedules for `cage_ids`.
    ///
    /// Cages with an active schedule are skipped unless `overwrite_existing`
    /// is set. A skipped or failed cage is reported in `errors` and never
    /// stops the rest of the batch.
    pub fn auto_generate(
        &self,
        data: &FarmData,
        cage_ids: &[CageId],
        overwrite_existing: bool,
        settings: &FeedingSettings,
        now: NaiveDateTime,
    ) -> AutoGenerateReport {
        let mut report = AutoGenerateReport::default();
        let mut seen = HashSet::new();

        for &cage_id in cage_ids {
            if !seen.insert(cage_id) {
                continue;
            }
            let Some(cage) = data.cage(cage_id) else {
                let err = GrowoutError::CageNotFound(cage_id);
                report
                    .errors
                    .push(format!("Failed to generate schedule for Cage {cage_id}: {err}"));
                continue;
            };

            let lock = self.cage_lock(cage_id);
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            if !overwrite_existing && self.active_for(cage_id).is_some() {
                tracing::info!(cage_id, "auto-generate skipped, active schedule exists");
                report
                    .errors
                    .push(GrowoutError::ActiveScheduleExists(cage_id).to_string());
                continue;
            }

            let latest = data
                .latest_sampling(cage_id)
                .map(|s| sampling_point(data, s));
            let spec = generate_feeding_schedule(cage, latest.as_ref(), settings, now);
            let record = self.insert_generated(cage_id, &spec, now);
            tracing::info!(
                cage_id,
                schedule_id = record.id,
                method = spec.method.as_str(),
                total_kg = spec.total_daily_amount,
                "schedule generated"
            );
            report.generated_schedules.push(GeneratedSchedule {
                id: record.id,
                cage_id,
                schedule_name: spec.name,
                feeding_frequency: spec.frequency,
                total_daily_amount: spec.total_daily_amount,
                fish_age_days: spec.fish_age_days,
                avg_weight_g: spec.avg_weight_g,
                calculation_method: spec.method,
                notes: spec.notes,
            });
        }

        report.message = format!(
            "{} schedules generated successfully",
            report.generated_schedules.len()
        );
        report
    }
}
