//! Scheduled versus actual feed over a date range.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::dataset::FarmData;
use crate::error::{GrowoutError, Result};
use crate::feeding::book::{FeedingSchedule, ScheduleBook};
use crate::feeding::tier::FeedingFrequency;
use crate::model::{Cage, CageId, FeedConsumption, days_between, round1, round2};

/// One day on which feed was recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAdherence {
    pub date: NaiveDate,
    /// English weekday name.
    pub day_name: String,
    pub scheduled_kg: f64,
    pub actual_kg: f64,
    pub variance_kg: f64,
    /// Actual as a percentage of scheduled, 1 decimal; 0 without a schedule.
    pub adherence_pct: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CageAdherence {
    pub cage_id: CageId,
    pub investor_name: Option<String>,
    pub feed_type: Option<String>,
    pub fingerlings: u32,
    pub schedule_name: Option<String>,
    pub frequency: Option<FeedingFrequency>,
    /// Scheduled daily total times the number of fed days.
    pub total_scheduled_kg: f64,
    pub total_consumed_kg: f64,
    pub variance_kg: f64,
    pub adherence_pct: f64,
    pub average_daily_consumption_kg: f64,
    pub daily: Vec<DailyAdherence>,
}

/// Compares recorded feed against the cage's active schedule for every day
/// in `[start, end]`. Days without recorded feed are left out of the
/// breakdown and of the scheduled total.
pub fn cage_adherence<'a, I>(
    cage: &Cage,
    investor_name: Option<String>,
    schedule: Option<&FeedingSchedule>,
    records: I,
    start: NaiveDate,
    end: NaiveDate,
) -> CageAdherence
where
    I: IntoIterator<Item = &'a FeedConsumption>,
{
    let in_range: Vec<&FeedConsumption> = records
        .into_iter()
        .filter(|r| r.date >= start && r.date <= end)
        .collect();
    let scheduled = schedule.map_or(0.0, FeedingSchedule::total_daily_amount);

    let mut daily = Vec::new();
    for date in start.iter_days().take_while(|d| *d <= end) {
        let todays: Vec<&&FeedConsumption> = in_range.iter().filter(|r| r.date == date).collect();
        let actual: f64 = todays.iter().map(|r| r.amount_kg).sum();
        if actual <= 0.0 {
            continue;
        }
        daily.push(DailyAdherence {
            date,
            day_name: date.format("%A").to_string(),
            scheduled_kg: scheduled,
            actual_kg: actual,
            variance_kg: round2(actual - scheduled),
            adherence_pct: percent(actual, scheduled),
            notes: todays.iter().find_map(|r| r.notes.clone()),
        });
    }

    let total_scheduled = scheduled * daily.len() as f64;
    let total_consumed: f64 = in_range.iter().map(|r| r.amount_kg).sum();
    CageAdherence {
        cage_id: cage.id,
        investor_name,
        feed_type: cage.feed_type.clone(),
        fingerlings: cage.fingerlings,
        schedule_name: schedule.map(|s| s.name.clone()),
        frequency: schedule.map(|s| s.frequency),
        total_scheduled_kg: round2(total_scheduled),
        total_consumed_kg: round2(total_consumed),
        variance_kg: round2(total_consumed - total_scheduled),
        adherence_pct: percent(total_consumed, total_scheduled),
        average_daily_consumption_kg: if daily.is_empty() {
            0.0
        } else {
            round2(total_consumed / daily.len() as f64)
        },
        daily,
    }
}

fn percent(actual: f64, scheduled: f64) -> f64 {
    if scheduled > 0.0 {
        round1(actual / scheduled * 100.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdherencePeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdherenceSummary {
    pub total_cages: usize,
    pub total_feed_consumed_kg: f64,
    pub total_scheduled_feed_kg: f64,
    pub average_adherence_pct: f64,
    pub active_schedules: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdherenceReport {
    pub period: AdherencePeriod,
    pub summary: AdherenceSummary,
    pub cages: Vec<CageAdherence>,
}

/// Monday and Sunday of the week containing `day`.
pub fn week_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let from_monday = u64::from(day.weekday().num_days_from_monday());
    let monday = day.checked_sub_days(Days::new(from_monday)).unwrap_or(day);
    let sunday = monday.checked_add_days(Days::new(6)).unwrap_or(monday);
    (monday, sunday)
}

/// Adherence of every cage in `data` (scope it first) for `[start, end]`.
///
/// # Errors
///
/// Returns [`GrowoutError::Validation`] when `end` is before `start`.
pub fn weekly_adherence(
    data: &FarmData,
    book: &ScheduleBook,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<AdherenceReport> {
    if end < start {
        return Err(GrowoutError::validation(
            "end_date",
            "must be on or after start_date",
        ));
    }

    let mut summary = AdherenceSummary {
        total_cages: data.cages.len(),
        ..AdherenceSummary::default()
    };
    let mut cages = Vec::with_capacity(data.cages.len());
    let mut consumed = 0.0;
    let mut scheduled = 0.0;
    for cage in &data.cages {
        let schedule = book.active_for(cage.id);
        if schedule.is_some() {
            summary.active_schedules += 1;
        }
        let report = cage_adherence(
            cage,
            data.investor(cage.investor_id).map(|i| i.name.clone()),
            schedule.as_ref(),
            data.feed_for_cage(cage.id),
            start,
            end,
        );
        consumed += report.total_consumed_kg;
        scheduled += report.total_scheduled_kg;
        cages.push(report);
    }
    summary.total_feed_consumed_kg = round2(consumed);
    summary.total_scheduled_feed_kg = round2(scheduled);
    summary.average_adherence_pct = percent(consumed, scheduled);

    Ok(AdherenceReport {
        period: AdherencePeriod {
            start_date: start,
            end_date: end,
            days_count: days_between(start, end) + 1,
        },
        summary,
        cages,
    })
}
