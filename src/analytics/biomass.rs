//! Present stock, biomass, feed ration, weight gain and FCR for one sampling.

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{FeedConsumption, days_between, round1, round2};
use crate::sampling::SampleSummary;

/// Feeding rate applied when the caller has no better figure (% of body weight).
pub const DEFAULT_FEEDING_RATE_PCT: f64 = 3.0;

/// One sampling as seen by the biomass calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingPoint {
    pub date: NaiveDate,
    pub summary: SampleSummary,
    /// Cumulative mortality at this sampling.
    pub mortality: u32,
}

/// Biomass and efficiency figures for one sampling.
///
/// Weights and feed amounts are rounded to 2 decimals on output only; the
/// gain and FCR are derived from unrounded intermediates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BiomassResult {
    /// Fingerlings minus mortality; negative when mortality was over-reported.
    pub present_stock: i64,
    /// Average body weight (g).
    pub abw_g: f64,
    /// `abw × present_stock / 1000` (kg).
    pub biomass_kg: f64,
    pub feeding_rate_pct: f64,
    /// `fingerlings × abw × rate / 1000` (kg).
    pub daily_feed_ration_kg: f64,
    /// Whether a previous sampling took part in the calculation.
    pub has_previous: bool,
    pub prev_abw_g: f64,
    pub prev_biomass_kg: f64,
    pub total_weight_gained_kg: f64,
    /// Biomass gain per day between the two samplings (g/day).
    pub daily_weight_gained_g: f64,
    pub days_between: i64,
    /// Feed recorded in `(previous date, this date]` (kg).
    pub feed_consumed_kg: f64,
    /// Feed conversion ratio; magnitude only, 0 when undefined.
    pub fcr: f64,
}

/// Present stock at a sampling; callers must tolerate non-positive results.
pub fn present_stock(fingerlings: u32, mortality: u32) -> i64 {
    i64::from(fingerlings) - i64::from(mortality)
}

fn biomass_kg(abw_g: f64, present: i64) -> f64 {
    abw_g * present as f64 / 1000.0
}

/// Daily feed ration (kg) for a stock at a given body weight and feeding rate.
pub fn daily_feed_ration_kg(total_stock: u32, abw_g: f64, feeding_rate_pct: f64) -> f64 {
    f64::from(total_stock) * abw_g * (feeding_rate_pct / 100.0) / 1000.0
}

/// Sums feed records dated within `(after, until]`, or up to `until` when
/// `after` is `None`.
pub fn feed_consumed_between<'a, I>(records: I, after: Option<NaiveDate>, until: NaiveDate) -> f64
where
    I: IntoIterator<Item = &'a FeedConsumption>,
{
    records
        .into_iter()
        .filter(|r| r.date <= until && after.is_none_or(|a| r.date > a))
        .map(|r| r.amount_kg)
        .sum()
}

/// Feed conversion ratio with the weight-loss rule applied.
///
/// Gain positive and feed consumed: `feed / gain`. Weight lost while feeding:
/// `feed / |gain|`. Anything else is 0.
pub fn feed_conversion_ratio(feed_consumed_kg: f64, gain_kg: f64) -> f64 {
    if feed_consumed_kg <= 0.0 || gain_kg == 0.0 {
        return 0.0;
    }
    feed_consumed_kg / gain_kg.abs()
}

/// Computes biomass and efficiency for `current`, optionally against `previous`.
///
/// `feed_records` may cover any period for the cage; only records inside the
/// inter-sampling window are summed. Never panics: zero divisors produce 0.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use growout::analytics::biomass::{SamplingPoint, compute_biomass};
/// use growout::model::{FeedConsumption, Sample};
/// use growout::sampling::aggregate_samples;
///
/// let samples: Vec<Sample> = (1..=30).map(|n| Sample::weighed(1, n, 225.0)).collect();
/// let point = SamplingPoint {
///     date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
///     summary: aggregate_samples(&samples),
///     mortality: 0,
/// };
/// let result = compute_biomass(&point, None, 5000, &Vec::<FeedConsumption>::new(), 3.0);
/// assert_eq!(result.biomass_kg, 1125.0);
/// ```
pub fn compute_biomass<'a, I>(
    current: &SamplingPoint,
    previous: Option<&SamplingPoint>,
    fingerlings: u32,
    feed_records: I,
    feeding_rate_pct: f64,
) -> BiomassResult
where
    I: IntoIterator<Item = &'a FeedConsumption>,
{
    let abw = current.summary.avg_weight_g;
    let present = present_stock(fingerlings, current.mortality);
    let biomass = biomass_kg(abw, present);
    let ration = daily_feed_ration_kg(fingerlings, abw, feeding_rate_pct);
    let feed = feed_consumed_between(feed_records, previous.map(|p| p.date), current.date);

    let (prev_abw, prev_biomass, gain, days, daily_gain_g) = match previous {
        Some(prev) => {
            let prev_abw = prev.summary.avg_weight_g;
            let prev_biomass = biomass_kg(prev_abw, present_stock(fingerlings, prev.mortality));
            let gain = biomass - prev_biomass;
            let days = days_between(prev.date, current.date);
            let daily = if days > 0 {
                gain * 1000.0 / days as f64
            } else {
                0.0
            };
            (prev_abw, prev_biomass, gain, days, daily)
        }
        None => (0.0, 0.0, 0.0, 0, 0.0),
    };

    BiomassResult {
        present_stock: present,
        abw_g: round2(abw),
        biomass_kg: round2(biomass),
        feeding_rate_pct,
        daily_feed_ration_kg: round2(ration),
        has_previous: previous.is_some(),
        prev_abw_g: round2(prev_abw),
        prev_biomass_kg: round2(prev_biomass),
        total_weight_gained_kg: round2(gain),
        daily_weight_gained_g: round1(daily_gain_g),
        days_between: days,
        feed_consumed_kg: round2(feed),
        fcr: round2(feed_conversion_ratio(feed, gain)),
    }
}
