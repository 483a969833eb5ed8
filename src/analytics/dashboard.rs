//! Period dashboard: sampling activity in a date range compared with the
//! period right before it, plus rankings of cages, investors and feed types.
//!
//! The dataset should already be scoped; soft-deleted investors are then
//! absent from every figure.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::dataset::FarmData;
use crate::error::{GrowoutError, Result};
use crate::model::{CageId, InvestorId, Sample, Sampling, SamplingId, days_between, round2};
use crate::sampling::aggregate_samples;

const RANKING_LIMIT: usize = 5;
const DEFAULT_LOOKBACK_DAYS: u64 = 30;

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// # Errors
    ///
    /// [`GrowoutError::Validation`] when `end` is before `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(GrowoutError::validation(
                "end_date",
                "must be on or after start_date",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days covered, counting both ends.
    pub fn len_days(&self) -> u64 {
        days_between(self.start, self.end).unsigned_abs() + 1
    }

    /// Range of the same length ending the day before `start`.
    pub fn previous(&self) -> Self {
        let len = Days::new(self.len_days());
        let end = self.start.pred_opt().unwrap_or(self.start);
        let start = self.start.checked_sub_days(len).unwrap_or(end);
        Self { start, end }
    }

    /// `Today`, `This Week`, `This Month` or `Custom Period`.
    pub fn label(&self) -> &'static str {
        if self.start == self.end {
            "Today"
        } else if days_between(self.start, self.end) <= 7 {
            "This Week"
        } else if self.start.year() == self.end.year() && self.start.month() == self.end.month() {
            "This Month"
        } else {
            "Custom Period"
        }
    }
}

/// Named dashboard period, resolved against a reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashboardPeriod {
    Day,
    /// Monday through Sunday of the current week.
    Week,
    /// The 30 days before today, plus today.
    #[default]
    Last30Days,
    /// First through last day of the current month.
    Month,
    /// Explicit bounds; a missing bound falls back to the `Last30Days` one.
    Custom {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

impl DashboardPeriod {
    /// # Errors
    ///
    /// [`GrowoutError::Validation`] for a custom range that ends before it starts.
    pub fn resolve(&self, today: NaiveDate) -> Result<DateRange> {
        let lookback = today
            .checked_sub_days(Days::new(DEFAULT_LOOKBACK_DAYS))
            .unwrap_or(today);
        match *self {
            Self::Day => DateRange::new(today, today),
            Self::Week => {
                let monday = today
                    .checked_sub_days(Days::new(u64::from(
                        today.weekday().num_days_from_monday(),
                    )))
                    .unwrap_or(today);
                DateRange::new(monday, monday.checked_add_days(Days::new(6)).unwrap_or(monday))
            }
            Self::Last30Days => DateRange::new(lookback, today),
            Self::Month => {
                let first = today.with_day(1).unwrap_or(today);
                let last = first
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .unwrap_or(today);
                DateRange::new(first, last)
            }
            Self::Custom { start, end } => {
                DateRange::new(start.unwrap_or(lookback), end.unwrap_or(today))
            }
        }
    }
}

impl FromStr for DashboardPeriod {
    type Err = GrowoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "30days" => Ok(Self::Last30Days),
            "month" => Ok(Self::Month),
            "custom" => Ok(Self::Custom {
                start: None,
                end: None,
            }),
            other => Err(GrowoutError::validation(
                "period",
                format!("unknown period \"{other}\" (expected day, week, 30days, month or custom)"),
            )),
        }
    }
}

/// Entity and activity counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardTotals {
    pub total_investors: usize,
    pub total_cages: usize,
    /// Distinct feed types assigned to cages.
    pub total_feed_types: usize,
    pub samplings_in_period: usize,
    pub total_samplings: usize,
    pub samples_in_period: usize,
    pub total_samples: usize,
}

/// Weight statistics over the samples taken in the period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightStats {
    pub sample_count: usize,
    pub avg_weight_g: f64,
    pub min_weight_g: f64,
    pub max_weight_g: f64,
    pub total_weight_g: f64,
}

/// Sampling activity on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingTrend {
    pub date: NaiveDate,
    pub sampling_count: usize,
    /// `None` when none of the day's samplings has samples.
    pub avg_weight_g: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CagePerformance {
    pub cage_id: CageId,
    pub fingerlings: u32,
    pub investor_name: Option<String>,
    pub sampling_count: usize,
    pub avg_sample_weight_g: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorActivity {
    pub investor_id: InvestorId,
    pub name: String,
    pub sampling_count: usize,
    pub total_sample_weight_g: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedTypeUsage {
    pub feed_type: String,
    pub cage_count: usize,
}

/// Period-over-period change. Percentages are 0 when the previous period
/// has nothing to compare against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthMetrics {
    pub sampling_growth_pct: f64,
    pub weight_growth_pct: f64,
    pub current_samplings: usize,
    pub previous_samplings: usize,
    pub current_avg_weight_g: f64,
    pub previous_avg_weight_g: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub range: DateRange,
    pub previous_range: DateRange,
    pub period_label: &'static str,
    pub totals: DashboardTotals,
    pub weight_stats: WeightStats,
    pub growth: GrowthMetrics,
    pub sampling_trends: Vec<SamplingTrend>,
    /// Best average sample weight first, at most five.
    pub cage_performance: Vec<CagePerformance>,
    /// Most samplings in the period first, at most five.
    pub top_investors: Vec<InvestorActivity>,
    /// Most cages first, at most five.
    pub feed_type_usage: Vec<FeedTypeUsage>,
}

/// Relative change in percent, 0 when `previous` is not positive.
pub fn growth_percentage(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        round2((current - previous) / previous * 100.0)
    } else {
        0.0
    }
}

struct PeriodView<'a> {
    samplings: Vec<&'a Sampling>,
    samples: Vec<&'a Sample>,
}

fn period_view<'a>(
    data: &'a FarmData,
    by_sampling: &HashMap<SamplingId, Vec<&'a Sample>>,
    range: DateRange,
) -> PeriodView<'a> {
    let samplings: Vec<&Sampling> = data
        .samplings
        .iter()
        .filter(|s| range.contains(s.date))
        .collect();
    let samples = samplings
        .iter()
        .flat_map(|s| by_sampling.get(&s.id).into_iter().flatten().copied())
        .collect();
    PeriodView { samplings, samples }
}

fn mean_weight(samples: &[&Sample]) -> Option<f64> {
    let summary = aggregate_samples(samples.iter().copied());
    summary.has_samples().then_some(summary.avg_weight_g)
}

/// Builds the dashboard for `range` over a scoped dataset.
pub fn dashboard(data: &FarmData, range: DateRange) -> Dashboard {
    let mut by_sampling: HashMap<SamplingId, Vec<&Sample>> = HashMap::new();
    for sample in &data.samples {
        by_sampling.entry(sample.sampling_id).or_default().push(sample);
    }

    let current = period_view(data, &by_sampling, range);
    let previous_range = range.previous();
    let previous = period_view(data, &by_sampling, previous_range);

    let stats = aggregate_samples(current.samples.iter().copied());
    let weight_stats = WeightStats {
        sample_count: stats.count,
        avg_weight_g: round2(stats.avg_weight_g),
        min_weight_g: stats.min_weight_g,
        max_weight_g: stats.max_weight_g,
        total_weight_g: stats.total_weight_g,
    };

    let current_avg = mean_weight(&current.samples).unwrap_or(0.0);
    let previous_avg = mean_weight(&previous.samples).unwrap_or(0.0);
    let growth = GrowthMetrics {
        sampling_growth_pct: growth_percentage(
            current.samplings.len() as f64,
            previous.samplings.len() as f64,
        ),
        weight_growth_pct: growth_percentage(current_avg, previous_avg),
        current_samplings: current.samplings.len(),
        previous_samplings: previous.samplings.len(),
        current_avg_weight_g: round2(current_avg),
        previous_avg_weight_g: round2(previous_avg),
    };

    let totals = DashboardTotals {
        total_investors: data.investors.iter().filter(|i| !i.deleted).count(),
        total_cages: data.cages.len(),
        total_feed_types: data
            .cages
            .iter()
            .filter_map(|c| c.feed_type.as_deref())
            .collect::<HashSet<_>>()
            .len(),
        samplings_in_period: current.samplings.len(),
        total_samplings: data.samplings.len(),
        samples_in_period: current.samples.len(),
        total_samples: data.samples.len(),
    };

    Dashboard {
        range,
        previous_range,
        period_label: range.label(),
        totals,
        weight_stats,
        growth,
        sampling_trends: sampling_trends(&current.samplings, &by_sampling),
        cage_performance: cage_performance(data, &current.samplings, &by_sampling),
        top_investors: top_investors(data, &current.samplings, &by_sampling),
        feed_type_usage: feed_type_usage(data),
    }
}

fn samples_of<'a>(
    samplings: &[&Sampling],
    by_sampling: &HashMap<SamplingId, Vec<&'a Sample>>,
) -> Vec<&'a Sample> {
    samplings
        .iter()
        .flat_map(|s| by_sampling.get(&s.id).into_iter().flatten().copied())
        .collect()
}

fn sampling_trends(
    samplings: &[&Sampling],
    by_sampling: &HashMap<SamplingId, Vec<&Sample>>,
) -> Vec<SamplingTrend> {
    let mut per_day: BTreeMap<NaiveDate, Vec<&Sampling>> = BTreeMap::new();
    for &s in samplings {
        per_day.entry(s.date).or_default().push(s);
    }
    per_day
        .into_iter()
        .map(|(date, day)| SamplingTrend {
            date,
            sampling_count: day.len(),
            avg_weight_g: mean_weight(&samples_of(&day, by_sampling)).map(round2),
        })
        .collect()
}

fn cage_performance(
    data: &FarmData,
    samplings: &[&Sampling],
    by_sampling: &HashMap<SamplingId, Vec<&Sample>>,
) -> Vec<CagePerformance> {
    let mut ranked: Vec<CagePerformance> = data
        .cages
        .iter()
        .filter_map(|cage| {
            let own: Vec<&Sampling> = samplings
                .iter()
                .copied()
                .filter(|s| s.cage_id == cage.id)
                .collect();
            if own.is_empty() {
                return None;
            }
            Some(CagePerformance {
                cage_id: cage.id,
                fingerlings: cage.fingerlings,
                investor_name: data.investor(cage.investor_id).map(|i| i.name.clone()),
                sampling_count: own.len(),
                avg_sample_weight_g: mean_weight(&samples_of(&own, by_sampling)).map(round2),
            })
        })
        .collect();
    // Cages without weighed samples rank last.
    ranked.sort_by(|a, b| {
        let key = |p: &CagePerformance| p.avg_sample_weight_g.unwrap_or(f64::NEG_INFINITY);
        key(b).total_cmp(&key(a))
    });
    ranked.truncate(RANKING_LIMIT);
    ranked
}

fn top_investors(
    data: &FarmData,
    samplings: &[&Sampling],
    by_sampling: &HashMap<SamplingId, Vec<&Sample>>,
) -> Vec<InvestorActivity> {
    let mut ranked: Vec<InvestorActivity> = data
        .investors
        .iter()
        .filter(|i| !i.deleted)
        .map(|investor| {
            let own: Vec<&Sampling> = samplings
                .iter()
                .copied()
                .filter(|s| s.investor_id == investor.id)
                .collect();
            InvestorActivity {
                investor_id: investor.id,
                name: investor.name.clone(),
                sampling_count: own.len(),
                total_sample_weight_g: samples_of(&own, by_sampling)
                    .iter()
                    .map(|s| s.weight_g)
                    .sum(),
            }
        })
        .collect();
    ranked.sort_by(|a, b| b.sampling_count.cmp(&a.sampling_count));
    ranked.truncate(RANKING_LIMIT);
    ranked
}

fn feed_type_usage(data: &FarmData) -> Vec<FeedTypeUsage> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for feed_type in data.cages.iter().filter_map(|c| c.feed_type.as_deref()) {
        *counts.entry(feed_type).or_default() += 1;
    }
    let mut usage: Vec<FeedTypeUsage> = counts
        .into_iter()
        .map(|(feed_type, cage_count)| FeedTypeUsage {
            feed_type: feed_type.to_string(),
            cage_count,
        })
        .collect();
    usage.sort_by(|a, b| b.cage_count.cmp(&a.cage_count));
    usage.truncate(RANKING_LIMIT);
    usage
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "--- Dashboard: {} ({} to {}) ---",
            self.period_label, self.range.start, self.range.end
        )?;
        writeln!(
            f,
            "Samplings:      {} in period / {} total",
            self.totals.samplings_in_period, self.totals.total_samplings
        )?;
        writeln!(
            f,
            "Samples:        {} in period / {} total",
            self.totals.samples_in_period, self.totals.total_samples
        )?;
        writeln!(f, "Avg weight:     {:.2} g", self.weight_stats.avg_weight_g)?;
        writeln!(
            f,
            "vs previous:    samplings {:+.2}%  weight {:+.2}%",
            self.growth.sampling_growth_pct, self.growth.weight_growth_pct
        )?;
        for p in &self.cage_performance {
            let avg = p
                .avg_sample_weight_g
                .map_or_else(|| "-".to_string(), |w| format!("{w:.2} g"));
            writeln!(
                f,
                "  cage {:>3} ({}) | samplings={} avg={}",
                p.cage_id,
                p.investor_name.as_deref().unwrap_or("-"),
                p.sampling_count,
                avg
            )?;
        }
        write!(
            f,
            "Feed types:     {}",
            self.feed_type_usage
                .iter()
                .map(|u| format!("{} x{}", u.feed_type, u.cage_count))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).expect("valid date")
    }

    const DATA: &str = r#"
[[investors]]
id = 1
name = "Reyes"

[[investors]]
id = 2
name = "Santos"

[[cages]]
id = 1
fingerlings = 2000
investor_id = 1
feed_type = "Grower Feed"

[[cages]]
id = 2
fingerlings = 500
investor_id = 2
feed_type = "Grower Feed"

[[cages]]
id = 3
fingerlings = 800
investor_id = 2
feed_type = "Starter Feed"

[[samplings]]
id = 1
cage_id = 1
investor_id = 1
date = "2025-04-02"

[[samplings]]
id = 2
cage_id = 1
investor_id = 1
date = "2025-04-12"

[[samplings]]
id = 3
cage_id = 2
investor_id = 2
date = "2025-04-12"

[[samplings]]
id = 4
cage_id = 3
investor_id = 2
date = "2025-04-14"

[[samples]]
sampling_id = 1
sample_no = 1
weight_g = 100.0

[[samples]]
sampling_id = 2
sample_no = 1
weight_g = 160.0

[[samples]]
sampling_id = 2
sample_no = 2
weight_g = 180.0

[[samples]]
sampling_id = 3
sample_no = 1
weight_g = 50.0
"#;

    fn data() -> FarmData {
        FarmData::from_toml_str(DATA).expect("dataset")
    }

    #[rstest]
    #[case(10.0, 5.0, 100.0)]
    #[case(3.0, 4.0, -25.0)]
    #[case(7.0, 0.0, 0.0)]
    #[case(0.0, 0.0, 0.0)]
    #[case(2.0, -1.0, 0.0)]
    fn growth_percentage_guards_empty_previous(
        #[case] current: f64,
        #[case] previous: f64,
        #[case] expected: f64,
    ) {
        assert_eq!(growth_percentage(current, previous), expected);
    }

    #[test]
    fn previous_range_has_equal_length() {
        let range = DateRange::new(d(4, 10), d(4, 16)).expect("range");
        let prev = range.previous();
        assert_eq!(prev, DateRange::new(d(4, 3), d(4, 9)).expect("range"));
        assert_eq!(prev.len_days(), range.len_days());
    }

    #[test]
    fn periods_resolve_against_today() {
        let today = d(4, 16); // Wednesday
        let week = DashboardPeriod::Week.resolve(today).expect("week");
        assert_eq!((week.start, week.end), (d(4, 14), d(4, 20)));
        let month = DashboardPeriod::Month.resolve(today).expect("month");
        assert_eq!((month.start, month.end), (d(4, 1), d(4, 30)));
        let last = DashboardPeriod::Last30Days.resolve(today).expect("30 days");
        assert_eq!((last.start, last.end), (d(3, 17), d(4, 16)));
        assert_eq!(DashboardPeriod::Day.resolve(today).expect("day").label(), "Today");
        assert_eq!(week.label(), "This Week");
        assert_eq!(month.label(), "This Month");
        assert_eq!(last.label(), "Custom Period");

        let inverted = DashboardPeriod::Custom {
            start: Some(d(5, 1)),
            end: Some(d(4, 1)),
        };
        assert!(inverted.resolve(today).is_err());
        assert!("fortnight".parse::<DashboardPeriod>().is_err());
    }

    #[test]
    fn growth_against_preceding_week() {
        let range = DateRange::new(d(4, 9), d(4, 15)).expect("range");
        let dash = dashboard(&data(), range);

        assert_eq!(dash.previous_range, DateRange::new(d(4, 2), d(4, 8)).expect("range"));
        assert_eq!(dash.growth.current_samplings, 3);
        assert_eq!(dash.growth.previous_samplings, 1);
        assert_eq!(dash.growth.sampling_growth_pct, 200.0);
        // (160 + 180 + 50) / 3 = 130 against 100.
        assert_eq!(dash.growth.current_avg_weight_g, 130.0);
        assert_eq!(dash.growth.weight_growth_pct, 30.0);
    }

    #[test]
    fn empty_previous_period_reports_zero_growth() {
        let range = DateRange::new(d(4, 1), d(4, 3)).expect("range");
        let dash = dashboard(&data(), range);
        assert_eq!(dash.growth.previous_samplings, 0);
        assert_eq!(dash.growth.sampling_growth_pct, 0.0);
        assert_eq!(dash.growth.weight_growth_pct, 0.0);
        assert_eq!(dash.growth.current_avg_weight_g, 100.0);
    }

    #[test]
    fn rankings_and_trends() {
        let range = DateRange::new(d(4, 1), d(4, 30)).expect("range");
        let dash = dashboard(&data(), range);

        assert_eq!(dash.totals.samplings_in_period, 4);
        assert_eq!(dash.totals.samples_in_period, 4);
        assert_eq!(dash.totals.total_feed_types, 2);
        assert_eq!(dash.weight_stats.min_weight_g, 50.0);
        assert_eq!(dash.weight_stats.max_weight_g, 180.0);
        assert_eq!(dash.weight_stats.avg_weight_g, 122.5);

        let trend_days: Vec<(NaiveDate, usize)> = dash
            .sampling_trends
            .iter()
            .map(|t| (t.date, t.sampling_count))
            .collect();
        assert_eq!(trend_days, [(d(4, 2), 1), (d(4, 12), 2), (d(4, 14), 1)]);
        assert_eq!(dash.sampling_trends[1].avg_weight_g, Some(130.0));
        assert_eq!(dash.sampling_trends[2].avg_weight_g, None);

        let cages: Vec<CageId> = dash.cage_performance.iter().map(|p| p.cage_id).collect();
        assert_eq!(cages, [1, 2, 3]);
        assert_eq!(dash.cage_performance[0].avg_sample_weight_g, Some(146.67));
        assert_eq!(dash.cage_performance[0].sampling_count, 2);
        assert_eq!(dash.cage_performance[2].avg_sample_weight_g, None);

        assert_eq!(dash.top_investors[0].name, "Reyes");
        assert_eq!(dash.top_investors[0].sampling_count, 2);
        assert_eq!(dash.top_investors[0].total_sample_weight_g, 440.0);
        assert_eq!(dash.top_investors[1].total_sample_weight_g, 50.0);

        assert_eq!(dash.feed_type_usage[0].feed_type, "Grower Feed");
        assert_eq!(dash.feed_type_usage[0].cage_count, 2);
    }
}
