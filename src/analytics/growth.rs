//! Daily growth rate from the two latest samplings that carry samples.

use chrono::NaiveDate;

use crate::model::{days_between, round2};

/// ABW of one sampling as seen by the growth estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthPoint {
    pub date: NaiveDate,
    /// Average body weight (g), 0 when the sampling has no samples.
    pub abw_g: f64,
    pub sample_count: usize,
}

/// Estimates growth in g/day, falling back to `default_rate` whenever the
/// history cannot produce a positive rate.
///
/// Points may arrive in any order; they are sorted by date with ties kept in
/// input order. Only an observed rate `<= 0` falls back. A positive rate is
/// rounded to 2 decimals unless that would round it to zero, in which case
/// the unrounded rate is returned.
///
/// The result is always `> 0` as long as `default_rate` is.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use growout::analytics::growth::{GrowthPoint, estimate_growth_rate};
///
/// let d = |m, d| NaiveDate::from_ymd_opt(2025, m, d).unwrap();
/// let points = [
///     GrowthPoint { date: d(1, 1), abw_g: 48.0, sample_count: 30 },
///     GrowthPoint { date: d(2, 22), abw_g: 161.0, sample_count: 30 },
/// ];
/// assert_eq!(estimate_growth_rate(&points, 3.0), 2.17);
/// ```
pub fn estimate_growth_rate(points: &[GrowthPoint], default_rate: f64) -> f64 {
    let mut qualifying: Vec<&GrowthPoint> = points.iter().filter(|p| p.sample_count > 0).collect();
    if qualifying.len() < 2 {
        tracing::debug!(
            qualifying = qualifying.len(),
            default_rate,
            "not enough sampled history, using default growth rate"
        );
        return default_rate;
    }
    qualifying.sort_by_key(|p| p.date);

    let [s1, s2] = [qualifying[qualifying.len() - 2], qualifying[qualifying.len() - 1]];
    let days = days_between(s1.date, s2.date);
    if days <= 0 || s1.abw_g <= 0.0 {
        tracing::debug!(days, prev_abw_g = s1.abw_g, "degenerate growth window");
        return default_rate;
    }

    let rate = (s2.abw_g - s1.abw_g) / days as f64;
    if rate <= 0.0 || !rate.is_finite() {
        tracing::debug!(rate, default_rate, "non-positive observed growth");
        return default_rate;
    }
    let rounded = round2(rate);
    if rounded > 0.0 { rounded } else { rate }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).expect("valid date")
    }

    fn gp(date: NaiveDate, abw_g: f64, n: usize) -> GrowthPoint {
        GrowthPoint {
            date,
            abw_g,
            sample_count: n,
        }
    }

    #[test]
    fn observed_rate_from_latest_two() {
        let points = [gp(d(1, 1), 48.0, 30), gp(d(2, 22), 161.0, 30)];
        assert_eq!(estimate_growth_rate(&points, 3.0), 2.17);
    }

    #[test]
    fn input_order_does_not_matter() {
        let points = [
            gp(d(3, 1), 200.0, 10),
            gp(d(1, 1), 10.0, 10),
            gp(d(2, 1), 100.0, 10),
        ];
        // 2/1 -> 3/1 is 28 days, 100 g.
        assert_eq!(estimate_growth_rate(&points, 3.0), 3.57);
    }

    #[test]
    fn unsampled_points_are_ignored() {
        let points = [
            gp(d(1, 1), 50.0, 5),
            gp(d(1, 11), 100.0, 5),
            gp(d(1, 21), 0.0, 0),
        ];
        assert_eq!(estimate_growth_rate(&points, 3.0), 5.0);
    }

    #[test]
    fn single_point_falls_back() {
        assert_eq!(estimate_growth_rate(&[gp(d(1, 1), 50.0, 5)], 3.0), 3.0);
        assert_eq!(estimate_growth_rate(&[], 1.5), 1.5);
    }

    #[test]
    fn same_day_falls_back() {
        let points = [gp(d(1, 1), 50.0, 5), gp(d(1, 1), 90.0, 5)];
        assert_eq!(estimate_growth_rate(&points, 3.0), 3.0);
    }

    #[test]
    fn shrinkage_falls_back() {
        let points = [gp(d(1, 1), 90.0, 5), gp(d(1, 11), 50.0, 5)];
        assert_eq!(estimate_growth_rate(&points, 3.0), 3.0);
    }

    #[test]
    fn slow_growth_is_kept_unrounded() {
        // 1 g over 364 days.
        let points = [gp(d(1, 1), 100.0, 5), gp(d(12, 31), 101.0, 5)];
        let rate = estimate_growth_rate(&points, 3.0);
        assert!((rate - 1.0 / 364.0).abs() < 1e-12);
        assert!(rate < 0.01);
    }
}
