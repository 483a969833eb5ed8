//! Summary statistics over the samples of one sampling event.

use serde::Serialize;

use crate::model::Sample;

/// Count and weight/size statistics for one sampling.
///
/// Empty input yields zeros for the weight fields and `None` for the
/// optional size averages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SampleSummary {
    /// Number of samples.
    pub count: usize,
    /// Sum of weights (g).
    pub total_weight_g: f64,
    /// Average body weight (g), 0 when there are no samples.
    pub avg_weight_g: f64,
    /// Lightest sample (g).
    pub min_weight_g: f64,
    /// Heaviest sample (g).
    pub max_weight_g: f64,
    /// Mean length over samples that carry one (cm).
    pub avg_length_cm: Option<f64>,
    /// Mean width over samples that carry one (cm).
    pub avg_width_cm: Option<f64>,
}

impl SampleSummary {
    /// Whether the sampling has at least one sample, i.e. a meaningful ABW.
    pub fn has_samples(&self) -> bool {
        self.count > 0
    }
}

/// Reduces the samples of one sampling to a [`SampleSummary`].
///
/// Accepts anything that yields `&Sample`, so both `&[Sample]` and the
/// `Vec<&Sample>` returned by dataset lookups work.
///
/// # Examples
///
/// ```
/// use growout::model::Sample;
/// use growout::sampling::aggregate_samples;
///
/// let samples = vec![Sample::weighed(1, 1, 200.0), Sample::weighed(1, 2, 250.0)];
/// let summary = aggregate_samples(&samples);
/// assert_eq!(summary.count, 2);
/// assert_eq!(summary.avg_weight_g, 225.0);
/// assert_eq!(summary.avg_length_cm, None);
/// ```
pub fn aggregate_samples<'a, I>(samples: I) -> SampleSummary
where
    I: IntoIterator<Item = &'a Sample>,
{
    let mut count = 0_usize;
    let mut total = 0.0_f64;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut length = MeanAcc::default();
    let mut width = MeanAcc::default();

    for s in samples {
        count += 1;
        total += s.weight_g;
        min = min.min(s.weight_g);
        max = max.max(s.weight_g);
        length.push(s.length_cm);
        width.push(s.width_cm);
    }

    if count == 0 {
        return SampleSummary::default();
    }

    SampleSummary {
        count,
        total_weight_g: total,
        avg_weight_g: total / count as f64,
        min_weight_g: min,
        max_weight_g: max,
        avg_length_cm: length.mean(),
        avg_width_cm: width.mean(),
    }
}

#[derive(Default)]
struct MeanAcc {
    sum: f64,
    n: usize,
}

impl MeanAcc {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.n += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / self.n as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_all_zero() {
        let summary = aggregate_samples(&Vec::<Sample>::new());
        assert_eq!(summary.count, 0);
        assert_eq!(summary.avg_weight_g, 0.0);
        assert_eq!(summary.min_weight_g, 0.0);
        assert_eq!(summary.max_weight_g, 0.0);
        assert!(!summary.has_samples());
    }

    #[test]
    fn min_max_and_mean() {
        let samples: Vec<Sample> = [120.0, 80.0, 100.0]
            .iter()
            .enumerate()
            .map(|(i, &w)| Sample::weighed(1, i as u32 + 1, w))
            .collect();
        let summary = aggregate_samples(&samples);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.total_weight_g, 300.0);
        assert_eq!(summary.avg_weight_g, 100.0);
        assert_eq!(summary.min_weight_g, 80.0);
        assert_eq!(summary.max_weight_g, 120.0);
    }

    #[test]
    fn size_averages_skip_missing_values() {
        let mut a = Sample::weighed(1, 1, 100.0);
        a.length_cm = Some(10.0);
        let mut b = Sample::weighed(1, 2, 100.0);
        b.length_cm = Some(14.0);
        let c = Sample::weighed(1, 3, 100.0);
        let summary = aggregate_samples(&[a, b, c]);
        assert_eq!(summary.avg_length_cm, Some(12.0));
        assert_eq!(summary.avg_width_cm, None);
    }

    #[test]
    fn accepts_borrowed_vec() {
        let owned = [Sample::weighed(1, 1, 40.0), Sample::weighed(1, 2, 60.0)];
        let borrowed: Vec<&Sample> = owned.iter().collect();
        assert_eq!(aggregate_samples(borrowed).avg_weight_g, 50.0);
    }
}
