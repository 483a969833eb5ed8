mod common;

use chrono::{Days, NaiveDate};
use proptest::prelude::*;

use growout::analytics::biomass::{SamplingPoint, compute_biomass};
use growout::analytics::{GrowthPoint, estimate_growth_rate, project_harvest};
use growout::config::FeedingSettings;
use growout::feeding::generate_feeding_schedule;
use growout::model::{FeedConsumption, Sample, round2};
use growout::sampling::aggregate_samples;

use common::{at, cage, date};

fn samples_of(weights: &[f64]) -> Vec<Sample> {
    weights
        .iter()
        .zip(1..)
        .map(|(&w, n)| Sample::weighed(1, n, w))
        .collect()
}

fn day(offset: u64) -> NaiveDate {
    date(2025, 1, 1)
        .checked_add_days(Days::new(offset))
        .expect("in range")
}

fn growth_points_strategy() -> impl Strategy<Value = Vec<GrowthPoint>> {
    prop::collection::vec((0u64..400, -100.0f64..1000.0, 0usize..5), 0..8).prop_map(|raw| {
        raw.into_iter()
            .map(|(offset, abw_g, sample_count)| GrowthPoint {
                date: day(offset),
                abw_g,
                sample_count,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn average_weight_is_the_arithmetic_mean(weights in prop::collection::vec(0.1f64..5000.0, 0..60)) {
        let samples = samples_of(&weights);
        let summary = aggregate_samples(&samples);

        prop_assert_eq!(summary.count, weights.len());
        if weights.is_empty() {
            prop_assert_eq!(summary.avg_weight_g, 0.0);
        } else {
            let mean = weights.iter().sum::<f64>() / weights.len() as f64;
            prop_assert!((summary.avg_weight_g - mean).abs() < 1e-9);
            prop_assert!(summary.min_weight_g <= summary.avg_weight_g + 1e-9);
            prop_assert!(summary.avg_weight_g <= summary.max_weight_g + 1e-9);
        }
    }

    #[test]
    fn biomass_follows_present_stock(
        weights in prop::collection::vec(1.0f64..2000.0, 1..40),
        fingerlings in 1u32..100_000,
        mortality in 0u32..200_000,
    ) {
        let samples = samples_of(&weights);
        let point = SamplingPoint {
            date: date(2025, 4, 1),
            summary: aggregate_samples(&samples),
            mortality,
        };
        let r = compute_biomass(&point, None, fingerlings, &Vec::<FeedConsumption>::new(), 3.0);

        let present = i64::from(fingerlings) - i64::from(mortality);
        prop_assert_eq!(r.present_stock, present);
        let expected = round2(point.summary.avg_weight_g * present as f64 / 1000.0);
        prop_assert!((r.biomass_kg - expected).abs() < 1e-9);
        prop_assert!(r.fcr >= 0.0);
    }

    #[test]
    fn growth_rate_is_always_positive(
        points in growth_points_strategy(),
        default_rate in 0.1f64..100.0,
    ) {
        let rate = estimate_growth_rate(&points, default_rate);
        prop_assert!(rate > 0.0);
        prop_assert!(rate.is_finite());
    }

    #[test]
    fn harvest_days_are_the_ceiling_of_remaining_growth(
        abw in 0.0f64..1500.0,
        target in 1.0f64..1000.0,
        rate in 0.01f64..50.0,
    ) {
        let est = project_harvest(abw, target, rate, date(2025, 3, 1));

        if abw >= target {
            prop_assert!(est.is_ready);
            prop_assert_eq!(est.days_until_harvest, Some(0));
            prop_assert_eq!(est.estimated_date, Some(date(2025, 3, 1)));
        } else {
            let expected = ((target - abw) / rate).ceil() as i64;
            prop_assert!(!est.is_ready);
            prop_assert_eq!(est.days_until_harvest, Some(expected));
            prop_assert!(expected >= 0);
        }
    }

    #[test]
    fn schedule_slots_add_up_to_the_daily_total(
        fingerlings in 1u32..200_000,
        weights in prop::collection::vec(1.0f64..1500.0, 0..10),
        age in 0u64..200,
        sampled in any::<bool>(),
    ) {
        let now = at(date(2025, 9, 1), 10, 0);
        let samples = samples_of(&weights);
        let latest = sampled.then(|| SamplingPoint {
            date: date(2025, 9, 1).checked_sub_days(Days::new(age)).expect("in range"),
            summary: aggregate_samples(&samples),
            mortality: 0,
        });

        let spec = generate_feeding_schedule(
            &cage(1, fingerlings),
            latest.as_ref(),
            &FeedingSettings::default(),
            now,
        );

        let slots = spec.frequency.slot_count();
        prop_assert!((1..=4).contains(&slots));
        prop_assert_eq!(spec.times.len(), slots);
        prop_assert_eq!(spec.amounts.len(), slots);
        let sum: f64 = spec.amounts.iter().sum();
        prop_assert!(
            (sum - spec.total_daily_amount).abs() <= 0.05,
            "slots sum to {sum}, total is {}",
            spec.total_daily_amount
        );
    }
}
