//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use growout::dataset::FarmData;
use growout::model::{Cage, CageId, FeedConsumption, Sample, SamplingId};

/// Path of a file under the crate's `data/` directory.
pub fn data_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
}

/// The demo farm (cages 1-4, samplings 1-3).
pub fn demo_farm() -> FarmData {
    FarmData::from_toml_file(&data_path("demo_farm.toml")).expect("demo farm should load")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn at(day: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
    day.and_hms_opt(h, m, 0).expect("valid time")
}

pub fn cage(id: CageId, fingerlings: u32) -> Cage {
    Cage {
        id,
        fingerlings,
        investor_id: 1,
        farmer_id: None,
        feed_type: None,
    }
}

/// `count` samples for one sampling, all of the same weight.
pub fn uniform_samples(sampling_id: SamplingId, count: u32, weight_g: f64) -> Vec<Sample> {
    (1..=count)
        .map(|n| Sample::weighed(sampling_id, n, weight_g))
        .collect()
}

pub fn feed(cage_id: CageId, day: NaiveDate, amount_kg: f64) -> FeedConsumption {
    FeedConsumption {
        cage_id,
        date: day,
        amount_kg,
        notes: None,
    }
}
