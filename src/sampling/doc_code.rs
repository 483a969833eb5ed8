//! Day-of-culture code generation for new samplings.

use chrono::NaiveDate;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::error::{GrowoutError, Result};

/// Largest random suffix; codes use five zero-padded digits.
const MAX_SUFFIX: u32 = 99_999;

/// Draws `DOC-YYYYMMDD-NNNNN` codes, retrying on collision a bounded number of times.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use growout::sampling::DocCodeGenerator;
///
/// let mut docs = DocCodeGenerator::seeded(7, 8);
/// let date = NaiveDate::from_ymd_opt(2025, 11, 16).unwrap();
/// let code = docs.generate(date, |_| false).unwrap();
/// assert!(code.starts_with("DOC-20251116-"));
/// assert_eq!(code.len(), "DOC-20251116-00000".len());
/// ```
pub struct DocCodeGenerator {
    rng: StdRng,
    max_attempts: u32,
}

impl DocCodeGenerator {
    /// Generator seeded from the operating system.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            max_attempts,
        }
    }

    /// Reproducible generator.
    pub fn seeded(seed: u64, max_attempts: u32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            max_attempts,
        }
    }

    /// Returns the first drawn code for which `is_taken` is false.
    ///
    /// # Errors
    ///
    /// Returns [`GrowoutError::DocCodeExhausted`] when every attempt collided.
    pub fn generate<F>(&mut self, date: NaiveDate, mut is_taken: F) -> Result<String>
    where
        F: FnMut(&str) -> bool,
    {
        let prefix = format!("DOC-{}", date.format("%Y%m%d"));
        for attempt in 1..=self.max_attempts {
            let suffix: u32 = self.rng.random_range(1..=MAX_SUFFIX);
            let code = format!("{prefix}-{suffix:05}");
            if !is_taken(&code) {
                return Ok(code);
            }
            tracing::debug!(attempt, code = %code, "DOC code collision, retrying");
        }
        tracing::error!(
            date = %date,
            attempts = self.max_attempts,
            "DOC code space exhausted"
        );
        Err(GrowoutError::DocCodeExhausted {
            date: date.to_string(),
            attempts: self.max_attempts,
        })
    }
}
