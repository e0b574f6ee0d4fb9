use chrono::{Duration, NaiveDateTime};
use log::info;
use rand::Rng;

use crate::store::StepStore;

/// Number of past days covered by [`generate`].
pub const DAYS: i64 = 360;
/// First and one-past-last sampled hour of each day.
pub const HOURS: std::ops::Range<u32> = 8..22;
pub const MIN_STEPS: u32 = 50;
pub const MAX_STEPS: u32 = 500;

/// Seed `store` with one random sample per hour for the last [`DAYS`] days.
///
/// Each call adds a fresh set of records; nothing is deduplicated. The
/// caller is responsible for committing the store afterwards. Returns the
/// number of records created.
pub fn generate<S, R>(store: &mut S, now: NaiveDateTime, rng: &mut R) -> usize
where
    S: StepStore + ?Sized,
    R: Rng + ?Sized,
{
    let start = now - Duration::days(DAYS);
    let mut created = 0;
    for day in 0..DAYS {
        let date = (start + Duration::days(day)).date();
        for h in HOURS {
            if let Some(ts) = date.and_hms_opt(h, 0, 0) {
                store.create(ts, rng.gen_range(MIN_STEPS..=MAX_STEPS));
                created += 1;
            }
        }
    }
    info!("Generated {created} example step records");
    created
}
