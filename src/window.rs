use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Named time windows offered by the interval picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepsDateInterval {
    Daily,
    Weekly,
    Monthly,
    YearHalf,
    Yearly,
}

impl StepsDateInterval {
    /// Picker order.
    pub const ALL: [StepsDateInterval; 5] = [
        StepsDateInterval::Daily,
        StepsDateInterval::Weekly,
        StepsDateInterval::Monthly,
        StepsDateInterval::YearHalf,
        StepsDateInterval::Yearly,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StepsDateInterval::Daily => "daily",
            StepsDateInterval::Weekly => "weekly",
            StepsDateInterval::Monthly => "monthly",
            StepsDateInterval::YearHalf => "half-year",
            StepsDateInterval::Yearly => "yearly",
        }
    }

    /// Caption shown under the total in the summary header.
    pub fn caption(self) -> &'static str {
        match self {
            StepsDateInterval::Daily => "Today",
            StepsDateInterval::Weekly => "Last 7 days",
            StepsDateInterval::Monthly => "Last 30 days",
            StepsDateInterval::YearHalf => "Last 6 months",
            StepsDateInterval::Yearly => "Last year",
        }
    }

    /// Number of days between "now" and the window's lower bound.
    pub fn offset_days(self, daily: DailyOffset) -> i64 {
        match self {
            StepsDateInterval::Daily => daily.days(),
            StepsDateInterval::Weekly => 7,
            StepsDateInterval::Monthly => 30,
            StepsDateInterval::YearHalf => 180,
            StepsDateInterval::Yearly => 360,
        }
    }

    pub fn granularity(self) -> BucketGranularity {
        match self {
            StepsDateInterval::Daily => BucketGranularity::Hour,
            StepsDateInterval::Weekly => BucketGranularity::Day,
            StepsDateInterval::Monthly => BucketGranularity::Weekday,
            StepsDateInterval::YearHalf | StepsDateInterval::Yearly => BucketGranularity::Month,
        }
    }
}

impl Default for StepsDateInterval {
    fn default() -> Self {
        StepsDateInterval::Daily
    }
}

/// Where the daily window starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DailyOffset {
    /// Midnight of the current day.
    Today,
    /// Midnight of the previous day.
    Yesterday,
}

impl DailyOffset {
    pub fn days(self) -> i64 {
        match self {
            DailyOffset::Today => 0,
            DailyOffset::Yesterday => 1,
        }
    }
}

impl Default for DailyOffset {
    fn default() -> Self {
        DailyOffset::Today
    }
}

/// Unit used to group records into chart marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BucketGranularity {
    Hour,
    Day,
    /// Calendar days, labelled by weekday on the axis.
    Weekday,
    Month,
}

impl BucketGranularity {
    /// Truncate `ts` to the start of the bucket that contains it.
    pub fn bucket_start(self, ts: NaiveDateTime) -> NaiveDateTime {
        match self {
            BucketGranularity::Hour => start_of_hour(ts),
            BucketGranularity::Day | BucketGranularity::Weekday => start_of_day(ts),
            BucketGranularity::Month => NaiveDate::from_ymd_opt(ts.year(), ts.month(), 1)
                .map(|d| d.and_time(NaiveTime::default()))
                .unwrap_or_else(|| start_of_day(ts)),
        }
    }

    /// Length of the bucket that starts at `start`. Month buckets run to the
    /// first day of the next calendar month.
    pub fn span(self, start: NaiveDateTime) -> Duration {
        match self {
            BucketGranularity::Hour => Duration::hours(1),
            BucketGranularity::Day | BucketGranularity::Weekday => Duration::days(1),
            BucketGranularity::Month => {
                let (y, m) = match start.month() {
                    12 => (start.year() + 1, 1),
                    m => (start.year(), m + 1),
                };
                NaiveDate::from_ymd_opt(y, m, 1)
                    .map(|d| d.and_time(NaiveTime::default()) - start)
                    .unwrap_or_else(|| Duration::days(30))
            }
        }
    }
}

/// The active date filter and its chart bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub interval: StepsDateInterval,
    pub lower_bound: NaiveDateTime,
    pub granularity: BucketGranularity,
}

/// Compute the window for `interval` relative to `now`.
///
/// The lower bound is midnight of the day `offset_days` before `now`.
pub fn compute_window(
    interval: StepsDateInterval,
    now: NaiveDateTime,
    daily: DailyOffset,
) -> DateWindow {
    let start = now - Duration::days(interval.offset_days(daily));
    DateWindow {
        interval,
        lower_bound: start_of_day(start),
        granularity: interval.granularity(),
    }
}

pub fn start_of_day(ts: NaiveDateTime) -> NaiveDateTime {
    ts.date().and_time(NaiveTime::default())
}

pub fn start_of_hour(ts: NaiveDateTime) -> NaiveDateTime {
    ts.date()
        .and_hms_opt(ts.hour(), 0, 0)
        .unwrap_or_else(|| start_of_day(ts))
}
