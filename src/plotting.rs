use chrono::{DateTime, NaiveDateTime};
use egui_plot::{Bar, BarChart, VLine};
use std::collections::BTreeMap;

use crate::selection::Annotation;
use crate::store::StepRecord;
use crate::window::BucketGranularity;

/// Fraction of a bucket's span covered by its bar.
const BAR_FILL: f64 = 0.8;

/// Map a timestamp onto the plot's x axis (seconds since the epoch).
pub fn datetime_to_x(ts: NaiveDateTime) -> f64 {
    ts.and_utc().timestamp() as f64
}

/// Inverse of [`datetime_to_x`]. Returns `None` for values chrono cannot
/// represent.
pub fn x_to_datetime(x: f64) -> Option<NaiveDateTime> {
    if !x.is_finite() {
        return None;
    }
    DateTime::from_timestamp(x.floor() as i64, 0).map(|dt| dt.naive_utc())
}

/// Sum steps per bucket, in time order.
pub fn bucket_totals(
    records: &[StepRecord],
    granularity: BucketGranularity,
) -> Vec<(NaiveDateTime, u64)> {
    let mut map: BTreeMap<NaiveDateTime, u64> = BTreeMap::new();
    for r in records {
        *map.entry(granularity.bucket_start(r.timestamp)).or_insert(0) += r.steps as u64;
    }
    map.into_iter().collect()
}

/// Bar chart of step totals. Bars are centred on their bucket.
pub fn step_bar_chart(records: &[StepRecord], granularity: BucketGranularity) -> BarChart {
    let bars: Vec<Bar> = bucket_totals(records, granularity)
        .into_iter()
        .map(|(start, steps)| {
            let span = granularity.span(start).num_seconds() as f64;
            Bar::new(datetime_to_x(start) + span / 2.0, steps as f64).width(span * BAR_FILL)
        })
        .collect();
    BarChart::new(bars).name("Steps")
}

/// Axis label for a grid mark at `x`.
pub fn format_x_mark(x: f64, granularity: BucketGranularity) -> String {
    let Some(dt) = x_to_datetime(x) else {
        return String::new();
    };
    let fmt = match granularity {
        BucketGranularity::Hour => "%H:%M",
        BucketGranularity::Day => "%m-%d",
        BucketGranularity::Weekday => "%a",
        BucketGranularity::Month => "%Y-%m",
    };
    dt.format(fmt).to_string()
}

/// Vertical rule marking the inspected hour.
pub fn selection_rule(annotation: &Annotation) -> VLine {
    VLine::new(datetime_to_x(annotation.marker)).name("Selected")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn rec(m: u32, d: u32, h: u32, steps: u32) -> StepRecord {
        StepRecord {
            id: Uuid::new_v4(),
            timestamp: NaiveDate::from_ymd_opt(2024, m, d)
                .unwrap()
                .and_hms_opt(h, 0, 0)
                .unwrap(),
            steps,
        }
    }

    fn midnight(m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn totals_per_day_and_month() {
        let records = vec![rec(1, 1, 8, 100), rec(1, 1, 9, 50), rec(1, 2, 8, 70), rec(2, 3, 10, 5)];

        let days = bucket_totals(&records, BucketGranularity::Day);
        assert_eq!(
            days,
            vec![(midnight(1, 1), 150), (midnight(1, 2), 70), (midnight(2, 3), 5)]
        );

        let months = bucket_totals(&records, BucketGranularity::Month);
        assert_eq!(months, vec![(midnight(1, 1), 220), (midnight(2, 1), 5)]);
    }

    #[test]
    fn hour_totals_keep_each_sample() {
        let records = vec![rec(3, 4, 8, 10), rec(3, 4, 8, 15), rec(3, 4, 9, 20)];
        let hours = bucket_totals(&records, BucketGranularity::Hour);
        assert_eq!(hours.len(), 2);
        assert_eq!(hours[0].1, 25);
    }

    #[test]
    fn x_axis_roundtrip() {
        let ts = midnight(5, 6);
        assert_eq!(x_to_datetime(datetime_to_x(ts)), Some(ts));
        assert_eq!(x_to_datetime(f64::NAN), None);
    }

    #[test]
    fn empty_records_give_no_buckets() {
        assert!(bucket_totals(&[], BucketGranularity::Hour).is_empty());
    }

    #[test]
    fn mark_labels() {
        let x = datetime_to_x(midnight(7, 1));
        assert_eq!(format_x_mark(x, BucketGranularity::Month), "2024-07");
        assert_eq!(format_x_mark(x, BucketGranularity::Weekday), "Mon");
    }
}
