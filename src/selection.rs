//! Click-to-inspect overlay for the step chart.

use chrono::{Duration, NaiveDateTime};
use egui_plot::PlotTransform;

use crate::plotting::x_to_datetime;
use crate::store::{SortOrder, StepFilter, StepRecord, StepStore};
use crate::window::start_of_hour;

/// Converts a plot-relative x offset (in points) into a date.
pub trait CoordinateMapper {
    fn date_at_x(&self, offset_x: f32) -> Option<NaiveDateTime>;
}

/// [`CoordinateMapper`] backed by the transform of the last drawn plot.
pub struct PlotMapper<'a> {
    transform: &'a PlotTransform,
}

impl<'a> PlotMapper<'a> {
    pub fn new(transform: &'a PlotTransform) -> Self {
        Self { transform }
    }

    /// Screen x of the plotting area's left edge.
    pub fn origin_x(&self) -> f32 {
        self.transform.frame().min.x
    }
}

impl CoordinateMapper for PlotMapper<'_> {
    fn date_at_x(&self, offset_x: f32) -> Option<NaiveDateTime> {
        let frame = self.transform.frame();
        let x = frame.min.x + offset_x;
        if !(frame.min.x..=frame.max.x).contains(&x) {
            return None;
        }
        let value = self
            .transform
            .value_from_position(egui::pos2(x, frame.center().y));
        x_to_datetime(value.x)
    }
}

/// Map a pointer position to the hour bucket under it.
pub fn map_point_to_bucket(
    pointer: egui::Pos2,
    plot_origin_x: f32,
    mapper: &dyn CoordinateMapper,
) -> Option<NaiveDateTime> {
    let date = mapper.date_at_x(pointer.x - plot_origin_x)?;
    Some(start_of_hour(date))
}

/// Summary drawn above the selected bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Middle of the hour, where the rule is drawn.
    pub marker: NaiveDateTime,
    pub steps: u32,
    pub label: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectionState {
    selected: Option<NaiveDateTime>,
}

impl SelectionState {
    pub fn selected(&self) -> Option<NaiveDateTime> {
        self.selected
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Select the hour bucket under `pointer`. A miss leaves the current
    /// selection untouched.
    pub fn select_at(
        &mut self,
        pointer: egui::Pos2,
        plot_origin_x: f32,
        mapper: &dyn CoordinateMapper,
    ) -> Option<NaiveDateTime> {
        let bucket = map_point_to_bucket(pointer, plot_origin_x, mapper)?;
        log::debug!("Selected bucket {bucket}");
        self.selected = Some(bucket);
        Some(bucket)
    }

    /// Records stored at exactly the selected bucket, newest first.
    pub fn records(&self, store: &dyn StepStore) -> Vec<StepRecord> {
        match self.selected {
            Some(ts) => store.query(StepFilter::At(ts), SortOrder::Descending),
            None => Vec::new(),
        }
    }

    pub fn annotation(&self, store: &dyn StepStore) -> Option<Annotation> {
        let bucket = self.selected?;
        let record = self.records(store).into_iter().next()?;
        Some(Annotation {
            marker: bucket + Duration::minutes(30),
            steps: record.steps,
            label: bucket.format("%Y-%m-%d %H:%M").to_string(),
        })
    }
}
