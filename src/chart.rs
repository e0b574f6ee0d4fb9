use chrono::NaiveDateTime;
use log::info;

use crate::selection::SelectionState;
use crate::store::{SortOrder, StepFilter, StepRecord, StepStore};
use crate::window::{DailyOffset, DateWindow, StepsDateInterval, compute_window};

/// Records backing the step chart for the active window.
///
/// The view is not ready until the first [`refresh`](ChartView::refresh).
/// Every refresh replaces the snapshot and asks the renderer to rebuild the
/// plot from scratch.
#[derive(Debug)]
pub struct ChartView {
    interval: StepsDateInterval,
    daily_offset: DailyOffset,
    order: SortOrder,
    window: Option<DateWindow>,
    records: Vec<StepRecord>,
    needs_reset: bool,
}

impl ChartView {
    pub fn new(interval: StepsDateInterval, daily_offset: DailyOffset, order: SortOrder) -> Self {
        Self {
            interval,
            daily_offset,
            order,
            window: None,
            records: Vec::new(),
            needs_reset: false,
        }
    }

    pub fn interval(&self) -> StepsDateInterval {
        self.interval
    }

    pub fn window(&self) -> Option<&DateWindow> {
        self.window.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.window.is_some()
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Re-query the store for the current window.
    pub fn refresh(&mut self, store: &dyn StepStore, now: NaiveDateTime) {
        let window = compute_window(self.interval, now, self.daily_offset);
        self.records = store.query(StepFilter::Since(window.lower_bound), self.order);
        info!(
            "Loaded {} records for {} window since {}",
            self.records.len(),
            self.interval.label(),
            window.lower_bound
        );
        self.window = Some(window);
        self.needs_reset = true;
    }

    /// Switch to `interval`. Any selection is dropped.
    pub fn set_interval(
        &mut self,
        interval: StepsDateInterval,
        store: &dyn StepStore,
        now: NaiveDateTime,
        selection: &mut SelectionState,
    ) -> bool {
        if interval == self.interval && self.is_ready() {
            return false;
        }
        selection.clear();
        self.interval = interval;
        self.refresh(store, now);
        true
    }

    /// Move the daily window's start. The window changes, so any selection
    /// is dropped.
    pub fn set_daily_offset(
        &mut self,
        offset: DailyOffset,
        store: &dyn StepStore,
        now: NaiveDateTime,
        selection: &mut SelectionState,
    ) {
        selection.clear();
        self.daily_offset = offset;
        self.refresh(store, now);
    }

    pub fn set_order(&mut self, order: SortOrder, store: &dyn StepStore, now: NaiveDateTime) {
        self.order = order;
        self.refresh(store, now);
    }

    pub fn total_steps(&self) -> u64 {
        self.records.iter().map(|r| r.steps as u64).sum()
    }

    pub fn total_steps_label(&self) -> String {
        format_thousands(self.total_steps())
    }

    /// Earliest and latest timestamps in the snapshot, or `None` when empty.
    pub fn domain(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let min = self.records.iter().map(|r| r.timestamp).min()?;
        let max = self.records.iter().map(|r| r.timestamp).max()?;
        Some((min, max))
    }

    /// Consume the pending redraw request.
    pub fn take_reset(&mut self) -> bool {
        std::mem::take(&mut self.needs_reset)
    }
}

/// Format `n` with `,` between groups of three digits.
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
