//! Step chart dashboard and persistent user settings.

use dirs_next as dirs;
use eframe::{App, Frame, NativeOptions, egui};
use egui_plot::{Plot, PlotPoint, Text};
use rfd::FileDialog;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use log::{error, info, warn};

mod chart;
use chart::ChartView;
mod export;
mod generator;
mod marks;
mod plotting;
use plotting::{datetime_to_x, format_x_mark, selection_rule, step_bar_chart};
mod selection;
use selection::{PlotMapper, SelectionState};
mod store;
use store::{JsonStepStore, SortOrder, StepStore, commit_logged};
mod window;
use window::{DailyOffset, StepsDateInterval};

fn default_plot_height() -> f32 {
    280.0
}

/// Persistent configuration for the dashboard.
///
/// Stored as JSON in the user's config directory. Fields missing from an
/// older file fall back to their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Settings {
    #[serde(default)]
    interval: StepsDateInterval,
    /// Whether the daily window starts today or yesterday.
    #[serde(default)]
    daily_offset: DailyOffset,
    #[serde(default)]
    sort_order: SortOrder,
    #[serde(default = "default_plot_height")]
    plot_height: f32,
    #[serde(default)]
    show_marks: bool,
    /// Overrides the default location of the step data file.
    #[serde(default)]
    store_path: Option<String>,
}

impl Settings {
    const FILE: &'static str = "step_charts_settings.json";

    fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(Self::FILE))
    }

    fn load() -> Self {
        if let Some(path) = Self::path() {
            if let Ok(data) = std::fs::read_to_string(&path) {
                match serde_json::from_str(&data) {
                    Ok(cfg) => return cfg,
                    Err(err) => warn!("Ignoring malformed settings {}: {err}", path.display()),
                }
            }
        }
        Self::default()
    }

    fn save(&self) {
        if let Some(path) = Self::path() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Ok(data) = serde_json::to_string_pretty(self) {
                if let Err(err) = std::fs::write(&path, data) {
                    error!("Failed to save settings to {}: {err}", path.display());
                }
            }
        }
    }

    fn store_path(&self) -> Option<PathBuf> {
        self.store_path
            .as_ref()
            .map(PathBuf::from)
            .or_else(JsonStepStore::default_path)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval: StepsDateInterval::Daily,
            daily_offset: DailyOffset::Today,
            sort_order: SortOrder::Ascending,
            plot_height: default_plot_height(),
            show_marks: false,
            store_path: None,
        }
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

struct StepsApp {
    store: Box<dyn StepStore>,
    settings: Settings,
    view: ChartView,
    selection: SelectionState,
    show_settings: bool,
    settings_dirty: bool,
}

impl StepsApp {
    fn new(store: Box<dyn StepStore>, settings: Settings) -> Self {
        let mut view =
            ChartView::new(settings.interval, settings.daily_offset, settings.sort_order);
        view.refresh(store.as_ref(), now());
        Self {
            store,
            settings,
            view,
            selection: SelectionState::default(),
            show_settings: false,
            settings_dirty: false,
        }
    }

    fn select_interval(&mut self, interval: StepsDateInterval) {
        if self
            .view
            .set_interval(interval, self.store.as_ref(), now(), &mut self.selection)
        {
            self.settings.interval = interval;
            self.settings_dirty = true;
        }
    }

    fn generate_data(&mut self) {
        let created = generator::generate(self.store.as_mut(), now(), &mut rand::thread_rng());
        commit_logged(self.store.as_mut());
        info!("Store now holds {} records after adding {created}", self.store.len());
        self.view.refresh(self.store.as_ref(), now());
    }

    fn interval_picker(&mut self, ui: &mut egui::Ui) {
        let mut chosen = self.view.interval();
        ui.horizontal(|ui| {
            for interval in StepsDateInterval::ALL {
                ui.selectable_value(&mut chosen, interval, interval.label());
            }
        });
        if chosen != self.view.interval() {
            self.select_interval(chosen);
        }
    }

    /// Total for the window. Hidden while a bucket is inspected; clicking
    /// it dismisses the inspection.
    fn summary_header(&mut self, ui: &mut egui::Ui) {
        let visible = self.selection.selected().is_none();
        let total = self.view.total_steps_label();
        let caption = self.view.interval().caption();
        let inner = ui.add_visible_ui(visible, |ui| {
            ui.vertical(|ui| {
                ui.label(egui::RichText::new("Total").color(egui::Color32::GRAY));
                ui.horizontal(|ui| {
                    ui.heading(total);
                    ui.label(egui::RichText::new("steps").color(egui::Color32::GRAY));
                });
                ui.label(egui::RichText::new(caption).color(egui::Color32::GRAY));
            });
        });
        let header = ui.interact(
            inner.response.rect,
            ui.id().with("summary_header"),
            egui::Sense::click(),
        );
        if header.clicked() {
            self.selection.clear();
        }
    }

    fn step_chart(&mut self, ui: &mut egui::Ui) {
        let Some(window) = self.view.window().copied() else {
            ui.label("Loading...");
            return;
        };
        let granularity = window.granularity;
        let mut plot = Plot::new("steps_plot")
            .height(self.settings.plot_height)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .allow_double_click_reset(false)
            .include_y(0.0)
            .x_axis_formatter(move |mark, _chars, _| format_x_mark(mark.value, granularity));
        if self.view.take_reset() {
            plot = plot.reset();
        }
        if let Some((first, last)) = self.view.domain() {
            let last_bucket = granularity.bucket_start(last);
            plot = plot
                .include_x(datetime_to_x(granularity.bucket_start(first)))
                .include_x(datetime_to_x(last_bucket + granularity.span(last_bucket)));
        }

        let annotation = self.selection.annotation(self.store.as_ref());
        let records = self.view.records();
        let resp = plot.show(ui, |plot_ui| {
            plot_ui.bar_chart(step_bar_chart(records, granularity));
            if let Some(ann) = &annotation {
                plot_ui.vline(selection_rule(ann));
                let top = plot_ui.plot_bounds().max()[1];
                plot_ui.text(
                    Text::new(
                        PlotPoint::new(datetime_to_x(ann.marker), top),
                        format!("Total {} steps\n{}", ann.steps, ann.label),
                    )
                    .anchor(egui::Align2::CENTER_TOP),
                );
            }
        });

        if resp.response.clicked() {
            if let Some(pos) = resp.response.interact_pointer_pos() {
                let mapper = PlotMapper::new(&resp.transform);
                self.selection.select_at(pos, mapper.origin_x(), &mapper);
            }
        }
    }

    fn export_buttons(&self, ui: &mut egui::Ui) {
        let records = self.view.records();
        if ui.button("Export CSV").clicked() {
            if let Some(path) = FileDialog::new().add_filter("CSV", &["csv"]).save_file() {
                match export::save_records_csv(&path, records) {
                    Ok(()) => info!("Exported {} records to {}", records.len(), path.display()),
                    Err(err) => error!("Failed to export CSV: {err}"),
                }
            }
        }
        if ui.button("Export JSON").clicked() {
            if let Some(path) = FileDialog::new().add_filter("JSON", &["json"]).save_file() {
                match export::save_records_json(&path, records) {
                    Ok(()) => info!("Exported {} records to {}", records.len(), path.display()),
                    Err(err) => error!("Failed to export JSON: {err}"),
                }
            }
        }
    }

    fn settings_window(&mut self, ctx: &egui::Context) {
        let mut offset = self.settings.daily_offset;
        let mut order = self.settings.sort_order;
        let mut changed = false;
        egui::Window::new("Settings")
            .open(&mut self.show_settings)
            .show(ctx, |ui| {
                egui::ComboBox::from_label("Daily window starts")
                    .selected_text(match offset {
                        DailyOffset::Today => "Today",
                        DailyOffset::Yesterday => "Yesterday",
                    })
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut offset, DailyOffset::Today, "Today");
                        ui.selectable_value(&mut offset, DailyOffset::Yesterday, "Yesterday");
                    });
                egui::ComboBox::from_label("Record order")
                    .selected_text(match order {
                        SortOrder::Ascending => "Oldest first",
                        SortOrder::Descending => "Newest first",
                    })
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut order, SortOrder::Ascending, "Oldest first");
                        ui.selectable_value(&mut order, SortOrder::Descending, "Newest first");
                    });
                if ui
                    .add(
                        egui::Slider::new(&mut self.settings.plot_height, 120.0..=600.0)
                            .text("Plot height"),
                    )
                    .changed()
                {
                    changed = true;
                }
                if ui
                    .checkbox(&mut self.settings.show_marks, "Show chart marks")
                    .changed()
                {
                    changed = true;
                }
            });

        if offset != self.settings.daily_offset {
            self.settings.daily_offset = offset;
            self.view
                .set_daily_offset(offset, self.store.as_ref(), now(), &mut self.selection);
            changed = true;
        }
        if order != self.settings.sort_order {
            self.settings.sort_order = order;
            self.view.set_order(order, self.store.as_ref(), now());
            changed = true;
        }
        if changed {
            self.settings_dirty = true;
        }
    }
}

impl App for StepsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Steps");
                ui.separator();
                if ui.button("Settings").clicked() {
                    self.show_settings = !self.show_settings;
                }
                if ui.button("Chart marks").clicked() {
                    self.settings.show_marks = !self.settings.show_marks;
                    self.settings_dirty = true;
                }
            });
        });

        egui::TopBottomPanel::bottom("bottom_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Generate data").clicked() {
                    self.generate_data();
                }
                ui.separator();
                self.export_buttons(ui);
                ui.separator();
                ui.label(format!("{} records in window", self.view.records().len()));
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.interval_picker(ui);
            ui.add_space(8.0);
            self.summary_header(ui);
            ui.add_space(8.0);
            self.step_chart(ui);
        });

        self.settings_window(ctx);

        let mut show_marks = self.settings.show_marks;
        egui::Window::new("Chart marks")
            .open(&mut show_marks)
            .default_width(520.0)
            .show(ctx, marks::show_gallery);
        if show_marks != self.settings.show_marks {
            self.settings.show_marks = show_marks;
            self.settings_dirty = true;
        }

        if self.settings_dirty {
            self.settings.save();
            self.settings_dirty = false;
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.settings.save();
        commit_logged(self.store.as_mut());
    }
}

/// Open the configured store, falling back to an unsaved in-memory one.
fn open_store(settings: &Settings) -> Box<dyn StepStore> {
    let Some(path) = settings.store_path() else {
        warn!("No data directory available; step data will not be saved");
        return Box::new(JsonStepStore::in_memory());
    };
    match JsonStepStore::open(&path) {
        Ok(store) => Box::new(store),
        Err(err) => {
            error!("Failed to load step data from {}: {err}", path.display());
            Box::new(JsonStepStore::in_memory())
        }
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let settings = Settings::load();
    let store = open_store(&settings);
    let options = NativeOptions::default();
    eframe::run_native(
        "Step Charts",
        options,
        Box::new(move |_cc| Box::new(StepsApp::new(store, settings))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    /// Point `XDG_CONFIG_HOME` at a temp dir for the duration of `f`.
    fn with_config_dir(f: impl FnOnce(&std::path::Path)) {
        use std::env;

        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let prev_config = env::var_os("XDG_CONFIG_HOME");
        unsafe {
            env::set_var("XDG_CONFIG_HOME", dir.path());
        }

        f(dir.path());

        if let Some(val) = prev_config {
            unsafe {
                env::set_var("XDG_CONFIG_HOME", val);
            }
        } else {
            unsafe {
                env::remove_var("XDG_CONFIG_HOME");
            }
        }
    }

    fn app() -> StepsApp {
        StepsApp::new(Box::new(JsonStepStore::in_memory()), Settings::default())
    }

    #[test]
    fn settings_roundtrip() {
        let mut s = Settings::default();
        s.interval = StepsDateInterval::YearHalf;
        s.daily_offset = DailyOffset::Yesterday;
        s.sort_order = SortOrder::Descending;
        s.plot_height = 400.0;
        s.show_marks = true;
        s.store_path = Some("/tmp/steps.json".into());

        let json = serde_json::to_string(&s).unwrap();
        let loaded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(s, loaded);
    }

    #[test]
    fn settings_persist_and_default_missing_fields() {
        with_config_dir(|_| {
            let mut s = Settings::default();
            s.interval = StepsDateInterval::Weekly;
            s.save();
            assert_eq!(Settings::load().interval, StepsDateInterval::Weekly);

            std::fs::write(Settings::path().unwrap(), "{}").unwrap();
            assert_eq!(Settings::load(), Settings::default());

            std::fs::write(Settings::path().unwrap(), "garbage").unwrap();
            assert_eq!(Settings::load(), Settings::default());
        });
    }

    #[test]
    fn store_path_override() {
        let mut s = Settings::default();
        s.store_path = Some("/data/custom.json".into());
        assert_eq!(s.store_path(), Some(PathBuf::from("/data/custom.json")));
    }

    #[test]
    fn unreadable_store_falls_back_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steps.json");
        std::fs::write(&path, "[{").unwrap();
        let mut s = Settings::default();
        s.store_path = Some(path.to_string_lossy().into_owned());
        let store = open_store(&s);
        assert!(store.is_empty());
    }

    #[test]
    fn empty_app_shows_zero() {
        let app = app();
        assert!(app.view.is_ready());
        assert_eq!(app.view.total_steps_label(), "0");
        assert_eq!(app.view.domain(), None);
    }

    #[test]
    fn generate_fills_store_and_view() {
        let mut app = app();
        app.generate_data();
        assert_eq!(app.store.len(), 5040);
        app.select_interval(StepsDateInterval::Yearly);
        assert!(app.view.total_steps() > 0);
        assert_eq!(app.settings.interval, StepsDateInterval::Yearly);
        assert!(app.settings_dirty);
    }

    #[test]
    fn ui_renders_with_empty_store() {
        let mut app = app();
        let ctx = egui::Context::default();
        let _ = ctx.run(Default::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                app.interval_picker(ui);
                app.summary_header(ui);
                app.step_chart(ui);
            });
        });
        assert_eq!(app.selection.selected(), None);
    }
}
