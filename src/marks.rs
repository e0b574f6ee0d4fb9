//! Gallery of the basic chart marks over a small fixed data set.

use egui_plot::{Bar, BarChart, Line, Plot, PlotPoints, Points, Polygon};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub name: &'static str,
    pub count: u32,
}

pub const POSTINGS: [Posting; 3] = [
    Posting { name: "Green", count: 250 },
    Posting { name: "James", count: 100 },
    Posting { name: "Tony", count: 70 },
];

/// Length of each rule mark past its posting count.
const RULE_LENGTH: f64 = 20.0;
/// Half-size of the rectangle marks (category units, value units).
const RECT_HALF: [f64; 2] = [0.3, 6.0];

/// Category name at an axis value, if it lands on one.
fn category_label(value: f64) -> String {
    let idx = value.round();
    if (value - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    POSTINGS
        .get(idx as usize)
        .map(|p| p.name.to_owned())
        .unwrap_or_default()
}

/// Bar mark: name on x, count on y.
pub fn posting_bars(postings: &[Posting]) -> BarChart {
    let bars: Vec<Bar> = postings
        .iter()
        .enumerate()
        .map(|(i, p)| Bar::new(i as f64, p.count as f64).name(p.name).width(0.6))
        .collect();
    BarChart::new(bars).name("Posting")
}

/// Point mark: count on x, name on y.
pub fn posting_points(postings: &[Posting]) -> Vec<[f64; 2]> {
    postings
        .iter()
        .enumerate()
        .map(|(i, p)| [p.count as f64, i as f64])
        .collect()
}

/// Area mark outline: name on x, count on y.
pub fn posting_area(postings: &[Posting]) -> Vec<[f64; 2]> {
    postings
        .iter()
        .enumerate()
        .map(|(i, p)| [i as f64, p.count as f64])
        .collect()
}

/// Rule marks: horizontal segments from `count` to `count + 20` on the
/// posting's row.
pub fn posting_rules(postings: &[Posting]) -> Vec<[[f64; 2]; 2]> {
    postings
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let x = p.count as f64;
            [[x, i as f64], [x + RULE_LENGTH, i as f64]]
        })
        .collect()
}

/// Rectangle marks centred on each (name, count) position.
pub fn posting_rectangles(postings: &[Posting]) -> Vec<Vec<[f64; 2]>> {
    let [hx, hy] = RECT_HALF;
    posting_area(postings)
        .into_iter()
        .map(|[x, y]| vec![[x - hx, y - hy], [x + hx, y - hy], [x + hx, y + hy], [x - hx, y + hy]])
        .collect()
}

fn mark_plot(id: &str, categories_on_x: bool) -> Plot {
    let plot = Plot::new(id).height(160.0).allow_drag(false).allow_zoom(false).allow_scroll(false);
    if categories_on_x {
        plot.x_axis_formatter(|mark, _chars, _| category_label(mark.value))
    } else {
        plot.y_axis_formatter(|mark, _chars, _| category_label(mark.value))
    }
}

/// Lay out the five mark examples in two columns.
pub fn show_gallery(ui: &mut egui::Ui) {
    ui.columns(2, |cols| {
        cols[0].label("Bar");
        mark_plot("mark_bar", true).show(&mut cols[0], |plot_ui| {
            plot_ui.bar_chart(posting_bars(&POSTINGS));
        });
        cols[0].label("Point");
        mark_plot("mark_point", false).show(&mut cols[0], |plot_ui| {
            plot_ui.points(Points::new(posting_points(&POSTINGS)).radius(4.0).name("Posting"));
        });
        cols[0].label("Rectangle");
        mark_plot("mark_rect", true).show(&mut cols[0], |plot_ui| {
            for rect in posting_rectangles(&POSTINGS) {
                plot_ui.polygon(Polygon::new(PlotPoints::from(rect)).name("Posting"));
            }
        });

        cols[1].label("Area");
        mark_plot("mark_area", true).show(&mut cols[1], |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(posting_area(&POSTINGS)))
                    .fill(0.0)
                    .name("Posting"),
            );
        });
        cols[1].label("Rule");
        mark_plot("mark_rule", false).show(&mut cols[1], |plot_ui| {
            for [a, b] in posting_rules(&POSTINGS) {
                plot_ui.line(Line::new(PlotPoints::from(vec![a, b])).width(3.0).name("Posting"));
            }
        });
    });
}
