use chrono::{Datelike, NaiveDate};
use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Line, Plot, VLine};

use crate::color::ColorScale;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Series chart (bottom panel)
// ---------------------------------------------------------------------------

/// Render the cases/deaths series for the current scope. Clicking the chart
/// selects the date rendered on the map.
pub fn series_chart(ui: &mut Ui, state: &mut AppState) {
    let Some(view) = state.series_view() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No series to plot.");
        });
        return;
    };

    if view.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No rows for this region.");
        });
        return;
    }

    let dates = view.dates();
    let days: Vec<f64> = dates.iter().map(|d| d.num_days_from_ce() as f64).collect();
    let cases: Vec<[f64; 2]> = days
        .iter()
        .zip(view.cases())
        .map(|(&x, y)| [x, y as f64])
        .collect();
    let deaths: Vec<[f64; 2]> = days
        .iter()
        .zip(view.deaths())
        .map(|(&x, y)| [x, y as f64])
        .collect();

    ui.strong(format!(
        "Cases & deaths in {} – click to choose the map date",
        state.region_label(),
    ));

    let selected_day = state.selected_date.map(|d| d.num_days_from_ce() as f64);

    let response = Plot::new("series")
        .legend(Legend::default())
        .x_axis_formatter(|mark, _range| format_day(mark.value))
        .label_formatter(|name, point| {
            let date = day_to_date(point.x)
                .map(|d| d.to_string())
                .unwrap_or_default();
            if name.is_empty() {
                date
            } else {
                format!("{name}\n{date}: {:.0}", point.y)
            }
        })
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(cases)
                    .name("Cases")
                    .color(ColorScale::blues().line_color())
                    .width(1.5),
            );
            plot_ui.line(
                Line::new(deaths)
                    .name("Deaths")
                    .color(ColorScale::reds().line_color())
                    .width(1.5),
            );
            if let Some(day) = selected_day {
                plot_ui.vline(VLine::new(day).color(Color32::GRAY).width(1.0));
            }
            plot_ui.pointer_coordinate()
        });

    if response.response.clicked() {
        if let Some(pointer) = response.inner {
            // Snap to the nearest reported date.
            let target = pointer.x.round() as i64;
            let nearest = dates
                .iter()
                .copied()
                .min_by_key(|d| (d.num_days_from_ce() as i64 - target).abs());
            if let Some(date) = nearest {
                state.select_date(date);
            }
        }
    }
}

fn day_to_date(day: f64) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(day.round() as i32)
}

fn format_day(day: f64) -> String {
    day_to_date(day)
        .map(|d| d.format("%b %e %Y").to_string())
        .unwrap_or_default()
}
