use std::collections::HashMap;

use eframe::egui::{Stroke, Ui};
use egui_plot::{Plot, PlotBounds, Polygon};

use crate::color;
use crate::geo::GeoFeature;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Choropleth (central panel)
// ---------------------------------------------------------------------------

/// Render the choropleth of the current scope's subregions; a click on a
/// region descends into it.
pub fn choropleth(ui: &mut Ui, state: &mut AppState) {
    let Some(view) = state.map_view() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a data folder to begin  (File → Open data folder…)");
        });
        return;
    };
    let Some(geo) = state.subregion_geo().cloned() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Boundary data for this level failed to load.");
        });
        return;
    };

    let metric = state.metric;
    let scale = metric.scale();

    // Metric value per code on the selected date. A code with no boundary
    // is simply never drawn; a boundary with no row renders neutral.
    let values: HashMap<String, i64> = view
        .rows()
        .filter_map(|rec| Some((rec.fips?.to_string(), metric.of(&rec))))
        .collect();

    let zmin = values.values().copied().min().unwrap_or(0) as f64;
    let zmax = values.values().copied().max().unwrap_or(0) as f64;
    let span = (zmax - zmin).max(1.0);

    let features = geo.region(&state.selected_fips);

    let date = state
        .selected_date
        .map(|d| d.to_string())
        .unwrap_or_default();
    ui.strong(format!(
        "{} in {} on {date} – click a region to see more",
        metric.label(),
        state.region_label(),
    ));

    let refit = state.map_needs_refit;
    let response = Plot::new("choropleth")
        // ~cos(38°): squeeze longitude so the mid-latitude US keeps its
        // proportions on a flat lon/lat plot.
        .data_aspect(0.8)
        .show_axes([false, false])
        .show_grid([false, false])
        .show(ui, |plot_ui| {
            if refit {
                if let Some((min_lon, min_lat, max_lon, max_lat)) = union_bounds(&features) {
                    plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                        [min_lon - 1.0, min_lat - 1.0],
                        [max_lon + 1.0, max_lat + 1.0],
                    ));
                }
            }

            for feature in &features {
                let fill = match values.get(&feature.id) {
                    Some(&value) => scale.color_for((value as f64 - zmin) / span),
                    None => color::missing_data_color(),
                };
                let name = feature.name.clone().unwrap_or_else(|| feature.id.clone());
                for ring in &feature.rings {
                    let points: Vec<[f64; 2]> = ring.clone();
                    plot_ui.polygon(
                        Polygon::new(points)
                            .fill_color(fill)
                            .stroke(Stroke::new(0.5, scale.line_color()))
                            .name(&name),
                    );
                }
            }

            plot_ui.pointer_coordinate()
        });
    state.map_needs_refit = false;

    if response.response.clicked() {
        if let Some(pointer) = response.inner {
            let hit = features
                .iter()
                .find(|f| f.contains(pointer.x, pointer.y))
                .map(|f| f.id.clone());
            if let Some(id) = hit {
                state.select_region(&id);
            }
        }
    }
}

fn union_bounds(features: &[&GeoFeature]) -> Option<(f64, f64, f64, f64)> {
    features
        .iter()
        .filter_map(|f| f.bounds())
        .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3)))
}
