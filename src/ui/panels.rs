use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::state::{AppState, Metric};

// ---------------------------------------------------------------------------
// Left side panel – drill-down navigation
// ---------------------------------------------------------------------------

/// Render the left explore panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Explore");
    ui.separator();

    if !state.has_data() {
        ui.label("No data loaded.");
        return;
    }

    ui.strong(state.region_label());
    if !state.selected_fips.is_empty() && ui.button("⬅ Back").clicked() {
        state.drill_up();
    }
    ui.add_space(4.0);

    if let Some(selected) = state.selected_date {
        ui.horizontal(|ui: &mut Ui| {
            ui.label("Map date:");
            let mut date = selected;
            if ui
                .add(DatePickerButton::new(&mut date).id_salt("map_date"))
                .changed()
            {
                state.select_date(date);
            }
        });
    }
    ui.separator();

    // ---- Subregion list (click to descend) ----
    let entries = subregion_entries(state);
    ui.strong(format!("Subregions ({})", entries.len()));
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (label, code) in &entries {
                if ui
                    .selectable_label(state.selected_fips == *code, label)
                    .clicked()
                {
                    state.select_region(code);
                }
            }
        });
}

/// `(label, code)` pairs for the current scope's subregions, sorted by name.
fn subregion_entries(state: &AppState) -> Vec<(String, String)> {
    let Some(view) = state.map_view() else {
        return Vec::new();
    };
    let mut entries: Vec<(String, String)> = view
        .rows()
        .filter_map(|rec| {
            let code = rec.fips?.to_string();
            if code.is_empty() {
                return None;
            }
            let label = rec.county.or(rec.state).unwrap_or(&code).to_string();
            Some((label, code))
        })
        .collect();
    entries.sort();
    entries.dedup();
    entries
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data folder…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(view) = state.map_view() {
            let date = state
                .selected_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "—".to_string());
            ui.label(format!("{} regions on {date}", view.len()));
        }

        ui.separator();

        for metric in [Metric::Cases, Metric::Deaths] {
            if ui
                .selectable_label(state.metric == metric, metric.label())
                .clicked()
            {
                state.metric = metric;
            }
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

pub fn open_folder_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open data folder")
        .pick_folder();

    if let Some(dir) = folder {
        state.open_data_dir(&dir);
        match &state.status_message {
            None => log::info!("loaded data folder {}", dir.display()),
            Some(msg) => log::error!("partial load from {}: {msg}", dir.display()),
        }
    }
}
