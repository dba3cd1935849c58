use eframe::egui;

use crate::state::AppState;
use crate::ui::{chart, map, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct CaseviewApp {
    pub state: AppState,
}

impl eframe::App for CaseviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: drill-down navigation ----
        egui::SidePanel::left("explore_panel")
            .default_width(230.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: time series ----
        egui::TopBottomPanel::bottom("chart_panel")
            .default_height(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                chart::series_chart(ui, &mut self.state);
            });

        // ---- Central panel: choropleth ----
        egui::CentralPanel::default().show(ctx, |ui| {
            map::choropleth(ui, &mut self.state);
        });
    }
}
