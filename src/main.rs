mod app;
mod color;
mod data;
mod geo;
mod state;
mod ui;

use app::CaseviewApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Caseview – COVID-19 Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(CaseviewApp::default()))),
    )
}
