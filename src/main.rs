mod app;
mod color;
mod config;
mod data;
mod error;
#[cfg(test)]
mod fixtures;
mod model;
mod present;
mod state;
mod ui;

use app::UtbkDashboardApp;
use config::AppConfig;
use eframe::egui;
use model::gateway::ModelGateway;

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}; falling back to defaults");
            AppConfig::default()
        }
    };

    // The gateway lives for the whole process; warm it up so the first
    // prediction does not pay for deserialization.
    let gateway = ModelGateway::new(&config.model_path);
    if let Err(e) = gateway.get_model() {
        log::warn!("Model not available yet: {e}");
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "UTBK Dashboard – Score Prediction",
        options,
        Box::new(|_cc| Ok(Box::new(UtbkDashboardApp::new(config, gateway)))),
    )
}
