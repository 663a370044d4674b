use std::path::PathBuf;

use eframe::egui::{self, RichText, Ui};

use crate::config::AppConfig;
use crate::model::gateway::ModelGateway;
use crate::state::{AppState, Page};

// ---------------------------------------------------------------------------
// Left side panel – navigation
// ---------------------------------------------------------------------------

/// Render the page selector.
pub fn side_panel(ui: &mut Ui, state: &mut AppState, config: &AppConfig, gateway: &ModelGateway) {
    ui.heading("Navigation");
    ui.separator();

    let mut selected = state.page;
    ui.label("Go to");
    for page in Page::ALL {
        ui.radio_value(&mut selected, page, page.title());
    }
    state.navigate(selected, config);

    ui.add_space(12.0);
    ui.separator();
    let model_state = if gateway.is_loaded() {
        "Model: loaded"
    } else {
        "Model: not loaded"
    };
    ui.label(RichText::new(model_state).small());
    ui.label(RichText::new(gateway.path().display().to_string()).small().weak());
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState, config: &AppConfig) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Upload dataset…").clicked() {
                state.navigate(Page::UploadAndPredict, config);
                if let Some(path) = pick_table_file("Upload dataset") {
                    upload_from_path(state, path, config);
                }
                ui.close_menu();
            }
            if ui.button("Quit").clicked() {
                ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });

        ui.separator();
        ui.label(RichText::new("UTBK Score Prediction").strong());

        if let Some(ds) = &state.dataset {
            ui.separator();
            ui.label(format!("{} rows loaded", ds.len()));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn pick_table_file(title: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter(
            "Supported files",
            &["csv", "tsv", "txt", "xlsx", "xlsm", "xls", "ods", "parquet", "pq"],
        )
        .add_filter("CSV", &["csv", "tsv", "txt"])
        .add_filter("Spreadsheet", &["xlsx", "xlsm", "xls", "ods"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file()
}

/// Read a picked file into memory and hand it over as the upload origin.
pub fn upload_from_path(state: &mut AppState, path: PathBuf, config: &AppConfig) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    match std::fs::read(&path) {
        Ok(bytes) => state.accept_upload(name, bytes, config),
        Err(e) => {
            log::error!("Failed to read {}: {e}", path.display());
            state.fail(e.into());
        }
    }
}

pub fn save_predictions(csv: &[u8]) -> Option<std::io::Result<PathBuf>> {
    let path = rfd::FileDialog::new()
        .set_title("Download predictions")
        .set_file_name("predictions.csv")
        .add_filter("CSV", &["csv"])
        .save_file()?;
    Some(std::fs::write(&path, csv).map(|_| path))
}
