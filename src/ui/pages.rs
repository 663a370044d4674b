use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::color::ColumnColors;
use crate::config::AppConfig;
use crate::data::schema::FeatureSchema;
use crate::model::gateway::ModelGateway;
use crate::state::{AppState, Origin, Page, Status};
use crate::ui::panels::{pick_table_file, save_predictions, upload_from_path};
use crate::ui::{plot, table};

// ---------------------------------------------------------------------------
// Central panel – one page per frame
// ---------------------------------------------------------------------------

/// Render the active page.
pub fn show(
    ui: &mut Ui,
    state: &mut AppState,
    config: &AppConfig,
    gateway: &ModelGateway,
    colors: &ColumnColors,
) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match state.page {
            Page::Home => home(ui, gateway),
            Page::UploadAndPredict => upload_and_predict(ui, state, config, gateway, colors),
            Page::Visualize => visualize(ui, state, config, colors),
            Page::About => about(ui, config),
        });
}

fn status_line(ui: &mut Ui, status: &Option<Status>) {
    match status {
        Some(Status::Info(msg)) => {
            ui.label(RichText::new(msg).color(Color32::LIGHT_BLUE));
        }
        Some(Status::Success(msg)) => {
            ui.label(RichText::new(msg).color(Color32::from_rgb(80, 180, 90)));
        }
        Some(Status::Error(msg)) => {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
        None => {}
    }
}

// ---------------------------------------------------------------------------
// Home
// ---------------------------------------------------------------------------

fn home(ui: &mut Ui, gateway: &ModelGateway) {
    ui.heading("Welcome!");
    ui.label(
        "This dashboard predicts UTBK scores per subtest (PU, PK, PPU, PBM, LIND, LING) \
         for study programmes from tryout results.",
    );
    ui.add_space(8.0);
    ui.label("Use the navigation on the left to load data and run predictions.");
    ui.add_space(4.0);
    ui.label(format!(
        "Input files need these columns: {}",
        FeatureSchema::utbk().columns().join(", ")
    ));
    if !gateway.is_loaded() {
        ui.label(
            RichText::new(format!(
                "The model at {} has not been loaded yet.",
                gateway.path().display()
            ))
            .weak(),
        );
    }
}

// ---------------------------------------------------------------------------
// Upload & Predict
// ---------------------------------------------------------------------------

fn upload_and_predict(
    ui: &mut Ui,
    state: &mut AppState,
    config: &AppConfig,
    gateway: &ModelGateway,
    colors: &ColumnColors,
) {
    ui.heading("Upload participant data for per-subtest prediction");
    ui.add_space(4.0);

    ui.horizontal(|ui: &mut Ui| {
        for origin in Origin::ALL {
            ui.selectable_value(&mut state.origin, origin, origin.label());
        }
    });

    let mut load = false;
    let mut picked_upload = None;
    match state.origin {
        Origin::Remote => {
            ui.horizontal(|ui: &mut Ui| {
                ui.label("URL");
                ui.add(egui::TextEdit::singleline(&mut state.remote_url).desired_width(480.0));
                load = ui.button("Load").clicked();
            });
        }
        Origin::Local => {
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Path");
                ui.add(egui::TextEdit::singleline(&mut state.local_path).desired_width(400.0));
                if ui.button("Browse…").clicked() {
                    if let Some(path) = pick_table_file("Open dataset") {
                        state.local_path = path.display().to_string();
                        load = true;
                    }
                }
                if ui.button("Load").clicked() {
                    load = true;
                }
            });
        }
        Origin::Upload => {
            ui.horizontal(|ui: &mut Ui| {
                if ui.button("Choose file…").clicked() {
                    picked_upload = pick_table_file("Upload dataset");
                }
                match &state.upload {
                    Some(upload) => ui.label(upload.name()),
                    None => ui.label(RichText::new("or drop a file onto the window").weak()),
                };
            });
        }
    }
    if load {
        state.load_selected(config);
    }
    if let Some(path) = picked_upload {
        upload_from_path(state, path, config);
    }

    status_line(ui, &state.status);
    ui.separator();

    let mut run = false;
    if let Some(ds) = &state.dataset {
        ui.label(format!("Rows: {}", ds.len()));
        ui.strong("Preview input:");
        table::dataset_table(ui, "input_preview", &ds.head(config.preview_rows));
        ui.add_space(6.0);
        run = ui.button("Run Prediction").clicked();
    }
    if run {
        state.run_prediction(gateway);
    }

    let mut saved = None;
    if let Some(outcome) = &state.predictions {
        ui.add_space(8.0);
        ui.strong(format!("Predictions ({} rows)", outcome.table.len()));
        table::prediction_table(ui, "prediction_preview", &outcome.table.head(config.preview_rows));

        ui.add_space(6.0);
        ui.strong("Mean predicted score per subtest");
        ui.horizontal_wrapped(|ui: &mut Ui| {
            for m in &outcome.means {
                if let Some(mean) = m.mean {
                    ui.label(format!("{}: {mean:.2}", m.column));
                }
            }
        });
        plot::means_chart(ui, "prediction_means", &outcome.means, colors);

        if ui.button("Download predictions CSV").clicked() {
            saved = save_predictions(&outcome.csv);
        }
    }
    match saved {
        Some(Ok(path)) => {
            log::info!("Wrote predictions to {}", path.display());
            state.status = Some(Status::Success(format!("Saved {}", path.display())));
        }
        Some(Err(e)) => state.fail(e.into()),
        None => {}
    }
}

// ---------------------------------------------------------------------------
// Visualize
// ---------------------------------------------------------------------------

fn visualize(ui: &mut Ui, state: &mut AppState, config: &AppConfig, colors: &ColumnColors) {
    ui.heading("UTBK score dataset");
    if ui.button("Reload").clicked() {
        state.load_visualization(config);
    }
    status_line(ui, &state.status);

    let Some(visual) = &state.visual else {
        return;
    };
    ui.label(format!("Preview of cleaned data ({} rows):", visual.total_rows));
    table::dataset_table(ui, "cleaned_preview", &visual.preview);

    if !visual.series.is_empty() {
        ui.add_space(8.0);
        ui.strong(format!(
            "Distribution of {} (first {} rows)",
            visual.column,
            visual.series.len()
        ));
        plot::series_chart(
            ui,
            "cleaned_chart",
            &visual.column,
            &visual.series,
            colors.color_for(&visual.column),
        );
    }
}

// ---------------------------------------------------------------------------
// About
// ---------------------------------------------------------------------------

fn about(ui: &mut Ui, config: &AppConfig) {
    ui.heading("About");
    ui.label(&config.about);
    ui.add_space(8.0);
    ui.label(
        RichText::new(format!(
            "{} {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ))
        .weak(),
    );
}
