use eframe::egui;

use crate::color::ColumnColors;
use crate::config::AppConfig;
use crate::model::gateway::ModelGateway;
use crate::present::OUTPUT_COLUMNS;
use crate::state::{AppState, Origin, Page};
use crate::ui::{pages, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct UtbkDashboardApp {
    pub config: AppConfig,
    pub gateway: ModelGateway,
    pub state: AppState,
    colors: ColumnColors,
}

impl UtbkDashboardApp {
    pub fn new(config: AppConfig, gateway: ModelGateway) -> Self {
        Self {
            state: AppState::new(&config),
            colors: ColumnColors::new(&OUTPUT_COLUMNS),
            config,
            gateway,
        }
    }

    /// A file dropped onto the window becomes the upload origin.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };

        self.state.origin = Origin::Upload;
        self.state.navigate(Page::UploadAndPredict, &self.config);
        match (file.bytes, file.path) {
            (Some(bytes), path) => {
                let name = if file.name.is_empty() {
                    path.map(|p| p.display().to_string()).unwrap_or_default()
                } else {
                    file.name
                };
                self.state.accept_upload(name, bytes.to_vec(), &self.config);
            }
            (None, Some(path)) => panels::upload_from_path(&mut self.state, path, &self.config),
            (None, None) => log::warn!("Dropped file '{}' carried no data", file.name),
        }
    }
}

impl eframe::App for UtbkDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_files(ctx);

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state, &self.config);
        });

        // ---- Left side panel: navigation ----
        egui::SidePanel::left("navigation_panel")
            .default_width(200.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state, &self.config, &self.gateway);
            });

        // ---- Central panel: active page ----
        egui::CentralPanel::default().show(ctx, |ui| {
            pages::show(ui, &mut self.state, &self.config, &self.gateway, &self.colors);
        });
    }
}
