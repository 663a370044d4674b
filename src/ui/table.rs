use eframe::egui::{ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{CellValue, Dataset};
use crate::present::PredictionTable;

const ROW_HEIGHT: f32 = 18.0;

/// Render a dataset preview as a striped grid.
pub fn dataset_table(ui: &mut Ui, id: &str, dataset: &Dataset) {
    ui.push_id(id, |ui: &mut Ui| {
        ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .columns(Column::auto().at_least(60.0), dataset.columns().len())
                .header(20.0, |mut header| {
                    for name in dataset.columns() {
                        header.col(|ui: &mut Ui| {
                            ui.strong(name);
                        });
                    }
                })
                .body(|mut body| {
                    for row in dataset.rows() {
                        body.row(ROW_HEIGHT, |mut table_row| {
                            for cell in row {
                                table_row.col(|ui: &mut Ui| {
                                    ui.label(cell_text(cell));
                                });
                            }
                        });
                    }
                });
        });
    });
}

/// Render predictions with two decimals.
pub fn prediction_table(ui: &mut Ui, id: &str, table: &PredictionTable) {
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .columns(Column::auto().at_least(60.0), table.columns().len())
            .header(20.0, |mut header| {
                for name in table.columns() {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|mut body| {
                for row in table.rows() {
                    body.row(ROW_HEIGHT, |mut table_row| {
                        for value in row {
                            table_row.col(|ui: &mut Ui| {
                                ui.label(format!("{value:.2}"));
                            });
                        }
                    });
                }
            });
    });
}

fn cell_text(cell: &CellValue) -> String {
    match cell {
        CellValue::Null => String::new(),
        other => other.to_string(),
    }
}
