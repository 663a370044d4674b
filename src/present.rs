use crate::data::model::Dataset;
use crate::error::{DashboardError, Result};
use crate::model::RawPredictions;

/// UTBK subtest score columns, in model output order.
pub const OUTPUT_COLUMNS: [&str; 6] = ["PU", "PK", "PPU", "PBM", "LIND", "LING"];

// ---------------------------------------------------------------------------
// PredictionTable
// ---------------------------------------------------------------------------

/// Labelled predictions: one row of six subtest scores per predicted input row.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionTable {
    rows: Vec<[f64; 6]>,
}

impl PredictionTable {
    pub fn columns(&self) -> [&'static str; 6] {
        OUTPUT_COLUMNS
    }

    pub fn rows(&self) -> &[[f64; 6]] {
        &self.rows
    }

    /// All values of one output column.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = OUTPUT_COLUMNS.iter().position(|c| *c == name)?;
        Some(self.rows.iter().map(|r| r[idx]).collect())
    }

    pub fn head(&self, n: usize) -> PredictionTable {
        PredictionTable {
            rows: self.rows.iter().take(n).copied().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Attach the fixed subtest labels to raw model output.
pub fn present(raw: RawPredictions) -> Result<PredictionTable> {
    if raw.width() != OUTPUT_COLUMNS.len() {
        return Err(DashboardError::ShapeMismatch {
            expected: OUTPUT_COLUMNS.len(),
            found: raw.width(),
        });
    }
    let rows = raw
        .into_rows()
        .into_iter()
        .map(|r| {
            let mut out = [0.0; 6];
            out.copy_from_slice(&r);
            out
        })
        .collect();
    Ok(PredictionTable { rows })
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Mean of one output column, rounded to two decimals for display.
/// `None` when the table has no rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMean {
    pub column: &'static str,
    pub mean: Option<f64>,
}

/// Per-column arithmetic means, in output column order.
pub fn summarize(table: &PredictionTable) -> Vec<ColumnMean> {
    OUTPUT_COLUMNS
        .iter()
        .map(|&column| {
            let mean = table
                .column(column)
                .filter(|values| !values.is_empty())
                .map(|values| round2(values.iter().sum::<f64>() / values.len() as f64));
            ColumnMean { column, mean }
        })
        .collect()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// UTF-8 CSV with the six output names as header and full-precision values.
/// No index column.
pub fn serialize(table: &PredictionTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let csv_err = |e: csv::Error| DashboardError::Io(e.into());

    writer.write_record(OUTPUT_COLUMNS).map_err(csv_err)?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .map_err(csv_err)?;
    }
    writer
        .into_inner()
        .map_err(|e| DashboardError::Io(e.into_error()))
}

// ---------------------------------------------------------------------------
// Chart series
// ---------------------------------------------------------------------------

/// Up to `limit` values of `column` for a bar chart. Missing cells plot as
/// zero; anything else non-numeric is a parse error.
pub fn bar_series(dataset: &Dataset, column: &str, limit: usize) -> Result<Vec<f64>> {
    let idx = dataset
        .column_index(column)
        .ok_or_else(|| DashboardError::MissingColumns(vec![column.to_string()]))?;

    dataset
        .rows()
        .iter()
        .take(limit)
        .enumerate()
        .map(|(row, cells)| {
            let cell = &cells[idx];
            if cell.is_missing() {
                Ok(0.0)
            } else {
                cell.as_f64().ok_or_else(|| {
                    DashboardError::Parse(format!(
                        "row {row}, column '{column}': {cell} is not a number"
                    ))
                })
            }
        })
        .collect()
}
