use std::io::Cursor;
use std::path::Path;

use arrow::array::{
    Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeStringArray, StringArray,
};
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{CellValue, Dataset};
use crate::error::{DashboardError, Result};

/// Tokens read as a missing value in text cells.
const MISSING_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

// ---------------------------------------------------------------------------
// Table formats
// ---------------------------------------------------------------------------

/// How a byte stream is decoded into a [`Dataset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableFormat {
    /// Delimited text with a header row (`,`, `;` or tab, sniffed).
    Delimited,
    /// Spreadsheet workbook; rows are read from the named sheet.
    Spreadsheet { sheet: String },
    /// Parquet file with flat columns.
    Parquet,
}

impl TableFormat {
    /// Pick a format from a file extension.
    ///
    /// Supported formats:
    /// * `.csv` / `.tsv` / `.txt`                   – delimited text
    /// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – spreadsheet, `sheet` is read
    /// * `.parquet` / `.pq`                          – Parquet
    pub fn from_extension(ext: &str, sheet: &str) -> Result<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "tsv" | "txt" => Ok(TableFormat::Delimited),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(TableFormat::Spreadsheet {
                sheet: sheet.to_string(),
            }),
            "parquet" | "pq" => Ok(TableFormat::Parquet),
            other => Err(DashboardError::Parse(format!(
                "unsupported file extension: .{other}"
            ))),
        }
    }

    /// Pick a format from a file name, path or URL. Query strings and
    /// fragments are ignored.
    pub fn from_name(name: &str, sheet: &str) -> Result<Self> {
        let without_query = name.split(['?', '#']).next().unwrap_or(name);
        let ext = Path::new(without_query)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        Self::from_extension(ext, sheet)
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Decode an in-memory table. Every origin (disk, upload, HTTP body) ends up
/// here so they all share the same parsing rules.
pub fn parse_table(bytes: &[u8], format: &TableFormat) -> Result<Dataset> {
    let dataset = match format {
        TableFormat::Delimited => parse_delimited(bytes)?,
        TableFormat::Spreadsheet { sheet } => parse_spreadsheet(bytes, sheet)?,
        TableFormat::Parquet => parse_parquet(bytes)?,
    };
    log::debug!(
        "Parsed {:?} table: {} rows x {} columns",
        format,
        dataset.len(),
        dataset.columns().len()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

/// Header row with column names, one record per line. The delimiter is
/// whichever of `,` `;` or tab appears most in the first line.
fn parse_delimited(bytes: &[u8]) -> Result<Dataset> {
    let delimiter = sniff_delimiter(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(bytes);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| DashboardError::Parse(format!("reading header row: {e}")))?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| DashboardError::Parse(format!("row {row_no}: {e}")))?;
        rows.push(record.iter().map(guess_cell_type).collect());
    }

    Dataset::new(columns, rows)
}

fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|&b| b == b'\n').next().unwrap_or(&[]);
    let count = |d: u8| first_line.iter().filter(|&&b| b == d).count();
    [b';', b'\t']
        .into_iter()
        .map(|d| (d, count(d)))
        .filter(|&(_, n)| n > count(b','))
        .max_by_key(|&(_, n)| n)
        .map(|(d, _)| d)
        .unwrap_or(b',')
}

fn guess_cell_type(s: &str) -> CellValue {
    if MISSING_TOKENS.contains(&s.trim()) {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Spreadsheet
// ---------------------------------------------------------------------------

/// The first row of `sheet` is the header; every following row is a record.
fn parse_spreadsheet(bytes: &[u8], sheet: &str) -> Result<Dataset> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| DashboardError::Parse(format!("opening workbook: {e}")))?;
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| DashboardError::Parse(format!("reading sheet '{sheet}': {e}")))?;

    let mut sheet_rows = range.rows();
    let Some(header) = sheet_rows.next() else {
        return Dataset::new(Vec::new(), Vec::new());
    };
    let columns: Vec<String> = header.iter().map(|c| c.to_string()).collect();
    let rows = sheet_rows
        .map(|row| row.iter().map(spreadsheet_cell).collect())
        .collect();

    Dataset::new(columns, rows)
}

fn spreadsheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) if MISSING_TOKENS.contains(&s.trim()) => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::DateTime(_) | Data::DateTimeIso(_) | Data::DurationIso(_) => {
            CellValue::Date(cell.to_string())
        }
        // `#N/A`, `#DIV/0!` and friends
        Data::Error(_) | Data::Empty => CellValue::Null,
    }
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Flat Parquet columns map one-to-one to dataset columns. Works with files
/// written by both **Pandas** (`df.to_parquet()`) and **Polars**.
fn parse_parquet(raw: &[u8]) -> Result<Dataset> {
    let data = bytes::Bytes::copy_from_slice(raw);
    let builder = ParquetRecordBatchReaderBuilder::try_new(data)
        .map_err(|e| DashboardError::Parse(format!("reading parquet metadata: {e}")))?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder
        .build()
        .map_err(|e| DashboardError::Parse(format!("building parquet reader: {e}")))?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result
            .map_err(|e| DashboardError::Parse(format!("reading parquet record batch: {e}")))?;
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| extract_cell(col, row))
                    .collect(),
            );
        }
    }

    Dataset::new(columns, rows)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    let typed = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|a| guess_text_cell(a.value(row))),
        DataType::LargeUtf8 => any
            .downcast_ref::<LargeStringArray>()
            .map(|a| guess_text_cell(a.value(row))),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| CellValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| CellValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| CellValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| CellValue::Bool(a.value(row))),
        _ => None,
    };
    typed.unwrap_or_else(|| {
        array_value_to_string(col.as_ref(), row)
            .map(CellValue::String)
            .unwrap_or(CellValue::Null)
    })
}

fn guess_text_cell(s: &str) -> CellValue {
    if MISSING_TOKENS.contains(&s.trim()) {
        CellValue::Null
    } else {
        CellValue::String(s.to_string())
    }
}
