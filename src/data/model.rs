use std::fmt;

use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a loaded table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the dtypes a spreadsheet or CSV
/// export ends up with.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Spreadsheet date/time kept as text.
    Date(String),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Missing values: explicit nulls and NaN floats.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// An ordered, rectangular table. Every row holds exactly one value per
/// column, in `columns` order.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// Build a dataset, rejecting rows whose width differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(DashboardError::Parse(format!(
                "row {i} has {} values but the header has {} columns",
                row.len(),
                columns.len()
            )));
        }
        Ok(Dataset { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// A copy of the first `n` rows.
    pub fn head(&self, n: usize) -> Dataset {
        Dataset {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Dataset::new(cols(&["a", "b"]), vec![vec![CellValue::Integer(1)]]).unwrap_err();
        assert!(matches!(err, DashboardError::Parse(_)));
    }

    #[test]
    fn columns_are_looked_up_by_name() {
        let ds = Dataset::new(
            cols(&["a", "b"]),
            vec![
                vec![CellValue::Integer(1), CellValue::String("x".into())],
                vec![CellValue::Integer(2), CellValue::Null],
            ],
        )
        .unwrap();
        assert_eq!(ds.column_index("b"), Some(1));
        assert!(!ds.has_column("missing"));
        assert_eq!(ds.head(1).rows(), &ds.rows()[..1]);
        assert!(ds.head(0).is_empty());
    }

    #[test]
    fn nan_counts_as_missing() {
        assert!(CellValue::Float(f64::NAN).is_missing());
        assert!(CellValue::Null.is_missing());
        assert!(!CellValue::Float(0.0).is_missing());
        assert!(!CellValue::String(String::new()).is_missing());
    }

    #[test]
    fn numeric_strings_convert() {
        assert_eq!(CellValue::String(" 12.5 ".into()).as_f64(), Some(12.5));
        assert_eq!(CellValue::String("SAINTEK".into()).as_f64(), None);
        assert_eq!(CellValue::Bool(true).as_f64(), None);
    }
}
