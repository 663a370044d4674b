use super::filter::complete_row_indices;
use super::model::Dataset;
use crate::error::{DashboardError, Result};

/// Feature columns the prediction pipeline is fitted on, in order.
pub const REQUIRED_COLUMNS: [&str; 13] = [
    "TO 1",
    "TO 2",
    "TO 3",
    "TO 4",
    "TO 5",
    "TO 6",
    "TO 7",
    "RATA- RATA TO 4 S.D 7",
    "ESTIMASI RATA-RATA",
    "Rata-rata",
    "Ranking",
    "RUMPUN",
    "JURUSAN/PRODI",
];

// ---------------------------------------------------------------------------
// FeatureSchema
// ---------------------------------------------------------------------------

/// A fixed, ordered set of column names a dataset must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: &'static [&'static str],
}

impl FeatureSchema {
    pub const fn new(columns: &'static [&'static str]) -> Self {
        FeatureSchema { columns }
    }

    /// The UTBK tryout feature set.
    pub const fn utbk() -> Self {
        FeatureSchema::new(&REQUIRED_COLUMNS)
    }

    pub fn columns(&self) -> &'static [&'static str] {
        self.columns
    }

    /// Schema columns absent from `dataset`, in schema order.
    pub fn missing_from(&self, dataset: &Dataset) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| !dataset.has_column(c))
            .map(|c| c.to_string())
            .collect()
    }

    /// Check `dataset` against the schema and return it projected to exactly
    /// the schema columns, dropping rows with a missing value in any of them.
    ///
    /// Every absent column is reported at once. An empty result is not an
    /// error.
    pub fn validate(&self, dataset: &Dataset) -> Result<Dataset> {
        let missing = self.missing_from(dataset);
        if !missing.is_empty() {
            return Err(DashboardError::MissingColumns(missing));
        }

        let positions: Vec<usize> = self
            .columns
            .iter()
            .filter_map(|c| dataset.column_index(c))
            .collect();
        let keep = complete_row_indices(dataset, &positions);
        let dropped = dataset.len() - keep.len();
        if dropped > 0 {
            log::info!("Dropped {dropped} incomplete rows out of {}", dataset.len());
        }

        let rows = keep
            .into_iter()
            .map(|i| {
                let row = &dataset.rows()[i];
                positions.iter().map(|&p| row[p].clone()).collect()
            })
            .collect();

        let features = Dataset::new(self.columns.iter().map(|c| c.to_string()).collect(), rows)?;
        if features.is_empty() {
            log::warn!("No complete rows left after validation");
        }
        Ok(features)
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::utbk()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;
    use crate::fixtures;

    #[test]
    fn reports_every_missing_column() {
        let ds = fixtures::utbk_dataset_without(3, &["Ranking", "RUMPUN"]);
        let err = FeatureSchema::utbk().validate(&ds).unwrap_err();
        match err {
            DashboardError::MissingColumns(cols) => assert_eq!(cols, ["Ranking", "RUMPUN"]),
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn empty_table_misses_all_thirteen() {
        let ds = Dataset::new(Vec::new(), Vec::new()).unwrap();
        assert_eq!(FeatureSchema::utbk().missing_from(&ds).len(), 13);
    }

    #[test]
    fn projects_to_schema_order_and_drops_extra_columns() {
        let ds = fixtures::utbk_dataset(4);
        let mut columns: Vec<String> = ds.columns().to_vec();
        columns.reverse();
        columns.push("NAMA".into());
        let rows = ds
            .rows()
            .iter()
            .map(|r| {
                let mut r = r.clone();
                r.reverse();
                r.push(CellValue::String("peserta".into()));
                r
            })
            .collect();
        let shuffled = Dataset::new(columns, rows).unwrap();

        let valid = FeatureSchema::utbk().validate(&shuffled).unwrap();
        assert_eq!(valid.columns(), REQUIRED_COLUMNS);
        assert_eq!(valid, ds);
    }

    #[test]
    fn drops_exactly_the_incomplete_rows() {
        let ds = fixtures::utbk_dataset(5);
        let mut rows = ds.rows().to_vec();
        rows[1][0] = CellValue::Null;
        rows[3][12] = CellValue::Null;
        rows[4][9] = CellValue::Float(f64::NAN);
        let ds = Dataset::new(ds.columns().to_vec(), rows).unwrap();

        let valid = FeatureSchema::utbk().validate(&ds).unwrap();
        assert_eq!(valid.len(), 2);
        assert_eq!(valid.rows()[0], ds.rows()[0]);
        assert_eq!(valid.rows()[1], ds.rows()[2]);
    }

    #[test]
    fn nulls_outside_the_schema_are_kept() {
        let ds = fixtures::utbk_dataset(2);
        let mut columns = ds.columns().to_vec();
        columns.push("KETERANGAN".into());
        let rows = ds
            .rows()
            .iter()
            .map(|r| {
                let mut r = r.clone();
                r.push(CellValue::Null);
                r
            })
            .collect();
        let ds = Dataset::new(columns, rows).unwrap();
        assert_eq!(FeatureSchema::utbk().validate(&ds).unwrap().len(), 2);
    }

    #[test]
    fn all_rows_incomplete_is_not_an_error() {
        let ds = fixtures::utbk_dataset(3);
        let rows = ds
            .rows()
            .iter()
            .map(|r| {
                let mut r = r.clone();
                r[10] = CellValue::Null;
                r
            })
            .collect();
        let ds = Dataset::new(ds.columns().to_vec(), rows).unwrap();
        let valid = FeatureSchema::utbk().validate(&ds).unwrap();
        assert!(valid.is_empty());
        assert_eq!(valid.columns().len(), 13);
    }
}
