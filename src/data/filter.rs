use super::model::Dataset;

// ---------------------------------------------------------------------------
// Row predicates
// ---------------------------------------------------------------------------

/// Return indices of rows that have a value in every one of `columns`.
///
/// A row fails when any of the given column positions holds a missing value
/// (null or NaN). Positions out of range are ignored.
pub fn complete_row_indices(dataset: &Dataset, columns: &[usize]) -> Vec<usize> {
    dataset
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            columns
                .iter()
                .filter_map(|&c| row.get(c))
                .all(|cell| !cell.is_missing())
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;

    #[test]
    fn only_checked_columns_matter() {
        let ds = Dataset::new(
            vec!["a".into(), "b".into()],
            vec![
                vec![CellValue::Integer(1), CellValue::Null],
                vec![CellValue::Null, CellValue::Integer(2)],
                vec![CellValue::Float(f64::NAN), CellValue::Integer(3)],
            ],
        )
        .unwrap();
        assert_eq!(complete_row_indices(&ds, &[0]), vec![0]);
        assert_eq!(complete_row_indices(&ds, &[1]), vec![1, 2]);
        assert!(complete_row_indices(&ds, &[0, 1]).is_empty());
        assert_eq!(complete_row_indices(&ds, &[]), vec![0, 1, 2]);
    }
}
