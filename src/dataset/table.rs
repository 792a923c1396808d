/// Numeric table with named columns, stored row-major.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    /// Build a table, checking that every row has one value per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, String> {
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(format!(
                "Row {idx} has {} values but the table has {} columns",
                row.len(),
                columns.len()
            ));
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, idx: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[idx]).collect()
    }

    /// Keep only the columns at `indices`, in that order.
    pub fn select_columns(&self, indices: &[usize]) -> Self {
        Self {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i]).collect())
                .collect(),
        }
    }

    /// Copy the rows at `indices`, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Count rows per distinct value of a column, ascending by value.
    pub fn value_counts(&self, idx: usize) -> Vec<(f64, usize)> {
        let mut values = self.column(idx);
        values.sort_by(|a, b| a.total_cmp(b));
        let mut counts: Vec<(f64, usize)> = Vec::new();
        for v in values {
            match counts.last_mut() {
                Some((last, count)) if *last == v => *count += 1,
                _ => counts.push((v, 1)),
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> FeatureTable {
        FeatureTable::new(
            vec!["a".into(), "b".into(), "label".into()],
            vec![
                vec![1.0, 2.0, 0.0],
                vec![3.0, 4.0, 1.0],
                vec![5.0, 6.0, 1.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = FeatureTable::new(vec!["a".into()], vec![vec![1.0, 2.0]]).unwrap_err();
        assert!(err.contains("Row 0"));
    }

    #[test]
    fn selects_columns_and_rows() {
        let t = table();
        let picked = t.select_columns(&[2, 0]).select_rows(&[2, 0]);
        assert_eq!(picked.columns(), &["label".to_string(), "a".to_string()]);
        assert_eq!(picked.rows(), &[vec![1.0, 5.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn counts_label_values() {
        let t = table();
        let idx = t.column_index("label").unwrap();
        assert_eq!(t.value_counts(idx), vec![(0.0, 1), (1.0, 2)]);
    }
}
