use std::sync::Arc;

/// One data row of the source file, addressed by header label.
///
/// Rows keep the file's column order. A row shorter than the header simply has no
/// value for the trailing columns, which is how an absent field is represented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    index: usize,
    headers: Arc<[String]>,
    values: Vec<String>,
}

impl RawRow {
    /// Creates a row from shared header labels and this row's values.
    ///
    /// `index` is the 1-based position of the row among the data rows.
    pub fn new(index: usize, headers: Arc<[String]>, values: Vec<String>) -> Self {
        Self {
            index,
            headers,
            values,
        }
    }

    /// Builds a standalone row from `(column, value)` pairs.
    pub fn from_pairs<C, V>(index: usize, pairs: impl IntoIterator<Item = (C, V)>) -> Self
    where
        C: Into<String>,
        V: Into<String>,
    {
        let (headers, values): (Vec<String>, Vec<String>) = pairs
            .into_iter()
            .map(|(column, value)| (column.into(), value.into()))
            .unzip();

        Self::new(index, headers.into(), values)
    }

    /// 1-based index of this row among the data rows of the file.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the raw value of `column`, or `None` when the row has no such field.
    pub fn get(&self, column: &str) -> Option<&str> {
        let position = self.headers.iter().position(|header| header == column)?;
        self.values.get(position).map(String::as_str)
    }

    /// Iterates over the `(column, value)` pairs present in this row, in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .zip(self.values.iter())
            .map(|(header, value)| (header.as_str(), value.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_rows_have_no_trailing_fields() {
        let headers: Arc<[String]> = vec!["Cód".to_string(), "Razão social".to_string()].into();
        let row = RawRow::new(1, headers, vec!["10".to_string()]);

        assert_eq!(row.get("Cód"), Some("10"));
        assert_eq!(row.get("Razão social"), None);
        assert_eq!(row.iter().count(), 1);
    }

    #[test]
    fn lookup_is_exact() {
        let row = RawRow::from_pairs(3, [("Cód", "10")]);

        assert_eq!(row.get("Cod"), None);
        assert_eq!(row.get("cód"), None);
        assert_eq!(row.index(), 3);
    }
}
