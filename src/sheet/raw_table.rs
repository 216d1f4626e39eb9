/// One parsed CSV export. The first row is the header row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTable {
    /// Each row as a Vec of Strings (one per field), in file order.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names, as the sheet claims them (untrimmed).
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Everything below the header row.
    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// First data row with at least one non-blank field.
    /// Falls back to the first data row when every row is blank.
    pub fn first_populated_row(&self) -> Option<&[String]> {
        let data = self.data_rows();
        data.iter()
            .find(|row| row.iter().any(|v| !v.trim().is_empty()))
            .or_else(|| data.first())
            .map(Vec::as_slice)
    }
}
