use serde::{Deserialize, Serialize};

/// Untyped upload: a header row plus string cells.
///
/// Every parser produces this shape; the schema validator turns it into a
/// typed [`crate::models::Dataset`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Cell at (`row`, `col`); short rows read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Header index for the first name matching `pred`.
    pub fn find_header(&self, mut pred: impl FnMut(&str) -> bool) -> Option<usize> {
        self.headers.iter().position(|h| pred(h))
    }
}
