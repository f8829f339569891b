use serde_json::Value;

/// A single spreadsheet cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

/// One projected record, ordered like its resource's headers.
pub type DisplayRow = Vec<Cell>;

impl Cell {
    pub fn to_value(&self) -> Value {
        match self {
            Cell::Text(text) => Value::String(text.clone()),
            // Non-finite numbers become an empty cell
            Cell::Number(number) => Value::from(*number),
        }
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Cell::Text(text)
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::Text(text.to_string())
    }
}

impl From<f64> for Cell {
    fn from(number: f64) -> Self {
        Cell::Number(number)
    }
}

impl From<usize> for Cell {
    fn from(number: usize) -> Self {
        Cell::Number(number as f64)
    }
}
