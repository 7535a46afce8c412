use std::fmt;

use calamine::Data;
use serde::{Deserialize, Serialize};

/// Largest magnitude at which every integer is exactly representable as `f64`.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A single decoded cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Empty,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    fn number(n: f64) -> Self {
        if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
            Cell::Int(n as i64)
        } else {
            Cell::Float(n)
        }
    }
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => Cell::Empty,
            Data::Bool(b) => Cell::Bool(*b),
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) => Cell::number(*f),
            Data::String(s) => Cell::Text(s.clone()),
            // Dates surface as their serial number, the way the workbook stores them.
            Data::DateTime(dt) => Cell::number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Text(e.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Float(n) => write!(f, "{n}"),
            Cell::Text(s) => f.write_str(s),
            Cell::Empty => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_floats_become_ints() {
        assert_eq!(Cell::from(&Data::Float(100.0)), Cell::Int(100));
        assert_eq!(Cell::from(&Data::Float(2.5)), Cell::Float(2.5));
        assert_eq!(Cell::from(&Data::Float(1e300)), Cell::Float(1e300));
    }

    #[test]
    fn serializes_as_plain_json_values() {
        let cells = vec![
            Cell::Text("Jan".into()),
            Cell::Int(100),
            Cell::Float(1.5),
            Cell::Bool(true),
            Cell::Empty,
        ];
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, r#"["Jan",100,1.5,true,null]"#);

        let back: Vec<Cell> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cells);
    }

    #[test]
    fn display_matches_header_text() {
        assert_eq!(Cell::Int(2024).to_string(), "2024");
        assert_eq!(Cell::Text("Sales".into()).to_string(), "Sales");
        assert_eq!(Cell::Empty.to_string(), "");
    }
}
