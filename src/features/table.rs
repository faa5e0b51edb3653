//! Row-ordered, column-oriented tables built from record batches

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ServeError};

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    /// Convert a JSON value, refusing nested arrays and objects
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Scalar::Null),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => n.as_f64().map(Scalar::Number),
            Value::String(s) => Some(Scalar::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Parse a raw CSV field: empty is null, then number, then boolean, then text.
    /// `NaN` and infinities read as null, as they would from a JSON body.
    pub fn parse_field(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Scalar::Null;
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            return if n.is_finite() {
                Scalar::Number(n)
            } else {
                Scalar::Null
            };
        }
        match trimmed {
            "True" | "true" => Scalar::Bool(true),
            "False" | "false" => Scalar::Bool(false),
            _ => Scalar::Text(trimmed.to_string()),
        }
    }

    /// Numeric view; booleans count as 0/1
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Scalar::Null | Scalar::Text(_) => None,
        }
    }

    /// Categorical level for this value; `None` for null
    pub fn level(&self) -> Option<String> {
        match self {
            Scalar::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "boolean",
            Scalar::Number(_) => "number",
            Scalar::Text(_) => "string",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// One input row: feature name to scalar, in the order the fields arrived
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Scalar)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing an earlier value with the same name
    pub fn insert(&mut self, name: impl Into<String>, value: Scalar) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: Scalar) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Parse a JSON body into a record batch.
///
/// The body must be an array whose elements are flat objects (scalar values
/// only). Anything else is rejected with the offending row index.
pub fn records_from_json(body: &Value) -> Result<Vec<Record>> {
    let rows = body.as_array().ok_or_else(|| {
        ServeError::invalid(format!(
            "expected a JSON array of objects, got {}",
            json_type_name(body)
        ))
    })?;

    rows.iter()
        .enumerate()
        .map(|(row, value)| {
            let object = value.as_object().ok_or_else(|| {
                ServeError::invalid(format!(
                    "row {} must be an object, got {}",
                    row,
                    json_type_name(value)
                ))
            })?;
            let mut record = Record::new();
            for (name, field) in object {
                let scalar = Scalar::from_json(field).ok_or_else(|| {
                    ServeError::invalid(format!(
                        "row {} field '{}' must be a scalar, got {}",
                        row,
                        name,
                        json_type_name(field)
                    ))
                })?;
                record.insert(name.clone(), scalar);
            }
            Ok(record)
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A named column of cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn numeric(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(name, values.into_iter().map(Scalar::Number).collect())
    }
}

/// Column-oriented table with a row index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    index: Vec<usize>,
    columns: Vec<Column>,
}

impl Table {
    /// Build a table, checking every column has one cell per index entry
    pub fn new(index: Vec<usize>, columns: Vec<Column>) -> Result<Self> {
        if let Some(bad) = columns.iter().find(|c| c.values.len() != index.len()) {
            return Err(ServeError::invalid(format!(
                "column '{}' has {} values but the table has {} rows",
                bad.name,
                bad.values.len(),
                index.len()
            )));
        }
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(ServeError::invalid(format!(
                    "duplicate column '{}'",
                    column.name
                )));
            }
        }
        Ok(Self { index, columns })
    }

    /// Build a table from a record batch.
    ///
    /// Columns follow first-seen field order across the batch; a field
    /// absent from a row becomes null in that row.
    pub fn from_records(records: &[Record]) -> Self {
        let mut names: Vec<&str> = Vec::new();
        for record in records {
            for name in record.names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        let columns = names
            .iter()
            .map(|name| {
                let values = records
                    .iter()
                    .map(|r| r.get(name).cloned().unwrap_or(Scalar::Null))
                    .collect();
                Column::new(*name, values)
            })
            .collect();

        Self {
            index: (0..records.len()).collect(),
            columns,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.index.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn index(&self) -> &[usize] {
        &self.index
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Cell lookup by column name and row position
    pub fn value(&self, name: &str, row: usize) -> Option<&Scalar> {
        self.column(name).and_then(|c| c.values.get(row))
    }

    /// Replace a column's values in place, or append it if absent
    pub fn set_column(&mut self, column: Column) -> Result<()> {
        if column.values.len() != self.num_rows() {
            return Err(ServeError::invalid(format!(
                "column '{}' has {} values but the table has {} rows",
                column.name,
                column.values.len(),
                self.num_rows()
            )));
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(slot) => *slot = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Remove the named columns; names not present are ignored
    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) {
        self.columns
            .retain(|c| !names.iter().any(|n| n.as_ref() == c.name));
    }

    /// Renumber rows `0..N-1`
    pub fn reset_index(&mut self) {
        self.index = (0..self.num_rows()).collect();
    }

    pub(crate) fn with_columns(&self, columns: Vec<Column>) -> Result<Self> {
        Self::new(self.index.clone(), columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_records_preserves_order_and_fills_nulls() {
        let records = vec![
            Record::new()
                .with("Age", Scalar::Number(30.0))
                .with("Department", Scalar::Text("IT".into())),
            Record::new()
                .with("Department", Scalar::Text("HR".into()))
                .with("Remote", Scalar::Bool(true)),
        ];
        let table = Table::from_records(&records);

        assert_eq!(table.column_names(), vec!["Age", "Department", "Remote"]);
        assert_eq!(table.index(), &[0, 1]);
        assert_eq!(table.value("Age", 1), Some(&Scalar::Null));
        assert_eq!(table.value("Remote", 0), Some(&Scalar::Null));
        assert_eq!(table.value("Remote", 1), Some(&Scalar::Bool(true)));
    }

    #[test]
    fn test_records_from_json_rejects_non_array() {
        let err = records_from_json(&json!({"Age": 3})).unwrap_err();
        assert!(err.to_string().contains("expected a JSON array"));
    }

    #[test]
    fn test_records_from_json_rejects_non_object_rows() {
        let err = records_from_json(&json!([{"Age": 3}, 7])).unwrap_err();
        assert!(err.to_string().contains("row 1 must be an object"));
    }

    #[test]
    fn test_records_from_json_rejects_nested_values() {
        let err = records_from_json(&json!([{"Age": [1, 2]}])).unwrap_err();
        assert!(err.to_string().contains("field 'Age' must be a scalar"));
    }

    #[test]
    fn test_records_from_json_reads_scalars() {
        let records =
            records_from_json(&json!([{"Age": 41, "Gender": "Female", "Flag": false, "X": null}]))
                .unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.get("Age"), Some(&Scalar::Number(41.0)));
        assert_eq!(r.get("Gender"), Some(&Scalar::Text("Female".into())));
        assert_eq!(r.get("Flag"), Some(&Scalar::Bool(false)));
        assert_eq!(r.get("X"), Some(&Scalar::Null));
    }

    #[test]
    fn test_parse_field() {
        assert_eq!(Scalar::parse_field(""), Scalar::Null);
        assert_eq!(Scalar::parse_field("4.5"), Scalar::Number(4.5));
        assert_eq!(Scalar::parse_field("True"), Scalar::Bool(true));
        assert_eq!(Scalar::parse_field("Sales"), Scalar::Text("Sales".into()));
    }

    #[test]
    fn test_level_formatting() {
        assert_eq!(Scalar::Number(3.0).level().as_deref(), Some("3"));
        assert_eq!(Scalar::Bool(true).level().as_deref(), Some("true"));
        assert_eq!(Scalar::Null.level(), None);
    }

    #[test]
    fn test_new_rejects_ragged_columns() {
        let err = Table::new(vec![0, 1], vec![Column::numeric("a", [1.0])]).unwrap_err();
        assert!(err.to_string().contains("has 1 values"));
    }

    #[test]
    fn test_drop_and_reset() {
        let mut table = Table::new(
            vec![4, 9],
            vec![Column::numeric("a", [1.0, 2.0]), Column::numeric("b", [3.0, 4.0])],
        )
        .unwrap();
        table.drop_columns(&["a", "missing"]);
        table.reset_index();
        assert_eq!(table.column_names(), vec!["b"]);
        assert_eq!(table.index(), &[0, 1]);
    }
}
