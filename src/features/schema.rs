//! Feature schema shared by training and serving

use serde::{Deserialize, Serialize};

use super::table::{Record, Scalar};
use crate::error::{Result, ServeError};

/// Partition of columns into numeric, categorical and target groups.
///
/// `ignored` lists identifier columns that may appear in the data but never
/// reach the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    #[serde(default)]
    pub numeric: Vec<String>,

    #[serde(default)]
    pub categorical: Vec<String>,

    pub target: String,

    #[serde(default)]
    pub ignored: Vec<String>,
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::employee_performance()
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl FeatureSchema {
    /// Schema of the employee performance and productivity dataset
    pub fn employee_performance() -> Self {
        Self {
            numeric: owned(&[
                "Age",
                "Years_At_Company",
                "Performance_Score",
                "Work_Hours_Per_Week",
                "Projects_Handled",
                "Overtime_Hours",
                "Sick_Days",
                "Remote_Work_Frequency",
                "Team_Size",
                "Training_Hours",
                "Promotions",
            ]),
            categorical: owned(&["Department", "Gender", "Job_Title", "Education_Level"]),
            target: "Employee_Satisfaction_Score".to_string(),
            ignored: owned(&["Employee_ID", "Hire_Date_int"]),
        }
    }

    /// Check that the groups are disjoint and contain no duplicates
    pub fn validate(&self) -> Result<()> {
        let mut seen: Vec<&str> = Vec::new();
        let groups = [
            &self.numeric[..],
            &self.categorical[..],
            std::slice::from_ref(&self.target),
            &self.ignored[..],
        ];
        for name in groups.iter().flat_map(|g| g.iter()) {
            if seen.contains(&name.as_str()) {
                return Err(ServeError::invalid(format!(
                    "column '{}' appears more than once in the feature schema",
                    name
                )));
            }
            seen.push(name);
        }
        if self.target.is_empty() {
            return Err(ServeError::invalid("feature schema has an empty target"));
        }
        Ok(())
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        self.numeric.iter().any(|c| c == name)
    }

    pub fn is_categorical(&self, name: &str) -> bool {
        self.categorical.iter().any(|c| c == name)
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.iter().any(|c| c == name)
    }

    /// Columns the model consumes: numeric then categorical
    pub fn feature_columns(&self) -> impl Iterator<Item = &str> {
        self.numeric
            .iter()
            .chain(self.categorical.iter())
            .map(String::as_str)
    }

    /// Validate one inference record against the schema.
    ///
    /// Rejects the target column, fields the schema does not know, missing
    /// feature fields, and values of the wrong type for their group.
    pub fn check_record(&self, row: usize, record: &Record) -> Result<()> {
        for name in record.names() {
            if name == self.target {
                return Err(ServeError::invalid(format!(
                    "row {}: target column '{}' must not be sent for prediction",
                    row, name
                )));
            }
            if !self.is_numeric(name) && !self.is_categorical(name) && !self.is_ignored(name) {
                return Err(ServeError::invalid(format!(
                    "row {}: unknown field '{}'",
                    row, name
                )));
            }
        }

        for name in self.feature_columns() {
            let value = record.get(name).ok_or_else(|| {
                ServeError::invalid(format!("row {}: missing field '{}'", row, name))
            })?;
            let ok = if self.is_numeric(name) {
                value.as_f64().is_some()
            } else {
                !value.is_null()
            };
            if !ok {
                return Err(ServeError::invalid(format!(
                    "row {}: field '{}' has unexpected {} value",
                    row,
                    name,
                    value.type_name()
                )));
            }
        }
        Ok(())
    }
}

/// Build a record holding every schema feature, mostly for tests and examples
pub fn example_record(schema: &FeatureSchema, numeric: f64, level: &str) -> Record {
    let mut record = Record::new();
    for name in &schema.numeric {
        record.insert(name.clone(), Scalar::Number(numeric));
    }
    for name in &schema.categorical {
        record.insert(name.clone(), Scalar::Text(level.to_string()));
    }
    record
}
