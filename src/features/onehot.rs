//! Drop-first one-hot encoding with levels pinned at fit time

use serde::{Deserialize, Serialize};

use super::table::{Column, Scalar, Table};
use crate::error::{Result, ServeError};

/// Levels observed for one categorical column, sorted.
///
/// The first level is the canonical reference level and gets no indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryLevels {
    pub column: String,
    pub levels: Vec<String>,
}

impl CategoryLevels {
    pub fn canonical(&self) -> Option<&str> {
        self.levels.first().map(String::as_str)
    }

    /// Indicator column names, `<field>_<level>` for every non-canonical level
    pub fn indicator_names(&self) -> impl Iterator<Item = String> + '_ {
        self.levels
            .iter()
            .skip(1)
            .map(move |level| format!("{}_{}", self.column, level))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    pub columns: Vec<CategoryLevels>,
}

impl OneHotEncoder {
    /// Collect the sorted distinct levels of each named column
    pub fn fit<S: AsRef<str>>(table: &Table, columns: &[S]) -> Result<Self> {
        let columns = columns
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let mut levels = column_levels(table, name)?;
                levels.sort();
                levels.dedup();
                Ok(CategoryLevels {
                    column: name.to_string(),
                    levels,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { columns })
    }

    /// Check every column has sorted, distinct, non-empty levels
    pub fn validate(&self) -> Result<()> {
        for fitted in &self.columns {
            if fitted.levels.is_empty() {
                return Err(ServeError::invalid(format!(
                    "encoder column '{}' has no levels",
                    fitted.column
                )));
            }
            if fitted.levels.windows(2).any(|w| w[0] >= w[1]) {
                return Err(ServeError::invalid(format!(
                    "encoder column '{}' levels must be sorted and distinct",
                    fitted.column
                )));
            }
        }
        Ok(())
    }

    pub fn indicator_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|c| c.indicator_names())
            .collect()
    }

    /// Emit boolean indicator columns for every fitted categorical column.
    ///
    /// A level that was not seen during fitting is rejected: encoding it as
    /// all zeros would silently turn it into the canonical level.
    pub fn encode(&self, table: &Table) -> Result<Vec<Column>> {
        let mut out = Vec::new();
        for fitted in &self.columns {
            let observed = column_levels(table, &fitted.column)?;
            let mut positions = Vec::with_capacity(observed.len());
            for (row, level) in observed.iter().enumerate() {
                let pos = fitted.levels.iter().position(|l| l == level).ok_or_else(|| {
                    ServeError::invalid(format!(
                        "column '{}' row {} has level '{}' not seen during fitting",
                        fitted.column,
                        table.index()[row],
                        level
                    ))
                })?;
                positions.push(pos);
            }

            for (i, name) in fitted.indicator_names().enumerate() {
                let level_pos = i + 1;
                let values = positions
                    .iter()
                    .map(|p| Scalar::Bool(*p == level_pos))
                    .collect();
                out.push(Column::new(name, values));
            }
        }
        Ok(out)
    }
}

fn column_levels(table: &Table, name: &str) -> Result<Vec<String>> {
    let column = table
        .column(name)
        .ok_or_else(|| ServeError::invalid(format!("missing categorical column '{}'", name)))?;

    column
        .values
        .iter()
        .enumerate()
        .map(|(row, value)| {
            value.level().ok_or_else(|| {
                ServeError::invalid(format!(
                    "column '{}' row {} is null where a category is required",
                    name,
                    table.index()[row]
                ))
            })
        })
        .collect()
}
