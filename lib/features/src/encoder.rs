//! Feature encoder
//!
//! Turns a [`FeatureTable`] into an [`EncodedMatrix`]. Each row is laid out as
//!
//! ```text
//! [ z-scored numeric columns | region one-hot | raw category counts ]
//! ```
//!
//! Statistics, region values and the category column set are learned once by
//! [`FeatureEncoder::fit_transform`] and frozen in an [`EncoderState`]; every
//! later [`FeatureEncoder::transform`] reuses that exact column layout.

use crate::table::{CustomerFeatureVector, FeatureTable, NUMERIC_COLUMNS};
use lookalike_core::{EncodedMatrix, Error, Result, SchemaError, Vector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Population mean and standard deviation of one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub name: String,
    pub mean: f64,
    /// Population standard deviation (divides by n)
    pub std: f64,
}

impl ColumnStats {
    fn fit(name: &str, values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        Self {
            name: name.to_string(),
            mean,
            std: variance.sqrt(),
        }
    }

    /// Divisor used for standardization; a constant column scales by 1
    #[inline]
    pub fn scale(&self) -> f64 {
        if self.std == 0.0 {
            1.0
        } else {
            self.std
        }
    }

    #[inline]
    pub fn standardize(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale()
    }
}

/// Everything learned during fit, enough to encode any later table identically
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderState {
    numeric: Vec<ColumnStats>,
    /// Region indicator columns, lexicographic
    regions: Vec<String>,
    /// Category count columns, frozen at fit time
    categories: Vec<String>,
}

impl EncoderState {
    pub fn numeric(&self) -> &[ColumnStats] {
        &self.numeric
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Width of every encoded row
    pub fn dim(&self) -> usize {
        self.numeric.len() + self.regions.len() + self.categories.len()
    }

    /// Column names in encoded order
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.dim());
        names.extend(self.numeric.iter().map(|s| s.name.clone()));
        names.extend(self.regions.iter().map(|r| format!("region={}", r)));
        names.extend(self.categories.iter().map(|c| format!("category_{}", c)));
        names
    }

    /// Encode a single profile whose counts follow `table_categories`
    pub fn encode(&self, row: &CustomerFeatureVector, table_categories: &[String]) -> Result<Vector> {
        let mapping = self.category_mapping(table_categories);
        self.encode_mapped(row, &mapping)
    }

    /// For each frozen category, where to find its count in the incoming table
    fn category_mapping(&self, table_categories: &[String]) -> Vec<Option<usize>> {
        self.categories
            .iter()
            .map(|c| table_categories.iter().position(|t| t == c))
            .collect()
    }

    fn encode_mapped(&self, row: &CustomerFeatureVector, mapping: &[Option<usize>]) -> Result<Vector> {
        let mut components = Vec::with_capacity(self.dim());

        for stats in &self.numeric {
            let value = row
                .numeric(&stats.name)
                .ok_or_else(|| SchemaError::MissingColumn(stats.name.clone()))?;
            components.push(stats.standardize(value));
        }

        // Unseen regions leave every indicator at zero
        components.extend(
            self.regions
                .iter()
                .map(|r| if *r == row.region { 1.0 } else { 0.0 }),
        );

        for source in mapping {
            let count = match source {
                Some(i) => *row.category_counts.get(*i).ok_or(SchemaError::WidthMismatch {
                    expected: mapping.len(),
                    actual: row.category_counts.len(),
                })?,
                None => 0,
            };
            components.push(count as f64);
        }

        Ok(Vector::new(components))
    }
}

/// Fits and applies the numeric / categorical encoding
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    numeric_columns: Vec<String>,
}

impl Default for FeatureEncoder {
    fn default() -> Self {
        Self {
            numeric_columns: NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl FeatureEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standardize only the named numeric columns, in the given order
    pub fn with_numeric_columns<S: AsRef<str>>(columns: &[S]) -> Result<Self> {
        let mut seen = BTreeSet::new();
        let mut numeric_columns = Vec::with_capacity(columns.len());
        for column in columns {
            let column = column.as_ref();
            if !NUMERIC_COLUMNS.contains(&column) {
                return Err(SchemaError::MissingColumn(column.to_string()).into());
            }
            if !seen.insert(column) {
                return Err(Error::InvalidArgument(format!(
                    "numeric column '{}' listed twice",
                    column
                )));
            }
            numeric_columns.push(column.to_string());
        }
        Ok(Self { numeric_columns })
    }

    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    /// Learn column statistics, region values and category columns
    pub fn fit(&self, table: &FeatureTable) -> Result<EncoderState> {
        if table.is_empty() {
            return Err(Error::EmptyInput("no customer profiles to fit".to_string()));
        }

        let mut numeric = Vec::with_capacity(self.numeric_columns.len());
        for column in &self.numeric_columns {
            let values = table
                .rows()
                .iter()
                .map(|row| row.numeric(column))
                .collect::<Option<Vec<f64>>>()
                .ok_or_else(|| SchemaError::MissingColumn(column.clone()))?;
            numeric.push(ColumnStats::fit(column, &values));
        }

        let regions: BTreeSet<&str> = table.rows().iter().map(|r| r.region.as_str()).collect();

        let state = EncoderState {
            numeric,
            regions: regions.into_iter().map(str::to_string).collect(),
            categories: table.categories().to_vec(),
        };

        tracing::info!(
            rows = table.len(),
            numeric = state.numeric.len(),
            regions = state.regions.len(),
            categories = state.categories.len(),
            dim = state.dim(),
            "fitted feature encoder"
        );

        Ok(state)
    }

    pub fn fit_transform(&self, table: &FeatureTable) -> Result<(EncodedMatrix, EncoderState)> {
        let state = self.fit(table)?;
        let matrix = Self::transform(table, &state)?;
        Ok((matrix, state))
    }

    /// Encode a table with a previously fitted state.
    ///
    /// Rows keep table order. Categories the state never saw are ignored and
    /// frozen categories absent from the table encode as zero counts.
    pub fn transform(table: &FeatureTable, state: &EncoderState) -> Result<EncodedMatrix> {
        let mapping = state.category_mapping(table.categories());
        let rows = table
            .rows()
            .iter()
            .map(|row| state.encode_mapped(row, &mapping))
            .collect::<Result<Vec<_>>>()?;
        EncodedMatrix::new(rows)
    }
}
