//! Column scalers fitted on the training partition

use crate::dataset::ColumnKind;
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Type of scaler to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalerType {
    /// z-score: (x - mean) / population std
    Standard,
    /// (x - min) / (max - min), fitted range maps to [0, 1]
    MinMax,
}

impl ScalerType {
    fn operation(self) -> &'static str {
        match self {
            ScalerType::Standard => "Standardization",
            ScalerType::MinMax => "Normalization",
        }
    }
}

/// Parameters for a fitted column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    /// mean or min
    pub center: f64,
    /// std or range, never zero
    pub scale: f64,
}

/// Feature scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: HashMap<String, ScalerParams>,
}

impl Scaler {
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: HashMap::new(),
        }
    }

    /// Learn per-column parameters from `df`
    pub fn fit<S: AsRef<str>>(&mut self, df: &DataFrame, columns: &[S]) -> Result<&mut Self> {
        for col_name in columns {
            let col_name = col_name.as_ref();
            let series = self.numeric_series(df, col_name)?;
            let params = self.compute_params(&series);
            self.params.insert(col_name.to_string(), params);
        }
        Ok(self)
    }

    /// Apply the fitted parameters, replacing each scaled column in place
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        for (col_name, params) in &self.params {
            let series = self.numeric_series(df, col_name)?;
            let scaled = scale_series(&series, params)?;
            result.with_column(scaled)?;
        }
        Ok(result)
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, df: &DataFrame, columns: &[S]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    pub fn params(&self, column: &str) -> Option<ScalerParams> {
        self.params.get(column).copied()
    }

    fn numeric_series(&self, df: &DataFrame, col_name: &str) -> Result<Series> {
        let error = |reason: String| PipelineError::Scaling {
            operation: self.scaler_type.operation().to_string(),
            column: col_name.to_string(),
            reason,
        };

        let column = df
            .column(col_name)
            .map_err(|_| error("column not found".to_string()))?;
        if !ColumnKind::of(column.dtype()).is_numeric() {
            return Err(error(format!("column is not numeric ({})", column.dtype())));
        }
        column
            .as_materialized_series()
            .cast(&DataType::Float64)
            .map_err(|e| error(e.to_string()))
    }

    fn compute_params(&self, series: &Series) -> ScalerParams {
        let values: Vec<f64> = series
            .f64()
            .map(|ca| ca.into_no_null_iter().collect())
            .unwrap_or_default();

        match self.scaler_type {
            ScalerType::Standard => {
                let n = values.len().max(1) as f64;
                let mean = values.iter().sum::<f64>() / n;
                let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                ScalerParams {
                    center: mean,
                    scale: if std == 0.0 { 1.0 } else { std },
                }
            }
            ScalerType::MinMax => {
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                if !min.is_finite() || !max.is_finite() {
                    return ScalerParams { center: 0.0, scale: 1.0 };
                }
                let range = max - min;
                ScalerParams {
                    center: min,
                    scale: if range == 0.0 { 1.0 } else { range },
                }
            }
        }
    }
}

fn scale_series(series: &Series, params: &ScalerParams) -> Result<Series> {
    let scaled: Float64Chunked = series
        .f64()?
        .into_iter()
        .map(|opt| opt.map(|v| (v - params.center) / params.scale))
        .collect();

    Ok(scaled.with_name(series.name().clone()).into_series())
}
