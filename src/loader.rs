//! Data Loader
//!
//! Reads the prediction and driver CSV files with polars and keeps every
//! parsed frame for the lifetime of the process, keyed by resolved path.
//! A missing file is cached too, as `None`.

use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use lazy_static::lazy_static;
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

pub const COUNTRY_COLUMN: &str = "country";
pub const PREDICTED_COLUMN: &str = "predicted_stunting_2026";
pub const ACTUAL_COLUMN: &str = "stunting_2023_actual";

lazy_static! {
    static ref TABLE_CACHE: RwLock<HashMap<PathBuf, Option<Arc<DataFrame>>>> =
        RwLock::new(HashMap::new());
}

/// Load a CSV file, or `None` when it does not exist.
///
/// The first call for a path reads disk; every later call returns the cached
/// result, including a cached absence.
pub fn load(path: &Path) -> Result<Option<Arc<DataFrame>>> {
    if let Some(hit) = TABLE_CACHE.read().ok().and_then(|cache| cache.get(path).cloned()) {
        debug!("Dataset cache hit: {}", path.display());
        return Ok(hit);
    }

    let table = if path.exists() {
        info!("Loading CSV: {}", path.display());
        let df = read_csv(path)?;
        info!("Loaded {} rows, {} columns from {}", df.height(), df.width(), path.display());
        Some(Arc::new(df))
    } else {
        warn!("Dataset not found: {}", path.display());
        None
    };

    match TABLE_CACHE.write() {
        Ok(mut cache) => Ok(cache.entry(path.to_path_buf()).or_insert(table).clone()),
        Err(_) => Ok(table),
    }
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .finish()?
        .collect()?;
    Ok(df)
}

/// One row of the predictions file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub country: String,
    pub predicted_stunting_2026: f64,
    pub stunting_2023_actual: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PredictionTable {
    records: Vec<PredictionRecord>,
}

impl PredictionTable {
    pub fn new(records: Vec<PredictionRecord>) -> Self {
        Self { records }
    }

    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let countries = string_column(df, COUNTRY_COLUMN)?;
        let predicted = float_column(require_column(df, PREDICTED_COLUMN)?)?;
        let actual = match df.column(ACTUAL_COLUMN) {
            Ok(series) => float_column(series)?,
            Err(_) => vec![None; df.height()],
        };

        let mut records = Vec::with_capacity(df.height());
        for (row, country) in countries.into_iter().enumerate() {
            let Some(country) = country else {
                warn!("Skipping predictions row {} without a country", row);
                continue;
            };
            let Some(value) = predicted[row] else {
                warn!("Skipping {}: no {} value", country, PREDICTED_COLUMN);
                continue;
            };
            records.push(PredictionRecord {
                country,
                predicted_stunting_2026: value,
                stunting_2023_actual: actual[row],
            });
        }
        Ok(Self { records })
    }

    /// First row for `country`, if any.
    pub fn get(&self, country: &str) -> Option<&PredictionRecord> {
        self.records.iter().find(|r| r.country == country)
    }

    pub fn records(&self) -> &[PredictionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Attribution scores for one country, in file column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverRecord {
    pub country: String,
    pub scores: Vec<(String, f64)>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DriverTable {
    features: Vec<String>,
    rows: Vec<(String, Vec<Option<f64>>)>,
}

impl DriverTable {
    pub fn new(features: Vec<String>, rows: Vec<(String, Vec<Option<f64>>)>) -> Self {
        Self { features, rows }
    }

    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let countries = string_column(df, COUNTRY_COLUMN)?;

        let mut features = Vec::new();
        let mut columns = Vec::new();
        for series in df.get_columns() {
            if series.name() == COUNTRY_COLUMN {
                continue;
            }
            features.push(series.name().to_string());
            columns.push(float_column(series)?);
        }

        let rows: Vec<(String, Vec<Option<f64>>)> = countries
            .into_iter()
            .enumerate()
            .filter_map(|(row, country)| {
                let scores: Vec<Option<f64>> = columns.iter().map(|col| col[row]).collect();
                country.map(|c| (c, scores))
            })
            .collect();

        Ok(Self { features, rows })
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Scores for the first row matching `country`. Missing and NaN cells are dropped.
    pub fn get(&self, country: &str) -> Option<DriverRecord> {
        let (name, values) = self.rows.iter().find(|(c, _)| c == country)?;
        let scores = self
            .features
            .iter()
            .zip(values)
            .filter_map(|(feature, value)| match value {
                Some(v) if !v.is_nan() => Some((feature.clone(), *v)),
                _ => None,
            })
            .collect();
        Some(DriverRecord {
            country: name.clone(),
            scores,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Load the predictions table. A missing file is fatal.
pub fn load_predictions(config: &DashboardConfig) -> Result<PredictionTable> {
    let path = config.predictions_path();
    match load(&path)? {
        Some(df) => PredictionTable::from_frame(&df),
        None => Err(DashboardError::MissingPrimaryData {
            file_name: config.predictions_file.clone(),
            dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
        }),
    }
}

/// Load the driver table. A missing file, or one without a `country`
/// column, yields `None`.
pub fn load_drivers(config: &DashboardConfig) -> Result<Option<DriverTable>> {
    let Some(df) = load(&config.drivers_path())? else {
        return Ok(None);
    };
    match DriverTable::from_frame(&df) {
        Ok(table) => Ok(Some(table)),
        Err(DashboardError::Schema(reason)) => {
            warn!("Ignoring {}: {}", config.drivers_file, reason);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map_err(|_| DashboardError::Schema(format!("required column '{}' is missing", name)))
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = require_column(df, name)?.cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
        .collect();
    Ok(values)
}

/// Non-numeric cells become `None`.
fn float_column(series: &Series) -> Result<Vec<Option<f64>>> {
    let series = series.cast(&DataType::Float64)?;
    let values = series.f64()?.into_iter().collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "stunting-loader-{}-{}",
            std::process::id(),
            DIR_COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_file_is_absent_not_error() {
        let dir = scratch_dir();
        let loaded = load(&dir.join("nothing_here.csv")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_second_load_is_served_from_cache() {
        let dir = scratch_dir();
        let path = dir.join("predictions_2026.csv");
        fs::write(&path, "country,predicted_stunting_2026\nKenya,42.3\n").unwrap();

        let first = load(&path).unwrap().unwrap();
        fs::remove_file(&path).unwrap();
        let second = load(&path).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_absence_is_cached() {
        let dir = scratch_dir();
        let path = dir.join("late.csv");
        assert!(load(&path).unwrap().is_none());
        fs::write(&path, "country,x\nChad,1.0\n").unwrap();
        assert!(load(&path).unwrap().is_none());
    }

    #[test]
    fn test_prediction_table_optional_actual() {
        let df = df![
            "country" => ["Kenya", "Chad"],
            "predicted_stunting_2026" => [42.3, 31.0],
        ]
        .unwrap();
        let table = PredictionTable::from_frame(&df).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("Chad").unwrap().stunting_2023_actual, None);
        assert!(table.get("Mali").is_none());
    }

    #[test]
    fn test_rows_without_prediction_are_dropped() {
        let df = df![
            "country" => ["Kenya", "Chad"],
            "predicted_stunting_2026" => [Some(42.3), None],
        ]
        .unwrap();
        let table = PredictionTable::from_frame(&df).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.get("Chad").is_none());
    }

    #[test]
    fn test_prediction_table_requires_predicted_column() {
        let df = df!["country" => ["Kenya"], "value" => [1.0]].unwrap();
        let err = PredictionTable::from_frame(&df).unwrap_err();
        assert!(matches!(err, DashboardError::Schema(_)));
    }

    #[test]
    fn test_duplicate_country_first_row_wins() {
        let df = df![
            "country" => ["Kenya", "Kenya"],
            "predicted_stunting_2026" => [42.3, 10.0],
            "stunting_2023_actual" => [Some(38.1), None],
        ]
        .unwrap();
        let table = PredictionTable::from_frame(&df).unwrap();
        assert_eq!(table.get("Kenya").unwrap().predicted_stunting_2026, 42.3);
    }

    #[test]
    fn test_driver_table_keeps_column_order_and_drops_missing() {
        let df = df![
            "country" => ["Kenya", "Chad"],
            "gdp_per_capita" => [Some(0.4), Some(0.1)],
            "water_access" => [None, Some(0.2)],
            "mothers_education_lag1" => [Some(0.9), Some(0.3)],
        ]
        .unwrap();
        let table = DriverTable::from_frame(&df).unwrap();
        assert_eq!(
            table.features(),
            &["gdp_per_capita", "water_access", "mothers_education_lag1"]
        );

        let kenya = table.get("Kenya").unwrap();
        assert_eq!(
            kenya.scores,
            vec![
                ("gdp_per_capita".to_string(), 0.4),
                ("mothers_education_lag1".to_string(), 0.9)
            ]
        );
        assert!(table.get("Niger").is_none());
    }

    #[test]
    fn test_load_predictions_missing_is_fatal() {
        let config = DashboardConfig::new(scratch_dir());
        let err = load_predictions(&config).unwrap_err();
        assert!(matches!(err, DashboardError::MissingPrimaryData { .. }));
        assert!(load_drivers(&config).unwrap().is_none());
    }

    #[test]
    fn test_drivers_without_country_column_are_ignored() {
        let dir = scratch_dir();
        fs::write(dir.join("country_shap_nowcast.csv"), "Country,gdp_per_capita\nKenya,0.4\n").unwrap();
        let config = DashboardConfig::new(&dir);
        assert!(load_drivers(&config).unwrap().is_none());
    }
}
