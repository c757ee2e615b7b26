//! Detail Panel view model
//!
//! Everything the right-hand panel shows for the current country, before it
//! is turned into HTML or JSON.

use crate::drivers::{rank_top, RankedDriver};
use crate::loader::{DriverTable, PredictionTable};
use crate::severity::{severity, Severity};
use serde::Serialize;

pub const IMPROVING_COLOR: &str = "#52b788";
pub const WORSENING_COLOR: &str = "#e05020";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Improving,
    Worsening,
}

impl Direction {
    pub fn arrow(&self) -> &'static str {
        match self {
            Direction::Improving => "▼",
            Direction::Worsening => "▲",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Direction::Improving => IMPROVING_COLOR,
            Direction::Worsening => WORSENING_COLOR,
        }
    }
}

/// Change from the 2023 actual to the 2026 prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delta {
    pub actual: f64,
    /// predicted minus actual, in percentage points
    pub value: f64,
    pub direction: Direction,
}

impl Delta {
    /// `None` when the actual is missing or exactly zero.
    pub fn between(predicted: f64, actual: Option<f64>) -> Option<Self> {
        let actual = actual.filter(|a| *a != 0.0 && !a.is_nan())?;
        let value = predicted - actual;
        let direction = if value < 0.0 {
            Direction::Improving
        } else {
            Direction::Worsening
        };
        Some(Self {
            actual,
            value,
            direction,
        })
    }

    pub fn magnitude(&self) -> f64 {
        self.value.abs()
    }

    /// e.g. `▲ 4.2pp`
    pub fn display(&self) -> String {
        format!("{} {:.1}pp", self.direction.arrow(), self.magnitude())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DriverSection {
    DatasetMissing { file_name: String },
    NoCountryData,
    Ranked { drivers: Vec<RankedDriver> },
}

impl DriverSection {
    pub fn placeholder(&self) -> Option<String> {
        match self {
            DriverSection::DatasetMissing { file_name } => Some(format!("{} not found", file_name)),
            DriverSection::NoCountryData => Some("No driver data for this country".to_string()),
            DriverSection::Ranked { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionDetail {
    pub country: String,
    pub predicted: f64,
    pub severity: Severity,
    pub delta: Option<Delta>,
    pub drivers: DriverSection,
}

impl PredictionDetail {
    /// e.g. `42.3%`
    pub fn predicted_display(&self) -> String {
        format!("{:.1}%", self.predicted)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DetailView {
    NoPrediction { country: String },
    Prediction(PredictionDetail),
}

impl DetailView {
    pub const NO_PREDICTION: &'static str = "No prediction available";
}

/// Builds detail views against the loaded tables.
pub struct DetailBuilder<'a> {
    pub predictions: &'a PredictionTable,
    pub drivers: Option<&'a DriverTable>,
    /// Name shown when the driver file is missing
    pub drivers_file: &'a str,
    pub top_drivers: usize,
}

impl<'a> DetailBuilder<'a> {
    pub fn build(&self, country: &str) -> DetailView {
        let Some(record) = self.predictions.get(country) else {
            return DetailView::NoPrediction {
                country: country.to_string(),
            };
        };

        let drivers = match self.drivers {
            None => DriverSection::DatasetMissing {
                file_name: self.drivers_file.to_string(),
            },
            Some(table) => match table.get(country) {
                None => DriverSection::NoCountryData,
                Some(row) => DriverSection::Ranked {
                    drivers: rank_top(&row.scores, self.top_drivers),
                },
            },
        };

        DetailView::Prediction(PredictionDetail {
            country: record.country.clone(),
            predicted: record.predicted_stunting_2026,
            severity: severity(record.predicted_stunting_2026),
            delta: Delta::between(record.predicted_stunting_2026, record.stunting_2023_actual),
            drivers,
        })
    }
}
