//! Dashboard state and the per-request render cycle.

use crate::choropleth::{self, MapData};
use crate::config::DashboardConfig;
use crate::detail::{DetailBuilder, DetailView};
use crate::error::Result;
use crate::loader::{self, DriverTable, PredictionTable};
use crate::search::{CountrySearch, SearchHit};
use crate::selection::{CountryOptions, Selection};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Loaded, read-only tables plus the configuration they came from.
pub struct Dashboard {
    config: DashboardConfig,
    predictions: Arc<PredictionTable>,
    drivers: Option<Arc<DriverTable>>,
    options: CountryOptions,
}

/// Result of one render cycle.
#[derive(Debug, Clone, Serialize)]
pub struct RenderCycle {
    pub selection: Selection,
    pub country: Option<String>,
    pub dropdown_index: usize,
    pub detail: DetailView,
}

impl Dashboard {
    /// Load both datasets. Missing predictions is an error; missing drivers
    /// only degrades the driver section.
    pub fn load(config: DashboardConfig) -> Result<Self> {
        let predictions = loader::load_predictions(&config)?;
        let drivers = loader::load_drivers(&config)?;
        match &drivers {
            Some(table) => info!(
                "Driver data: {} countries, {} features",
                table.len(),
                table.features().len()
            ),
            None => warn!(
                "{} not found; driver panels will show a placeholder",
                config.drivers_file
            ),
        }
        Ok(Self::from_tables(config, predictions, drivers))
    }

    pub fn from_tables(
        config: DashboardConfig,
        predictions: PredictionTable,
        drivers: Option<DriverTable>,
    ) -> Self {
        let options = CountryOptions::from_table(&predictions);
        info!("Dashboard ready with {} countries", options.countries().len());
        Self {
            config,
            predictions: Arc::new(predictions),
            drivers: drivers.map(Arc::new),
            options,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn predictions(&self) -> &PredictionTable {
        &self.predictions
    }

    pub fn drivers(&self) -> Option<&DriverTable> {
        self.drivers.as_deref()
    }

    pub fn options(&self) -> &CountryOptions {
        &self.options
    }

    pub fn detail(&self, country: &str) -> DetailView {
        DetailBuilder {
            predictions: &self.predictions,
            drivers: self.drivers.as_deref(),
            drivers_file: &self.config.drivers_file,
            top_drivers: self.config.top_drivers,
        }
        .build(country)
    }

    pub fn render_cycle(&self, selection: &Selection) -> RenderCycle {
        let country = selection.current(&self.options);
        let detail = self.detail(country.as_deref().unwrap_or_default());
        RenderCycle {
            selection: selection.clone(),
            dropdown_index: selection.dropdown_index(&self.options),
            country,
            detail,
        }
    }

    pub fn map_data(&self) -> MapData {
        choropleth::map_data(&self.predictions)
    }

    pub fn figure(&self) -> Value {
        choropleth::figure(&self.predictions)
    }

    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        CountrySearch::default().search(query, self.options.countries())
    }
}

/// What the server holds: a working dashboard, or the reason there is none.
pub enum AppState {
    Ready(Dashboard),
    Unavailable { message: String },
}

impl AppState {
    /// Fatal load errors become `Unavailable`; anything else is returned.
    pub fn from_load(result: Result<Dashboard>) -> Result<Self> {
        match result {
            Ok(dashboard) => Ok(AppState::Ready(dashboard)),
            Err(e) if e.is_fatal() => Ok(AppState::Unavailable {
                message: e.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, AppState::Ready(_))
    }
}
