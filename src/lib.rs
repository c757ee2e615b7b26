pub mod choropleth;
pub mod config;
pub mod dashboard;
pub mod detail;
pub mod drivers;
pub mod error;
pub mod loader;
pub mod render;
pub mod search;
pub mod selection;
pub mod server;
pub mod severity;

pub use dashboard::{AppState, Dashboard, RenderCycle};
pub use error::{DashboardError, Result};
