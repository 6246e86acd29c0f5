//! Terminal choropleth of aid-project counts per recipient country.
//!
//! Records are aggregated per normalized ISO-3 key for the selected flow
//! category (ODA or OOF), counts are mapped onto a sequential color scale, and
//! the map, legend and tooltip are redrawn from one shared state whenever the
//! category changes.

pub mod aggregate;
pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod error;
pub mod legend;
pub mod map;
pub mod scale;
pub mod ui;

pub use aggregate::{aggregate, normalize_key, CategoryCountMap, FlowCategory};
pub use app::{App, AppState, Command};
pub use error::LoadError;
