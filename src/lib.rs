pub mod aggregate;
pub mod config;
pub mod derive;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod pipeline;
pub mod record;
pub mod state;

pub use error::LoadError;
pub use filter::FilterCriteria;
pub use pipeline::{DashboardView, Pipeline};
