pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod types;

pub use db::{CompanyStore, Database};
pub use error::GeoError;
pub use router::{GeoState, geo_router};
