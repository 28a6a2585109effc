pub mod config;
pub mod dataset;
pub mod model;

pub use config::*;
pub use dataset::*;
pub use model::*;
