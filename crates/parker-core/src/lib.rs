pub mod config;
pub mod error;
pub mod logging;

pub use config::ParkerConfig;
pub use error::CoreError;
