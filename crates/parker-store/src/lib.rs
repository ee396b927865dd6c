pub mod db;
pub mod error;
pub mod models;
pub mod store;
pub mod timefmt;

pub use error::StoreError;
pub use models::{Progress, Schedule, User};
pub use store::ScheduleStore;
