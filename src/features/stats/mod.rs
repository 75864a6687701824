pub mod handler;
pub mod models;
pub mod reporter;

pub use handler::create_stats_router;
pub use models::{GroupCount, StatsSnapshot};
