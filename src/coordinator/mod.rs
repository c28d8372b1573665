//! Background-refreshing per-user coordinators and the logical-day check that
//! decides when their data must be thrown away.

mod daily_plan;
pub mod logical_day;
mod registry;

pub use daily_plan::{DailyPlanCoordinator, DEFAULT_UPDATE_INTERVAL};
pub use registry::CoordinatorRegistry;
