mod maintenance;
mod usage;

pub use maintenance::{MaintenanceManager, MaintenanceReport};
pub use usage::{Quota, UsageService, UsageSnapshot, DESIGN_CREDIT_WINDOW_DAYS};
