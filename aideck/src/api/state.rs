use std::sync::Arc;

use crate::config::Config;
use crate::db::DatabaseBackend;
use crate::services::{MaintenanceManager, UsageService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<dyn DatabaseBackend>,
    pub usage: UsageService,
    pub maintenance: MaintenanceManager,
}

impl AppState {
    pub fn new(config: Config, db: Arc<dyn DatabaseBackend>) -> Self {
        let usage = UsageService::new(db.clone(), config.plans.clone());
        let maintenance = MaintenanceManager::new(
            db.clone(),
            config.maintenance.interval_secs,
            config.maintenance.design_stuck_threshold_hours,
        );

        Self {
            config: Arc::new(config),
            db,
            usage,
            maintenance,
        }
    }
}
