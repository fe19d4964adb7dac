//! Shared application state for the Axum API server.

use std::sync::Arc;

use fxdao_common::config::AppConfig;
use fxdao_common::error::AppError;
use fxdao_engine::locator::PredecessorLocator;
use fxdao_engine::planner::VaultPlanner;
use fxdao_engine::reader::{SafetyPoolReader, VaultsReader};

/// Application state shared across all route handlers via Axum `State`.
///
/// Holds no contract data. Every request reads the remote contracts again.
#[derive(Clone)]
pub struct AppState {
    pub reader: Arc<dyn VaultsReader>,
    pub safety_pool: Option<Arc<dyn SafetyPoolReader>>,
    pub planner: VaultPlanner,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(reader: Arc<dyn VaultsReader>, config: AppConfig) -> Self {
        let planner =
            VaultPlanner::new(PredecessorLocator::with_page_size(config.locator_page_size));
        Self {
            reader,
            safety_pool: None,
            planner,
            config,
        }
    }

    pub fn with_safety_pool(mut self, reader: Arc<dyn SafetyPoolReader>) -> Self {
        self.safety_pool = Some(reader);
        self
    }

    /// The safety pool reader, or a configuration error if none is set up.
    pub fn safety_pool(&self) -> Result<&dyn SafetyPoolReader, AppError> {
        self.safety_pool.as_deref().ok_or_else(|| {
            AppError::Config("Safety pool contract is not configured".to_string())
        })
    }
}
