//! Business logic services

pub mod availability;
pub mod gateway;
pub mod holdings;
pub mod validation;

use std::sync::Arc;

use crate::config::AppConfig;
use gateway::{AlmaGateway, UpstreamClient};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub availability: availability::AvailabilityService,
    pub holdings: holdings::HoldingsService,
}

impl Services {
    /// Create all services on top of the given upstream client
    pub fn new(client: Arc<dyn UpstreamClient>, config: &AppConfig) -> Self {
        let gateway = AlmaGateway::new(client, config.alma.clone());
        let holdings = holdings::HoldingsService::new(gateway.clone(), config.catalog.clone());

        Self {
            availability: availability::AvailabilityService::new(
                gateway,
                holdings.clone(),
                config.catalog.concurrent_due_dates,
            ),
            holdings,
        }
    }
}
