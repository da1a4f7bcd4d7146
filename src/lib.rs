//! Alma Service
//!
//! A REST JSON mediator in front of the Alma library API, reporting the
//! availability of bibs, course reserves (Top Textbooks) and holding items.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod marc;
pub mod models;
pub mod services;
pub mod xml;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use services::gateway::UpstreamClient;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    pub fn new(config: AppConfig, client: Arc<dyn UpstreamClient>) -> Self {
        let services = services::Services::new(client, &config);
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}
