use std::sync::Arc;

use crate::config::Config;
use crate::recommendation::pipeline::Pipeline;
use crate::recommendation::reference::ReferenceDataset;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything here is fixed at startup; requests never mutate it.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pipeline for preference-record requests.
    pub preferences: Pipeline,
    /// Pipeline for free-text profile requests. May point at a different model.
    pub profiles: Pipeline,
    /// College table for profile requests. `None` when REFERENCE_DATASET_PATH is unset.
    pub reference: Option<Arc<ReferenceDataset>>,
}

impl AppState {
    pub fn new(config: Config, reference: Option<ReferenceDataset>) -> Self {
        Self {
            preferences: Pipeline::from_config(&config.preference_generator),
            profiles: Pipeline::from_config(&config.profile_generator),
            reference: reference.map(Arc::new),
            config,
        }
    }
}
