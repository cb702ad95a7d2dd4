use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{checkout::CheckoutWizard, commerce::CommerceClient, config::Config, steps::StepFlow};

/// Shared application state. The two maps hold the per-session state
/// machines, keyed by the commerce session token; entries live exactly as
/// long as the flow they describe.
pub struct State {
    pub config: Config,
    pub commerce: CommerceClient,
    pub flows: RwLock<HashMap<String, StepFlow>>,
    pub checkouts: RwLock<HashMap<String, CheckoutWizard>>,
}

impl State {
    pub fn new() -> Arc<Self> {
        let config = Config::load();
        let commerce = CommerceClient::new(&config);

        Arc::new(Self {
            config,
            commerce,
            flows: RwLock::new(HashMap::new()),
            checkouts: RwLock::new(HashMap::new()),
        })
    }
}
