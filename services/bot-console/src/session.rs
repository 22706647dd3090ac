//! Console session - owns the state store for one client session

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::orchestrator::{Orchestrator, SyncReport};
use crate::service::TradingService;
use crate::store::StateStore;
use crate::view::{Dashboard, StrategyForm};

/// One client session: created at start, discarded at end, never persisted
pub struct ConsoleSession {
    id: Uuid,
    store: Arc<StateStore>,
    orchestrator: Orchestrator,
}

impl ConsoleSession {
    /// Create a fresh store and run the startup synchronization
    pub async fn open(service: Arc<dyn TradingService>) -> (Self, SyncReport) {
        let id = Uuid::new_v4();
        let store = Arc::new(StateStore::new());
        let orchestrator = Orchestrator::new(service, store.clone());

        info!(session = %id, "Opening console session");
        let report = orchestrator.synchronize().await;
        if !report.strategy_ready() {
            warn!(session = %id, "Bot state unavailable; strategy settings not initialized");
        }

        (
            Self {
                id,
                store,
                orchestrator,
            },
            report,
        )
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard::project(&self.store)
    }

    /// Strategy form, once bot state is known
    pub fn strategy_form(&self) -> Option<StrategyForm> {
        self.store.bot_state().map(|state| StrategyForm::from_state(&state))
    }

    /// End the session and drop all cached state
    pub fn close(self) {
        if self.store.is_pending() {
            warn!(session = %self.id, "Closing session with a command still in flight");
        }
        info!(session = %self.id, "Console session closed");
    }
}
