use crate::clock::SharedClock;
use crate::completion::CompletionService;
use crate::household::HouseholdService;
use crate::ledger::LedgerService;
use crate::storage::JsonStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub households: HouseholdService,
    pub completions: CompletionService,
    pub ledger: LedgerService,
    pub clock: SharedClock,
}

impl AppState {
    pub fn new(store: Arc<JsonStore>, clock: SharedClock, ledger_max_attempts: u32) -> Self {
        let ledger = LedgerService::new(store.clone(), ledger_max_attempts);
        let completions = CompletionService::new(store.clone(), ledger.clone(), clock.clone());
        let households = HouseholdService::new(store, completions.clone(), clock.clone());
        Self {
            households,
            completions,
            ledger,
            clock,
        }
    }
}
