use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::allocation::{AssignmentWorkflow, RuleSet};
use crate::db::{AssignmentLedger, Catalog, PreferenceStore, SqliteStore};
use crate::services::{PreferenceService, ReviewService};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub catalog: Arc<dyn Catalog>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub ledger: Arc<dyn AssignmentLedger>,
    pub review: Arc<Mutex<AssignmentWorkflow>>,
    pub rules: RuleSet,
}

impl AppState {
    pub fn new(db: SqlitePool, rules: RuleSet) -> Self {
        let store = Arc::new(SqliteStore::new(db.clone()));
        Self {
            db,
            catalog: store.clone(),
            preferences: store.clone(),
            ledger: store,
            review: Arc::new(Mutex::new(AssignmentWorkflow::new(rules.clone()))),
            rules,
        }
    }

    pub fn preference_service(&self) -> PreferenceService {
        PreferenceService::new(self.catalog.clone(), self.preferences.clone(), self.rules.clone())
    }

    pub fn review_service(&self) -> ReviewService {
        ReviewService::new(
            self.catalog.clone(),
            self.preferences.clone(),
            self.ledger.clone(),
            self.review.clone(),
        )
    }
}
