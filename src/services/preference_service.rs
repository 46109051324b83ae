use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::allocation::{Candidate, CheckPhase, RuleSet, validate};
use crate::db::{Catalog, PreferenceStore};
use crate::error::AppError;
use crate::models::{Preference, PreferenceSlots, SubmissionResponse, SubmitPreferencesRequest};

pub struct PreferenceService {
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn PreferenceStore>,
    rules: RuleSet,
}

impl PreferenceService {
    pub fn new(catalog: Arc<dyn Catalog>, store: Arc<dyn PreferenceStore>, rules: RuleSet) -> Self {
        Self {
            catalog,
            store,
            rules,
        }
    }

    /// Validates and stores a faculty member's ranked choices. Nothing is
    /// written unless every rule passes and no earlier submission exists.
    pub async fn submit(
        &self,
        staff_id: &str,
        req: SubmitPreferencesRequest,
    ) -> Result<SubmissionResponse, AppError> {
        let faculty = self
            .catalog
            .faculty(staff_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if !self.store.for_faculty(staff_id).await?.is_empty() {
            warn!("Rejected repeat submission from {}", staff_id);
            return Err(AppError::AlreadySubmitted);
        }

        let mut ids: Vec<String> = req.preferences.iter().map(|p| p.course_id.clone()).collect();
        ids.sort();
        ids.dedup();
        let courses: HashMap<String, _> = self
            .catalog
            .courses_by_ids(&ids)
            .await?
            .into_iter()
            .map(|c| (c.course_id.clone(), c))
            .collect();

        let mut candidates = Vec::with_capacity(req.preferences.len());
        for entry in &req.preferences {
            let Some(course) = courses.get(&entry.course_id) else {
                warn!("Submission from {} names unknown course {}", staff_id, entry.course_id);
                return Err(AppError::NotFound);
            };
            candidates.push(Candidate::new(course, Some(entry.preference_rank)));
        }

        let report = validate(&faculty, &candidates, 0.0, CheckPhase::Submission, &self.rules);
        if !report.is_ok() {
            warn!("Submission from {} failed validation: {:?}", staff_id, report.errors);
            return Err(AppError::ValidationFailed(report.errors));
        }

        let slots = PreferenceSlots::from_entries(&req.preferences)
            .map_err(|e| AppError::ValidationFailed(vec![e]))?;

        if !self.store.insert_if_absent(staff_id, &slots).await? {
            warn!("Concurrent submission from {} lost the race", staff_id);
            return Err(AppError::AlreadySubmitted);
        }

        info!(
            "Stored {} preferences for {} ({} warnings)",
            slots.len(),
            staff_id,
            report.warnings.len()
        );
        Ok(SubmissionResponse {
            success: true,
            warnings: report.warnings,
        })
    }

    pub async fn preferences(&self, staff_id: &str) -> Result<Vec<Preference>, AppError> {
        self.catalog
            .faculty(staff_id)
            .await?
            .ok_or(AppError::NotFound)?;
        self.store.for_faculty(staff_id).await
    }

    /// Reopens submission for `staff_id` by dropping their stored choices.
    pub async fn clear(&self, staff_id: &str) -> Result<(), AppError> {
        if self.store.clear(staff_id).await? {
            info!("Cleared preferences for {}", staff_id);
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }
}
