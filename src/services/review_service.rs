use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::allocation::{AssignmentWorkflow, build_review_queue};
use crate::db::{AssignmentLedger, Catalog, PreferenceStore};
use crate::error::AppError;
use crate::models::{
    ApprovalResponse, AssignmentRecord, ReviewEntry, ToggleAction, ToggleRequest, ToggleResponse,
};

pub struct ReviewService {
    catalog: Arc<dyn Catalog>,
    preferences: Arc<dyn PreferenceStore>,
    ledger: Arc<dyn AssignmentLedger>,
    workflow: Arc<Mutex<AssignmentWorkflow>>,
}

impl ReviewService {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        preferences: Arc<dyn PreferenceStore>,
        ledger: Arc<dyn AssignmentLedger>,
        workflow: Arc<Mutex<AssignmentWorkflow>>,
    ) -> Self {
        Self {
            catalog,
            preferences,
            ledger,
            workflow,
        }
    }

    pub async fn queue(&self) -> Result<Vec<ReviewEntry>, AppError> {
        let faculty = self.catalog.all_faculty().await?;
        let preferences = self.preferences.all().await?;
        Ok(build_review_queue(faculty, preferences))
    }

    pub async fn session(&self) -> ToggleResponse {
        let workflow = self.workflow.lock().await;
        ToggleResponse {
            session: workflow.snapshot(),
            validation: workflow.validation().unwrap_or_default(),
        }
    }

    pub async fn select(&self, staff_id: &str) -> Result<ToggleResponse, AppError> {
        let mut workflow = self.workflow.lock().await;
        self.open_session(&mut workflow, staff_id).await?;
        Ok(ToggleResponse {
            session: workflow.snapshot(),
            validation: workflow.validation().unwrap_or_default(),
        })
    }

    /// Adds or removes one tentative course. A rejected toggle leaves the
    /// session exactly as it was.
    pub async fn toggle(&self, staff_id: &str, req: ToggleRequest) -> Result<ToggleResponse, AppError> {
        let mut workflow = self.workflow.lock().await;
        let previous = workflow.state().clone();

        let result = self.apply_toggle(&mut workflow, staff_id, &req).await;
        match result {
            Ok(validation) => Ok(ToggleResponse {
                session: workflow.snapshot(),
                validation,
            }),
            Err(err) => {
                warn!("Rejected {:?} of {} for {}: {}", req.action, req.course_id, staff_id, err);
                workflow.restore(previous);
                Err(err)
            }
        }
    }

    pub async fn approve(&self, staff_id: &str) -> Result<ApprovalResponse, AppError> {
        let mut workflow = self.workflow.lock().await;
        if workflow.reviewing() != Some(staff_id) {
            return Err(AppError::ApprovalBlocked(vec![format!(
                "{} is not under review",
                staff_id
            )]));
        }

        let fresh = self
            .catalog
            .faculty(staff_id)
            .await?
            .ok_or(AppError::NotFound)?;
        workflow.refresh_faculty(fresh)?;

        let plan = workflow.approval_plan()?;
        let Some(load) = self
            .ledger
            .commit(&plan.staff_id, &plan.courses, plan.added_clh)
            .await?
        else {
            warn!("Load commit for {} refused by the store", staff_id);
            return Err(AppError::ApprovalBlocked(vec![
                "Load or assignments changed by a concurrent approval".to_string(),
            ]));
        };

        workflow.complete_approval(&plan);
        info!(
            "Approved {} course(s) for {}: +{} CLH, load now {}",
            plan.courses.len(),
            staff_id,
            plan.added_clh,
            load
        );

        Ok(ApprovalResponse {
            staff_id: plan.staff_id,
            courses: plan.courses.into_iter().map(|c| c.course_id).collect(),
            added_clh: plan.added_clh,
            committed_load_clh: load,
        })
    }

    pub async fn cancel(&self) -> bool {
        let discarded = self.workflow.lock().await.cancel();
        if discarded {
            info!("Review session cancelled");
        }
        discarded
    }

    pub async fn assignments(&self) -> Result<Vec<AssignmentRecord>, AppError> {
        self.ledger.assignments().await
    }

    async fn open_session(&self, workflow: &mut AssignmentWorkflow, staff_id: &str) -> Result<(), AppError> {
        let faculty = self
            .catalog
            .faculty(staff_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let ranks: HashMap<String, i64> = self
            .preferences
            .for_faculty(staff_id)
            .await?
            .into_iter()
            .map(|p| (p.course_id, p.preference_rank))
            .collect();
        let committed = self.ledger.assigned_courses(staff_id).await?;
        workflow.select(faculty, ranks, committed)
    }

    async fn apply_toggle(
        &self,
        workflow: &mut AssignmentWorkflow,
        staff_id: &str,
        req: &ToggleRequest,
    ) -> Result<crate::allocation::ValidationReport, AppError> {
        if workflow.reviewing() != Some(staff_id) {
            self.open_session(workflow, staff_id).await?;
        }

        match req.action {
            ToggleAction::Assign => {
                let course = self
                    .catalog
                    .course(&req.course_id)
                    .await?
                    .ok_or(AppError::NotFound)?;
                workflow.assign(course)
            }
            ToggleAction::Unassign => workflow.unassign(&req.course_id),
        }
    }
}
