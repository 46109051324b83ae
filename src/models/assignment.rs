use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::allocation::ValidationReport;
use crate::models::{Faculty, Preference};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AssignmentRecord {
    pub assignment_id: String,
    pub staff_id: String,
    pub course_id: String,
    pub calculated_clh: f64,
    pub approved_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    Assign,
    Unassign,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleRequest {
    pub course_id: String,
    pub action: ToggleAction,
}

/// Live view of the administrator's review session.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewSnapshot {
    pub staff_id: Option<String>,
    pub committed_courses: Vec<String>,
    pub tentative_courses: Vec<String>,
    pub tentative_clh: f64,
    pub committed_clh: f64,
    pub projected_clh: f64,
    pub max_load_clh: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleResponse {
    pub session: ReviewSnapshot,
    pub validation: ValidationReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovalResponse {
    pub staff_id: String,
    pub courses: Vec<String>,
    pub added_clh: f64,
    pub committed_load_clh: f64,
}

/// One row of the administrator's review queue.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewEntry {
    pub faculty: Faculty,
    pub best_preference_rank: Option<i64>,
    pub preferences: Vec<Preference>,
}
