//! Administrator review session.
//!
//! `Idle` until a faculty member is selected; while `Reviewing`, courses are
//! toggled in and out of a tentative list that never holds a selection the
//! validator rejects. Approval hands back an [`ApprovalPlan`] for the caller
//! to commit; the session only returns to `Idle` once the commit succeeded.

use std::collections::HashMap;

use crate::allocation::validator::{self, Candidate, RuleSet, ValidationReport};
use crate::error::AppError;
use crate::models::{Course, Faculty, ReviewSnapshot};

#[derive(Debug, Clone, Default)]
pub enum ReviewState {
    #[default]
    Idle,
    Reviewing {
        faculty: Faculty,
        /// Course id -> rank the faculty gave it, for courses they asked for.
        preference_ranks: HashMap<String, i64>,
        /// Courses approved for this faculty in earlier sessions.
        committed: Vec<Course>,
        tentative: Vec<Course>,
    },
}

/// What an approval commits: `added_clh` on top of the faculty's load.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalPlan {
    pub staff_id: String,
    pub courses: Vec<Course>,
    pub added_clh: f64,
}

#[derive(Debug, Default)]
pub struct AssignmentWorkflow {
    state: ReviewState,
    rules: RuleSet,
}

impl AssignmentWorkflow {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            state: ReviewState::Idle,
            rules,
        }
    }

    pub fn state(&self) -> &ReviewState {
        &self.state
    }

    pub fn reviewing(&self) -> Option<&str> {
        match &self.state {
            ReviewState::Idle => None,
            ReviewState::Reviewing { faculty, .. } => Some(faculty.staff_id.as_str()),
        }
    }

    /// Opens (or refreshes) a session for `faculty`. Switching to someone else
    /// is refused while courses are still pending for the current faculty.
    pub fn select(
        &mut self,
        faculty: Faculty,
        preference_ranks: HashMap<String, i64>,
        committed: Vec<Course>,
    ) -> Result<(), AppError> {
        if let ReviewState::Reviewing {
            faculty: current,
            preference_ranks: ranks,
            committed: assigned,
            tentative,
        } = &mut self.state
        {
            if current.staff_id == faculty.staff_id {
                *current = faculty;
                *ranks = preference_ranks;
                *assigned = committed;
                return Ok(());
            }
            if !tentative.is_empty() {
                return Err(AppError::Conflict(format!(
                    "{} has unapproved selections; approve or cancel first",
                    current.name
                )));
            }
        }

        self.state = ReviewState::Reviewing {
            faculty,
            preference_ranks,
            committed,
            tentative: Vec::new(),
        };
        Ok(())
    }

    /// Replaces the faculty snapshot with a fresher copy of the same record.
    pub fn refresh_faculty(&mut self, fresh: Faculty) -> Result<(), AppError> {
        match &mut self.state {
            ReviewState::Reviewing { faculty, .. } if faculty.staff_id == fresh.staff_id => {
                *faculty = fresh;
                Ok(())
            }
            _ => Err(AppError::Conflict(format!(
                "{} is not under review",
                fresh.staff_id
            ))),
        }
    }

    pub fn assign(&mut self, course: Course) -> Result<ValidationReport, AppError> {
        let rules = self.rules.clone();
        let ReviewState::Reviewing {
            faculty,
            preference_ranks,
            committed,
            tentative,
        } = &mut self.state
        else {
            return Err(AppError::Conflict("no faculty is under review".to_string()));
        };

        if committed.iter().any(|c| c.course_id == course.course_id) {
            return Err(AppError::Conflict(format!(
                "{} is already assigned to {}",
                course.name, faculty.name
            )));
        }
        if tentative.iter().any(|c| c.course_id == course.course_id) {
            return Err(AppError::Conflict(format!(
                "{} is already selected",
                course.name
            )));
        }

        let report = {
            let mut candidates = candidates(tentative, preference_ranks);
            candidates.push(Candidate::new(
                &course,
                preference_ranks.get(&course.course_id).copied(),
            ));
            validator::validate_assignment(faculty, &candidates, committed, &rules)
        };

        if !report.is_ok() {
            return Err(AppError::ValidationFailed(report.errors));
        }

        tentative.push(course);
        Ok(report)
    }

    pub fn unassign(&mut self, course_id: &str) -> Result<ValidationReport, AppError> {
        let ReviewState::Reviewing { tentative, .. } = &mut self.state else {
            return Err(AppError::Conflict("no faculty is under review".to_string()));
        };

        let position = tentative
            .iter()
            .position(|c| c.course_id == course_id)
            .ok_or(AppError::NotFound)?;
        tentative.remove(position);

        Ok(self.validation().unwrap_or_default())
    }

    /// Current report for the tentative selection, `None` when idle.
    pub fn validation(&self) -> Option<ValidationReport> {
        let ReviewState::Reviewing {
            faculty,
            preference_ranks,
            committed,
            tentative,
        } = &self.state
        else {
            return None;
        };

        Some(validator::validate_assignment(
            faculty,
            &candidates(tentative, preference_ranks),
            committed,
            &self.rules,
        ))
    }

    /// Checks the session can be approved, without leaving `Reviewing`.
    pub fn approval_plan(&self) -> Result<ApprovalPlan, AppError> {
        let ReviewState::Reviewing {
            faculty, tentative, ..
        } = &self.state
        else {
            return Err(AppError::ApprovalBlocked(vec![
                "No faculty is under review".to_string(),
            ]));
        };

        if tentative.is_empty() {
            return Err(AppError::ApprovalBlocked(vec![
                "No courses selected".to_string(),
            ]));
        }

        let report = self.validation().unwrap_or_default();
        if !report.is_ok() {
            return Err(AppError::ApprovalBlocked(report.errors));
        }

        Ok(ApprovalPlan {
            staff_id: faculty.staff_id.clone(),
            courses: tentative.clone(),
            added_clh: tentative.iter().map(|c| c.calculated_clh).sum(),
        })
    }

    /// Marks `plan` as committed: the faculty's load grows and the session ends.
    pub fn complete_approval(&mut self, plan: &ApprovalPlan) -> Option<Faculty> {
        match std::mem::take(&mut self.state) {
            ReviewState::Reviewing { mut faculty, .. } if faculty.staff_id == plan.staff_id => {
                faculty.current_load_clh += plan.added_clh;
                Some(faculty)
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Puts back a state captured earlier with `state().clone()`.
    pub fn restore(&mut self, state: ReviewState) {
        self.state = state;
    }

    /// Drops any tentative selection. Returns whether a session was open.
    pub fn cancel(&mut self) -> bool {
        !matches!(std::mem::take(&mut self.state), ReviewState::Idle)
    }

    pub fn snapshot(&self) -> ReviewSnapshot {
        match &self.state {
            ReviewState::Idle => ReviewSnapshot {
                staff_id: None,
                committed_courses: Vec::new(),
                tentative_courses: Vec::new(),
                tentative_clh: 0.0,
                committed_clh: 0.0,
                projected_clh: 0.0,
                max_load_clh: None,
            },
            ReviewState::Reviewing {
                faculty,
                committed,
                tentative,
                ..
            } => {
                let tentative_clh: f64 = tentative.iter().map(|c| c.calculated_clh).sum();
                ReviewSnapshot {
                    staff_id: Some(faculty.staff_id.clone()),
                    committed_courses: committed.iter().map(|c| c.course_id.clone()).collect(),
                    tentative_courses: tentative.iter().map(|c| c.course_id.clone()).collect(),
                    tentative_clh,
                    committed_clh: faculty.current_load_clh,
                    projected_clh: faculty.current_load_clh + tentative_clh,
                    max_load_clh: Some(faculty.max_load_clh),
                }
            }
        }
    }
}

fn candidates<'a>(tentative: &'a [Course], ranks: &HashMap<String, i64>) -> Vec<Candidate<'a>> {
    tentative
        .iter()
        .map(|c| Candidate::new(c, ranks.get(&c.course_id).copied()))
        .collect()
}
