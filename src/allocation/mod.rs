pub mod priority;
pub mod validator;
pub mod workflow;

pub use priority::{best_preference_rank, build_review_queue, review_order, sort_for_review};
pub use validator::{Candidate, CheckPhase, RuleSet, ValidationReport, total_clh, validate, validate_assignment};
pub use workflow::{ApprovalPlan, AssignmentWorkflow, ReviewState};
