//! Allocation constraint rules.
//!
//! The same rule set gates preference submission and the administrator's
//! tentative assignments. Every violated rule is reported; nothing
//! short-circuits, so callers can show the full list at once.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::models::{Course, Faculty, PREFERENCE_SLOTS};

/// Tunable limits for the rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    pub max_preferences: usize,
    pub senior_lab_limit: usize,
    /// Postgraduate courses allowed per preference rank. `None` disables the rule.
    pub graduate_limit_per_rank: Option<usize>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            max_preferences: PREFERENCE_SLOTS,
            senior_lab_limit: 1,
            graduate_limit_per_rank: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckPhase {
    /// Brand-new preferences; cardinality and rank checks apply.
    Submission,
    /// Incremental selection on top of the faculty's committed load.
    Assignment,
}

/// A course under consideration, with the preference rank it was chosen at
/// (if any).
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub course: &'a Course,
    pub rank: Option<i64>,
}

impl<'a> Candidate<'a> {
    pub fn new(course: &'a Course, rank: Option<i64>) -> Self {
        Self { course, rank }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Total contact load of a candidate set.
pub fn total_clh(candidates: &[Candidate<'_>]) -> f64 {
    candidates.iter().map(|c| c.course.calculated_clh).sum()
}

/// Checks `candidates` for `faculty`.
///
/// `committed_load` is the load already on the books: zero for a fresh
/// submission, the faculty's current load during review.
pub fn validate(
    faculty: &Faculty,
    candidates: &[Candidate<'_>],
    committed_load: f64,
    phase: CheckPhase,
    rules: &RuleSet,
) -> ValidationReport {
    check(faculty, candidates, committed_load, 0, phase, rules)
}

/// Checks a tentative selection on top of `committed`, the courses already
/// assigned to `faculty`. Their hours are part of `current_load_clh`; their
/// labs still count toward the senior limit.
pub fn validate_assignment(
    faculty: &Faculty,
    candidates: &[Candidate<'_>],
    committed: &[Course],
    rules: &RuleSet,
) -> ValidationReport {
    let committed_labs = committed.iter().filter(|c| c.is_lab_associated).count();
    check(
        faculty,
        candidates,
        faculty.current_load_clh,
        committed_labs,
        CheckPhase::Assignment,
        rules,
    )
}

fn check(
    faculty: &Faculty,
    candidates: &[Candidate<'_>],
    committed_load: f64,
    committed_labs: usize,
    phase: CheckPhase,
    rules: &RuleSet,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    if phase == CheckPhase::Submission {
        check_cardinality(candidates, rules, &mut report);
        check_uniqueness(candidates, &mut report);
    }

    let total = total_clh(candidates) + committed_load;
    if total > faculty.max_load_clh {
        report.errors.push(format!(
            "Exceeds max load: {}/{} CLH",
            total, faculty.max_load_clh
        ));
    }

    if faculty.is_senior {
        let labs = committed_labs
            + candidates
                .iter()
                .filter(|c| c.course.is_lab_associated)
                .count();
        if labs > rules.senior_lab_limit {
            report.errors.push(format!(
                "Senior faculty cannot select more than {} lab-associated course(s); {} selected",
                rules.senior_lab_limit, labs
            ));
        }
    }

    if let Some(limit) = rules.graduate_limit_per_rank {
        check_graduate_load(candidates, limit, &mut report);
    }

    check_core_coverage(faculty, candidates, &mut report);

    report
}

fn check_cardinality(candidates: &[Candidate<'_>], rules: &RuleSet, report: &mut ValidationReport) {
    if candidates.is_empty() {
        report
            .errors
            .push("At least one preference is required".to_string());
    } else if candidates.len() > rules.max_preferences {
        report.errors.push(format!(
            "Max {} preferences allowed; {} submitted",
            rules.max_preferences,
            candidates.len()
        ));
    }
}

fn check_uniqueness(candidates: &[Candidate<'_>], report: &mut ValidationReport) {
    let mut seen_ranks = HashSet::new();
    let mut reported_ranks = HashSet::new();
    let mut seen_courses = HashSet::new();

    for candidate in candidates {
        match candidate.rank {
            None => report
                .errors
                .push(format!("Course {} has no preference rank", candidate.course.name)),
            Some(rank) if !(1..=PREFERENCE_SLOTS as i64).contains(&rank) => {
                report.errors.push(format!(
                    "Preference rank {} is out of range (1-{})",
                    rank, PREFERENCE_SLOTS
                ));
            }
            Some(rank) => {
                if !seen_ranks.insert(rank) && reported_ranks.insert(rank) {
                    report
                        .errors
                        .push(format!("Duplicate preference rank {}", rank));
                }
            }
        }

        if !seen_courses.insert(candidate.course.course_id.as_str()) {
            report.errors.push(format!(
                "Course {} selected more than once",
                candidate.course.name
            ));
        }
    }
}

fn check_graduate_load(candidates: &[Candidate<'_>], limit: usize, report: &mut ValidationReport) {
    let mut per_rank: BTreeMap<i64, usize> = BTreeMap::new();
    for candidate in candidates.iter().filter(|c| c.course.is_postgraduate()) {
        if let Some(rank) = candidate.rank {
            *per_rank.entry(rank).or_default() += 1;
        }
    }

    for (rank, count) in per_rank {
        if count > limit {
            report.errors.push(format!(
                "Preference rank {} has {} postgraduate courses; at most {} allowed",
                rank, count, limit
            ));
        }
    }
}

fn check_core_coverage(faculty: &Faculty, candidates: &[Candidate<'_>], report: &mut ValidationReport) {
    if candidates.is_empty() {
        return;
    }
    let has_core = candidates.iter().any(|c| c.course.is_core);
    let has_elective = candidates.iter().any(|c| !c.course.is_core);

    if has_elective && !has_core {
        report
            .warnings
            .push("Elective selected without a core course".to_string());
    }
    if !faculty.is_senior && !has_core {
        report
            .warnings
            .push("Junior faculty are advised to select core courses".to_string());
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{Course, CourseLevel, Faculty, Rank};

    pub fn course(id: &str, clh: f64, is_core: bool, is_lab: bool) -> Course {
        Course {
            course_id: id.to_string(),
            name: id.to_string(),
            lecture_hours: 0,
            tutorial_hours: 0,
            practical_hours: 0,
            calculated_clh: clh,
            is_core,
            is_lab_associated: is_lab,
            level: CourseLevel::Undergraduate,
            required_faculty: 1,
        }
    }

    pub fn faculty(id: &str, rank: Rank, max: f64, current: f64) -> Faculty {
        Faculty {
            staff_id: id.to_string(),
            name: id.to_string(),
            rank,
            is_senior: rank.is_senior(),
            max_load_clh: max,
            current_load_clh: current,
        }
    }
}
