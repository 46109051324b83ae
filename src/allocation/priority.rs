//! Review queue ordering.
//!
//! Keys, in order: faculty rank (professors first), best submitted
//! preference rank (faculty without preferences last), committed load
//! (lightest first). `sort_by` is stable, so full ties keep their input order.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{Faculty, Preference, ReviewEntry};

/// Lowest-numbered rank among `preferences`.
pub fn best_preference_rank<'a>(preferences: impl IntoIterator<Item = &'a Preference>) -> Option<i64> {
    preferences.into_iter().map(|p| p.preference_rank).min()
}

pub fn review_order(a: &ReviewEntry, b: &ReviewEntry) -> Ordering {
    a.faculty
        .rank
        .priority()
        .cmp(&b.faculty.rank.priority())
        .then_with(|| {
            let a_best = a.best_preference_rank.unwrap_or(i64::MAX);
            let b_best = b.best_preference_rank.unwrap_or(i64::MAX);
            a_best.cmp(&b_best)
        })
        .then_with(|| {
            a.faculty
                .current_load_clh
                .total_cmp(&b.faculty.current_load_clh)
        })
}

pub fn sort_for_review(entries: &mut [ReviewEntry]) {
    entries.sort_by(review_order);
}

/// Pairs each faculty member with their submitted preferences and returns the
/// queue in review order.
pub fn build_review_queue(faculty: Vec<Faculty>, preferences: Vec<Preference>) -> Vec<ReviewEntry> {
    let mut by_staff: HashMap<String, Vec<Preference>> = HashMap::new();
    for preference in preferences {
        by_staff
            .entry(preference.staff_id.clone())
            .or_default()
            .push(preference);
    }

    let mut entries: Vec<ReviewEntry> = faculty
        .into_iter()
        .map(|f| {
            let mut preferences = by_staff.remove(&f.staff_id).unwrap_or_default();
            preferences.sort_by_key(|p| p.preference_rank);
            ReviewEntry {
                best_preference_rank: best_preference_rank(&preferences),
                faculty: f,
                preferences,
            }
        })
        .collect();

    sort_for_review(&mut entries);
    entries
}
