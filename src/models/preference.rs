use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Number of ranked choices a faculty member may submit per cycle.
pub const PREFERENCE_SLOTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Preference {
    pub preference_id: String,
    pub staff_id: String,
    pub course_id: String,
    pub preference_rank: i64,
}

/// One entry of a submission as sent by the client. The rank is kept raw so
/// out-of-range values reach the validator instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceEntry {
    pub course_id: String,
    pub preference_rank: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitPreferencesRequest {
    #[serde(default)]
    pub preferences: Vec<PreferenceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub success: bool,
    pub warnings: Vec<String>,
}

/// Validated submission: slot `i` holds the course ranked `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceSlots([Option<String>; PREFERENCE_SLOTS]);

impl PreferenceSlots {
    pub fn from_entries(entries: &[PreferenceEntry]) -> Result<Self, String> {
        let mut slots: [Option<String>; PREFERENCE_SLOTS] = Default::default();
        for entry in entries {
            let index = usize::try_from(entry.preference_rank)
                .ok()
                .and_then(|rank| rank.checked_sub(1))
                .filter(|i| *i < PREFERENCE_SLOTS)
                .ok_or_else(|| format!("preference rank {} is out of range", entry.preference_rank))?;
            if slots[index].is_some() {
                return Err(format!("preference rank {} used more than once", entry.preference_rank));
            }
            slots[index] = Some(entry.course_id.clone());
        }
        Ok(Self(slots))
    }

    /// Filled slots as `(rank, course_id)`, best rank first.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &str)> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_deref().map(|course| (i as i64 + 1, course)))
    }

    pub fn len(&self) -> usize {
        self.0.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
