use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum CourseLevel {
    #[default]
    Undergraduate,
    Postgraduate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub course_id: String,
    pub name: String,
    pub lecture_hours: i64,
    pub tutorial_hours: i64,
    pub practical_hours: i64,
    pub calculated_clh: f64,
    pub is_core: bool,
    pub is_lab_associated: bool,
    pub level: CourseLevel,
    pub required_faculty: i64,
}

impl Course {
    pub fn is_postgraduate(&self) -> bool {
        self.level == CourseLevel::Postgraduate
    }
}

/// Contact load hours: lecture and tutorial hours count in full, practical
/// hours count half.
pub fn contact_load_hours(lecture: i64, tutorial: i64, practical: i64) -> f64 {
    (lecture + tutorial) as f64 + practical as f64 / 2.0
}

/// Hours in a week; no single hour component may exceed it.
pub const MAX_WEEKLY_HOURS: i64 = 168;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourseRequest {
    pub name: String,
    #[serde(default)]
    pub lecture_hours: i64,
    #[serde(default)]
    pub tutorial_hours: i64,
    #[serde(default)]
    pub practical_hours: i64,
    #[serde(default)]
    pub is_core: bool,
    #[serde(default)]
    pub is_lab_associated: bool,
    #[serde(default)]
    pub level: CourseLevel,
    #[serde(default = "default_required_faculty")]
    pub required_faculty: i64,
}

fn default_required_faculty() -> i64 {
    1
}

impl NewCourseRequest {
    pub fn check(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("course name must not be empty".to_string());
        }
        let hours = [self.lecture_hours, self.tutorial_hours, self.practical_hours];
        if hours.iter().any(|h| *h < 0) {
            return Err("hour components must not be negative".to_string());
        }
        if hours.iter().any(|h| *h > MAX_WEEKLY_HOURS) {
            return Err(format!(
                "hour components must not exceed {} per week",
                MAX_WEEKLY_HOURS
            ));
        }
        if self.required_faculty < 1 {
            return Err("required_faculty must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn calculated_clh(&self) -> f64 {
        contact_load_hours(self.lecture_hours, self.tutorial_hours, self.practical_hours)
    }
}
