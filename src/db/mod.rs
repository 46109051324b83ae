pub mod repository;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::{AssignmentRecord, Course, Faculty, Preference, PreferenceSlots};

/// Read-only reference data for one allocation cycle.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn courses(&self) -> Result<Vec<Course>, AppError>;
    async fn course(&self, course_id: &str) -> Result<Option<Course>, AppError>;
    /// Courses matching `ids`; unknown ids are simply absent from the result.
    async fn courses_by_ids(&self, ids: &[String]) -> Result<Vec<Course>, AppError>;
    async fn faculty(&self, staff_id: &str) -> Result<Option<Faculty>, AppError>;
    async fn all_faculty(&self) -> Result<Vec<Faculty>, AppError>;
}

#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Atomically stores `slots` iff nothing is stored for `staff_id` yet.
    async fn insert_if_absent(&self, staff_id: &str, slots: &PreferenceSlots) -> Result<bool, AppError>;
    async fn for_faculty(&self, staff_id: &str) -> Result<Vec<Preference>, AppError>;
    async fn all(&self) -> Result<Vec<Preference>, AppError>;
    async fn clear(&self, staff_id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait AssignmentLedger: Send + Sync {
    /// Atomically raises the faculty's load by `added_clh` iff the result stays
    /// within the ceiling and no course is assigned to them twice, recording
    /// `courses`. `None` means nothing changed.
    async fn commit(&self, staff_id: &str, courses: &[Course], added_clh: f64) -> Result<Option<f64>, AppError>;
    async fn assignments(&self) -> Result<Vec<AssignmentRecord>, AppError>;
    async fn assigned_courses(&self, staff_id: &str) -> Result<Vec<Course>, AppError>;
}

#[derive(Clone)]
pub struct SqliteStore {
    db: SqlitePool,
}

impl SqliteStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Catalog for SqliteStore {
    async fn courses(&self) -> Result<Vec<Course>, AppError> {
        Ok(repository::fetch_courses(&self.db).await?)
    }

    async fn course(&self, course_id: &str) -> Result<Option<Course>, AppError> {
        Ok(repository::find_course_by_id(&self.db, course_id).await?)
    }

    async fn courses_by_ids(&self, ids: &[String]) -> Result<Vec<Course>, AppError> {
        Ok(repository::find_courses_by_ids(&self.db, ids).await?)
    }

    async fn faculty(&self, staff_id: &str) -> Result<Option<Faculty>, AppError> {
        Ok(repository::find_faculty_by_id(&self.db, staff_id).await?)
    }

    async fn all_faculty(&self) -> Result<Vec<Faculty>, AppError> {
        Ok(repository::fetch_faculty(&self.db).await?)
    }
}

#[async_trait]
impl PreferenceStore for SqliteStore {
    async fn insert_if_absent(&self, staff_id: &str, slots: &PreferenceSlots) -> Result<bool, AppError> {
        Ok(repository::insert_preferences_if_absent(&self.db, staff_id, slots).await?)
    }

    async fn for_faculty(&self, staff_id: &str) -> Result<Vec<Preference>, AppError> {
        Ok(repository::fetch_preferences_for(&self.db, staff_id).await?)
    }

    async fn all(&self) -> Result<Vec<Preference>, AppError> {
        Ok(repository::fetch_all_preferences(&self.db).await?)
    }

    async fn clear(&self, staff_id: &str) -> Result<bool, AppError> {
        Ok(repository::clear_preferences(&self.db, staff_id).await?)
    }
}

#[async_trait]
impl AssignmentLedger for SqliteStore {
    async fn commit(&self, staff_id: &str, courses: &[Course], added_clh: f64) -> Result<Option<f64>, AppError> {
        Ok(repository::commit_assignment(&self.db, staff_id, courses, added_clh).await?)
    }

    async fn assignments(&self) -> Result<Vec<AssignmentRecord>, AppError> {
        Ok(repository::fetch_assignments(&self.db).await?)
    }

    async fn assigned_courses(&self, staff_id: &str) -> Result<Vec<Course>, AppError> {
        Ok(repository::fetch_assigned_courses(&self.db, staff_id).await?)
    }
}
