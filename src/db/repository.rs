use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::models::{
    AssignmentRecord, Course, Faculty, NewCourseRequest, NewFacultyRequest, Preference,
    PreferenceSlots,
};

const COURSE_COLUMNS: &str = "course_id, name, lecture_hours, tutorial_hours, practical_hours, calculated_clh, is_core, is_lab_associated, level, required_faculty";
const FACULTY_COLUMNS: &str = "staff_id, name, rank, is_senior, max_load_clh, current_load_clh";

/// Whether `err` is the store refusing a duplicate key.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

pub async fn fetch_courses(db: &SqlitePool) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses ORDER BY name, course_id"
    ))
    .fetch_all(db)
    .await
}

pub async fn find_course_by_id(db: &SqlitePool, id: &str) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses WHERE course_id = ?"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn find_courses_by_ids(
    db: &SqlitePool,
    ids: &[String],
) -> Result<Vec<Course>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {COURSE_COLUMNS} FROM courses WHERE course_id IN ("
    ));
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(id);
    }
    separated.push_unseparated(")");

    query.build_query_as::<Course>().fetch_all(db).await
}

pub async fn insert_course(db: &SqlitePool, req: NewCourseRequest) -> Result<Course, sqlx::Error> {
    let course = Course {
        course_id: Uuid::new_v4().to_string(),
        calculated_clh: req.calculated_clh(),
        name: req.name,
        lecture_hours: req.lecture_hours,
        tutorial_hours: req.tutorial_hours,
        practical_hours: req.practical_hours,
        is_core: req.is_core,
        is_lab_associated: req.is_lab_associated,
        level: req.level,
        required_faculty: req.required_faculty,
    };

    sqlx::query(
        r#"
        INSERT INTO courses
            (course_id, name, lecture_hours, tutorial_hours, practical_hours,
            calculated_clh, is_core, is_lab_associated, level, required_faculty)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&course.course_id)
    .bind(&course.name)
    .bind(course.lecture_hours)
    .bind(course.tutorial_hours)
    .bind(course.practical_hours)
    .bind(course.calculated_clh)
    .bind(course.is_core)
    .bind(course.is_lab_associated)
    .bind(course.level)
    .bind(course.required_faculty)
    .execute(db)
    .await?;

    Ok(course)
}

pub async fn fetch_faculty(db: &SqlitePool) -> Result<Vec<Faculty>, sqlx::Error> {
    sqlx::query_as::<_, Faculty>(&format!(
        "SELECT {FACULTY_COLUMNS} FROM faculty ORDER BY name, staff_id"
    ))
    .fetch_all(db)
    .await
}

pub async fn find_faculty_by_id(db: &SqlitePool, id: &str) -> Result<Option<Faculty>, sqlx::Error> {
    sqlx::query_as::<_, Faculty>(&format!(
        "SELECT {FACULTY_COLUMNS} FROM faculty WHERE staff_id = ?"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn insert_faculty(db: &SqlitePool, req: NewFacultyRequest) -> Result<Faculty, sqlx::Error> {
    let faculty = Faculty {
        staff_id: req.staff_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        name: req.name,
        is_senior: req.rank.is_senior(),
        rank: req.rank,
        max_load_clh: req.max_load_clh,
        current_load_clh: req.current_load_clh,
    };

    sqlx::query(
        r#"
        INSERT INTO faculty
            (staff_id, name, rank, is_senior, max_load_clh, current_load_clh)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&faculty.staff_id)
    .bind(&faculty.name)
    .bind(faculty.rank)
    .bind(faculty.is_senior)
    .bind(faculty.max_load_clh)
    .bind(faculty.current_load_clh)
    .execute(db)
    .await?;

    Ok(faculty)
}

pub async fn fetch_preferences_for(
    db: &SqlitePool,
    staff_id: &str,
) -> Result<Vec<Preference>, sqlx::Error> {
    sqlx::query_as::<_, Preference>(
        "SELECT preference_id, staff_id, course_id, preference_rank FROM preferences WHERE staff_id = ? ORDER BY preference_rank",
    )
    .bind(staff_id)
    .fetch_all(db)
    .await
}

pub async fn fetch_all_preferences(db: &SqlitePool) -> Result<Vec<Preference>, sqlx::Error> {
    sqlx::query_as::<_, Preference>(
        "SELECT preference_id, staff_id, course_id, preference_rank FROM preferences ORDER BY staff_id, preference_rank",
    )
    .fetch_all(db)
    .await
}

/// Stores `slots` unless the faculty member already submitted this cycle.
/// Returns `false` (and writes nothing) on a repeat submission.
pub async fn insert_preferences_if_absent(
    db: &SqlitePool,
    staff_id: &str,
    slots: &PreferenceSlots,
) -> Result<bool, sqlx::Error> {
    let mut tx = db.begin().await?;
    let now = Utc::now().to_rfc3339();

    let claimed = sqlx::query(
        "INSERT INTO preference_submissions (staff_id, submitted_at) VALUES (?1, ?2) ON CONFLICT(staff_id) DO NOTHING",
    )
    .bind(staff_id)
    .bind(&now)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if claimed == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    for (rank, course_id) in slots.iter() {
        sqlx::query(
            "INSERT INTO preferences (preference_id, staff_id, course_id, preference_rank) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(staff_id)
        .bind(course_id)
        .bind(rank)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(true)
}

pub async fn clear_preferences(db: &SqlitePool, staff_id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = db.begin().await?;

    sqlx::query("DELETE FROM preferences WHERE staff_id = ?")
        .bind(staff_id)
        .execute(&mut *tx)
        .await?;
    let cleared = sqlx::query("DELETE FROM preference_submissions WHERE staff_id = ?")
        .bind(staff_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;
    Ok(cleared > 0)
}

/// Adds `added_clh` to the faculty's load and records the courses, but only
/// if the new total stays within the ceiling and none of the courses is
/// already assigned to them. Returns the new load, or `None` when the ceiling,
/// an existing assignment or a missing faculty row stopped the update.
pub async fn commit_assignment(
    db: &SqlitePool,
    staff_id: &str,
    courses: &[Course],
    added_clh: f64,
) -> Result<Option<f64>, sqlx::Error> {
    let mut tx = db.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE faculty
        SET current_load_clh = current_load_clh + ?1
        WHERE staff_id = ?2
            AND current_load_clh + ?1 <= max_load_clh
        "#,
    )
    .bind(added_clh)
    .bind(staff_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        tx.rollback().await?;
        return Ok(None);
    }

    let now = Utc::now().to_rfc3339();
    for course in courses {
        let inserted = sqlx::query(
            r#"
            INSERT INTO assignments
                (assignment_id, staff_id, course_id, calculated_clh, approved_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(staff_id)
        .bind(&course.course_id)
        .bind(course.calculated_clh)
        .bind(&now)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                tx.rollback().await?;
                return Ok(None);
            }
            Err(err) => return Err(err),
        }
    }

    let load: f64 = sqlx::query_scalar("SELECT current_load_clh FROM faculty WHERE staff_id = ?")
        .bind(staff_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Some(load))
}

pub async fn fetch_assignments(db: &SqlitePool) -> Result<Vec<AssignmentRecord>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentRecord>(
        "SELECT assignment_id, staff_id, course_id, calculated_clh, approved_at FROM assignments ORDER BY approved_at, staff_id",
    )
    .fetch_all(db)
    .await
}

/// Courses already committed to `staff_id`, in approval order.
pub async fn fetch_assigned_courses(
    db: &SqlitePool,
    staff_id: &str,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        r#"
        SELECT c.course_id, c.name, c.lecture_hours, c.tutorial_hours, c.practical_hours,
            c.calculated_clh, c.is_core, c.is_lab_associated, c.level, c.required_faculty
        FROM assignments a
        JOIN courses c ON c.course_id = a.course_id
        WHERE a.staff_id = ?
        ORDER BY a.approved_at, c.name
        "#,
    )
    .bind(staff_id)
    .fetch_all(db)
    .await
}
