pub mod identity;

use axum::Json;
use axum::extract::Path;
use axum::routing::{delete, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use tracing::info;

use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

pub use identity::{Identity, Role};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/courses", get(list_courses).post(create_course))
        .route("/faculty", get(list_faculty).post(create_faculty))
        .route("/preferences", get(my_preferences).post(submit_preferences))
        .route("/admin/review", get(review_queue))
        .route("/admin/review/session", get(review_session).delete(cancel_review))
        .route("/admin/review/{staff_id}", post(select_faculty))
        .route("/admin/review/{staff_id}/toggle", post(toggle_assignment))
        .route("/admin/review/{staff_id}/approve", post(approve_assignment))
        .route("/admin/faculty/{staff_id}/preferences", delete(clear_preferences))
        .route("/admin/assignments", get(list_assignments))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, AppError> {
    let courses = state.catalog.courses().await?;
    Ok(Json(courses))
}

async fn create_course(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<NewCourseRequest>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    identity.require_admin()?;
    req.check().map_err(AppError::BadRequest)?;
    let course = repository::insert_course(&state.db, req).await?;
    info!("Created course {} ({} CLH)", course.name, course.calculated_clh);
    Ok((StatusCode::CREATED, Json(course)))
}

async fn list_faculty(State(state): State<AppState>) -> Result<Json<Vec<Faculty>>, AppError> {
    let faculty = state.catalog.all_faculty().await?;
    Ok(Json(faculty))
}

async fn create_faculty(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<NewFacultyRequest>,
) -> Result<(StatusCode, Json<Faculty>), AppError> {
    identity.require_admin()?;
    req.check().map_err(AppError::BadRequest)?;
    let requested_id = req.staff_id.clone();
    let faculty = repository::insert_faculty(&state.db, req)
        .await
        .map_err(|err| match requested_id {
            Some(id) if repository::is_unique_violation(&err) => {
                AppError::Conflict(format!("faculty {} already exists", id))
            }
            _ => AppError::from(err),
        })?;
    info!("Created faculty {} ({:?})", faculty.name, faculty.rank);
    Ok((StatusCode::CREATED, Json(faculty)))
}

async fn submit_preferences(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<SubmitPreferencesRequest>,
) -> Result<(StatusCode, Json<SubmissionResponse>), AppError> {
    let staff_id = identity.faculty_id()?;
    let response = state.preference_service().submit(staff_id, req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn my_preferences(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<Preference>>, AppError> {
    let staff_id = identity.faculty_id()?;
    let preferences = state.preference_service().preferences(staff_id).await?;
    Ok(Json(preferences))
}

async fn review_queue(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<ReviewEntry>>, AppError> {
    identity.require_admin()?;
    let queue = state.review_service().queue().await?;
    Ok(Json(queue))
}

async fn review_session(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<ToggleResponse>, AppError> {
    identity.require_admin()?;
    Ok(Json(state.review_service().session().await))
}

async fn cancel_review(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<StatusCode, AppError> {
    identity.require_admin()?;
    state.review_service().cancel().await;
    Ok(StatusCode::NO_CONTENT)
}

async fn select_faculty(
    State(state): State<AppState>,
    identity: Identity,
    Path(staff_id): Path<String>,
) -> Result<Json<ToggleResponse>, AppError> {
    identity.require_admin()?;
    let response = state.review_service().select(&staff_id).await?;
    Ok(Json(response))
}

async fn toggle_assignment(
    State(state): State<AppState>,
    identity: Identity,
    Path(staff_id): Path<String>,
    Json(req): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, AppError> {
    identity.require_admin()?;
    let response = state.review_service().toggle(&staff_id, req).await?;
    Ok(Json(response))
}

async fn approve_assignment(
    State(state): State<AppState>,
    identity: Identity,
    Path(staff_id): Path<String>,
) -> Result<Json<ApprovalResponse>, AppError> {
    identity.require_admin()?;
    let response = state.review_service().approve(&staff_id).await?;
    Ok(Json(response))
}

async fn clear_preferences(
    State(state): State<AppState>,
    identity: Identity,
    Path(staff_id): Path<String>,
) -> Result<StatusCode, AppError> {
    identity.require_admin()?;
    state.preference_service().clear(&staff_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_assignments(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<AssignmentRecord>>, AppError> {
    identity.require_admin()?;
    let assignments = state.review_service().assignments().await?;
    Ok(Json(assignments))
}
