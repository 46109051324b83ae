use faculty_allocation::db::repository;
use faculty_allocation::error::AppError;
use faculty_allocation::models::{
    Course, CourseLevel, Faculty, NewCourseRequest, NewFacultyRequest, PreferenceEntry, Rank,
    SubmitPreferencesRequest, ToggleAction, ToggleRequest,
};
use faculty_allocation::allocation::RuleSet;
use faculty_allocation::state::AppState;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

async fn setup() -> (SqlitePool, AppState) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let state = AppState::new(pool.clone(), RuleSet::default());
    (pool, state)
}

async fn add_course(pool: &SqlitePool, name: &str, l: i64, t: i64, p: i64, is_core: bool, is_lab: bool) -> Course {
    repository::insert_course(
        pool,
        NewCourseRequest {
            name: name.to_string(),
            lecture_hours: l,
            tutorial_hours: t,
            practical_hours: p,
            is_core,
            is_lab_associated: is_lab,
            level: CourseLevel::Undergraduate,
            required_faculty: 1,
        },
    )
    .await
    .expect("Failed to insert course")
}

async fn add_faculty(pool: &SqlitePool, name: &str, rank: Rank, current: f64) -> Faculty {
    repository::insert_faculty(
        pool,
        NewFacultyRequest {
            staff_id: None,
            name: name.to_string(),
            rank,
            max_load_clh: 14.0,
            current_load_clh: current,
        },
    )
    .await
    .expect("Failed to insert faculty")
}

fn submission(entries: &[(&Course, i64)]) -> SubmitPreferencesRequest {
    SubmitPreferencesRequest {
        preferences: entries
            .iter()
            .map(|(c, rank)| PreferenceEntry {
                course_id: c.course_id.clone(),
                preference_rank: *rank,
            })
            .collect(),
    }
}

fn toggle(course: &Course, action: ToggleAction) -> ToggleRequest {
    ToggleRequest {
        course_id: course.course_id.clone(),
        action,
    }
}

#[tokio::test]
async fn test_second_submission_is_rejected_without_writes() {
    let (pool, state) = setup().await;
    let faculty = add_faculty(&pool, "Dr. Sarah Johnson", Rank::AssociateProfessor, 0.0).await;
    let ds = add_course(&pool, "Data Structures", 3, 0, 2, true, false).await;
    let algo = add_course(&pool, "Algorithms", 3, 1, 0, true, false).await;
    let service = state.preference_service();

    let first = service
        .submit(&faculty.staff_id, submission(&[(&ds, 1), (&algo, 2)]))
        .await
        .expect("First submission should pass");
    assert!(first.success);
    assert!(first.warnings.is_empty());

    let second = service
        .submit(&faculty.staff_id, submission(&[(&algo, 1)]))
        .await;
    assert!(matches!(second, Err(AppError::AlreadySubmitted)));

    let stored = service.preferences(&faculty.staff_id).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].course_id, ds.course_id);
}

#[tokio::test]
async fn test_duplicate_ranks_insert_nothing() {
    let (pool, state) = setup().await;
    let faculty = add_faculty(&pool, "Dr. Emily Watson", Rank::AssistantProfessor, 0.0).await;
    let a = add_course(&pool, "Data Structures", 3, 0, 2, true, false).await;
    let b = add_course(&pool, "Algorithms", 3, 1, 0, true, false).await;
    let c = add_course(&pool, "Operating Systems", 2, 1, 0, true, false).await;
    let service = state.preference_service();

    let result = service
        .submit(&faculty.staff_id, submission(&[(&a, 1), (&b, 1), (&c, 2)]))
        .await;
    match result {
        Err(AppError::ValidationFailed(errors)) => {
            assert_eq!(errors, vec!["Duplicate preference rank 1".to_string()]);
        }
        other => panic!("expected validation failure, got {:?}", other),
    }

    assert!(service.preferences(&faculty.staff_id).await.unwrap().is_empty());
    // Still allowed to submit a corrected list.
    service
        .submit(&faculty.staff_id, submission(&[(&a, 1), (&b, 2), (&c, 3)]))
        .await
        .expect("Corrected submission should pass");
}

#[tokio::test]
async fn test_submission_warnings_and_unknown_courses() {
    let (pool, state) = setup().await;
    let faculty = add_faculty(&pool, "Dr. Lisa Anderson", Rank::AssistantProfessor, 0.0).await;
    let cloud = add_course(&pool, "Cloud Computing", 3, 1, 2, false, false).await;
    let service = state.preference_service();

    let bogus = SubmitPreferencesRequest {
        preferences: vec![PreferenceEntry {
            course_id: "no-such-course".to_string(),
            preference_rank: 1,
        }],
    };
    assert!(matches!(
        service.submit(&faculty.staff_id, bogus).await,
        Err(AppError::NotFound)
    ));

    let response = service
        .submit(&faculty.staff_id, submission(&[(&cloud, 1)]))
        .await
        .unwrap();
    assert_eq!(response.warnings.len(), 2);

    assert!(matches!(
        service.submit("nobody", submission(&[(&cloud, 1)])).await,
        Err(AppError::NotFound)
    ));
}

#[tokio::test]
async fn test_admin_clear_reopens_submission() {
    let (pool, state) = setup().await;
    let faculty = add_faculty(&pool, "Prof. Rajesh Kumar", Rank::Professor, 0.0).await;
    let sp = add_course(&pool, "Signal Processing", 3, 0, 2, true, true).await;
    let service = state.preference_service();

    service.submit(&faculty.staff_id, submission(&[(&sp, 1)])).await.unwrap();
    service.clear(&faculty.staff_id).await.unwrap();
    assert!(matches!(service.clear(&faculty.staff_id).await, Err(AppError::NotFound)));
    service.submit(&faculty.staff_id, submission(&[(&sp, 2)])).await.unwrap();
}

#[tokio::test]
async fn test_assign_then_unassign_records_nothing() {
    let (pool, state) = setup().await;
    let faculty = add_faculty(&pool, "Prof. Michael Chen", Rank::Professor, 6.0).await;
    let ml = add_course(&pool, "Machine Learning", 3, 1, 2, true, false).await;
    let review = state.review_service();

    let assigned = review
        .toggle(&faculty.staff_id, toggle(&ml, ToggleAction::Assign))
        .await
        .unwrap();
    assert_eq!(assigned.session.tentative_courses, vec![ml.course_id.clone()]);
    assert_eq!(assigned.session.projected_clh, 11.0);

    let unassigned = review
        .toggle(&faculty.staff_id, toggle(&ml, ToggleAction::Unassign))
        .await
        .unwrap();
    assert!(unassigned.session.tentative_courses.is_empty());
    assert_eq!(unassigned.session.projected_clh, 6.0);

    let stored = repository::find_faculty_by_id(&pool, &faculty.staff_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.current_load_clh, 6.0);
    assert!(review.assignments().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_approval_commits_load_once() {
    let (pool, state) = setup().await;
    let faculty = add_faculty(&pool, "Prof. Michael Chen", Rank::Professor, 0.0).await;
    let ds = add_course(&pool, "Data Structures", 3, 0, 2, true, false).await;
    let web = add_course(&pool, "Web Development", 2, 1, 2, false, true).await;
    let vlsi = add_course(&pool, "VLSI Design", 2, 1, 4, false, true).await;
    let review = state.review_service();

    review.toggle(&faculty.staff_id, toggle(&ds, ToggleAction::Assign)).await.unwrap();
    review.toggle(&faculty.staff_id, toggle(&web, ToggleAction::Assign)).await.unwrap();

    let rejected = review
        .toggle(&faculty.staff_id, toggle(&vlsi, ToggleAction::Assign))
        .await;
    assert!(matches!(rejected, Err(AppError::ValidationFailed(_))));
    assert_eq!(review.session().await.session.tentative_courses.len(), 2);

    let approval = review.approve(&faculty.staff_id).await.unwrap();
    assert_eq!(approval.added_clh, 8.0);
    assert_eq!(approval.committed_load_clh, 8.0);
    assert_eq!(review.session().await.session.staff_id, None);

    assert!(matches!(
        review.approve(&faculty.staff_id).await,
        Err(AppError::ApprovalBlocked(_))
    ));
    assert_eq!(review.assignments().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_committed_courses_carry_into_later_sessions() {
    let (pool, state) = setup().await;
    let faculty = add_faculty(&pool, "Prof. Michael Chen", Rank::Professor, 0.0).await;
    let web = add_course(&pool, "Web Development", 2, 1, 2, false, true).await;
    let networks = add_course(&pool, "Computer Networks", 2, 0, 4, true, true).await;
    let ds = add_course(&pool, "Data Structures", 3, 0, 2, true, false).await;
    let review = state.review_service();

    review.toggle(&faculty.staff_id, toggle(&web, ToggleAction::Assign)).await.unwrap();
    review.approve(&faculty.staff_id).await.unwrap();

    let opened = review.select(&faculty.staff_id).await.unwrap();
    assert_eq!(opened.session.committed_courses, vec![web.course_id.clone()]);
    assert_eq!(opened.session.committed_clh, 4.0);

    let again = review
        .toggle(&faculty.staff_id, toggle(&web, ToggleAction::Assign))
        .await;
    assert!(matches!(again, Err(AppError::Conflict(_))), "{:?}", again);

    let second_lab = review
        .toggle(&faculty.staff_id, toggle(&networks, ToggleAction::Assign))
        .await;
    match second_lab {
        Err(AppError::ValidationFailed(errors)) => {
            assert!(errors[0].contains("lab-associated"), "{:?}", errors);
        }
        other => panic!("expected the second lab to be rejected, got {:?}", other),
    }

    let session = review.session().await.session;
    assert_eq!(session.committed_courses, vec![web.course_id.clone()]);
    assert!(session.tentative_courses.is_empty());

    review.toggle(&faculty.staff_id, toggle(&ds, ToggleAction::Assign)).await.unwrap();
    let approval = review.approve(&faculty.staff_id).await.unwrap();
    assert_eq!(approval.committed_load_clh, 8.0);

    let records = review.assignments().await.unwrap();
    let mut courses: Vec<&str> = records.iter().map(|r| r.course_id.as_str()).collect();
    courses.sort_unstable();
    let mut expected = vec![web.course_id.as_str(), ds.course_id.as_str()];
    expected.sort_unstable();
    assert_eq!(courses, expected);
}

#[tokio::test]
async fn test_approval_blocked_when_load_moved_underneath() {
    let (pool, state) = setup().await;
    let faculty = add_faculty(&pool, "Dr. Emily Watson", Rank::AssistantProfessor, 4.0).await;
    let ml = add_course(&pool, "Machine Learning", 3, 1, 2, true, false).await;
    let review = state.review_service();

    review.toggle(&faculty.staff_id, toggle(&ml, ToggleAction::Assign)).await.unwrap();

    sqlx::query("UPDATE faculty SET current_load_clh = 12 WHERE staff_id = ?")
        .bind(&faculty.staff_id)
        .execute(&pool)
        .await
        .unwrap();

    match review.approve(&faculty.staff_id).await {
        Err(AppError::ApprovalBlocked(errors)) => {
            assert_eq!(errors, vec!["Exceeds max load: 17/14 CLH".to_string()]);
        }
        other => panic!("expected approval to be blocked, got {:?}", other),
    }
    // Session survives so the admin can adjust it.
    assert_eq!(
        review.session().await.session.staff_id.as_deref(),
        Some(faculty.staff_id.as_str())
    );
}

#[tokio::test]
async fn test_review_queue_order() {
    let (pool, state) = setup().await;
    let asst = add_faculty(&pool, "A Assistant", Rank::AssistantProfessor, 0.0).await;
    let prof_heavy = add_faculty(&pool, "B Professor", Rank::Professor, 10.0).await;
    let prof_light = add_faculty(&pool, "C Professor", Rank::Professor, 6.0).await;
    let assoc = add_faculty(&pool, "D Associate", Rank::AssociateProfessor, 0.0).await;
    let course = add_course(&pool, "Algorithms", 3, 1, 0, true, false).await;
    let prefs = state.preference_service();

    for f in [&asst, &prof_heavy, &prof_light, &assoc] {
        prefs.submit(&f.staff_id, submission(&[(&course, 1)])).await.unwrap();
    }

    let queue = state.review_service().queue().await.unwrap();
    let order: Vec<&str> = queue.iter().map(|e| e.faculty.name.as_str()).collect();
    assert_eq!(order, vec!["C Professor", "B Professor", "D Associate", "A Assistant"]);
}
