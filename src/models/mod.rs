pub mod assignment;
pub mod course;
pub mod faculty;
pub mod preference;

pub use assignment::{
    ApprovalResponse, AssignmentRecord, ReviewEntry, ReviewSnapshot, ToggleAction, ToggleRequest,
    ToggleResponse,
};
pub use course::{Course, CourseLevel, NewCourseRequest, contact_load_hours};
pub use faculty::{Faculty, NewFacultyRequest, Rank};
pub use preference::{
    PREFERENCE_SLOTS, Preference, PreferenceEntry, PreferenceSlots, SubmissionResponse,
    SubmitPreferencesRequest,
};
