pub mod preference_service;
pub mod review_service;

pub use preference_service::PreferenceService;
pub use review_service::ReviewService;
