use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

pub const STAFF_ID_HEADER: &str = "x-staff-id";
pub const ROLE_HEADER: &str = "x-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Faculty,
    Admin,
}

/// Caller identity as resolved by the upstream auth layer.
#[derive(Debug, Clone)]
pub struct Identity {
    pub staff_id: Option<String>,
    pub role: Role,
}

impl Identity {
    pub fn require_admin(&self) -> Result<(), AppError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Faculty => Err(AppError::Forbidden),
        }
    }

    pub fn faculty_id(&self) -> Result<&str, AppError> {
        match (self.role, self.staff_id.as_deref()) {
            (Role::Faculty, Some(id)) => Ok(id),
            (Role::Faculty, None) => Err(AppError::Unauthorized),
            (Role::Admin, _) => Err(AppError::Forbidden),
        }
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let role = match header(ROLE_HEADER).as_deref() {
            Some("admin") => Role::Admin,
            Some("faculty") => Role::Faculty,
            _ => return Err(AppError::Unauthorized),
        };

        Ok(Self {
            staff_id: header(STAFF_ID_HEADER),
            role,
        })
    }
}
