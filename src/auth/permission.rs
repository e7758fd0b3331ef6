use crate::error::AppError;
use crate::model::Role;

/// Roles allowed on each route group.
pub const CONTROL_ONLY: &[Role] = &[Role::Control];
pub const EXEC_ONLY: &[Role] = &[Role::Exec];
pub const TRACE_ONLY: &[Role] = &[Role::Trace];
pub const CONTROL_OR_TRACE: &[Role] = &[Role::Control, Role::Trace];
pub const EXEC_OR_TRACE: &[Role] = &[Role::Exec, Role::Trace];
pub const ANY_ROLE: &[Role] = &[Role::Control, Role::Exec, Role::Trace];

/// Forbidden unless `role` is one of `required`.
pub fn check_permission(role: Role, required: &[Role]) -> Result<(), AppError> {
    if required.contains(&role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("role {} may not perform this operation", role)))
    }
}
