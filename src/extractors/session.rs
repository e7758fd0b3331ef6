//! Claims placed in the request by the session middleware.

use crate::auth::{check_permission, Claims};
use crate::error::AppError;
use crate::model::Role;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

#[derive(Clone, Debug)]
pub struct Session(pub Claims);

impl Session {
    /// Forbidden unless the caller's role is one of `roles`.
    pub fn require(&self, roles: &[Role]) -> Result<&Claims, AppError> {
        check_permission(self.0.role, roles)?;
        Ok(&self.0)
    }

    pub fn claims(&self) -> &Claims {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(Session)
            .ok_or_else(|| AppError::Unauthenticated("missing session".into()))
    }
}
