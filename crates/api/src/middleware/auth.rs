//! # Authentication Module
//!
//! Every protected handler takes an [`AuthContext`]. Extracting one reads the
//! `Authorization: Bearer <token>` header, asks the account service to
//! introspect the token and turns the answer into a [`Principal`]. The raw
//! token is kept so later directory lookups can forward it.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use clinic_schedule_core::{auth::Principal, errors::ScheduleError};
use tracing::debug;

use crate::{middleware::error_handling::AppError, ApiState};

/// Authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal: Principal,
    pub token: String,
}

impl AuthContext {
    pub fn new(principal: Principal, token: impl Into<String>) -> Self {
        Self {
            principal,
            token: token.into(),
        }
    }

    pub fn username(&self) -> &str {
        self.principal.username()
    }
}

/// Pulls the token out of an `Authorization` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                ScheduleError::Authentication("Missing Authorization header".to_string())
            })?;

        let token = bearer_token(header).ok_or_else(|| {
            ScheduleError::Authentication("Authorization header must be 'Bearer <token>'".to_string())
        })?;

        let info = state
            .directory
            .introspect_token(token)
            .await?
            .ok_or_else(|| ScheduleError::Authentication("Invalid or expired token".to_string()))?;

        let principal = Principal::from(&info);
        debug!("Authenticated {} with roles {:?}", principal.username(), principal.roles());

        Ok(AuthContext::new(principal, token))
    }
}
