//! Authentication and role middleware

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::identity::{Identity, Role, RoleSet};
use super::token::{TokenError, TokenKeys};
use crate::api::types::ErrorBody;
use crate::core::constants::BEARER_PREFIX;

/// Gate failure, rendered as the `{ success: false, message }` envelope
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("Not authorized to access this route - No token provided")]
    MissingCredential,

    #[error("Not authorized to access this route - Invalid token")]
    InvalidCredential,

    /// Role check ran on a route where the auth gate was not layered
    #[error("Not authorized to access this route - User not found in request")]
    MissingIdentityContext,

    #[error(
        "User role {role} is not authorized to access this route. Required roles: {required}"
    )]
    InsufficientRole { role: Role, required: RoleSet },
}

impl GateError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InsufficientRole { .. } => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

/// Shared state for `require_auth`
#[derive(Debug, Clone)]
pub struct AuthGate {
    keys: Arc<TokenKeys>,
}

impl AuthGate {
    pub fn new(keys: Arc<TokenKeys>) -> Self {
        Self { keys }
    }

    /// Verify a raw `Authorization` header value and derive the caller identity
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Identity, GateError> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or(GateError::MissingCredential)?;

        match self.keys.verify(token) {
            Ok(claims) => {
                tracing::trace!(subject = %claims.sub, role = %claims.role, "Token verified");
                Ok(claims.identity())
            }
            Err(e) => {
                match e {
                    TokenError::Expired => {
                        tracing::debug!(reason = e.reason(), "Rejected expired token")
                    }
                    _ => tracing::warn!(reason = e.reason(), error = %e, "Rejected token"),
                }
                Err(GateError::InvalidCredential)
            }
        }
    }
}

/// Extract the token from `Bearer <token>`
///
/// Only the first space-separated segment after the scheme is used; an empty
/// segment counts as no token at all.
fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix(BEARER_PREFIX)
        .and_then(|rest| rest.split(' ').next())
        .filter(|token| !token.is_empty())
}

/// Authentication middleware
///
/// Injects `Identity` into request extensions on success. Responses produced
/// downstream are passed back untouched.
pub async fn require_auth(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, GateError> {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let identity = gate.authenticate(authorization)?;
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Shared state for `require_roles`
#[derive(Debug, Clone, Copy)]
pub struct RoleGate {
    permitted: RoleSet,
}

impl RoleGate {
    pub fn new(permitted: RoleSet) -> Self {
        if permitted.is_empty() {
            tracing::warn!("Role gate has no permitted roles and will reject every request");
        }
        Self { permitted }
    }

    pub fn permitted(&self) -> RoleSet {
        self.permitted
    }

    pub fn authorize(&self, identity: Option<&Identity>) -> Result<(), GateError> {
        check_role(self.permitted, identity).map(|_| ())
    }
}

/// Role check shared by `RoleGate` and the `Authorized` extractor
pub(super) fn check_role(
    permitted: RoleSet,
    identity: Option<&Identity>,
) -> Result<&Identity, GateError> {
    let identity = identity.ok_or(GateError::MissingIdentityContext)?;

    if !permitted.contains(identity.role) {
        tracing::debug!(
            subject = %identity.subject,
            role = %identity.role,
            required = %permitted,
            "Role not permitted"
        );
        return Err(GateError::InsufficientRole {
            role: identity.role,
            required: permitted,
        });
    }

    Ok(identity)
}

/// Role middleware, layered inside `require_auth`
pub async fn require_roles(
    State(gate): State<RoleGate>,
    request: Request,
    next: Next,
) -> Result<Response, GateError> {
    let identity = request.extensions().get::<Identity>();
    if identity.is_none() {
        tracing::error!(uri = %request.uri(), "Role gate reached without an identity");
    }
    gate.authorize(identity)?;

    Ok(next.run(request).await)
}
