//! Identity extractors for Axum handlers
//!
//! `Identity` reads what `require_auth` attached. `Authorized<P>` additionally
//! checks the caller's role against a policy fixed at compile time, for
//! handlers that would rather declare their roles in the signature than in
//! the router.
//!
//! ```no_run
//! # use axum::Json;
//! # use eventhub_server::api::auth::{Authorized, Staff};
//! pub async fn manage(auth: Authorized<Staff>) -> Json<String> {
//!     Json(auth.identity.subject)
//! }
//! ```

use std::marker::PhantomData;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::identity::{Identity, Role, RoleSet};
use super::middleware::{GateError, check_role};
use crate::api::types::ApiError;

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Identity>().cloned().ok_or_else(|| {
            tracing::error!(uri = %parts.uri, "Identity requested without require_auth");
            ApiError::internal("Identity context not available")
        })
    }
}

/// Marker trait naming the roles a handler accepts
pub trait RolePolicy: Send + Sync + 'static {
    const ROLES: RoleSet;
}

/// Admins only
pub struct AdminOnly;
impl RolePolicy for AdminOnly {
    const ROLES: RoleSet = RoleSet::of(&[Role::Admin]);
}

/// Admins and organizers
pub struct Staff;
impl RolePolicy for Staff {
    const ROLES: RoleSet = RoleSet::of(&[Role::Admin, Role::Organizer]);
}

/// Identity whose role satisfies policy `P`
pub struct Authorized<P: RolePolicy> {
    pub identity: Identity,
    _policy: PhantomData<P>,
}

impl<S, P> FromRequestParts<S> for Authorized<P>
where
    S: Send + Sync,
    P: RolePolicy,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = check_role(P::ROLES, parts.extensions.get::<Identity>())?;

        Ok(Self {
            identity: identity.clone(),
            _policy: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use chrono::Duration;
    use tower::ServiceExt;

    use super::*;
    use crate::api::auth::middleware::{AuthGate, require_auth};
    use crate::api::auth::token::TokenKeys;

    async fn admin_only(auth: Authorized<AdminOnly>) -> String {
        auth.identity.subject
    }

    async fn staff(auth: Authorized<Staff>) -> String {
        auth.identity.role.to_string()
    }

    struct Nobody;
    impl RolePolicy for Nobody {
        const ROLES: RoleSet = RoleSet::EMPTY;
    }

    async fn closed(auth: Authorized<Nobody>) -> String {
        auth.identity.subject
    }

    async fn plain(identity: Identity) -> String {
        identity.subject
    }

    fn keys() -> Arc<TokenKeys> {
        Arc::new(TokenKeys::new(b"extractor-secret", 0))
    }

    fn app() -> Router {
        Router::new()
            .route("/admin", get(admin_only))
            .route("/staff", get(staff))
            .route("/closed", get(closed))
            .route_layer(from_fn_with_state(AuthGate::new(keys()), require_auth))
            .route("/unguarded", get(plain))
            .route("/unguarded-admin", get(admin_only))
    }

    async fn call(uri: &str, role: Option<Role>) -> (StatusCode, String) {
        let mut req = Request::builder().uri(uri);
        if let Some(role) = role {
            let token = keys().issue("u7", role, Duration::minutes(10)).unwrap();
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let resp = app().oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_policy_sets() {
        assert_eq!(AdminOnly::ROLES, RoleSet::of(&[Role::Admin]));
        assert!(Staff::ROLES.contains(Role::Organizer));
        assert!(!Staff::ROLES.contains(Role::Participant));
    }

    #[tokio::test]
    async fn test_authorized_admin() {
        let (status, body) = call("/admin", Some(Role::Admin)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "u7");
    }

    #[tokio::test]
    async fn test_authorized_rejects_role() {
        let (status, body) = call("/admin", Some(Role::Organizer)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.contains("Required roles: admin"));
    }

    #[tokio::test]
    async fn test_staff_accepts_organizer() {
        let (status, body) = call("/staff", Some(Role::Organizer)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "organizer");
    }

    #[tokio::test]
    async fn test_identity_without_gate_is_internal_error() {
        let (status, body) = call("/unguarded", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("\"success\":false"));
    }

    #[tokio::test]
    async fn test_authorized_without_gate_is_unauthenticated() {
        let (status, body) = call("/unguarded-admin", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("User not found in request"));
    }

    #[tokio::test]
    async fn test_empty_policy_rejects_every_role() {
        for role in Role::ALL {
            let (status, body) = call("/closed", Some(role)).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
            assert!(body.contains(&format!("User role {} is not authorized", role)));
        }
    }
}
