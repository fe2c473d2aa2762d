//! Caller identity endpoints
//!
//! These echo the identity the gates derived from the token. Each router is
//! returned unguarded; the server decides which gates wrap it.

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::api::auth::{Identity, Role};

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub user: MeUser,
}

#[derive(Debug, Serialize)]
pub struct MeUser {
    pub id: String,
    pub role: Role,
}

impl From<Identity> for MeResponse {
    fn from(identity: Identity) -> Self {
        Self {
            success: true,
            user: MeUser {
                id: identity.subject,
                role: identity.role,
            },
        }
    }
}

/// Return the authenticated caller
pub async fn me(identity: Identity) -> Json<MeResponse> {
    Json(identity.into())
}

pub fn routes() -> Router {
    Router::new().route("/me", get(me))
}
