//! API server initialization

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use super::auth::{
    AdminOnly, AuthGate, RoleGate, RolePolicy, RoleSet, Staff, TokenKeys, require_auth,
    require_roles,
};
use super::middleware::{self, AllowedOrigins};
use super::routes::{health, identity};
use crate::core::CoreApp;

pub struct ApiServer {
    app: CoreApp,
    allowed_origins: AllowedOrigins,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        let allowed_origins = AllowedOrigins::new(&app.config.server.cors_origins);
        Self {
            app,
            allowed_origins,
        }
    }

    /// Serve until the shutdown signal fires; returns CoreApp for cleanup
    pub async fn start(self) -> Result<CoreApp> {
        let Self {
            app,
            allowed_origins,
        } = self;

        let addr = app.config.server.addr()?;
        let router = build_router(app.keys.clone(), &allowed_origins);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "Listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(app.shutdown.wait())
            .await?;

        Ok(app)
    }
}

/// Wrap `routes` in the auth gate and, when given, a role gate inside it
fn gated(routes: Router, gate: &AuthGate, roles: Option<RoleSet>) -> Router {
    let routes = match roles {
        Some(roles) => {
            routes.route_layer(from_fn_with_state(RoleGate::new(roles), require_roles))
        }
        None => routes,
    };
    routes.route_layer(from_fn_with_state(gate.clone(), require_auth))
}

/// Build the full application router
pub fn build_router(keys: Arc<TokenKeys>, allowed_origins: &AllowedOrigins) -> Router {
    let gate = AuthGate::new(keys);

    let router = Router::new()
        .route("/api/v1/health", get(health::health))
        .nest("/api/v1/auth", gated(identity::routes(), &gate, None))
        .nest(
            "/api/v1/manage",
            gated(identity::routes(), &gate, Some(Staff::ROLES)),
        )
        .nest(
            "/api/v1/admin",
            gated(identity::routes(), &gate, Some(AdminOnly::ROLES)),
        );

    with_outer_layers(router, allowed_origins)
}

/// 404 fallback, panic recovery, request tracing and CORS around `router`
fn with_outer_layers(router: Router, allowed_origins: &AllowedOrigins) -> Router {
    router
        .fallback(middleware::handle_404)
        .layer(CatchPanicLayer::custom(middleware::handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors(allowed_origins))
}
