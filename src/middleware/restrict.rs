use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

use crate::error::ApiError;
use crate::types::Role;

use super::auth::CurrentUser;

/// The set of roles allowed through one route
#[derive(Debug, Clone)]
pub struct RoleGate {
    allowed: Arc<HashSet<Role>>,
}

impl RoleGate {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self { allowed: Arc::new(roles.into_iter().collect()) }
    }

    pub fn allows(&self, role: Role) -> bool {
        self.allowed.contains(&role)
    }
}

/// Must run after [`super::auth::protect`]
pub async fn restrict_to(State(gate): State<RoleGate>, request: Request, next: Next) -> Result<Response, ApiError> {
    let Some(CurrentUser(user)) = request.extensions().get::<CurrentUser>() else {
        return Err(ApiError::unauthorized("You are not logged in! Please log in to get access."));
    };

    if !gate.allows(user.role) {
        warn!("{} ({}) denied {} {}", user.email, user.role, request.method(), request.uri().path());
        return Err(ApiError::forbidden("You do not have permission to perform this action"));
    }

    Ok(next.run(request).await)
}

/// Wrap every method of `route` in a gate admitting only `roles`
pub fn gated<S>(route: MethodRouter<S>, roles: &[Role]) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.route_layer(middleware::from_fn_with_state(RoleGate::new(roles.iter().copied()), restrict_to))
}
