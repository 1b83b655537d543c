//! Route guards, applied per handler. Each guarded handler is wrapped in
//! the `authorize` middleware with a [`Guard`] describing the role it
//! requires and the methods it governs.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use service::auth::{AuthError, Guard};

use crate::errors::ApiError;
use crate::startup::AppState;

#[derive(Clone)]
pub struct GuardContext {
    pub state: AppState,
    pub guard: Guard,
}

impl GuardContext {
    pub fn user(state: AppState, methods: &[axum::http::Method]) -> Self {
        Self {
            state,
            guard: Guard::user(methods),
        }
    }

    pub fn admin(state: AppState, methods: &[axum::http::Method]) -> Self {
        Self {
            state,
            guard: Guard::admin(methods),
        }
    }
}

/// Method gate first, then token authentication, then the role check. The
/// decoded identity is attached to the request for handlers downstream.
pub async fn authorize(
    State(ctx): State<GuardContext>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !ctx.guard.governs(req.method()) {
        return Err(ApiError::from(AuthError::Forbidden));
    }
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let identity = ctx.state.tokens.authenticate(header)?;
    ctx.guard.allows_role(identity.role)?;
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
