pub mod auth;
pub mod query;
pub mod services;
pub mod usages;

use axum::handler::Handler;
use axum::http::Method;
use axum::routing::{delete, get, post, put};
use axum::{middleware, Json, Router};
use common::types::Health;

use crate::guards::{authorize, GuardContext};
use crate::startup::AppState;

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub fn router(state: AppState) -> Router {
    let user_gate = |methods: &[Method]| {
        middleware::from_fn_with_state(GuardContext::user(state.clone(), methods), authorize)
    };
    let admin_gate = |methods: &[Method]| {
        middleware::from_fn_with_state(GuardContext::admin(state.clone(), methods), authorize)
    };

    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/admin/login", post(auth::admin_login))
        .route(
            "/auth/admin/register",
            post(auth::admin_register.layer(admin_gate(&[Method::POST]))),
        )
        .route(
            "/auth/:username/extend-subscription",
            put(auth::extend_subscription.layer(admin_gate(&[Method::PUT]))),
        )
        .route(
            "/auth/:username",
            delete(auth::remove_account.layer(user_gate(&[Method::DELETE]))),
        )
        .route(
            "/services",
            get(services::list.layer(user_gate(&[Method::GET])))
                .post(services::create.layer(admin_gate(&[Method::POST]))),
        )
        .route(
            "/services/types",
            get(services::list_types.layer(user_gate(&[Method::GET]))),
        )
        .route(
            "/services/:type/versions",
            get(services::list_versions.layer(user_gate(&[Method::GET]))),
        )
        .route(
            "/services/:type/:version",
            get(services::get_one.layer(user_gate(&[Method::GET])))
                .put(services::update.layer(admin_gate(&[Method::PUT])))
                .delete(services::remove.layer(admin_gate(&[Method::DELETE]))),
        )
        .route(
            "/services/:type/:version/endpoints",
            get(services::list_endpoints.layer(user_gate(&[Method::GET])))
                .post(services::add_endpoint.layer(admin_gate(&[Method::POST]))),
        )
        .route(
            "/services/:type/:version/endpoints/:task",
            get(services::get_endpoint.layer(user_gate(&[Method::GET])))
                .put(services::update_endpoint.layer(admin_gate(&[Method::PUT])))
                .delete(services::remove_endpoint.layer(admin_gate(&[Method::DELETE]))),
        )
        .route(
            "/query/:type/:version/:task",
            post(query::dispatch.layer(user_gate(&[Method::POST]))),
        )
        .route("/usages", get(usages::list.layer(user_gate(&[Method::GET]))))
        .route(
            "/usages/purge/:user_id",
            delete(usages::purge.layer(admin_gate(&[Method::DELETE]))),
        )
        .route(
            "/usages/:uuid",
            get(usages::get_one.layer(user_gate(&[Method::GET])))
                .delete(usages::remove.layer(user_gate(&[Method::DELETE]))),
        )
        .with_state(state)
}
