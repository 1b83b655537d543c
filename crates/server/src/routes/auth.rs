//! Account registration, login and lifecycle.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use models::types::Role;
use serde::Deserialize;
use serde_json::{json, Value};
use service::auth::domain::{LoginInput, RegisterInput};
use service::auth::repo::seaorm::SeaOrmAccountRepository;
use service::auth::service::AccountService;
use service::auth::Identity;

use crate::errors::ApiError;
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub department: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ExtendBody {
    pub extension: i64,
}

fn accounts(state: &AppState) -> AccountService<SeaOrmAccountRepository> {
    AccountService::new(
        SeaOrmAccountRepository::new(state.db.clone()),
        state.tokens.clone(),
    )
}

async fn do_register(
    state: AppState,
    role: Role,
    body: RegisterBody,
) -> Result<Json<Value>, ApiError> {
    let profile = accounts(&state)
        .register(
            role,
            RegisterInput {
                username: body.username,
                name: body.name,
                email: body.email,
                password: body.password,
                department: body.department,
            },
        )
        .await?;
    Ok(Json(json!({
        "message": "Account registered.",
        "account": profile,
    })))
}

async fn do_login(state: AppState, role: Role, body: LoginBody) -> Result<Json<Value>, ApiError> {
    let session = accounts(&state)
        .login(
            role,
            LoginInput {
                username: body.username,
                password: body.password,
            },
        )
        .await?;
    Ok(Json(json!({
        "accessToken": session.access_token,
        "account": session.profile,
    })))
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<Json<Value>, ApiError> {
    do_register(state, Role::User, body).await
}

pub async fn admin_register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<Json<Value>, ApiError> {
    do_register(state, Role::Admin, body).await
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<Value>, ApiError> {
    do_login(state, Role::User, body).await
}

pub async fn admin_login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<Value>, ApiError> {
    do_login(state, Role::Admin, body).await
}

pub async fn extend_subscription(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(body): Json<ExtendBody>,
) -> Result<Json<Value>, ApiError> {
    let profile = accounts(&state)
        .extend_subscription(&username, body.extension)
        .await?;
    Ok(Json(json!({
        "message": "Subscription extended.",
        "account": profile,
    })))
}

pub async fn remove_account(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    accounts(&state)
        .remove_account(&identity, Role::User, &username)
        .await?;
    Ok(Json(json!({ "message": "Account removed." })))
}
