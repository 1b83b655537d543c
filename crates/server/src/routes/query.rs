//! Query dispatch to registered backends.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{Map, Value};
use service::auth::Identity;
use service::dispatch::DispatchOutcome;

use crate::errors::ApiError;
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryBody {
    pub options: Option<Map<String, Value>>,
}

pub async fn dispatch(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((service_type, version, task)): Path<(String, String, String)>,
    Json(body): Json<QueryBody>,
) -> Result<Json<DispatchOutcome>, ApiError> {
    let outcome = state
        .dispatcher
        .dispatch(
            &state.db,
            &identity,
            &service_type,
            &version,
            &task,
            body.options,
        )
        .await?;
    Ok(Json(outcome))
}
