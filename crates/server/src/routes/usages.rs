//! Usage ledger queries.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use service::auth::Identity;
use service::usage::{self, UsageFilter};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::startup::AppState;

/// Filter parameters arrive as strings; numbers and booleans are parsed
/// here so a malformed value is a 400, not a silently dropped filter.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageListQuery {
    #[serde(rename = "type")]
    pub service_type: Option<String>,
    pub version: Option<String>,
    pub execution_time: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub timezone: Option<String>,
    pub return_del_user: Option<String>,
    pub return_del_service: Option<String>,
}

fn parse_flag(raw: Option<&str>, name: &str) -> Result<bool, ApiError> {
    match raw {
        None => Ok(false),
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(ApiError::bad_request(format!(
            "Invalid value '{other}' for '{name}'. Expected 'true' or 'false'."
        ))),
    }
}

impl UsageListQuery {
    fn into_filter(self) -> Result<UsageFilter, ApiError> {
        let max_execution_time = self
            .execution_time
            .map(|raw| {
                raw.parse::<f64>().map_err(|_| {
                    ApiError::bad_request(format!(
                        "Invalid execution time '{raw}'. Expected a number of seconds."
                    ))
                })
            })
            .transpose()?;
        let timezone_offset = self
            .timezone
            .map(|raw| {
                raw.parse::<f64>().map_err(|_| {
                    ApiError::bad_request(format!(
                        "Invalid timezone '{raw}'. Expected an offset from UTC in hours."
                    ))
                })
            })
            .transpose()?
            .unwrap_or(0.0);
        let include_deleted_user = parse_flag(self.return_del_user.as_deref(), "returnDelUser")?;
        let include_deleted_service =
            parse_flag(self.return_del_service.as_deref(), "returnDelService")?;
        Ok(UsageFilter {
            service_type: self.service_type,
            version: self.version,
            max_execution_time,
            start_date: self.start_date,
            end_date: self.end_date,
            timezone_offset,
            include_deleted_user,
            include_deleted_service,
        })
    }
}

fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError::bad_request(format!("Invalid {what} '{raw}'. Expected a UUID.")))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<UsageListQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter = query.into_filter()?;
    let usages = usage::list_usages(&state.db, &identity, filter).await?;
    Ok(Json(json!({ "usages": usages })))
}

pub async fn get_one(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(uuid): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let uuid = parse_uuid(&uuid, "usage id")?;
    let record = usage::get_usage(&state.db, uuid).await?;
    usage::authorize_record(&identity, &record.model)?;
    Ok(Json(json!({ "usage": record.into_view() })))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(uuid): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let uuid = parse_uuid(&uuid, "usage id")?;
    usage::delete_usage(&state.db, &identity, uuid).await?;
    Ok(Json(json!({ "message": "Usage deleted." })))
}

pub async fn purge(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user_id = parse_uuid(&user_id, "user id")?;
    let removed = usage::purge_usages(&state.db, user_id).await?;
    Ok(Json(json!({
        "message": "Usage records purged.",
        "removed": removed,
    })))
}
