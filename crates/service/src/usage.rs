//! Usage ledger: querying and pruning the records the dispatcher writes.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::auth::Identity;
use crate::errors::ServiceError;
use models::{admin, service, usage, user};

/// Ledger query as supplied by the caller. All filters are optional; a
/// filter that is absent does not constrain the result set.
#[derive(Debug, Clone, Default)]
pub struct UsageFilter {
    pub service_type: Option<String>,
    pub version: Option<String>,
    pub max_execution_time: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Caller-local offset from UTC in hours; may be fractional (e.g. 5.5).
    pub timezone_offset: f64,
    pub include_deleted_user: bool,
    pub include_deleted_service: bool,
}

/// A ledger record with its references re-resolved at read time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageView {
    pub uuid: Uuid,
    pub execution_time: f64,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
    pub date_time: DateTime<Utc>,
    pub service_type: String,
    pub service_version: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub service_deleted: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub user_deleted: bool,
}

/// Record plus reference-liveness flags, before ownership is applied.
#[derive(Debug, Clone)]
pub struct UsageRecord {
    pub model: usage::Model,
    pub service_deleted: bool,
    pub user_deleted: bool,
}

impl UsageRecord {
    pub fn into_view(self) -> UsageView {
        UsageView {
            uuid: self.model.id,
            execution_time: self.model.execution_time,
            output: self.model.output,
            options: self.model.options,
            date_time: self.model.date_time.to_utc(),
            service_type: self.model.service_type,
            service_version: self.model.service_version,
            service_deleted: self.service_deleted,
            user_deleted: self.user_deleted,
        }
    }
}

/// Parse a date bound: a bare `YYYY-MM-DD` expands to the start or end of
/// that day, otherwise a full datetime with a space or `T` separator.
pub(crate) fn parse_bound(raw: &str, is_end: bool) -> Result<NaiveDateTime, ServiceError> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let time = if is_end {
            chrono::NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(chrono::NaiveTime::MIN)
        } else {
            chrono::NaiveTime::MIN
        };
        return Ok(date.and_time(time));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| {
            ServiceError::BadRequest(format!(
                "Invalid date '{raw}'. Expected 'YYYY-MM-DD' or 'YYYY-MM-DD HH:MM:SS'."
            ))
        })
}

/// Shift a caller-local boundary to UTC. The offset's whole part is hours
/// and the fractional part is converted to minutes, both subtracted from
/// the naive timestamp.
pub(crate) fn shift_to_utc(local: NaiveDateTime, offset_hours: f64) -> DateTime<Utc> {
    let hours = offset_hours.trunc() as i64;
    let minutes = (offset_hours.fract() * 60.0).round() as i64;
    (local - Duration::hours(hours) - Duration::minutes(minutes)).and_utc()
}

fn resolve_bound(
    raw: Option<&str>,
    is_end: bool,
    offset_hours: f64,
) -> Result<Option<DateTime<Utc>>, ServiceError> {
    raw.map(|r| parse_bound(r, is_end).map(|naive| shift_to_utc(naive, offset_hours)))
        .transpose()
}

/// Re-resolve a record's references. When the service still exists its
/// current type and version replace the dispatch-time snapshot.
async fn reconcile(
    db: &DatabaseConnection,
    mut model: usage::Model,
) -> Result<UsageRecord, ServiceError> {
    let live = service::find_by_id(db, model.service_id).await?;
    let service_deleted = match live {
        Some(svc) => {
            model.service_type = svc.service_type;
            model.service_version = svc.version;
            false
        }
        None => true,
    };
    let user_deleted = if model.is_admin_query {
        admin::find_by_id(db, model.user_id).await?.is_none()
    } else {
        user::find_by_id(db, model.user_id).await?.is_none()
    };
    Ok(UsageRecord {
        model,
        service_deleted,
        user_deleted,
    })
}

/// List ledger records visible to the caller. Non-admins only ever see
/// their own records.
#[instrument(skip(db, caller, filter), fields(caller_id = %caller.id))]
pub async fn list_usages(
    db: &DatabaseConnection,
    caller: &Identity,
    filter: UsageFilter,
) -> Result<Vec<UsageView>, ServiceError> {
    let start = resolve_bound(filter.start_date.as_deref(), false, filter.timezone_offset)?;
    let end = resolve_bound(filter.end_date.as_deref(), true, filter.timezone_offset)?;

    let owner = if caller.is_admin() { None } else { Some(caller.id) };
    let candidates = usage::find_filtered(
        db,
        owner,
        filter.max_execution_time,
        start.map(Into::into),
        end.map(Into::into),
    )
    .await?;

    let mut views = Vec::with_capacity(candidates.len());
    for model in candidates {
        let record = reconcile(db, model).await?;
        // Type and version filters apply only when supplied, against the
        // reconciled record.
        if let Some(t) = &filter.service_type {
            if &record.model.service_type != t {
                continue;
            }
        }
        if let Some(v) = &filter.version {
            if &record.model.service_version != v {
                continue;
            }
        }
        if record.user_deleted && !filter.include_deleted_user {
            continue;
        }
        if record.service_deleted && !filter.include_deleted_service {
            continue;
        }
        views.push(record.into_view());
    }
    debug!(matched = views.len(), "usage records listed");
    Ok(views)
}

/// Fetch one record. Absence is NotFound for every caller; ownership is
/// checked afterwards so the two cannot be confused.
pub async fn get_usage(db: &DatabaseConnection, uuid: Uuid) -> Result<UsageRecord, ServiceError> {
    let model = usage::find_by_uuid(db, uuid)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("No usage record with id '{uuid}'.")))?;
    reconcile(db, model).await
}

/// Owner or admin only.
pub fn authorize_record(caller: &Identity, record: &usage::Model) -> Result<(), ServiceError> {
    if caller.is_admin() || record.user_id == caller.id {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "Access denied. User is not authorized to access this resource.".into(),
        ))
    }
}

#[instrument(skip(db, caller), fields(caller_id = %caller.id))]
pub async fn delete_usage(
    db: &DatabaseConnection,
    caller: &Identity,
    uuid: Uuid,
) -> Result<(), ServiceError> {
    let record = get_usage(db, uuid).await?;
    authorize_record(caller, &record.model)?;
    usage::hard_delete(db, uuid).await?;
    info!(usage_id = %uuid, "usage_deleted");
    Ok(())
}

/// Admin-only bulk removal of one user's records.
#[instrument(skip(db))]
pub async fn purge_usages(db: &DatabaseConnection, user_id: Uuid) -> Result<u64, ServiceError> {
    let removed = usage::purge_for_user(db, user_id).await?;
    info!(%user_id, removed, "usages_purged");
    Ok(removed)
}
