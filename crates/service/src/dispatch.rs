//! Query dispatch: resolve an endpoint, validate the caller and their
//! options, forward the request to the registered backend and record the
//! round trip in the ledger.

use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::Identity;
use crate::errors::ServiceError;
use crate::registry;
use crate::validate::validate_options;
use models::types::HttpMethod;
use models::usage::NewUsage;
use models::{service_endpoint, usage, user};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Result of a dispatched query, keyed by the ledger record it produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub uuid: Uuid,
    /// Round-trip time against the backend, in seconds.
    pub execution_time: f64,
    pub output: Value,
}

pub struct Dispatcher {
    http: reqwest::Client,
}

impl Dispatcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// Forward a query to the backend registered for (type, version, task).
    pub async fn dispatch(
        &self,
        db: &DatabaseConnection,
        caller: &Identity,
        service_type: &str,
        version: &str,
        task: &str,
        options: Option<Map<String, Value>>,
    ) -> Result<DispatchOutcome, ServiceError> {
        let svc = registry::resolve_service(db, service_type, version).await?;
        let endpoint = service_endpoint::find_by_service_task(db, svc.id, task)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(format!("No endpoint registered for task '{task}'."))
            })?;

        if !caller.is_admin() {
            check_subscription(db, caller.id).await?;
        }

        if !endpoint.text_based {
            return Err(ServiceError::BadRequest(
                "Endpoint is not text based and cannot be queried with options.".into(),
            ));
        }
        let declared = endpoint
            .options
            .as_ref()
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let supplied = options.unwrap_or_default();
        validate_options(&declared, &supplied)?;

        let method: HttpMethod = endpoint
            .method
            .parse()
            .map_err(|_| ServiceError::Db(format!("corrupt method '{}'", endpoint.method)))?;
        let url = format!("{}{}", svc.base_address, endpoint.endpoint_path);
        debug!(%url, method = %method, task, "dispatching query");

        let started = Instant::now();
        let response = self.forward(method, &url, &supplied).await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;
        // The full round trip, body download included.
        let execution_time = started.elapsed().as_secs_f64();
        if !status.is_success() {
            warn!(%url, %status, "backend rejected query");
            return Err(ServiceError::Upstream(format!(
                "backend responded with status {status}"
            )));
        }

        let record = usage::insert(
            db,
            NewUsage {
                user_id: caller.id,
                service_type: &svc.service_type,
                service_version: &svc.version,
                service_id: svc.id,
                endpoint_id: endpoint.id,
                output: body.clone(),
                execution_time,
                options: Some(Value::Object(supplied)),
                is_admin_query: caller.is_admin(),
            },
        )
        .await?;

        let output = serde_json::from_str(&body).unwrap_or(Value::String(body));
        Ok(DispatchOutcome {
            uuid: record.id,
            execution_time,
            output,
        })
    }

    async fn forward(
        &self,
        method: HttpMethod,
        url: &str,
        options: &Map<String, Value>,
    ) -> Result<reqwest::Response, ServiceError> {
        let request = match method {
            HttpMethod::Post => self.http.post(url).json(options),
            HttpMethod::Put => self.http.put(url).json(options),
            HttpMethod::Get => self.http.get(url).query(&query_pairs(options)),
            HttpMethod::Delete => self.http.delete(url).query(&query_pairs(options)),
        };
        request
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(e.to_string()))
    }
}

/// Render option values for a query string: strings bare, everything else
/// in JSON notation.
fn query_pairs(options: &Map<String, Value>) -> Vec<(String, String)> {
    options
        .iter()
        .map(|(k, v)| {
            let rendered = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), rendered)
        })
        .collect()
}

async fn check_subscription(db: &DatabaseConnection, user_id: Uuid) -> Result<(), ServiceError> {
    let account = user::find_by_id(db, user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Account no longer exists.".to_owned()))?;
    if account.subscription_expiry_date < Utc::now() {
        return Err(ServiceError::Unauthorized(
            "Subscription expired. Please renew the subscription to continue using the service."
                .into(),
        ));
    }
    Ok(())
}
