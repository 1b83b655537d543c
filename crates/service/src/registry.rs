//! Service catalogue: registration, versioning, endpoint management.

use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::validate::{
    parse_method, parse_service_type, validate_address, validate_endpoint_spec, validate_version,
    EndpointSpec,
};
use models::types::HttpMethod;
use models::{service, service_endpoint};

#[derive(Debug, Clone)]
pub struct CreateServiceInput {
    pub name: String,
    pub description: String,
    pub address: String,
    pub service_type: String,
    pub endpoints: Vec<EndpointInput>,
}

#[derive(Debug, Clone)]
pub struct EndpointInput {
    pub endpoint_path: String,
    pub method: String,
    pub task: String,
    pub text_based: Option<bool>,
    pub options: Option<Map<String, Value>>,
    pub supported_formats: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateServiceInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateEndpointInput {
    pub endpoint_path: Option<String>,
    pub method: Option<String>,
    pub task: Option<String>,
    pub text_based: Option<bool>,
    pub options: Option<Map<String, Value>>,
    pub supported_formats: Option<Vec<String>>,
}

fn to_spec(input: &EndpointInput) -> Result<EndpointSpec, ServiceError> {
    let method = parse_method(&input.method)?;
    let spec = EndpointSpec {
        endpoint_path: input.endpoint_path.clone(),
        method,
        task: input.task.clone(),
        text_based: input.text_based.unwrap_or(true),
        options: input.options.clone(),
        supported_formats: input.supported_formats.clone(),
    };
    validate_endpoint_spec(&spec)?;
    Ok(spec)
}

/// Next free version label for a type: one past the highest registered,
/// starting at v1.
pub(crate) fn next_version_from<'a>(existing: impl IntoIterator<Item = &'a str>) -> String {
    let max = existing
        .into_iter()
        .filter_map(|v| v.strip_prefix('v'))
        .filter_map(|n| n.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("v{}", max + 1)
}

/// Register a service and its endpoints atomically. The version label is
/// assigned inside the transaction; the unique (type, version) index
/// resolves concurrent registrations of the same type.
#[instrument(skip(db, input), fields(service_type = %input.service_type, name = %input.name))]
pub async fn create_service(
    db: &DatabaseConnection,
    input: CreateServiceInput,
) -> Result<(service::Model, Vec<service_endpoint::Model>), ServiceError> {
    let service_type = parse_service_type(&input.service_type)?;
    validate_address(&input.address)?;
    if input.endpoints.is_empty() {
        return Err(ServiceError::BadRequest(
            "Service must declare at least one endpoint.".into(),
        ));
    }
    let specs = input
        .endpoints
        .iter()
        .map(to_spec)
        .collect::<Result<Vec<_>, _>>()?;

    let txn = db.begin().await.map_err(|e| ServiceError::Db(e.to_string()))?;

    let existing = service::find_all_of_type(&txn, service_type.as_str()).await?;
    let version = next_version_from(existing.iter().map(|s| s.version.as_str()));
    debug!(%version, "version assigned");

    let created = service::insert(
        &txn,
        &input.name,
        &input.description,
        &input.address,
        service_type.as_str(),
        &version,
    )
    .await?;

    let mut endpoints = Vec::with_capacity(specs.len());
    for spec in &specs {
        let ep = insert_endpoint(&txn, created.id, spec).await?;
        endpoints.push(ep);
    }

    txn.commit().await.map_err(|e| ServiceError::Db(e.to_string()))?;
    info!(
        service_id = %created.id,
        version = %created.version,
        endpoints = endpoints.len(),
        "service_registered"
    );
    Ok((created, endpoints))
}

async fn insert_endpoint<C: sea_orm::ConnectionTrait>(
    db: &C,
    service_id: Uuid,
    spec: &EndpointSpec,
) -> Result<service_endpoint::Model, ServiceError> {
    let options = spec.options.as_ref().map(|m| Value::Object(m.clone()));
    let formats = spec
        .supported_formats
        .as_ref()
        .map(|f| Value::Array(f.iter().cloned().map(Value::from).collect()));
    let ep = service_endpoint::insert(
        db,
        service_id,
        spec.method.as_str(),
        &spec.endpoint_path,
        &spec.task,
        spec.text_based,
        options,
        formats,
    )
    .await?;
    Ok(ep)
}

pub async fn resolve_service(
    db: &DatabaseConnection,
    service_type: &str,
    version: &str,
) -> Result<service::Model, ServiceError> {
    let service_type = parse_service_type(service_type)?;
    service::find_by_type_version(db, service_type.as_str(), version)
        .await?
        .ok_or_else(|| {
            ServiceError::not_found(format!(
                "No service registered for type '{service_type}' and version '{version}'."
            ))
        })
}

pub async fn get_services(
    db: &DatabaseConnection,
    name_contains: Option<&str>,
    service_type: Option<&str>,
) -> Result<Vec<service::Model>, ServiceError> {
    let service_type = service_type.map(parse_service_type).transpose()?;
    let list = service::search(db, name_contains, service_type.map(|t| t.as_str())).await?;
    Ok(list)
}

#[instrument(skip(db, input))]
pub async fn update_service(
    db: &DatabaseConnection,
    service_type: &str,
    version: &str,
    input: UpdateServiceInput,
) -> Result<service::Model, ServiceError> {
    let existing = resolve_service(db, service_type, version).await?;

    if let Some(address) = &input.address {
        validate_address(address)?;
    }
    if let Some(new_version) = &input.version {
        validate_version(new_version)?;
    }

    let mut am: service::ActiveModel = existing.into();
    if let Some(name) = input.name {
        am.name = Set(name);
    }
    if let Some(description) = input.description {
        am.description = Set(description);
    }
    if let Some(address) = input.address {
        am.base_address = Set(address);
    }
    if let Some(new_version) = input.version {
        am.version = Set(new_version);
    }
    let updated = am.update(db).await.map_err(models::errors::ModelError::from)?;
    info!(service_id = %updated.id, version = %updated.version, "service_updated");
    Ok(updated)
}

/// Remove a service and its endpoints. Usage records keep their snapshot
/// columns and are left in place.
#[instrument(skip(db))]
pub async fn remove_service(
    db: &DatabaseConnection,
    service_type: &str,
    version: &str,
) -> Result<(), ServiceError> {
    let existing = resolve_service(db, service_type, version).await?;
    let txn = db.begin().await.map_err(|e| ServiceError::Db(e.to_string()))?;
    service_endpoint::delete_for_service(&txn, existing.id).await?;
    service::hard_delete(&txn, existing.id).await?;
    txn.commit().await.map_err(|e| ServiceError::Db(e.to_string()))?;
    info!(service_id = %existing.id, "service_removed");
    Ok(())
}

/// All registered type labels that currently have at least one service.
pub async fn get_service_types(db: &DatabaseConnection) -> Result<Vec<String>, ServiceError> {
    let mut types = Vec::new();
    for t in models::types::ServiceType::ALL {
        let registered = service::find_all_of_type(db, t.as_str()).await?;
        if !registered.is_empty() {
            types.push(t.as_str().to_owned());
        }
    }
    Ok(types)
}

pub async fn get_service_versions(
    db: &DatabaseConnection,
    service_type: &str,
) -> Result<Vec<String>, ServiceError> {
    let service_type = parse_service_type(service_type)?;
    let mut versions: Vec<(u32, String)> = service::find_all_of_type(db, service_type.as_str())
        .await?
        .into_iter()
        .filter_map(|s| {
            s.version
                .strip_prefix('v')
                .and_then(|n| n.parse::<u32>().ok())
                .map(|n| (n, s.version))
        })
        .collect();
    versions.sort_by_key(|(n, _)| *n);
    Ok(versions.into_iter().map(|(_, v)| v).collect())
}

pub async fn get_endpoints(
    db: &DatabaseConnection,
    service_type: &str,
    version: &str,
    task_contains: Option<&str>,
    method: Option<&str>,
) -> Result<Vec<service_endpoint::Model>, ServiceError> {
    let svc = resolve_service(db, service_type, version).await?;
    let method = method.map(parse_method).transpose()?;
    let list = service_endpoint::find_for_service(
        db,
        svc.id,
        task_contains,
        method.map(|m: HttpMethod| m.as_str()),
    )
    .await?;
    Ok(list)
}

pub async fn get_endpoint(
    db: &DatabaseConnection,
    service_type: &str,
    version: &str,
    task: &str,
) -> Result<service_endpoint::Model, ServiceError> {
    let svc = resolve_service(db, service_type, version).await?;
    service_endpoint::find_by_service_task(db, svc.id, task)
        .await?
        .ok_or_else(|| {
            ServiceError::not_found(format!("No endpoint registered for task '{task}'."))
        })
}

#[instrument(skip(db, input), fields(task = %input.task))]
pub async fn add_endpoint(
    db: &DatabaseConnection,
    service_type: &str,
    version: &str,
    input: EndpointInput,
) -> Result<service_endpoint::Model, ServiceError> {
    let svc = resolve_service(db, service_type, version).await?;
    let spec = to_spec(&input)?;
    let ep = insert_endpoint(db, svc.id, &spec).await?;
    info!(service_id = %svc.id, endpoint_id = %ep.id, "endpoint_added");
    Ok(ep)
}

#[instrument(skip(db, input))]
pub async fn update_endpoint(
    db: &DatabaseConnection,
    service_type: &str,
    version: &str,
    task: &str,
    input: UpdateEndpointInput,
) -> Result<service_endpoint::Model, ServiceError> {
    let existing = get_endpoint(db, service_type, version, task).await?;

    // Re-validate the merged definition before touching the row.
    let merged = EndpointSpec {
        endpoint_path: input
            .endpoint_path
            .clone()
            .unwrap_or_else(|| existing.endpoint_path.clone()),
        method: match &input.method {
            Some(raw) => parse_method(raw)?,
            None => parse_method(&existing.method)?,
        },
        task: input.task.clone().unwrap_or_else(|| existing.task.clone()),
        text_based: input.text_based.unwrap_or(existing.text_based),
        options: match &input.options {
            Some(map) => Some(map.clone()),
            None => existing.options.as_ref().and_then(|v| v.as_object().cloned()),
        },
        supported_formats: match &input.supported_formats {
            Some(f) => Some(f.clone()),
            None => existing.supported_formats.as_ref().and_then(|v| {
                v.as_array().map(|a| {
                    a.iter()
                        .filter_map(|s| s.as_str().map(str::to_owned))
                        .collect()
                })
            }),
        },
    };
    validate_endpoint_spec(&merged)?;

    let mut am: service_endpoint::ActiveModel = existing.into();
    am.endpoint_path = Set(merged.endpoint_path);
    am.method = Set(merged.method.as_str().to_owned());
    am.task = Set(merged.task);
    am.text_based = Set(merged.text_based);
    am.options = Set(merged.options.map(Value::Object));
    am.supported_formats = Set(merged
        .supported_formats
        .map(|f| Value::Array(f.into_iter().map(Value::from).collect())));
    let updated = am.update(db).await.map_err(models::errors::ModelError::from)?;
    info!(endpoint_id = %updated.id, task = %updated.task, "endpoint_updated");
    Ok(updated)
}

#[instrument(skip(db))]
pub async fn remove_endpoint(
    db: &DatabaseConnection,
    service_type: &str,
    version: &str,
    task: &str,
) -> Result<(), ServiceError> {
    let existing = get_endpoint(db, service_type, version, task).await?;
    service_endpoint::hard_delete(db, existing.id).await?;
    info!(endpoint_id = %existing.id, "endpoint_removed");
    Ok(())
}
