//! Service catalogue management.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use models::service::Model as ServiceModel;
use models::service_endpoint;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use service::auth::Identity;
use service::registry::{
    self, CreateServiceInput, EndpointInput, UpdateEndpointInput, UpdateServiceInput,
};

use crate::errors::ApiError;
use crate::startup::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceView {
    #[serde(rename = "type")]
    pub service_type: String,
    pub version: String,
    pub name: String,
    pub description: String,
    /// Backend location, exposed to admins only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_address: Option<String>,
}

impl ServiceView {
    fn for_caller(model: ServiceModel, caller: &Identity) -> Self {
        Self {
            service_type: model.service_type,
            version: model.version,
            name: model.name,
            description: model.description,
            base_address: caller.is_admin().then_some(model.base_address),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointView {
    pub task: String,
    pub method: String,
    pub endpoint_path: String,
    pub text_based: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_formats: Option<Value>,
}

impl From<service_endpoint::Model> for EndpointView {
    fn from(model: service_endpoint::Model) -> Self {
        Self {
            task: model.task,
            method: model.method,
            endpoint_path: model.endpoint_path,
            text_based: model.text_based,
            options: model.options,
            supported_formats: model.supported_formats,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointBody {
    pub endpoint_path: String,
    pub method: String,
    pub task: String,
    pub text_based: Option<bool>,
    pub options: Option<Map<String, Value>>,
    pub supported_formats: Option<Vec<String>>,
}

impl From<EndpointBody> for EndpointInput {
    fn from(body: EndpointBody) -> Self {
        Self {
            endpoint_path: body.endpoint_path,
            method: body.method,
            task: body.task,
            text_based: body.text_based,
            options: body.options,
            supported_formats: body.supported_formats,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceBody {
    pub name: String,
    pub description: String,
    pub address: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub endpoints: Vec<EndpointBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceBody {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEndpointBody {
    pub endpoint_path: Option<String>,
    pub method: Option<String>,
    pub task: Option<String>,
    pub text_based: Option<bool>,
    pub options: Option<Map<String, Value>>,
    pub supported_formats: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceListQuery {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub service_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EndpointListQuery {
    pub task: Option<String>,
    pub method: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ServiceListQuery>,
) -> Result<Json<Value>, ApiError> {
    let services = registry::get_services(
        &state.db,
        query.name.as_deref(),
        query.service_type.as_deref(),
    )
    .await?;
    let views: Vec<ServiceView> = services
        .into_iter()
        .map(|s| ServiceView::for_caller(s, &identity))
        .collect();
    Ok(Json(json!({ "services": views })))
}

pub async fn get_one(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((service_type, version)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let model = registry::resolve_service(&state.db, &service_type, &version).await?;
    Ok(Json(json!({ "service": ServiceView::for_caller(model, &identity) })))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<CreateServiceBody>,
) -> Result<Json<Value>, ApiError> {
    let (created, endpoints) = registry::create_service(
        &state.db,
        CreateServiceInput {
            name: body.name,
            description: body.description,
            address: body.address,
            service_type: body.service_type,
            endpoints: body.endpoints.into_iter().map(Into::into).collect(),
        },
    )
    .await?;
    let endpoint_views: Vec<EndpointView> = endpoints.into_iter().map(Into::into).collect();
    Ok(Json(json!({
        "message": "Service registered.",
        "service": ServiceView::for_caller(created, &identity),
        "endpoints": endpoint_views,
    })))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((service_type, version)): Path<(String, String)>,
    Json(body): Json<UpdateServiceBody>,
) -> Result<Json<Value>, ApiError> {
    let updated = registry::update_service(
        &state.db,
        &service_type,
        &version,
        UpdateServiceInput {
            name: body.name,
            description: body.description,
            address: body.address,
            version: body.version,
        },
    )
    .await?;
    Ok(Json(json!({
        "message": "Service updated.",
        "service": ServiceView::for_caller(updated, &identity),
    })))
}

pub async fn remove(
    State(state): State<AppState>,
    Path((service_type, version)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    registry::remove_service(&state.db, &service_type, &version).await?;
    Ok(Json(json!({ "message": "Service removed." })))
}

pub async fn list_types(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let types = registry::get_service_types(&state.db).await?;
    Ok(Json(json!({ "types": types })))
}

pub async fn list_versions(
    State(state): State<AppState>,
    Path(service_type): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let versions = registry::get_service_versions(&state.db, &service_type).await?;
    Ok(Json(json!({ "versions": versions })))
}

pub async fn list_endpoints(
    State(state): State<AppState>,
    Path((service_type, version)): Path<(String, String)>,
    Query(query): Query<EndpointListQuery>,
) -> Result<Json<Value>, ApiError> {
    let endpoints = registry::get_endpoints(
        &state.db,
        &service_type,
        &version,
        query.task.as_deref(),
        query.method.as_deref(),
    )
    .await?;
    let views: Vec<EndpointView> = endpoints.into_iter().map(Into::into).collect();
    Ok(Json(json!({ "endpoints": views })))
}

pub async fn get_endpoint(
    State(state): State<AppState>,
    Path((service_type, version, task)): Path<(String, String, String)>,
) -> Result<Json<Value>, ApiError> {
    let endpoint = registry::get_endpoint(&state.db, &service_type, &version, &task).await?;
    Ok(Json(json!({ "endpoint": EndpointView::from(endpoint) })))
}

pub async fn add_endpoint(
    State(state): State<AppState>,
    Path((service_type, version)): Path<(String, String)>,
    Json(body): Json<EndpointBody>,
) -> Result<Json<Value>, ApiError> {
    let created =
        registry::add_endpoint(&state.db, &service_type, &version, body.into()).await?;
    Ok(Json(json!({
        "message": "Endpoint registered.",
        "endpoint": EndpointView::from(created),
    })))
}

pub async fn update_endpoint(
    State(state): State<AppState>,
    Path((service_type, version, task)): Path<(String, String, String)>,
    Json(body): Json<UpdateEndpointBody>,
) -> Result<Json<Value>, ApiError> {
    let updated = registry::update_endpoint(
        &state.db,
        &service_type,
        &version,
        &task,
        UpdateEndpointInput {
            endpoint_path: body.endpoint_path,
            method: body.method,
            task: body.task,
            text_based: body.text_based,
            options: body.options,
            supported_formats: body.supported_formats,
        },
    )
    .await?;
    Ok(Json(json!({
        "message": "Endpoint updated.",
        "endpoint": EndpointView::from(updated),
    })))
}

pub async fn remove_endpoint(
    State(state): State<AppState>,
    Path((service_type, version, task)): Path<(String, String, String)>,
) -> Result<Json<Value>, ApiError> {
    registry::remove_endpoint(&state.db, &service_type, &version, &task).await?;
    Ok(Json(json!({ "message": "Endpoint removed." })))
}
