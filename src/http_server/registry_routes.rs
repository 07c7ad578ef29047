//! Registry Management Routes
//!
//! CRUD over the namespace → module → system → version hierarchy.
//! Versions are published as multipart uploads with a `file` part holding
//! the archive and a `version` part holding its name.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{ApiError, ApiResult};
use crate::registry::download::download_path;
use crate::registry::{Module, Namespace, Registry, System, Version};

// ==================
// Shared State
// ==================

/// Registry state shared across handlers
#[derive(Debug, Clone)]
pub struct RegistryState {
    pub registry: Registry,
}

impl RegistryState {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct CreateNamespaceRequest {
    pub name: String,
    pub owner: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateChildRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct NamespaceListResponse {
    pub namespaces: Vec<Namespace>,
}

#[derive(Debug, Serialize)]
pub struct ModuleListResponse {
    pub modules: Vec<Module>,
}

#[derive(Debug, Serialize)]
pub struct SystemListResponse {
    pub systems: Vec<System>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResponse {
    pub id: String,
    pub namespace: String,
    pub module: String,
    pub system: String,
    pub name: String,
    pub download_url: String,
    pub downloads: u64,
    pub created: DateTime<Utc>,
}

impl VersionResponse {
    fn new(version: &Version, downloads: u64) -> Self {
        Self {
            id: version.id.clone(),
            namespace: version.namespace.clone(),
            module: version.module.clone(),
            system: version.system.clone(),
            name: version.name.clone(),
            download_url: download_path(version),
            downloads,
            created: version.created,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListMeta {
    pub offset: usize,
    pub limit: usize,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VersionListResponse {
    pub meta: ListMeta,
    pub versions: Vec<VersionResponse>,
}

// ==================
// Registry Routes
// ==================

/// Create the management routes
pub fn registry_routes(state: Arc<RegistryState>) -> Router {
    Router::new()
        .route(
            "/namespace",
            get(list_namespaces_handler).post(create_namespace_handler),
        )
        .route(
            "/namespace/:namespace",
            get(get_namespace_handler).delete(delete_namespace_handler),
        )
        .route(
            "/namespace/:namespace/module",
            get(list_modules_handler).post(create_module_handler),
        )
        .route(
            "/namespace/:namespace/module/:module",
            get(get_module_handler).delete(delete_module_handler),
        )
        .route(
            "/namespace/:namespace/module/:module/system",
            get(list_systems_handler).post(create_system_handler),
        )
        .route(
            "/namespace/:namespace/module/:module/system/:system",
            get(get_system_handler).delete(delete_system_handler),
        )
        .route(
            "/namespace/:namespace/module/:module/system/:system/version",
            get(list_versions_handler).post(create_version_handler),
        )
        .route(
            "/namespace/:namespace/module/:module/system/:system/version/:version",
            get(get_version_handler).delete(delete_version_handler),
        )
        .with_state(state)
}

// ==================
// Namespace Handlers
// ==================

async fn list_namespaces_handler(
    State(state): State<Arc<RegistryState>>,
) -> ApiResult<Json<NamespaceListResponse>> {
    let namespaces = state.registry.list_namespaces().await?;
    Ok(Json(NamespaceListResponse { namespaces }))
}

async fn create_namespace_handler(
    State(state): State<Arc<RegistryState>>,
    Json(req): Json<CreateNamespaceRequest>,
) -> ApiResult<(StatusCode, Json<Namespace>)> {
    let namespace = state
        .registry
        .create_namespace(&req.name, &req.owner)
        .await?;
    Ok((StatusCode::CREATED, Json(namespace)))
}

async fn get_namespace_handler(
    State(state): State<Arc<RegistryState>>,
    Path(namespace): Path<String>,
) -> ApiResult<Json<Namespace>> {
    Ok(Json(state.registry.resolve_namespace(&namespace).await?))
}

async fn delete_namespace_handler(
    State(state): State<Arc<RegistryState>>,
    Path(namespace): Path<String>,
) -> ApiResult<StatusCode> {
    state.registry.delete_namespace(&namespace).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================
// Module Handlers
// ==================

async fn list_modules_handler(
    State(state): State<Arc<RegistryState>>,
    Path(namespace): Path<String>,
) -> ApiResult<Json<ModuleListResponse>> {
    let modules = state.registry.list_modules(&namespace).await?;
    Ok(Json(ModuleListResponse { modules }))
}

async fn create_module_handler(
    State(state): State<Arc<RegistryState>>,
    Path(namespace): Path<String>,
    Json(req): Json<CreateChildRequest>,
) -> ApiResult<(StatusCode, Json<Module>)> {
    let module = state.registry.create_module(&namespace, &req.name).await?;
    Ok((StatusCode::CREATED, Json(module)))
}

async fn get_module_handler(
    State(state): State<Arc<RegistryState>>,
    Path((namespace, module)): Path<(String, String)>,
) -> ApiResult<Json<Module>> {
    Ok(Json(state.registry.resolve_module(&namespace, &module).await?))
}

async fn delete_module_handler(
    State(state): State<Arc<RegistryState>>,
    Path((namespace, module)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state.registry.delete_module(&namespace, &module).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================
// System Handlers
// ==================

async fn list_systems_handler(
    State(state): State<Arc<RegistryState>>,
    Path((namespace, module)): Path<(String, String)>,
) -> ApiResult<Json<SystemListResponse>> {
    let systems = state.registry.list_systems(&namespace, &module).await?;
    Ok(Json(SystemListResponse { systems }))
}

async fn create_system_handler(
    State(state): State<Arc<RegistryState>>,
    Path((namespace, module)): Path<(String, String)>,
    Json(req): Json<CreateChildRequest>,
) -> ApiResult<(StatusCode, Json<System>)> {
    let system = state
        .registry
        .create_system(&namespace, &module, &req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(system)))
}

async fn get_system_handler(
    State(state): State<Arc<RegistryState>>,
    Path((namespace, module, system)): Path<(String, String, String)>,
) -> ApiResult<Json<System>> {
    Ok(Json(
        state
            .registry
            .resolve_system(&namespace, &module, &system)
            .await?,
    ))
}

async fn delete_system_handler(
    State(state): State<Arc<RegistryState>>,
    Path((namespace, module, system)): Path<(String, String, String)>,
) -> ApiResult<StatusCode> {
    state
        .registry
        .delete_system(&namespace, &module, &system)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================
// Version Handlers
// ==================

async fn list_versions_handler(
    State(state): State<Arc<RegistryState>>,
    Path((namespace, module, system)): Path<(String, String, String)>,
) -> ApiResult<Json<VersionListResponse>> {
    let versions: Vec<VersionResponse> = state
        .registry
        .list_versions(&namespace, &module, &system)
        .await?
        .iter()
        .map(|v| VersionResponse::new(v, state.registry.download_count(v)))
        .collect();

    Ok(Json(VersionListResponse {
        meta: ListMeta {
            offset: 0,
            limit: versions.len(),
            count: versions.len(),
        },
        versions,
    }))
}

async fn create_version_handler(
    State(state): State<Arc<RegistryState>>,
    Path((namespace, module, system)): Path<(String, String, String)>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<VersionResponse>)> {
    let mut archive = None;
    let mut name = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()))?;
                archive = Some(data);
            }
            Some("version") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()))?;
                name = Some(text.trim().to_string());
            }
            _ => {}
        }
    }

    let archive = archive.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let name = name.ok_or_else(|| ApiError::bad_request("No version provided"))?;

    let version = state
        .registry
        .create_version(&namespace, &module, &system, &name, &archive)
        .await?;
    let downloads = state.registry.download_count(&version);
    Ok((
        StatusCode::CREATED,
        Json(VersionResponse::new(&version, downloads)),
    ))
}

async fn get_version_handler(
    State(state): State<Arc<RegistryState>>,
    Path((namespace, module, system, version)): Path<(String, String, String, String)>,
) -> ApiResult<Json<VersionResponse>> {
    let version = state
        .registry
        .resolve_version(&namespace, &module, &system, &version)
        .await?;
    let downloads = state.registry.download_count(&version);
    Ok(Json(VersionResponse::new(&version, downloads)))
}

async fn delete_version_handler(
    State(state): State<Arc<RegistryState>>,
    Path((namespace, module, system, version)): Path<(String, String, String, String)>,
) -> ApiResult<StatusCode> {
    state
        .registry
        .delete_version(&namespace, &module, &system, &version)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
