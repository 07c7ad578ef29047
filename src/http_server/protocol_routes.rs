//! Terraform Module Registry Protocol
//!
//! The read-only endpoints `terraform init` talks to after service
//! discovery. `download` answers with an `X-Terraform-Get` location unless
//! the registry runs in proxy mode, in which case it streams the archive.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::errors::{ApiError, ApiResult};
use super::registry_routes::RegistryState;
use crate::registry::{DownloadLocator, RegistryError, SignedLink};

/// Header carrying the archive location
pub const TERRAFORM_GET_HEADER: &str = "x-terraform-get";

#[derive(Debug, Serialize, Deserialize)]
pub struct ProtocolVersion {
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProtocolModule {
    pub versions: Vec<ProtocolVersion>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProtocolVersionsResponse {
    pub modules: Vec<ProtocolModule>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadFileQuery {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub expires: Option<i64>,
}

impl DownloadFileQuery {
    fn link(&self) -> ApiResult<Option<SignedLink>> {
        match (&self.token, self.expires) {
            (Some(token), Some(expires)) => Ok(Some(SignedLink::new(token.clone(), expires))),
            (None, None) => Ok(None),
            _ => Err(RegistryError::InvalidDownloadLink.into()),
        }
    }
}

type Coordinates = (String, String, String, String);

pub fn protocol_routes(state: Arc<RegistryState>) -> Router {
    Router::new()
        .route("/:namespace/:module/:system/versions", get(versions_handler))
        .route(
            "/:namespace/:module/:system/:version/download",
            get(download_handler),
        )
        .route(
            "/:namespace/:module/:system/:version/downloadFile",
            get(download_file_handler),
        )
        .with_state(state)
}

async fn versions_handler(
    State(state): State<Arc<RegistryState>>,
    Path((namespace, module, system)): Path<(String, String, String)>,
) -> ApiResult<Json<ProtocolVersionsResponse>> {
    let versions = state
        .registry
        .list_versions(&namespace, &module, &system)
        .await?
        .into_iter()
        .map(|v| ProtocolVersion { version: v.name })
        .collect();

    Ok(Json(ProtocolVersionsResponse {
        modules: vec![ProtocolModule { versions }],
    }))
}

async fn download_handler(
    State(state): State<Arc<RegistryState>>,
    Path((namespace, module, system, version)): Path<Coordinates>,
) -> ApiResult<Response> {
    let (_, locator) = state
        .registry
        .resolve_download(&namespace, &module, &system, &version)
        .await?;

    match locator {
        DownloadLocator::Redirect { location } => {
            let value = HeaderValue::from_str(&location)
                .map_err(|e| ApiError::Internal(format!("bad download location: {}", e)))?;
            Ok((StatusCode::NO_CONTENT, [(TERRAFORM_GET_HEADER, value)]).into_response())
        }
        DownloadLocator::Proxy { .. } => {
            let data = state
                .registry
                .fetch_artifact(&namespace, &module, &system, &version, None)
                .await?;
            Ok(archive_response(data))
        }
    }
}

async fn download_file_handler(
    State(state): State<Arc<RegistryState>>,
    Path((namespace, module, system, version)): Path<Coordinates>,
    Query(query): Query<DownloadFileQuery>,
) -> ApiResult<Response> {
    let link = query.link()?;
    let data = state
        .registry
        .fetch_artifact(&namespace, &module, &system, &version, link.as_ref())
        .await?;
    Ok(archive_response(data))
}

fn archive_response(data: Vec<u8>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/zip"));
    (StatusCode::OK, headers, Bytes::from(data)).into_response()
}
