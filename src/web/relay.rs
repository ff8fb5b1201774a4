use axum::{
    Json,
    extract::{Path as AxumPath, State},
    http::{HeaderMap, StatusCode},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    ingest::Destination,
    relay::RelayOutcome,
    web::{ApiResult, AppState, caller_session, json_error, relay_error},
};

/// Body of `POST /files/:file_id/relay`. Both fields are optional.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RelayRequest {
    #[serde(default)]
    pub destination_endpoint: Option<String>,
    #[serde(default)]
    pub destination_resource_kind: Option<String>,
}

pub async fn relay_file(
    State(state): State<AppState>,
    AxumPath(file_id): AxumPath<u64>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Option<Json<RelayRequest>>,
) -> ApiResult<RelayOutcome> {
    let owner = caller_session(&jar, &headers)?;
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let destination =
        Destination::from_parts(request.destination_endpoint, request.destination_resource_kind);
    info!(file_id, %destination, "relay requested");

    // Detached so a dropped connection cannot stop the relay before cleanup.
    let pipeline = state.relay_pipeline();
    let task =
        tokio::spawn(async move { pipeline.relay(file_id, &destination, &owner).await });

    let outcome = task
        .await
        .map_err(|err| {
            error!(?err, file_id, "relay task aborted");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Relay task aborted")
        })?
        .map_err(|err| relay_error(&err))?;

    Ok(Json(outcome))
}
