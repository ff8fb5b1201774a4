use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::{
    browse::{CatalogSource, RelayTrigger},
    error::{BridgeError, Result},
    ingest::Destination,
    lms::{Course, Module, ModuleItem},
    relay::RelayOutcome,
    web::{ApiError, RelayRequest},
};

/// Browser-side client of this service's browse and relay endpoints.
#[derive(Clone)]
pub struct PortalClient {
    http: Client,
    base_url: String,
    session_token: String,
}

impl PortalClient {
    pub fn new(base_url: impl Into<String>, session_token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_token: session_token.into(),
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(&self.session_token)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|err| BridgeError::Upstream {
                status: None,
                message: format!("relay service request failed: {err}"),
            })?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response.json::<T>().await.map_err(|err| BridgeError::Upstream {
            status: Some(status),
            message: format!("unexpected response payload: {err}"),
        });
    }

    let message = match response.json::<ApiError>().await {
        Ok(ApiError {
            error,
            details: Some(details),
        }) => format!("{error} ({details})"),
        Ok(ApiError { error, .. }) => error,
        Err(_) => format!("request failed with status {status}"),
    };
    Err(BridgeError::upstream_status(status, message))
}

impl CatalogSource for PortalClient {
    async fn list_courses(&self) -> Result<Vec<Course>> {
        self.send(self.get("/courses")).await
    }

    async fn list_modules(&self, course_id: u64) -> Result<Vec<Module>> {
        self.send(self.get(&format!("/courses/{course_id}/modules")))
            .await
    }

    async fn list_items(&self, course_id: u64, module_id: u64) -> Result<Vec<ModuleItem>> {
        self.send(self.get(&format!(
            "/courses/{course_id}/modules/{module_id}/items"
        )))
        .await
    }
}

impl RelayTrigger for PortalClient {
    async fn relay(&self, file_id: u64, destination: &Destination) -> Result<RelayOutcome> {
        let body = RelayRequest {
            destination_endpoint: Some(destination.endpoint.clone()),
            destination_resource_kind: Some(destination.resource_kind.clone()),
        };
        let request = self
            .http
            .post(format!("{}/files/{file_id}/relay", self.base_url))
            .bearer_auth(&self.session_token)
            .json(&body);
        self.send(request).await
    }
}
