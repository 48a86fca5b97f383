//! HTTP resource service.

use async_trait::async_trait;
use battant::changes::{BatchChange, Payload, Resource, ResourceId, batch::BatchResponse};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;
use url::Url;

use crate::resources::{
    errors::ResourceServiceError,
    service::{Record, ResourceService},
};

/// Talks to `/api/<resource>` on the shop's JSON API.
#[derive(Debug, Clone)]
pub struct HttpResourceService {
    http: Client,
    base: Url,
    resource: Resource,
}

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    changes: &'a [BatchChange],
}

impl HttpResourceService {
    #[must_use]
    pub fn new(http: Client, base: Url, resource: Resource) -> Self {
        Self {
            http,
            base,
            resource,
        }
    }

    /// Resource served by this client.
    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// `<base>/api/<plural>` followed by `segments`, each percent-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceServiceError::InvalidBaseUrl`] when the base URL
    /// cannot carry a path (e.g. `mailto:`).
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ResourceServiceError> {
        let mut url = self.base.clone();

        url.path_segments_mut()
            .map_err(|()| ResourceServiceError::InvalidBaseUrl)?
            .pop_if_empty()
            .extend(["api", self.resource.plural()])
            .extend(segments);

        Ok(url)
    }

    fn item_endpoint(&self, id: &ResourceId) -> Result<Url, ResourceServiceError> {
        self.endpoint(&[&id.to_string()])
    }

    async fn send(
        &self,
        request: RequestBuilder,
        route: Route,
    ) -> Result<String, ResourceServiceError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!(resource = %self.resource, status = status.as_u16(), "api response");

        check_status(status, body, route)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Collection,
    Item,
}

/// Any 2xx, 207 Multi-Status included, is a success. A 404 on an item route
/// means the row does not exist.
fn check_status(
    status: StatusCode,
    body: String,
    route: Route,
) -> Result<String, ResourceServiceError> {
    if status.is_success() {
        return Ok(body);
    }

    if status == StatusCode::NOT_FOUND && route == Route::Item {
        return Err(ResourceServiceError::NotFound);
    }

    Err(ResourceServiceError::UnexpectedResponse {
        status: status.as_u16(),
        body,
    })
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ResourceServiceError> {
    serde_json::from_str(body).map_err(ResourceServiceError::Decode)
}

/// Parse a batch endpoint body into per-change results.
///
/// # Errors
///
/// Returns [`ResourceServiceError::Decode`] when the body is not a
/// `{ "results": [...] }` object.
pub fn decode_batch_response(body: &str) -> Result<BatchResponse, ResourceServiceError> {
    decode(body)
}

#[async_trait]
impl ResourceService for HttpResourceService {
    async fn get_all(&self) -> Result<Vec<Record>, ResourceServiceError> {
        let url = self.endpoint(&[])?;
        let body = self.send(self.http.get(url), Route::Collection).await?;

        decode(&body)
    }

    async fn get_by_id(&self, id: &ResourceId) -> Result<Record, ResourceServiceError> {
        let url = self.item_endpoint(id)?;
        let body = self.send(self.http.get(url), Route::Item).await?;

        decode(&body)
    }

    async fn create(&self, payload: Payload) -> Result<Record, ResourceServiceError> {
        let url = self.endpoint(&[])?;
        let body = self
            .send(self.http.post(url).json(&payload), Route::Collection)
            .await?;

        decode(&body)
    }

    async fn update(
        &self,
        id: &ResourceId,
        payload: Payload,
    ) -> Result<Record, ResourceServiceError> {
        let url = self.item_endpoint(id)?;
        let body = self
            .send(self.http.put(url).json(&payload), Route::Item)
            .await?;

        decode(&body)
    }

    async fn delete(&self, id: &ResourceId) -> Result<(), ResourceServiceError> {
        let url = self.item_endpoint(id)?;

        self.send(self.http.delete(url), Route::Item).await?;

        Ok(())
    }

    async fn apply_batch(
        &self,
        changes: Vec<BatchChange>,
    ) -> Result<BatchResponse, ResourceServiceError> {
        let url = self.endpoint(&["batch"])?;

        debug!(resource = %self.resource, changes = changes.len(), "submitting batch");

        let body = self
            .send(
                self.http.post(url).json(&BatchRequest { changes: &changes }),
                Route::Collection,
            )
            .await?;

        decode_batch_response(&body)
    }
}
