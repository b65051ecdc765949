//! ARM REST client shared by the service modules

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::error::{ApiError, ErrorDetail};
use super::lro::Poller;
use super::transport::{HttpRequest, HttpResponse, Transport};

/// Client for one management endpoint
#[derive(Clone)]
pub struct ArmClient {
    transport: Arc<dyn Transport>,
    endpoint: Url,
}

impl std::fmt::Debug for ArmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

/// One page of a list operation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    next_link: Option<String>,
}

impl ArmClient {
    pub fn new(transport: Arc<dyn Transport>, endpoint: Url) -> Self {
        Self {
            transport,
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Resolve a resource path against the endpoint and pin the API version
    pub fn url(&self, path: &str, api_version: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.set_path(path);
        url.query_pairs_mut()
            .clear()
            .append_pair("api-version", api_version);
        url
    }

    /// Send a request and map non-2xx statuses to [`ApiError`]
    pub async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<HttpResponse, ApiError> {
        let method_name = method.to_string();
        let url_string = url.to_string();
        let response = self
            .transport
            .send(HttpRequest { method, url, body })
            .await?;

        if response.is_success() {
            return Ok(response);
        }
        if response.status == 404 {
            return Err(ApiError::NotFound {
                method: method_name,
                url: url_string,
            });
        }
        let detail = ErrorDetail::from_body(&response.body);
        Err(ApiError::Remote {
            method: method_name,
            url: url_string,
            status: response.status,
            code: detail.code,
            message: detail.message,
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, api_version: &str) -> Result<T, ApiError> {
        let url = self.url(path, api_version);
        let response = self.execute(Method::GET, url.clone(), None).await?;
        decode(&url, &response.body)
    }

    pub async fn put<B: Serialize>(
        &self,
        path: &str,
        api_version: &str,
        body: &B,
    ) -> Result<Poller, ApiError> {
        self.mutate(Method::PUT, path, api_version, Some(encode(body)?), false)
            .await
    }

    pub async fn patch<B: Serialize>(
        &self,
        path: &str,
        api_version: &str,
        body: &B,
    ) -> Result<Poller, ApiError> {
        self.mutate(Method::PATCH, path, api_version, Some(encode(body)?), false)
            .await
    }

    pub async fn post<B: Serialize>(
        &self,
        path: &str,
        api_version: &str,
        body: Option<&B>,
    ) -> Result<Poller, ApiError> {
        let body = body.map(encode).transpose()?;
        self.mutate(Method::POST, path, api_version, body, false)
            .await
    }

    /// Delete; the returned poller treats a vanished resource as done
    pub async fn delete(&self, path: &str, api_version: &str) -> Result<Poller, ApiError> {
        self.mutate(Method::DELETE, path, api_version, None, true)
            .await
    }

    async fn mutate(
        &self,
        method: Method,
        path: &str,
        api_version: &str,
        body: Option<serde_json::Value>,
        tolerate_not_found: bool,
    ) -> Result<Poller, ApiError> {
        let url = self.url(path, api_version);
        let response = self.execute(method.clone(), url.clone(), body).await?;
        Ok(Poller::from_response(
            self.clone(),
            &method,
            url,
            &response,
            tolerate_not_found,
        ))
    }

    /// GET an absolute URL, e.g. a `nextLink` or an operation status URL
    pub async fn get_url(&self, url: Url) -> Result<HttpResponse, ApiError> {
        self.execute(Method::GET, url, None).await
    }

    /// Collect every page of a list operation
    pub async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
    ) -> Result<Vec<T>, ApiError> {
        self.list_matching(path, api_version, |_| true).await
    }

    /// Collect every page of a list operation, keeping items that match
    pub async fn list_matching<T, F>(
        &self,
        path: &str,
        api_version: &str,
        predicate: F,
    ) -> Result<Vec<T>, ApiError>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        let mut items = Vec::new();
        let mut next = Some(self.url(path, api_version));

        while let Some(url) = next.take() {
            let response = self.get_url(url.clone()).await?;
            let page: Page<T> = decode(&url, &response.body)?;
            items.extend(page.value.into_iter().filter(|item| predicate(item)));
            next = match page.next_link.filter(|link| !link.is_empty()) {
                Some(link) => Some(Url::parse(&link)?),
                None => None,
            };
        }

        Ok(items)
    }
}

pub(crate) fn decode<T: DeserializeOwned>(url: &Url, body: &str) -> Result<T, ApiError> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })
}

fn encode<B: Serialize>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(ApiError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::fake::FakeArm;
    use serde_json::json;

    #[test]
    fn url_pins_api_version() {
        let fake = FakeArm::new();
        let client = fake.client();
        let url = client.url("/subscriptions/s/resourceGroups/rg", "2023-04-15");
        assert_eq!(url.path(), "/subscriptions/s/resourceGroups/rg");
        assert_eq!(url.query(), Some("api-version=2023-04-15"));
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let fake = FakeArm::new();
        let err = fake
            .client()
            .get::<serde_json::Value>("/subscriptions/s/nothing", "v1")
            .await
            .unwrap_err();
        assert!(err.was_not_found());
    }

    #[tokio::test]
    async fn error_envelope_is_decoded() {
        let fake = FakeArm::new();
        fake.respond(
            Method::GET,
            "/subscriptions/s/broken",
            HttpResponse::new(409).with_json(&json!({
                "error": {"code": "Conflict", "message": "busy"}
            })),
        );
        let err = fake
            .client()
            .get::<serde_json::Value>("/subscriptions/s/broken", "v1")
            .await
            .unwrap_err();
        match err {
            ApiError::Remote {
                status,
                code,
                message,
                ..
            } => {
                assert_eq!(status, 409);
                assert_eq!(code, "Conflict");
                assert_eq!(message, "busy");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_follows_next_link_and_filters() {
        let fake = FakeArm::new();
        let second = format!("{}page2", fake.endpoint());
        fake.respond(
            Method::GET,
            "/items",
            HttpResponse::new(200).with_json(&json!({
                "value": [{"n": 1}, {"n": 2}],
                "nextLink": second,
            })),
        );
        fake.respond(
            Method::GET,
            "/page2",
            HttpResponse::new(200).with_json(&json!({"value": [{"n": 3}]})),
        );

        let all: Vec<serde_json::Value> = fake.client().list("/items", "v1").await.unwrap();
        assert_eq!(all.len(), 3);

        let odd: Vec<serde_json::Value> = fake
            .client()
            .list_matching("/items", "v1", |v: &serde_json::Value| {
                v["n"].as_i64().is_some_and(|n| n % 2 == 1)
            })
            .await
            .unwrap();
        assert_eq!(odd, vec![json!({"n": 1}), json!({"n": 3})]);
    }
}
