//! Minimal HTTP collaborator used by the consent resolvers.

use std::time::Duration;

use crate::error::ApiError;

/// Single attempt, fail fast. The bounded timeout is a deliberate deviation
/// from earlier SDK versions, which would block a caller indefinitely on a
/// request that never returned.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Performs GET requests for the consent resolvers.
///
/// The resolvers only ever need "URL in, raw body out, or failure"; keeping
/// the trait this small lets tests substitute a recording fake.
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    /// Performs a GET request and returns the raw response body.
    async fn get(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}

/// Default [`HttpClient`] backed by [`reqwest`].
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client with the default request timeout.
    pub fn new() -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::ResponseContent {
                status,
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    #[tokio::test]
    async fn get_returns_the_raw_response_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_site_data"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"site_id":"42"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = ReqwestClient::new().unwrap();
        let body = client
            .get(&format!("http://{}/get_site_data", server.address()))
            .await
            .unwrap();

        assert_eq!(body, br#"{"site_id":"42"}"#);
    }

    #[tokio::test]
    async fn get_surfaces_error_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = ReqwestClient::new().unwrap();
        let result = client
            .get(&format!("http://{}/get_site_data", server.address()))
            .await;

        assert!(matches!(
            result,
            Err(ApiError::ResponseContent { status, message })
                if status == reqwest::StatusCode::INTERNAL_SERVER_ERROR && message == "boom"
        ));
    }
}
