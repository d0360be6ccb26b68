//! Site-id resolution against the MMS endpoint.

use std::sync::Arc;

use cmp_state::ConsentStore;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::{
    config::SessionConfig, encoding::encode_uri_component, error::ApiError, http::HttpClient,
};

#[derive(Deserialize)]
struct SiteDataResponse {
    site_id: String,
}

/// Resolves the numeric site id the CMP endpoints key consent data by.
///
/// A resolved id is cached indefinitely in the [`ConsentStore`] under the
/// account/site pair; only the first call for a pair goes to the network.
pub struct SiteIdResolver {
    store: Arc<ConsentStore>,
    http: Arc<dyn HttpClient>,
    // Held across a lookup so concurrent callers cannot race the same
    // remote resolution.
    lookup: Mutex<()>,
}

impl SiteIdResolver {
    /// Creates a resolver using the given cache and HTTP collaborator.
    pub fn new(store: Arc<ConsentStore>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            store,
            http,
            lookup: Mutex::new(()),
        }
    }

    /// Resolves the site id for `config`, consulting the cache first.
    ///
    /// Returns `None` when the lookup fails for any reason (network,
    /// malformed response, storage); callers treat that as "cannot resolve
    /// vendor consents right now" rather than an error.
    pub async fn resolve(&self, config: &SessionConfig) -> Option<String> {
        match self.try_resolve(config).await {
            Ok(site_id) => Some(site_id),
            Err(e) => {
                log::warn!("site id lookup failed: {e}");
                None
            }
        }
    }

    async fn try_resolve(&self, config: &SessionConfig) -> Result<String, ApiError> {
        let _guard = self.lookup.lock().await;

        if let Some(site_id) = self
            .store
            .cached_site_id(config.account_id(), config.site_name())
            .await?
        {
            return Ok(site_id);
        }

        let url = format!(
            "https://{}/get_site_data?account_id={}&href={}",
            config.mms_domain_to_load(),
            config.account_id(),
            encode_uri_component(&config.site_href())
        );
        log::debug!("resolving site id: {url}");

        let body = self.http.get(&url).await?;
        let response: SiteDataResponse = serde_json::from_slice(&body)?;

        self.store
            .set_cached_site_id(config.account_id(), config.site_name(), &response.site_id)
            .await?;

        Ok(response.site_id)
    }
}

#[cfg(test)]
mod tests {
    use cmp_state::InMemoryRepository;

    use super::*;
    use crate::test_util::FakeHttpClient;

    fn resolver_with(http: Arc<FakeHttpClient>) -> SiteIdResolver {
        let store = Arc::new(ConsentStore::new(Arc::new(InMemoryRepository::new())));
        SiteIdResolver::new(store, http)
    }

    #[tokio::test]
    async fn resolves_and_caches_the_site_id() {
        let http = Arc::new(FakeHttpClient::new());
        http.push_json(r#"{"site_id":"4587","site_name":"demo.site"}"#);
        let resolver = resolver_with(http.clone());
        let config = SessionConfig::new(22, "demo.site");

        assert_eq!(resolver.resolve(&config).await.as_deref(), Some("4587"));
        // Second call is served from the cache.
        assert_eq!(resolver.resolve(&config).await.as_deref(), Some("4587"));

        let calls = http.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            "https://mms.sp-prod.net/get_site_data?account_id=22\
             &href=http%3A%2F%2Fdemo.site%2F%3F"
        );
    }

    #[tokio::test]
    async fn concurrent_resolves_share_one_outstanding_request() {
        let http = Arc::new(FakeHttpClient::gated());
        http.push_json(r#"{"site_id":"4587"}"#);
        let resolver = Arc::new(resolver_with(http.clone()));

        let first = tokio::spawn({
            let resolver = resolver.clone();
            async move { resolver.resolve(&SessionConfig::new(22, "demo.site")).await }
        });
        let second = tokio::spawn({
            let resolver = resolver.clone();
            async move { resolver.resolve(&SessionConfig::new(22, "demo.site")).await }
        });

        // Let the first lookup go out and hold it there while the second
        // caller queues behind the lock.
        while http.calls().is_empty() {
            tokio::task::yield_now().await;
        }
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        http.release(2);

        assert_eq!(first.await.unwrap().as_deref(), Some("4587"));
        assert_eq!(second.await.unwrap().as_deref(), Some("4587"));
        // The second caller was served from the cache populated under the
        // lock, never from a duplicate request.
        assert_eq!(http.calls().len(), 1);
    }

    #[tokio::test]
    async fn network_failure_yields_none() {
        let http = Arc::new(FakeHttpClient::new());
        http.push_error();
        let resolver = resolver_with(http);
        let config = SessionConfig::new(22, "demo.site");

        assert_eq!(resolver.resolve(&config).await, None);
    }

    #[tokio::test]
    async fn malformed_response_yields_none_and_caches_nothing() {
        let http = Arc::new(FakeHttpClient::new());
        http.push_json(r#"{"unexpected":"shape"}"#);
        http.push_json(r#"{"site_id":"4587"}"#);
        let resolver = resolver_with(http.clone());
        let config = SessionConfig::new(22, "demo.site");

        assert_eq!(resolver.resolve(&config).await, None);
        // A failed lookup is retryable.
        assert_eq!(resolver.resolve(&config).await.as_deref(), Some("4587"));
        assert_eq!(http.calls().len(), 2);
    }
}
