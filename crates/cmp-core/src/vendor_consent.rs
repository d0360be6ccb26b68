//! Batched custom-vendor consent resolution.

use std::sync::Arc;

use cmp_state::ConsentStore;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::{
    config::SessionConfig, encoding::encode_uri_component, error::ApiError, http::HttpClient,
    site_id::SiteIdResolver,
};

/// Anonymous sentinels the consent endpoint accepts in place of values the
/// user has not produced yet.
const CONSENT_UUID_PLACEHOLDER: &str = "[CONSENT_UUID]";
const EU_CONSENT_PLACEHOLDER: &str = "[EUCONSENT]";

#[derive(Deserialize)]
struct ConsentedVendor {
    #[serde(rename = "_id")]
    id: String,
}

/// Answers "has the user consented to vendor X" for custom vendors.
///
/// Cached answers are served from the [`ConsentStore`]; all cache misses in
/// one call are coalesced into a single batched request, never one request
/// per vendor. Every failure degrades to `false` (default deny), a consent
/// lookup must never take the host application down.
pub struct VendorConsentResolver {
    store: Arc<ConsentStore>,
    http: Arc<dyn HttpClient>,
    site_ids: Arc<SiteIdResolver>,
    // One outstanding batch at a time per resolver instance.
    batch: Mutex<()>,
}

impl VendorConsentResolver {
    /// Creates a resolver over the given cache, HTTP collaborator and
    /// site-id resolver.
    pub fn new(
        store: Arc<ConsentStore>,
        http: Arc<dyn HttpClient>,
        site_ids: Arc<SiteIdResolver>,
    ) -> Self {
        Self {
            store,
            http,
            site_ids,
            batch: Mutex::new(()),
        }
    }

    /// Resolves the consent flag for a single vendor.
    pub async fn resolve(&self, config: &SessionConfig, vendor_id: &str) -> bool {
        let ids = [vendor_id.to_string()];
        self.resolve_all(config, &ids)
            .await
            .first()
            .copied()
            .unwrap_or(false)
    }

    /// Resolves consent flags for `vendor_ids`, one-to-one and in order.
    ///
    /// Unknown vendors and every failure mode resolve to `false`. When the
    /// site id cannot be resolved, no vendor request is attempted at all.
    pub async fn resolve_all(&self, config: &SessionConfig, vendor_ids: &[String]) -> Vec<bool> {
        let mut result = vec![false; vendor_ids.len()];

        let Some(site_id) = self.site_ids.resolve(config).await else {
            return result;
        };

        let _guard = self.batch.lock().await;

        let mut uncached = Vec::new();
        for (index, vendor_id) in vendor_ids.iter().enumerate() {
            match self.store.cached_vendor_consent(vendor_id).await {
                Ok(Some(granted)) => result[index] = granted,
                Ok(None) => uncached.push(vendor_id.clone()),
                Err(e) => {
                    log::warn!("vendor consent cache read failed: {e}");
                    return result;
                }
            }
        }

        if uncached.is_empty() {
            return result;
        }

        if let Err(e) = self.fetch_batch(config, &site_id, &uncached).await {
            log::warn!("custom vendor consent lookup failed: {e}");
        }

        // Re-read everything that was requested: ids answered by this batch
        // and ids that were already cached going into it.
        for (index, vendor_id) in vendor_ids.iter().enumerate() {
            if let Ok(Some(granted)) = self.store.cached_vendor_consent(vendor_id).await {
                result[index] = granted;
            }
        }

        result
    }

    async fn fetch_batch(
        &self,
        config: &SessionConfig,
        site_id: &str,
        vendor_ids: &[String],
    ) -> Result<(), ApiError> {
        let record = self.store.consent_record().await?;
        let consent_uuid = record
            .consent_uuid
            .unwrap_or_else(|| CONSENT_UUID_PLACEHOLDER.to_string());
        let eu_consent = record
            .eu_consent
            .unwrap_or_else(|| EU_CONSENT_PLACEHOLDER.to_string());

        let url = format!(
            "https://{}/v2/consent/{}/custom-vendors?customVendorIds={}&consent_uuid={}&euconsent={}",
            config.cmp_domain_to_load(),
            site_id,
            encode_uri_component(&vendor_ids.join(",")),
            consent_uuid,
            eu_consent,
        );
        log::debug!("resolving custom vendor consents: {url}");

        let body = self.http.get(&url).await?;
        let consented: Vec<ConsentedVendor> = serde_json::from_slice(&body)?;

        // Vendors absent from the response are cached as explicitly denied,
        // otherwise every later call would re-request them forever.
        for vendor_id in vendor_ids {
            let granted = consented.iter().any(|vendor| &vendor.id == vendor_id);
            self.store
                .set_cached_vendor_consent(vendor_id, granted)
                .await?;
        }

        Ok(())
    }
}
