use std::sync::Arc;

use crate::repository::{ConsentRepository, RepositoryError};

/// Storage keys shared with the hosted message page and other SDK platforms.
///
/// The literal values are part of the SDK's persisted contract and must not
/// change between releases.
pub mod keys {
    /// Key holding the IAB EU consent string.
    pub const EU_CONSENT: &str = "euconsent";
    /// Key holding the consent UUID assigned by the CMP endpoint.
    pub const CONSENT_UUID: &str = "consentUUID";

    const SP_PREFIX: &str = "_sp_";

    /// Key caching the resolved site id for an account/site pair.
    pub fn site_id(account_id: u32, site_name: &str) -> String {
        format!("{SP_PREFIX}site_id_{account_id}_{site_name}")
    }

    /// Key caching the consent flag for a single custom vendor.
    pub fn vendor_consent(vendor_id: &str) -> String {
        format!("{SP_PREFIX}_custom_vendor_consent_{vendor_id}")
    }
}

/// The two canonical consent values persisted across sessions.
///
/// Either field may be absent until the user completes an interaction with
/// the consent message. There is no cross-field validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsentRecord {
    /// IAB EU consent string, if the user has completed an interaction.
    pub eu_consent: Option<String>,
    /// Consent UUID assigned by the CMP endpoint, if any.
    pub consent_uuid: Option<String>,
}

/// Typed access to the consent values and caches kept in durable storage.
///
/// Every write is followed by a [`ConsentRepository::flush`] so that a crash
/// right after an update cannot lose a consent decision.
pub struct ConsentStore {
    repository: Arc<dyn ConsentRepository>,
}

impl ConsentStore {
    /// Creates a store backed by the given repository.
    pub fn new(repository: Arc<dyn ConsentRepository>) -> Self {
        Self { repository }
    }

    /// Reads the persisted consent record. Missing keys yield `None` fields.
    pub async fn consent_record(&self) -> Result<ConsentRecord, RepositoryError> {
        Ok(ConsentRecord {
            eu_consent: self.repository.get(keys::EU_CONSENT).await?,
            consent_uuid: self.repository.get(keys::CONSENT_UUID).await?,
        })
    }

    /// Persists the EU consent string when `value` is present.
    ///
    /// A `None` argument is a no-op: an absent value never clears a
    /// previously stored one.
    pub async fn set_consent_string(&self, value: Option<&str>) -> Result<(), RepositoryError> {
        if let Some(value) = value {
            self.repository.set(keys::EU_CONSENT, value).await?;
            self.repository.flush().await?;
        }
        Ok(())
    }

    /// Persists the consent UUID when `value` is present.
    pub async fn set_consent_uuid(&self, value: Option<&str>) -> Result<(), RepositoryError> {
        if let Some(value) = value {
            self.repository.set(keys::CONSENT_UUID, value).await?;
            self.repository.flush().await?;
        }
        Ok(())
    }

    /// Persists both consent values in one update, flushing once if either
    /// was present. Used when the page reports a completed interaction.
    pub async fn update_consent(
        &self,
        eu_consent: Option<&str>,
        consent_uuid: Option<&str>,
    ) -> Result<(), RepositoryError> {
        if let Some(value) = eu_consent {
            self.repository.set(keys::EU_CONSENT, value).await?;
        }
        if let Some(value) = consent_uuid {
            self.repository.set(keys::CONSENT_UUID, value).await?;
        }
        if eu_consent.is_some() || consent_uuid.is_some() {
            self.repository.flush().await?;
        }
        Ok(())
    }

    /// Returns the cached consent flag for a vendor, or `None` when the
    /// vendor has never been resolved.
    pub async fn cached_vendor_consent(
        &self,
        vendor_id: &str,
    ) -> Result<Option<bool>, RepositoryError> {
        let value = self.repository.get(&keys::vendor_consent(vendor_id)).await?;
        Ok(value.map(|v| v == "true"))
    }

    /// Caches the consent flag for a vendor.
    pub async fn set_cached_vendor_consent(
        &self,
        vendor_id: &str,
        granted: bool,
    ) -> Result<(), RepositoryError> {
        let value = if granted { "true" } else { "false" };
        self.repository
            .set(&keys::vendor_consent(vendor_id), value)
            .await?;
        self.repository.flush().await?;
        Ok(())
    }

    /// Returns the cached site id for an account/site pair, if resolved.
    pub async fn cached_site_id(
        &self,
        account_id: u32,
        site_name: &str,
    ) -> Result<Option<String>, RepositoryError> {
        self.repository.get(&keys::site_id(account_id, site_name)).await
    }

    /// Caches a resolved site id. Cached indefinitely, there is no TTL.
    pub async fn set_cached_site_id(
        &self,
        account_id: u32,
        site_name: &str,
        site_id: &str,
    ) -> Result<(), RepositoryError> {
        self.repository
            .set(&keys::site_id(account_id, site_name), site_id)
            .await?;
        self.repository.flush().await?;
        Ok(())
    }
}
