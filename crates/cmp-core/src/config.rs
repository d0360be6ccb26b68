//! Session configuration and message-page URL construction.

use std::collections::BTreeMap;

use serde::Serialize;
use url::Url;

use crate::{encoding::encode_uri_component, error::UrlError};

const STAGE_MESSAGING_PAGE_URL: &str = "http://in-app-messaging.pm.cmp.sp-stage.net/";
const PROD_MESSAGING_PAGE_URL: &str = "http://in-app-messaging.pm.sourcepoint.mgr.consensu.org/";

const STAGE_MMS_DOMAIN: &str = "mms.sp-stage.net";
const PROD_MMS_DOMAIN: &str = "mms.sp-prod.net";

const STAGE_CMP_DOMAIN: &str = "cmp.sp-stage.net";
const PROD_CMP_DOMAIN: &str = "sourcepoint.mgr.consensu.org";

/// Verbosity of the in-page messaging script, passed through as
/// `_sp_debug_level`.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DebugLevel {
    Debug,
    Info,
    Time,
    Warn,
    Error,
    #[default]
    Off,
}

impl DebugLevel {
    fn as_str(self) -> &'static str {
        match self {
            DebugLevel::Debug => "DEBUG",
            DebugLevel::Info => "INFO",
            DebugLevel::Time => "TIME",
            DebugLevel::Warn => "WARN",
            DebugLevel::Error => "ERROR",
            DebugLevel::Off => "OFF",
        }
    }
}

/// A targeting parameter value. The message page accepts strings and
/// integers; both serialize into the `_sp_msg_targetingParams` JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TargetingValue {
    /// A string parameter.
    String(String),
    /// An integer parameter.
    Int(i64),
}

impl From<&str> for TargetingValue {
    fn from(value: &str) -> Self {
        TargetingValue::String(value.to_string())
    }
}

impl From<String> for TargetingValue {
    fn from(value: String) -> Self {
        TargetingValue::String(value)
    }
}

impl From<i64> for TargetingValue {
    fn from(value: i64) -> Self {
        TargetingValue::Int(value)
    }
}

/// Configuration for one consent session.
///
/// `account_id` and `site_name` are fixed at construction. The remaining
/// fields may be adjusted up until the message page is loaded; they are read
/// once when [`message_page_url`](SessionConfig::message_page_url) is built.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    account_id: u32,
    site_name: String,

    /// Path appended to the site name when building the site href.
    pub page: Option<String>,
    /// Targets the stage campaign instead of the public one.
    pub is_stage: bool,
    /// Routes all defaulted domains to the internal stage environment.
    pub is_internal_stage: bool,
    /// Overrides the default messaging-page URL.
    pub in_app_messaging_page_url: Option<String>,
    /// Overrides the default MMS domain.
    pub mms_domain: Option<String>,
    /// Overrides the default CMP domain.
    pub cmp_domain: Option<String>,
    /// Verbosity of the in-page messaging script.
    pub debug_level: DebugLevel,

    targeting_params: BTreeMap<String, TargetingValue>,
}

impl SessionConfig {
    /// Creates a configuration for the given account and site.
    pub fn new(account_id: u32, site_name: impl Into<String>) -> Self {
        Self {
            account_id,
            site_name: site_name.into(),
            page: None,
            is_stage: false,
            is_internal_stage: false,
            in_app_messaging_page_url: None,
            mms_domain: None,
            cmp_domain: None,
            debug_level: DebugLevel::default(),
            targeting_params: BTreeMap::new(),
        }
    }

    /// The account id this session belongs to.
    pub fn account_id(&self) -> u32 {
        self.account_id
    }

    /// The property (site) name this session belongs to.
    pub fn site_name(&self) -> &str {
        &self.site_name
    }

    /// Sets a targeting parameter forwarded to the message page.
    pub fn set_targeting_param(&mut self, key: impl Into<String>, value: impl Into<TargetingValue>) {
        self.targeting_params.insert(key.into(), value.into());
    }

    /// The href identifying this site to the MMS and message endpoints.
    pub fn site_href(&self) -> String {
        format!(
            "http://{}/{}?",
            self.site_name,
            self.page.as_deref().unwrap_or("")
        )
    }

    /// The MMS domain to use, falling back by stage environment.
    pub fn mms_domain_to_load(&self) -> &str {
        self.mms_domain.as_deref().unwrap_or(if self.is_internal_stage {
            STAGE_MMS_DOMAIN
        } else {
            PROD_MMS_DOMAIN
        })
    }

    /// The CMP domain to use, falling back by stage environment.
    pub fn cmp_domain_to_load(&self) -> &str {
        self.cmp_domain.as_deref().unwrap_or(if self.is_internal_stage {
            STAGE_CMP_DOMAIN
        } else {
            PROD_CMP_DOMAIN
        })
    }

    /// Builds the full message-page URL for this session.
    ///
    /// Query parameters are appended in a fixed order the page relies on.
    /// Targeting parameters are included only when they serialize; a
    /// serialization failure is logged and the parameter omitted, the
    /// session continues without it. A URL that fails to parse as a whole
    /// aborts session start.
    pub fn message_page_url(&self) -> Result<Url, UrlError> {
        let base = self.in_app_messaging_page_url.as_deref().unwrap_or(
            if self.is_internal_stage {
                STAGE_MESSAGING_PAGE_URL
            } else {
                PROD_MESSAGING_PAGE_URL
            },
        );

        let mut params = vec![
            "_sp_cmp_inApp=true".to_string(),
            "_sp_writeFirstPartyCookies=true".to_string(),
            format!("_sp_siteHref={}", encode_uri_component(&self.site_href())),
            format!("_sp_accountId={}", self.account_id),
            format!(
                "_sp_msg_domain={}",
                encode_uri_component(self.mms_domain_to_load())
            ),
            format!(
                "_sp_cmp_origin={}",
                encode_uri_component(&format!("//{}", self.cmp_domain_to_load()))
            ),
            format!("_sp_debug_level={}", self.debug_level.as_str()),
            format!("_sp_msg_stageCampaign={}", self.is_stage),
        ];

        match serde_json::to_string(&self.targeting_params) {
            Ok(json) => {
                params.push(format!(
                    "_sp_msg_targetingParams={}",
                    encode_uri_component(&json)
                ));
            }
            Err(e) => log::error!("error serializing targeting params: {e}"),
        }

        let url = format!("{}?{}", base, params.join("&"));
        log::debug!("message page url: {url}");

        Ok(Url::parse(&url)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_the_production_environment() {
        let config = SessionConfig::new(22, "demo.site");

        let url = config.message_page_url().unwrap();

        assert_eq!(
            url.as_str(),
            "http://in-app-messaging.pm.sourcepoint.mgr.consensu.org/\
             ?_sp_cmp_inApp=true\
             &_sp_writeFirstPartyCookies=true\
             &_sp_siteHref=http%3A%2F%2Fdemo.site%2F%3F\
             &_sp_accountId=22\
             &_sp_msg_domain=mms.sp-prod.net\
             &_sp_cmp_origin=%2F%2Fsourcepoint.mgr.consensu.org\
             &_sp_debug_level=OFF\
             &_sp_msg_stageCampaign=false\
             &_sp_msg_targetingParams=%7B%7D"
        );
    }

    #[test]
    fn internal_stage_switches_every_defaulted_domain() {
        let mut config = SessionConfig::new(22, "demo.site");
        config.is_internal_stage = true;

        let url = config.message_page_url().unwrap();

        assert!(url.as_str().starts_with(STAGE_MESSAGING_PAGE_URL));
        assert_eq!(config.mms_domain_to_load(), STAGE_MMS_DOMAIN);
        assert_eq!(config.cmp_domain_to_load(), STAGE_CMP_DOMAIN);
    }

    #[test]
    fn explicit_overrides_win_over_stage_defaults() {
        let mut config = SessionConfig::new(22, "demo.site");
        config.is_internal_stage = true;
        config.in_app_messaging_page_url = Some("https://messages.example/".to_string());
        config.mms_domain = Some("mms.example".to_string());
        config.cmp_domain = Some("cmp.example".to_string());

        let url = config.message_page_url().unwrap();

        assert!(url.as_str().starts_with("https://messages.example/?"));
        assert_eq!(config.mms_domain_to_load(), "mms.example");
        assert_eq!(config.cmp_domain_to_load(), "cmp.example");
    }

    #[test]
    fn page_path_and_stage_flag_feed_the_query() {
        let mut config = SessionConfig::new(22, "demo.site");
        config.page = Some("news/article".to_string());
        config.is_stage = true;
        config.debug_level = DebugLevel::Debug;

        let url = config.message_page_url().unwrap();
        let query = url.query().unwrap();

        assert!(query.contains("_sp_siteHref=http%3A%2F%2Fdemo.site%2Fnews%2Farticle%3F"));
        assert!(query.contains("_sp_msg_stageCampaign=true"));
        assert!(query.contains("_sp_debug_level=DEBUG"));
    }

    #[test]
    fn targeting_params_serialize_as_json() {
        let mut config = SessionConfig::new(22, "demo.site");
        config.set_targeting_param("CMP", "true");
        config.set_targeting_param("bucket", 5);

        let url = config.message_page_url().unwrap();
        let query = url.query().unwrap();

        // {"CMP":"true","bucket":5}
        assert!(query.contains(
            "_sp_msg_targetingParams=%7B%22CMP%22%3A%22true%22%2C%22bucket%22%3A5%7D"
        ));
    }
}
