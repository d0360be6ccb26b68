#![doc = include_str!("../README.md")]

mod bridge;
mod config;
mod encoding;
mod error;
mod http;
mod site_id;
mod vendor_consent;

#[cfg(test)]
pub(crate) mod test_util;

pub use bridge::{
    js_receiver_script, BridgeState, ConsentEventHandler, ConsentMessage, MessageBridge, PageHost,
};
pub use config::{DebugLevel, SessionConfig, TargetingValue};
pub use encoding::encode_uri_component;
pub use error::{ApiError, UrlError};
pub use http::{HttpClient, ReqwestClient};
pub use site_id::SiteIdResolver;
pub use vendor_consent::VendorConsentResolver;
