//! URI-component encoding for query-string construction.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Escape set matching JavaScript's `encodeURIComponent`: ASCII
/// alphanumerics and `-_.!~*'()` pass through, everything else is escaped
/// as UTF-8 bytes. The message page decodes these parameters with the
/// standard browser functions, so the sets must agree.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes `value` for use as a URI component.
pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}
