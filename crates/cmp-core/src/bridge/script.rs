/// Builds the receiver shim the host must inject into the message page
/// before any page script runs.
///
/// The shim defines `window.JSReceiver`, the uniform interface the message
/// page calls into regardless of platform, and forwards each call through
/// the host's message channel as a `{ name, body }` envelope for
/// [`ConsentMessage::parse`](crate::ConsentMessage::parse).
///
/// `message_channel` is the JavaScript expression for the host object
/// exposing `postMessage`, e.g.
/// `window.webkit.messageHandlers.JSReceiver` in a `WKWebView` host.
pub fn js_receiver_script(message_channel: &str) -> String {
    format!(
        "(function () {{\n\
         function postToHost (name, body) {{\n\
         \x20 {message_channel}.postMessage({{ name: name, body: body }});\n\
         }}\n\
         window.JSReceiver = {{\n\
         \x20 onReceiveMessageData: function (willShowMessage, msgJSON) {{ postToHost('onReceiveMessageData', {{ willShowMessage: willShowMessage, msgJSON: msgJSON }}); }},\n\
         \x20 onMessageChoiceSelect: function (choiceType) {{ postToHost('onMessageChoiceSelect', {{ choiceType: choiceType }}); }},\n\
         \x20 sendConsentData: function (euconsent, consentUUID) {{ postToHost('interactionComplete', {{ euconsent: euconsent, consentUUID: consentUUID }}); }}\n\
         }};\n\
         }})();"
    )
}
