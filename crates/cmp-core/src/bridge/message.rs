use serde::Deserialize;
use serde_json::Value;

/// Raw `{ name, body }` envelope posted by the injected receiver script.
#[derive(Deserialize)]
struct Envelope {
    name: String,
    #[serde(default)]
    body: Value,
}

#[derive(Deserialize)]
struct MessageDataBody {
    #[serde(default, rename = "willShowMessage")]
    will_show_message: bool,
    #[serde(default, rename = "msgJSON")]
    msg_json: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceSelectBody {
    #[serde(default, rename = "choiceType")]
    choice_type: Option<i64>,
}

#[derive(Deserialize)]
struct InteractionCompleteBody {
    #[serde(default)]
    euconsent: Option<String>,
    #[serde(default, rename = "consentUUID")]
    consent_uuid: Option<String>,
}

/// A protocol message from the hosted consent page.
///
/// Message bodies are loosely typed on the wire; they are parsed exactly
/// once here, at the bridge boundary, so nothing dynamic travels further
/// into the SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentMessage {
    /// The page has decided whether a consent message will be shown.
    MessageData {
        /// Whether the page is about to render a message to the user.
        will_show_message: bool,
        /// Raw message JSON, when the page included one.
        msg_json: Option<String>,
    },
    /// The user picked a choice inside the message.
    ChoiceSelected {
        /// Numeric choice identifier defined by the message campaign.
        choice_type: i64,
    },
    /// The user finished interacting with the message.
    InteractionComplete {
        /// Updated EU consent string, when one was produced.
        eu_consent: Option<String>,
        /// Updated consent UUID, when one was produced.
        consent_uuid: Option<String>,
    },
}

impl ConsentMessage {
    /// Parses a raw envelope from the page channel.
    ///
    /// Unrecognized message names (and choice selections without a choice)
    /// yield `Ok(None)` and are dropped by the bridge without an error.
    /// Malformed JSON is an `Err` so the bridge can log it.
    pub fn parse(raw: &str) -> Result<Option<ConsentMessage>, serde_json::Error> {
        let envelope: Envelope = serde_json::from_str(raw)?;
        // An absent body arrives as JSON null; treat it as an empty one.
        let body_value = match envelope.body {
            Value::Null => Value::Object(serde_json::Map::new()),
            body => body,
        };

        Ok(match envelope.name.as_str() {
            "onReceiveMessageData" => {
                let body: MessageDataBody = serde_json::from_value(body_value)?;
                Some(ConsentMessage::MessageData {
                    will_show_message: body.will_show_message,
                    msg_json: body.msg_json,
                })
            }
            "onMessageChoiceSelect" => {
                let body: ChoiceSelectBody = serde_json::from_value(body_value)?;
                body.choice_type
                    .map(|choice_type| ConsentMessage::ChoiceSelected { choice_type })
            }
            "interactionComplete" => {
                let body: InteractionCompleteBody = serde_json::from_value(body_value)?;
                Some(ConsentMessage::InteractionComplete {
                    eu_consent: body.euconsent,
                    consent_uuid: body.consent_uuid,
                })
            }
            _ => None,
        })
    }
}
