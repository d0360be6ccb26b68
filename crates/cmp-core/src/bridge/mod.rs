//! Message bridge between the native SDK and the hosted consent page.

mod message;
mod script;

use std::sync::Arc;

use cmp_state::{ConsentRecord, ConsentStore, RepositoryError};

pub use message::ConsentMessage;
pub use script::js_receiver_script;

/// Host-provided surface displaying the consent message page.
///
/// The SDK never renders anything itself; it only tells the host when the
/// surface should become visible and when it is done.
pub trait PageHost: Send {
    /// Expands the page surface to fill its container.
    fn show_page(&mut self);
    /// Collapses and detaches the page surface.
    fn dismiss_page(&mut self);
}

/// Receives consent session events.
///
/// Each protocol message produces at most one call per method, exactly once;
/// all default to no-ops so hosts implement only what they care about.
pub trait ConsentEventHandler: Send {
    /// A consent message payload arrived from the page.
    fn on_message_data(&mut self, _msg_json: &str) {}
    /// The user selected a choice inside the message.
    fn on_choice_selected(&mut self, _choice_type: i64) {}
    /// The interaction finished; `record` holds the current consent values.
    fn on_interaction_complete(&mut self, _record: &ConsentRecord) {}
}

/// Lifecycle of one bridge instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// The page is loading; nothing has been received yet.
    Loading,
    /// The page is up and the user may interact with the message.
    AwaitingInteraction,
    /// The session ended. A closed bridge never reopens; a new page load
    /// gets a fresh instance.
    Closed,
}

/// Routes protocol messages from the hosted page to the store, the event
/// handler and the page surface.
///
/// Messages are handled to completion one at a time; the host delivers them
/// from a single logical queue by calling
/// [`handle_raw`](MessageBridge::handle_raw) with each envelope it receives
/// on the script channel.
pub struct MessageBridge<H: PageHost, E: ConsentEventHandler> {
    store: Arc<ConsentStore>,
    host: H,
    handler: E,
    state: BridgeState,
    consent: ConsentRecord,
    msg_json: Option<String>,
    choice_type: Option<i64>,
}

impl<H: PageHost, E: ConsentEventHandler> MessageBridge<H, E> {
    /// Creates a bridge for a fresh page load, reading the persisted consent
    /// record so the session starts from the stored values.
    pub async fn new(
        store: Arc<ConsentStore>,
        host: H,
        handler: E,
    ) -> Result<Self, RepositoryError> {
        let consent = store.consent_record().await?;
        Ok(Self {
            store,
            host,
            handler,
            state: BridgeState::Loading,
            consent,
            msg_json: None,
            choice_type: None,
        })
    }

    /// Current bridge lifecycle state.
    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// The last message payload received from the page, if any.
    pub fn msg_json(&self) -> Option<&str> {
        self.msg_json.as_deref()
    }

    /// The last choice the user selected, if any.
    pub fn choice_type(&self) -> Option<i64> {
        self.choice_type
    }

    /// The consent values as of the latest completed interaction.
    pub fn consent_record(&self) -> &ConsentRecord {
        &self.consent
    }

    /// Handles one raw envelope from the page channel.
    ///
    /// Unrecognized names are dropped silently and malformed envelopes are
    /// logged; neither is an error to the host.
    pub async fn handle_raw(&mut self, raw: &str) -> Result<(), RepositoryError> {
        match ConsentMessage::parse(raw) {
            Ok(Some(message)) => self.handle_message(message).await,
            Ok(None) => {
                log::debug!("ignoring unrecognized page message");
                Ok(())
            }
            Err(e) => {
                log::warn!("malformed page message: {e}");
                Ok(())
            }
        }
    }

    /// Handles one parsed protocol message.
    pub async fn handle_message(&mut self, message: ConsentMessage) -> Result<(), RepositoryError> {
        if self.state == BridgeState::Closed {
            log::warn!("page message received after the session closed; ignoring");
            return Ok(());
        }

        match message {
            ConsentMessage::MessageData {
                will_show_message,
                msg_json,
            } => {
                if let Some(msg_json) = msg_json {
                    self.handler.on_message_data(&msg_json);
                    self.msg_json = Some(msg_json);
                }

                if will_show_message {
                    self.host.show_page();
                    self.state = BridgeState::AwaitingInteraction;
                } else {
                    self.close();
                }
            }
            ConsentMessage::ChoiceSelected { choice_type } => {
                self.choice_type = Some(choice_type);
                self.handler.on_choice_selected(choice_type);
            }
            ConsentMessage::InteractionComplete {
                eu_consent,
                consent_uuid,
            } => {
                self.store
                    .update_consent(eu_consent.as_deref(), consent_uuid.as_deref())
                    .await?;
                if let Some(eu_consent) = eu_consent {
                    self.consent.eu_consent = Some(eu_consent);
                }
                if let Some(consent_uuid) = consent_uuid {
                    self.consent.consent_uuid = Some(consent_uuid);
                }

                self.close();
            }
        }

        Ok(())
    }

    fn close(&mut self) {
        self.handler.on_interaction_complete(&self.consent);
        self.host.dismiss_page();
        self.state = BridgeState::Closed;
    }
}
