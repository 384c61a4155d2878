//! Chat transport abstraction.
//!
//! The navigation core never talks to a chat service directly. It sends,
//! edits and deletes messages through [`ChatTransport`], and receives user
//! actions as [`InboundEvent`]s produced by a concrete channel such as
//! [`telegram::TelegramChannel`].

mod callback;
pub mod telegram;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

pub use callback::CallbackData;

/// Identity of the user a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// Conversation messages are sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

/// Handle of a message previously sent to a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i64);

/// Handle of a button press that must be acknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InteractionId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: CallbackData,
}

impl Button {
    pub fn new(label: impl Into<String>, data: CallbackData) -> Self {
        Self {
            label: label.into(),
            data,
        }
    }
}

/// Rows of inline buttons attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<Button>>,
}

impl InlineKeyboard {
    /// Previous/Next row for result navigation. Empty when neither applies.
    pub fn navigation(can_retreat: bool, can_advance: bool) -> Self {
        let mut row = Vec::new();
        if can_retreat {
            row.push(Button::new("Previous", CallbackData::Retreat));
        }
        if can_advance {
            row.push(Button::new("Next", CallbackData::Advance));
        }
        if row.is_empty() {
            Self::default()
        } else {
            Self { rows: vec![row] }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.is_empty())
    }
}

/// Who sent an inbound event and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub user: UserId,
    pub chat: ChatId,
    /// Display name used for greetings.
    pub display_name: Option<String>,
}

/// A user action delivered by a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Plain text or a `/command`.
    Text { sender: Sender, text: String },
    /// Inline button press on `message`.
    Callback {
        sender: Sender,
        interaction: InteractionId,
        message: Option<MessageId>,
        data: String,
    },
}

impl InboundEvent {
    pub fn sender(&self) -> &Sender {
        match self {
            Self::Text { sender, .. } | Self::Callback { sender, .. } => sender,
        }
    }
}

/// Outbound side of a chat service.
///
/// Text passed to the `*_html` and `edit_text` methods uses the channel's
/// HTML markup; `send_text` is sent verbatim.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Channel name used in logs and errors.
    fn name(&self) -> &str;

    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageId, ChannelError>;

    async fn send_html(
        &self,
        chat: ChatId,
        html: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageId, ChannelError>;

    /// Replace the text (HTML) and keyboard of an existing message.
    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        html: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), ChannelError>;

    /// Replace only the keyboard of an existing message.
    async fn edit_keyboard(
        &self,
        chat: ChatId,
        message: MessageId,
        keyboard: &InlineKeyboard,
    ) -> Result<(), ChannelError>;

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), ChannelError>;

    /// Acknowledge a button press, optionally with a short notice.
    async fn answer_interaction(
        &self,
        interaction: &InteractionId,
        text: Option<&str>,
    ) -> Result<(), ChannelError>;
}
