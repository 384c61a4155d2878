//! Telegram Bot API channel.
//!
//! Outbound calls go to `{api_url}/bot{token}/{method}` as JSON POSTs.
//! Inbound events are pulled with `getUpdates` long polling; the channel
//! tracks the update offset itself so each update is delivered once.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::channels::{
    ChatId, ChatTransport, InboundEvent, InlineKeyboard, InteractionId, MessageId, Sender, UserId,
};
use crate::config::TelegramConfig;
use crate::error::ChannelError;

const CHANNEL_NAME: &str = "telegram";

/// Slack on top of the long-poll timeout before the HTTP client gives up.
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Telegram Bot API client.
pub struct TelegramChannel {
    api_url: String,
    token: SecretString,
    poll_timeout: Duration,
    client: reqwest::Client,
    offset: AtomicI64,
}

impl TelegramChannel {
    pub fn new(config: &TelegramConfig) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder()
            .timeout(config.poll_timeout + POLL_GRACE)
            .build()
            .map_err(|e| ChannelError::Http(e.to_string()))?;

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.bot_token.clone(),
            poll_timeout: config.poll_timeout,
            client,
            offset: AtomicI64::new(0),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_url,
            self.token.expose_secret(),
            method
        )
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> Result<T, ApiFailure> {
        let response = self
            .client
            .post(self.endpoint(method))
            .json(&body)
            .send()
            .await
            // reqwest errors carry the URL, which contains the token.
            .map_err(|e| ApiFailure::Transport(e.without_url().to_string()))?;

        let status = response.status();
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| ApiFailure::Transport(format!("HTTP {status}: {}", e.without_url())))?;

        envelope.into_result()
    }

    /// Check the token by calling `getMe`. Returns the bot's username.
    pub async fn verify(&self) -> Result<String, ChannelError> {
        let me: TgUser = self
            .call("getMe", json!({}))
            .await
            .map_err(|f| f.into_channel_error(|reason| ChannelError::AuthFailed {
                name: CHANNEL_NAME.to_string(),
                reason,
            }))?;
        Ok(me.username.unwrap_or(me.first_name))
    }

    /// Publish the command menu shown by Telegram clients.
    pub async fn register_commands(&self, commands: &[(&str, &str)]) -> Result<(), ChannelError> {
        let commands: Vec<Value> = commands
            .iter()
            .map(|(command, description)| json!({ "command": command, "description": description }))
            .collect();

        let _: bool = self
            .call("setMyCommands", json!({ "commands": commands }))
            .await
            .map_err(|f| f.into_channel_error(|reason| send_failed(reason)))?;
        Ok(())
    }

    /// Wait for the next batch of updates and convert them to events.
    ///
    /// Updates that carry nothing the bot reacts to are skipped but still
    /// acknowledged.
    pub async fn poll_updates(&self) -> Result<Vec<InboundEvent>, ChannelError> {
        let offset = self.offset.load(Ordering::SeqCst);
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                json!({
                    "offset": offset,
                    "timeout": self.poll_timeout.as_secs(),
                    "allowed_updates": ["message", "callback_query"],
                }),
            )
            .await
            .map_err(|f| f.into_channel_error(ChannelError::Http))?;

        if let Some(last) = updates.iter().map(|u| u.update_id).max() {
            self.offset.store(last + 1, Ordering::SeqCst);
        }

        Ok(updates.into_iter().filter_map(Update::into_event).collect())
    }
}

#[async_trait]
impl ChatTransport for TelegramChannel {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageId, ChannelError> {
        let mut body = json!({ "chat_id": chat.0, "text": text });
        attach_keyboard(&mut body, keyboard);

        let sent: TgMessage = self
            .call("sendMessage", body)
            .await
            .map_err(|f| f.into_channel_error(send_failed))?;
        Ok(MessageId(sent.message_id))
    }

    async fn send_html(
        &self,
        chat: ChatId,
        html: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageId, ChannelError> {
        let mut body = json!({
            "chat_id": chat.0,
            "text": html,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });
        attach_keyboard(&mut body, keyboard);

        let sent: TgMessage = self
            .call("sendMessage", body)
            .await
            .map_err(|f| f.into_channel_error(send_failed))?;
        Ok(MessageId(sent.message_id))
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        html: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), ChannelError> {
        let mut body = json!({
            "chat_id": chat.0,
            "message_id": message.0,
            "text": html,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });
        attach_keyboard(&mut body, keyboard);

        match self.call::<Value>("editMessageText", body).await {
            Ok(_) => Ok(()),
            Err(failure) if failure.is_not_modified() => Ok(()),
            Err(failure) => Err(failure.into_channel_error(|reason| edit_failed(message, reason))),
        }
    }

    async fn edit_keyboard(
        &self,
        chat: ChatId,
        message: MessageId,
        keyboard: &InlineKeyboard,
    ) -> Result<(), ChannelError> {
        let body = json!({
            "chat_id": chat.0,
            "message_id": message.0,
            "reply_markup": keyboard_json(keyboard),
        });

        match self.call::<Value>("editMessageReplyMarkup", body).await {
            Ok(_) => Ok(()),
            Err(failure) if failure.is_not_modified() => Ok(()),
            Err(failure) => Err(failure.into_channel_error(|reason| edit_failed(message, reason))),
        }
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), ChannelError> {
        let _: bool = self
            .call(
                "deleteMessage",
                json!({ "chat_id": chat.0, "message_id": message.0 }),
            )
            .await
            .map_err(|f| {
                f.into_channel_error(|reason| ChannelError::DeleteFailed {
                    name: CHANNEL_NAME.to_string(),
                    message_id: message.0,
                    reason,
                })
            })?;
        Ok(())
    }

    async fn answer_interaction(
        &self,
        interaction: &InteractionId,
        text: Option<&str>,
    ) -> Result<(), ChannelError> {
        let mut body = json!({ "callback_query_id": interaction.0 });
        if let Some(text) = text {
            body["text"] = Value::String(text.to_string());
        }

        let _: bool = self
            .call("answerCallbackQuery", body)
            .await
            .map_err(|f| f.into_channel_error(send_failed))?;
        Ok(())
    }
}

fn send_failed(reason: String) -> ChannelError {
    ChannelError::SendFailed {
        name: CHANNEL_NAME.to_string(),
        reason,
    }
}

fn edit_failed(message: MessageId, reason: String) -> ChannelError {
    ChannelError::EditFailed {
        name: CHANNEL_NAME.to_string(),
        message_id: message.0,
        reason,
    }
}

fn attach_keyboard(body: &mut Value, keyboard: Option<&InlineKeyboard>) {
    if let Some(keyboard) = keyboard.filter(|k| !k.is_empty()) {
        body["reply_markup"] = keyboard_json(keyboard);
    }
}

/// `InlineKeyboardMarkup` for `keyboard`.
fn keyboard_json(keyboard: &InlineKeyboard) -> Value {
    let rows: Vec<Vec<Value>> = keyboard
        .rows
        .iter()
        .filter(|row| !row.is_empty())
        .map(|row| {
            row.iter()
                .map(|button| json!({ "text": button.label, "callback_data": button.data.encode() }))
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": rows })
}

/// Why a Bot API call did not produce a result.
#[derive(Debug)]
enum ApiFailure {
    /// The request never got a well-formed answer.
    Transport(String),
    /// Telegram answered with `ok: false`.
    Rejected {
        code: Option<i64>,
        description: String,
        retry_after: Option<u64>,
    },
}

impl ApiFailure {
    fn is_not_modified(&self) -> bool {
        matches!(self, Self::Rejected { description, .. } if description.contains("message is not modified"))
    }

    /// Map to a [`ChannelError`]. Auth and rate-limit rejections get their
    /// own variants; everything else goes through `other`.
    fn into_channel_error(self, other: impl FnOnce(String) -> ChannelError) -> ChannelError {
        match self {
            Self::Transport(reason) => other(reason),
            Self::Rejected {
                code: Some(401), description, ..
            } => ChannelError::AuthFailed {
                name: CHANNEL_NAME.to_string(),
                reason: description,
            },
            Self::Rejected {
                code: Some(429),
                retry_after,
                ..
            } => ChannelError::RateLimited {
                name: CHANNEL_NAME.to_string(),
                retry_after: retry_after.map(Duration::from_secs),
            },
            Self::Rejected {
                code, description, ..
            } => match code {
                Some(code) => other(format!("{code}: {description}")),
                None => other(description),
            },
        }
    }
}

/// Response wrapper shared by every Bot API method.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

impl<T> Envelope<T> {
    fn into_result(self) -> Result<T, ApiFailure> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(ApiFailure::Transport(
                "response marked ok but carried no result".to_string(),
            )),
            (false, _) => Err(ApiFailure::Rejected {
                code: self.error_code,
                description: self
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
                retry_after: self.parameters.and_then(|p| p.retry_after),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<TgMessage>,
    callback_query: Option<TgCallbackQuery>,
}

#[derive(Debug, Deserialize)]
struct TgMessage {
    message_id: i64,
    chat: TgChat,
    from: Option<TgUser>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct TgUser {
    id: i64,
    first_name: String,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgCallbackQuery {
    id: String,
    from: TgUser,
    message: Option<TgMessage>,
    data: Option<String>,
}

impl Update {
    fn into_event(self) -> Option<InboundEvent> {
        if let Some(query) = self.callback_query {
            // Without the originating message (very old messages) the
            // private chat with the user is the best target.
            let chat = query
                .message
                .as_ref()
                .map_or(query.from.id, |m| m.chat.id);
            return Some(InboundEvent::Callback {
                sender: Sender {
                    user: UserId(query.from.id),
                    chat: ChatId(chat),
                    display_name: Some(query.from.first_name),
                },
                interaction: InteractionId(query.id),
                message: query.message.map(|m| MessageId(m.message_id)),
                data: query.data.unwrap_or_default(),
            });
        }

        let message = self.message?;
        let text = message.text?;
        let from = message.from?;
        Some(InboundEvent::Text {
            sender: Sender {
                user: UserId(from.id),
                chat: ChatId(message.chat.id),
                display_name: Some(from.first_name),
            },
            text,
        })
    }
}
