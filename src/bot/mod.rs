//! Chat front-end.
//!
//! Turns inbound chat events into navigation intents and turns their
//! outcomes into replies. Rendering of results is done by the engine
//! itself; the bot only adds prompts, confirmations and error texts.

mod commands;
pub mod replies;

pub use self::commands::{BotCommand, Input, InputParser};

use std::sync::Arc;

use crate::channels::{
    CallbackData, ChatTransport, InboundEvent, InteractionId, MessageId, Sender,
};
use crate::error::{ChannelError, MissingStep, NavigationError};
use crate::navigation::{Intent, NavigationEngine, Outcome};
use crate::selector;

/// Dispatches inbound events for every user.
pub struct Bot {
    engine: Arc<NavigationEngine>,
    transport: Arc<dyn ChatTransport>,
}

impl Bot {
    pub fn new(engine: Arc<NavigationEngine>, transport: Arc<dyn ChatTransport>) -> Self {
        Self { engine, transport }
    }

    pub fn engine(&self) -> &NavigationEngine {
        &self.engine
    }

    /// Handle one inbound event. Errors are transport failures while
    /// replying; navigation failures are reported to the user instead.
    pub async fn handle_event(&self, event: InboundEvent) -> Result<(), ChannelError> {
        match event {
            InboundEvent::Text { sender, text } => self.handle_text(&sender, &text).await,
            InboundEvent::Callback {
                sender,
                interaction,
                message,
                data,
            } => {
                self.handle_callback(&sender, &interaction, message, &data)
                    .await
            }
        }
    }

    async fn handle_text(&self, sender: &Sender, text: &str) -> Result<(), ChannelError> {
        match InputParser::parse(text) {
            Input::Command(BotCommand::Start) => {
                tracing::info!(user = %sender.user, "User started the bot");
                self.transport
                    .send_html(sender.chat, &replies::greeting(sender), None)
                    .await?;
            }
            Input::Command(BotCommand::Help) => {
                self.transport
                    .send_html(sender.chat, replies::HELP, None)
                    .await?;
            }
            Input::Command(BotCommand::Jobs) => self.jobs(sender).await?,
            Input::Command(BotCommand::Exit) => {
                let result = self
                    .engine
                    .handle(sender.user, sender.chat, Intent::Exit)
                    .await;
                self.reply(sender, None, result, false).await?;
            }
            Input::UnknownCommand(name) => {
                self.transport
                    .send_text(sender.chat, &replies::unknown_command(&name), None)
                    .await?;
            }
            Input::Query(query) => {
                let intent = Intent::SetQuery(query);
                let fetches = self.will_fetch(sender, &intent);
                self.search(sender, intent, fetches).await?;
            }
        }
        Ok(())
    }

    async fn handle_callback(
        &self,
        sender: &Sender,
        interaction: &InteractionId,
        message: Option<MessageId>,
        data: &str,
    ) -> Result<(), ChannelError> {
        let Some(data) = CallbackData::parse(data) else {
            tracing::debug!(user = %sender.user, data, "Unrecognized callback data");
            self.transport.answer_interaction(interaction, None).await?;
            self.transport
                .send_text(sender.chat, replies::UNRECOGNIZED_ACTION, None)
                .await?;
            return Ok(());
        };

        match data {
            CallbackData::PageInfo => {
                self.transport
                    .answer_interaction(interaction, Some(replies::PAGE_INFO))
                    .await
            }
            CallbackData::SourcesPage(n) => {
                self.transport.answer_interaction(interaction, None).await?;
                let result = self
                    .engine
                    .handle(sender.user, sender.chat, Intent::PageSources(n))
                    .await;
                if let (Ok(Outcome::SourcePicker(page)), Some(message)) = (result, message) {
                    self.transport
                        .edit_keyboard(sender.chat, message, &selector::sources_keyboard(&page))
                        .await?;
                }
                Ok(())
            }
            CallbackData::Source(source) => {
                // Answer now; the search below can take a while.
                self.transport.answer_interaction(interaction, None).await?;
                tracing::info!(user = %sender.user, %source, "User selected job site");

                let intent = Intent::SelectSource(source.clone());
                let fetches = self.will_fetch(sender, &intent);
                if fetches {
                    self.transport
                        .send_html(sender.chat, &replies::source_selected(source.as_str()), None)
                        .await?;
                }
                self.search(sender, intent, fetches).await
            }
            CallbackData::Advance => {
                let result = self
                    .engine
                    .handle(sender.user, sender.chat, Intent::Advance)
                    .await;
                self.reply(sender, Some(interaction), result, false).await
            }
            CallbackData::Retreat => {
                let result = self
                    .engine
                    .handle(sender.user, sender.chat, Intent::Retreat)
                    .await;
                self.reply(sender, Some(interaction), result, false).await
            }
        }
    }

    /// `/jobs`: the source picker for the active query.
    async fn jobs(&self, sender: &Sender) -> Result<(), ChannelError> {
        match self.engine.sessions().peek(sender.user) {
            Ok(Some(session)) if !session.query.is_empty() => self.send_picker(sender).await,
            Ok(_) => {
                let prompt = NavigationError::PreconditionFailed(MissingStep::NoQuery);
                self.transport
                    .send_text(sender.chat, &prompt.user_message(), None)
                    .await?;
                Ok(())
            }
            Err(e) => {
                self.transport
                    .send_text(sender.chat, &e.user_message(), None)
                    .await?;
                Ok(())
            }
        }
    }

    async fn send_picker(&self, sender: &Sender) -> Result<(), ChannelError> {
        let page = self.engine.source_page(1);
        if page.visible.is_empty() {
            self.transport
                .send_text(sender.chat, replies::NO_SOURCES, None)
                .await?;
            return Ok(());
        }

        self.transport
            .send_html(
                sender.chat,
                replies::PICK_SOURCE,
                Some(&selector::sources_keyboard(&page)),
            )
            .await?;
        Ok(())
    }

    /// Whether `intent` is expected to hit a job source, judged from the
    /// session as it is now.
    fn will_fetch(&self, sender: &Sender, intent: &Intent) -> bool {
        let Ok(Some(session)) = self.engine.sessions().peek(sender.user) else {
            return false;
        };
        match intent {
            Intent::SetQuery(text) => session.selected_source.is_some() && !text.trim().is_empty(),
            Intent::SelectSource(source) => {
                !session.query.is_empty() && self.engine.registry().contains(source)
            }
            _ => false,
        }
    }

    /// Run a new search, showing a wait notice while it runs.
    async fn search(
        &self,
        sender: &Sender,
        intent: Intent,
        show_wait: bool,
    ) -> Result<(), ChannelError> {
        let notice = if show_wait {
            match self
                .transport
                .send_text(sender.chat, replies::WAIT, None)
                .await
            {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::debug!(user = %sender.user, error = %e, "Failed to send wait notice");
                    None
                }
            }
        } else {
            None
        };

        let result = self.engine.handle(sender.user, sender.chat, intent).await;

        if let Some(notice) = notice
            && let Err(e) = self.transport.delete_message(sender.chat, notice).await
        {
            tracing::debug!(user = %sender.user, error = %e, "Failed to delete wait notice");
        }

        self.reply(sender, None, result, true).await
    }

    /// Report the outcome of an intent. Button presses are always answered.
    async fn reply(
        &self,
        sender: &Sender,
        interaction: Option<&InteractionId>,
        result: Result<Outcome, NavigationError>,
        new_search: bool,
    ) -> Result<(), ChannelError> {
        let mut show_picker = false;
        let (notice, text): (Option<String>, Option<String>) = match &result {
            Ok(Outcome::Displayed(_)) | Ok(Outcome::SourcePicker(_)) => (None, None),
            Ok(Outcome::AwaitingSource) => {
                show_picker = true;
                (None, None)
            }
            Ok(Outcome::Boundary) => (Some(replies::FIRST_RESULT.to_string()), None),
            Ok(Outcome::Reset) => (None, Some(replies::EXIT.to_string())),
            Err(e @ NavigationError::NoResults) => {
                let text = if new_search {
                    replies::NO_JOBS_FOUND.to_string()
                } else {
                    e.user_message()
                };
                (Some(e.user_message()), Some(text))
            }
            Err(e @ NavigationError::Busy) => match interaction {
                Some(_) => (Some(e.user_message()), None),
                None => (None, Some(e.user_message())),
            },
            Err(e) => {
                tracing::info!(user = %sender.user, error = %e, "Intent failed");
                (None, Some(e.user_message()))
            }
        };

        if let Some(interaction) = interaction {
            self.transport
                .answer_interaction(interaction, notice.as_deref())
                .await?;
        }
        if let Some(text) = text {
            self.transport.send_text(sender.chat, &text, None).await?;
        }
        if show_picker {
            self.send_picker(sender).await?;
        }
        Ok(())
    }
}
