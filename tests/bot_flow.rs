//! Drives the bot through whole conversations using in-memory stubs for
//! the chat service and the job source.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio::sync::Notify;

use job_beacon::bot::{Bot, replies};
use job_beacon::channels::{
    ChatId, ChatTransport, InboundEvent, InlineKeyboard, InteractionId, MessageId, Sender, UserId,
};
use job_beacon::clock::SystemClock;
use job_beacon::config::DisplayConfig;
use job_beacon::error::{ChannelError, FetchError};
use job_beacon::navigation::{EngineDeps, NavigationEngine};
use job_beacon::observability::NoopObserver;
use job_beacon::session::{BusyPolicy, SessionState};
use job_beacon::sources::{JobSource, Listing, SearchPage, SourceId, SourceRegistry};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Sent {
    Text(MessageId, String),
    Html(MessageId, String, Option<InlineKeyboard>),
    Edit(MessageId, String, Option<InlineKeyboard>),
    Keyboard(MessageId, InlineKeyboard),
    Delete(MessageId),
    Answer(Option<String>),
}

#[derive(Default)]
struct RecordingTransport {
    next_id: AtomicI64,
    sent: Mutex<Vec<Sent>>,
}

impl RecordingTransport {
    fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    fn push(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }

    fn id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send_text(
        &self,
        _chat: ChatId,
        text: &str,
        _keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageId, ChannelError> {
        let id = self.id();
        self.push(Sent::Text(id, text.to_string()));
        Ok(id)
    }

    async fn send_html(
        &self,
        _chat: ChatId,
        html: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageId, ChannelError> {
        let id = self.id();
        self.push(Sent::Html(id, html.to_string(), keyboard.cloned()));
        Ok(id)
    }

    async fn edit_text(
        &self,
        _chat: ChatId,
        message: MessageId,
        html: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), ChannelError> {
        self.push(Sent::Edit(message, html.to_string(), keyboard.cloned()));
        Ok(())
    }

    async fn edit_keyboard(
        &self,
        _chat: ChatId,
        message: MessageId,
        keyboard: &InlineKeyboard,
    ) -> Result<(), ChannelError> {
        self.push(Sent::Keyboard(message, keyboard.clone()));
        Ok(())
    }

    async fn delete_message(&self, _chat: ChatId, message: MessageId) -> Result<(), ChannelError> {
        self.push(Sent::Delete(message));
        Ok(())
    }

    async fn answer_interaction(
        &self,
        _interaction: &InteractionId,
        text: Option<&str>,
    ) -> Result<(), ChannelError> {
        self.push(Sent::Answer(text.map(str::to_string)));
        Ok(())
    }
}

/// Source serving fixed pages. Missing pages are empty.
#[derive(Default)]
struct BoardSource {
    pages: HashMap<u32, Vec<Listing>>,
    down: AtomicBool,
    requests: Mutex<Vec<(String, u32)>>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl BoardSource {
    fn with_page(mut self, page: u32, titles: &[&str]) -> Self {
        let listings = titles
            .iter()
            .map(|title| Listing {
                title: Some(title.to_string()),
                url: Some(format!("https://jobs.example/{page}/{title}")),
                ..Listing::default()
            })
            .collect();
        self.pages.insert(page, listings);
        self
    }

    fn requests(&self) -> Vec<(String, u32)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobSource for BoardSource {
    fn id(&self) -> SourceId {
        SourceId::new("board")
    }

    async fn search(&self, query: &str, page: u32) -> Result<SearchPage, FetchError> {
        self.requests.lock().unwrap().push((query.to_string(), page));
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        if self.down.load(Ordering::SeqCst) {
            return Err(FetchError::UpstreamUnavailable {
                source_id: self.id(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(SearchPage {
            listings: self.pages.get(&page).cloned().unwrap_or_default(),
            page,
        })
    }
}

struct Chat {
    bot: Bot,
    transport: Arc<RecordingTransport>,
    source: Arc<BoardSource>,
}

impl Chat {
    fn new(source: BoardSource, display: DisplayConfig) -> Self {
        let transport = Arc::new(RecordingTransport::default());
        let source = Arc::new(source);
        let registry =
            SourceRegistry::new(Duration::from_secs(5)).with_source(source.clone());
        let engine = NavigationEngine::new(
            EngineDeps {
                registry: Arc::new(registry),
                transport: transport.clone(),
                clock: Arc::new(SystemClock),
                observer: Arc::new(NoopObserver),
            },
            display,
            BusyPolicy::Reject,
        );
        Self {
            bot: Bot::new(Arc::new(engine), transport.clone()),
            transport,
            source,
        }
    }

    async fn say(&self, text: &str) -> Vec<Sent> {
        self.bot
            .handle_event(InboundEvent::Text {
                sender: sender(),
                text: text.to_string(),
            })
            .await
            .unwrap();
        self.transport.take()
    }

    async fn press(&self, data: &str) -> Vec<Sent> {
        self.bot.handle_event(press(data)).await.unwrap();
        self.transport.take()
    }
}

fn sender() -> Sender {
    Sender {
        user: UserId(7),
        chat: ChatId(70),
        display_name: Some("Grace".to_string()),
    }
}

fn press(data: &str) -> InboundEvent {
    InboundEvent::Callback {
        sender: sender(),
        interaction: InteractionId(format!("press-{data}")),
        message: Some(MessageId(1)),
        data: data.to_string(),
    }
}

fn labels(keyboard: &Option<InlineKeyboard>) -> Vec<String> {
    keyboard
        .iter()
        .flat_map(|k| k.rows.iter().flatten())
        .map(|b| b.label.clone())
        .collect()
}

#[tokio::test]
async fn search_browse_and_run_out_of_results() {
    let source = BoardSource::default()
        .with_page(1, &["alpha", "beta"])
        .with_page(2, &["gamma"]);
    let chat = Chat::new(source, DisplayConfig::default());

    let greeting = chat.say("/start").await;
    assert!(matches!(&greeting[..], [Sent::Html(_, html, None)] if html.contains("Grace")));

    // Query first: the bot asks for a site.
    let prompt = chat.say("rust developer").await;
    match &prompt[..] {
        [Sent::Html(_, html, keyboard)] => {
            assert_eq!(html, replies::PICK_SOURCE);
            assert_eq!(labels(keyboard), vec!["Board", "Page 1 of 1"]);
        }
        other => panic!("unexpected replies {other:?}"),
    }

    // Picking the site runs the search.
    let shown = chat.press("site:board").await;
    assert_eq!(shown[0], Sent::Answer(None));
    assert_eq!(
        shown[1],
        Sent::Html(MessageId(3), "Job site <b><i>board</i></b> selected.".to_string(), None)
    );
    assert_eq!(shown[2], Sent::Text(MessageId(4), replies::WAIT.to_string()));
    let primary = match &shown[3] {
        Sent::Html(id, html, keyboard) => {
            assert!(html.contains("alpha"));
            assert_eq!(labels(keyboard), vec!["Next"]);
            *id
        }
        other => panic!("expected results, got {other:?}"),
    };
    assert_eq!(shown[4], Sent::Delete(MessageId(4)));
    assert_eq!(chat.source.requests(), vec![("rust developer".to_string(), 1)]);

    // Within the page: edited in place, no fetch.
    let second = chat.press("nav:next").await;
    match &second[..] {
        [Sent::Edit(id, html, keyboard), Sent::Answer(None)] => {
            assert_eq!(*id, primary);
            assert!(html.contains("beta"));
            assert_eq!(labels(keyboard), vec!["Previous", "Next"]);
        }
        other => panic!("unexpected replies {other:?}"),
    }
    assert_eq!(chat.source.requests().len(), 1);

    // Past the page: page 2 is fetched and shown in the same message.
    let third = chat.press("nav:next").await;
    assert!(matches!(&third[0], Sent::Edit(id, html, _) if *id == primary && html.contains("gamma")));
    assert_eq!(chat.source.requests()[1], ("rust developer".to_string(), 2));

    // Back within page 2 is impossible.
    let back = chat.press("nav:prev").await;
    assert_eq!(back, vec![Sent::Answer(Some(replies::FIRST_RESULT.to_string()))]);

    // Page 3 is empty: controls removed, user told.
    let end = chat.press("nav:next").await;
    assert_eq!(end[0], Sent::Keyboard(primary, InlineKeyboard::default()));
    assert_eq!(end[1], Sent::Answer(Some("No further results.".to_string())));
    assert!(matches!(&end[2], Sent::Text(_, text) if text == "No further results."));

    let session = chat.bot.engine().sessions().peek(UserId(7)).unwrap().unwrap();
    assert_eq!(session.page, 3);
    assert_eq!(session.state(), SessionState::Ready);
    assert!(session.primary.is_none());

    let exit = chat.say("/exit").await;
    assert!(matches!(&exit[..], [Sent::Text(_, text)] if text == replies::EXIT));
    assert!(chat.bot.engine().sessions().is_empty());
}

#[tokio::test]
async fn new_query_with_a_source_searches_immediately() {
    let source = BoardSource::default().with_page(1, &["only"]);
    let chat = Chat::new(source, DisplayConfig::default());

    chat.say("rust").await;
    chat.press("site:board").await;

    let replies_sent = chat.say("golang").await;
    assert!(matches!(&replies_sent[0], Sent::Text(_, text) if text == replies::WAIT));
    assert!(matches!(&replies_sent[1], Sent::Html(_, html, _) if html.contains("only")));
    assert!(matches!(replies_sent[2], Sent::Delete(_)));
    assert_eq!(chat.source.requests()[1], ("golang".to_string(), 1));
}

#[tokio::test]
async fn long_listing_is_split_and_cleaned_up() {
    let mut source = BoardSource::default().with_page(1, &["first", "second"]);
    if let Some(listings) = source.pages.get_mut(&1) {
        listings[0].description = Some("lorem ipsum ".repeat(60));
    }
    let display = DisplayConfig {
        max_fragment_size: 300,
        ..DisplayConfig::default()
    };
    let chat = Chat::new(source, display);

    chat.say("rust").await;
    let shown = chat.press("site:board").await;
    let overflow: Vec<MessageId> = shown
        .iter()
        .filter_map(|s| match s {
            Sent::Html(id, html, None) if !html.starts_with("Job site") => Some(*id),
            _ => None,
        })
        .collect();
    assert!(!overflow.is_empty());

    let next = chat.press("nav:next").await;
    let deleted: Vec<MessageId> = next
        .iter()
        .filter_map(|s| match s {
            Sent::Delete(id) => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(deleted, overflow);

    let session = chat.bot.engine().sessions().peek(UserId(7)).unwrap().unwrap();
    assert!(session.overflow.is_empty());
    assert_eq!(session.cursor, 1);
}

#[tokio::test]
async fn upstream_failure_keeps_the_current_result() {
    let source = BoardSource::default().with_page(1, &["kept"]);
    let chat = Chat::new(source, DisplayConfig::default());

    chat.say("rust").await;
    chat.press("site:board").await;
    chat.source.down.store(true, Ordering::SeqCst);

    let failed = chat.press("nav:next").await;
    assert_eq!(failed[0], Sent::Answer(None));
    assert!(matches!(
        &failed[1],
        Sent::Text(_, text) if text == "Could not reach board right now. Please try again later."
    ));

    let session = chat.bot.engine().sessions().peek(UserId(7)).unwrap().unwrap();
    assert_eq!(session.page, 1);
    assert_eq!(session.cursor, 0);
    assert_eq!(session.listings[0].title.as_deref(), Some("kept"));
}

#[tokio::test]
async fn presses_during_a_search_are_turned_away() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let source = BoardSource {
        gate: Some((entered.clone(), release.clone())),
        ..BoardSource::default()
    }
    .with_page(1, &["slow"]);
    let chat = Arc::new(Chat::new(source, DisplayConfig::default()));

    chat.say("rust").await;
    let running = {
        let chat = Arc::clone(&chat);
        tokio::spawn(async move { chat.bot.handle_event(press("site:board")).await })
    };
    entered.notified().await;

    chat.bot.handle_event(press("nav:next")).await.unwrap();
    let sent = chat.transport.take();
    assert!(sent.contains(&Sent::Answer(Some(
        "Still working on your previous request, please wait.".to_string()
    ))));

    release.notify_one();
    running.await.unwrap().unwrap();
    assert_eq!(chat.source.requests().len(), 1);
}

#[tokio::test]
async fn unknown_site_and_stray_buttons() {
    let chat = Chat::new(BoardSource::default(), DisplayConfig::default());

    let early = chat.press("nav:next").await;
    assert_eq!(early[0], Sent::Answer(None));
    assert!(matches!(&early[1], Sent::Text(_, text) if text.contains("There are no results on display")));

    chat.say("rust").await;
    let unknown = chat.press("site:monster").await;
    assert_eq!(unknown[0], Sent::Answer(None));
    assert!(matches!(&unknown[1], Sent::Text(_, text) if text.contains("'monster' is not available")));
    assert!(chat.source.requests().is_empty());

    let garbage = chat.press("something-else").await;
    assert_eq!(
        garbage,
        vec![
            Sent::Answer(None),
            Sent::Text(MessageId(4), replies::UNRECOGNIZED_ACTION.to_string())
        ]
    );
}
