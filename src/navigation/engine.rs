//! The navigation engine.
//!
//! Every intent runs with the user's session locked, from the first check
//! through the registry call to the last transport call. A session is
//! therefore never observed half-updated and a slow fetch cannot overwrite
//! state written by a later intent.
//!
//! Intents are all-or-nothing with respect to `query`, `selected_source`,
//! `page`, `listings` and `cursor`: those fields change only after the
//! fetch (if any) succeeded and the primary message was put on screen.
//! Message handles (`primary`, `overflow`) always describe what is actually
//! on screen, so they are updated as soon as the screen changes.

use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;

use crate::channels::{ChatId, ChatTransport, InlineKeyboard, UserId};
use crate::clock::Clock;
use crate::config::DisplayConfig;
use crate::error::{MissingStep, NavigationError};
use crate::navigation::{Intent, Outcome, RenderPlan};
use crate::observability::{Observer, ObserverEvent, ObserverMetric};
use crate::selector::{self, SourcePage};
use crate::session::{BusyPolicy, Session, SessionState, SessionStore};
use crate::sources::{Listing, SearchPage, SourceId, SourceRegistry};

/// Collaborators injected into the engine.
pub struct EngineDeps {
    pub registry: Arc<SourceRegistry>,
    pub transport: Arc<dyn ChatTransport>,
    pub clock: Arc<dyn Clock>,
    pub observer: Arc<dyn Observer>,
}

/// How the primary message of a display is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Edit the session's primary message, or send one if there is none.
    InPlace,
    /// Always send a new message.
    Fresh,
}

/// A page fetched for a query, not yet committed to the session.
struct Fetched {
    query: String,
    source: SourceId,
    result: SearchPage,
}

/// Applies intents to per-user sessions.
pub struct NavigationEngine {
    deps: EngineDeps,
    display: DisplayConfig,
    sessions: SessionStore,
}

impl NavigationEngine {
    pub fn new(deps: EngineDeps, display: DisplayConfig, busy_policy: BusyPolicy) -> Self {
        Self {
            deps,
            display,
            sessions: SessionStore::new(busy_policy),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.deps.registry
    }

    pub fn display(&self) -> &DisplayConfig {
        &self.display
    }

    /// Carry out `intent` for `user`, whose messages go to `chat`.
    pub async fn handle(
        &self,
        user: UserId,
        chat: ChatId,
        intent: Intent,
    ) -> Result<Outcome, NavigationError> {
        self.deps.observer.record_event(&ObserverEvent::IntentReceived {
            user,
            intent: intent.kind(),
        });
        tracing::debug!(%user, %chat, intent = intent.kind(), "Handling intent");

        match intent {
            Intent::PageSources(n) => Ok(Outcome::SourcePicker(self.source_page(n))),
            Intent::SetQuery(text) => {
                let mut session = self.lock(user).await?;
                self.set_query(user, chat, &mut session, text).await
            }
            Intent::SelectSource(id) => {
                let mut session = self.lock(user).await?;
                self.select_source(user, chat, &mut session, id).await
            }
            Intent::Advance => {
                let mut session = self.lock(user).await?;
                self.advance(user, chat, &mut session).await
            }
            Intent::Retreat => {
                let mut session = self.lock(user).await?;
                self.retreat(user, chat, &mut session).await
            }
            Intent::Exit => {
                let mut session = self.lock(user).await?;
                session.reset();
                self.sessions.remove(user);
                drop(session);
                self.deps
                    .observer
                    .record_metric(&ObserverMetric::ActiveSessions(self.sessions.len() as u64));
                self.deps
                    .observer
                    .record_event(&ObserverEvent::SessionReset { user });
                tracing::info!(%user, "Session reset");
                Ok(Outcome::Reset)
            }
        }
    }

    /// Page `n` of the picker over all registered sources.
    pub fn source_page(&self, n: usize) -> SourcePage {
        selector::page(
            &self.deps.registry.ids(),
            n,
            self.display.sources_per_page,
        )
    }

    async fn lock(&self, user: UserId) -> Result<OwnedMutexGuard<Session>, NavigationError> {
        let session = self.sessions.acquire(user).await.inspect_err(|err| {
            if matches!(err, NavigationError::Busy) {
                self.deps
                    .observer
                    .record_event(&ObserverEvent::SessionBusy { user });
            }
        })?;
        self.deps
            .observer
            .record_metric(&ObserverMetric::ActiveSessions(self.sessions.len() as u64));
        Ok(session)
    }

    async fn set_query(
        &self,
        user: UserId,
        chat: ChatId,
        session: &mut Session,
        text: String,
    ) -> Result<Outcome, NavigationError> {
        let query = text.trim();
        if query.is_empty() {
            return Err(NavigationError::PreconditionFailed(MissingStep::NoQuery));
        }

        let Some(source) = session.selected_source.clone() else {
            session.query = query.to_string();
            return Ok(Outcome::AwaitingSource);
        };

        let result = self.fetch(user, &source, query, 1).await?;
        let fetched = Fetched {
            query: query.to_string(),
            source,
            result,
        };
        self.show_page(user, chat, session, fetched, Placement::Fresh)
            .await
    }

    async fn select_source(
        &self,
        user: UserId,
        chat: ChatId,
        session: &mut Session,
        source: SourceId,
    ) -> Result<Outcome, NavigationError> {
        if session.query.is_empty() {
            return Err(NavigationError::PreconditionFailed(MissingStep::NoQuery));
        }
        if !self.deps.registry.contains(&source) {
            return Err(NavigationError::PreconditionFailed(
                MissingStep::UnknownSource(source),
            ));
        }

        let query = session.query.clone();
        let result = self.fetch(user, &source, &query, 1).await?;
        let fetched = Fetched {
            query,
            source,
            result,
        };
        self.show_page(user, chat, session, fetched, Placement::Fresh)
            .await
    }

    async fn advance(
        &self,
        user: UserId,
        chat: ChatId,
        session: &mut Session,
    ) -> Result<Outcome, NavigationError> {
        let source = match (session.state(), session.selected_source.clone()) {
            (SessionState::Displaying, Some(source)) => source,
            // The last fetch came back empty; only a new search helps.
            (SessionState::Ready, _) => return Err(NavigationError::NoResults),
            (SessionState::AwaitingSource, _) => {
                return Err(NavigationError::PreconditionFailed(MissingStep::NoSource));
            }
            _ => {
                return Err(NavigationError::PreconditionFailed(
                    MissingStep::NothingDisplayed,
                ));
            }
        };

        let next = session.cursor + 1;
        if next < session.listings.len() {
            return self.move_to(user, chat, session, &source, next).await;
        }

        let query = session.query.clone();
        let result = self
            .fetch(user, &source, &query, session.page.saturating_add(1))
            .await?;
        let fetched = Fetched {
            query,
            source,
            result,
        };
        self.show_page(user, chat, session, fetched, Placement::InPlace)
            .await
    }

    async fn retreat(
        &self,
        user: UserId,
        chat: ChatId,
        session: &mut Session,
    ) -> Result<Outcome, NavigationError> {
        let source = match (session.state(), session.selected_source.clone()) {
            (SessionState::Displaying, Some(source)) => source,
            (SessionState::Ready, _) => return Ok(Outcome::Boundary),
            (SessionState::AwaitingSource, _) => {
                return Err(NavigationError::PreconditionFailed(MissingStep::NoSource));
            }
            _ => {
                return Err(NavigationError::PreconditionFailed(
                    MissingStep::NothingDisplayed,
                ));
            }
        };

        let Some(previous) = session.cursor.checked_sub(1) else {
            return Ok(Outcome::Boundary);
        };
        self.move_to(user, chat, session, &source, previous).await
    }

    /// Show another listing from the buffer. No fetch.
    async fn move_to(
        &self,
        user: UserId,
        chat: ChatId,
        session: &mut Session,
        source: &SourceId,
        cursor: usize,
    ) -> Result<Outcome, NavigationError> {
        let plan = self.plan(source, &session.listings, cursor).ok_or(
            NavigationError::PreconditionFailed(MissingStep::NothingDisplayed),
        )?;

        self.present(user, chat, session, &plan, Placement::InPlace)
            .await?;
        session.cursor = cursor;
        Ok(Outcome::Displayed(plan))
    }

    /// Put the first listing of a freshly fetched page on screen and commit
    /// the page. An empty page is committed too and reported as
    /// [`NavigationError::NoResults`].
    async fn show_page(
        &self,
        user: UserId,
        chat: ChatId,
        session: &mut Session,
        fetched: Fetched,
        placement: Placement,
    ) -> Result<Outcome, NavigationError> {
        let Some(plan) = self.plan(&fetched.source, &fetched.result.listings, 0) else {
            self.clear_overflow(user, chat, session).await;
            self.retire_primary(user, chat, session).await;
            fetched.commit(session);
            tracing::info!(%user, page = session.page, "No further results");
            return Err(NavigationError::NoResults);
        };

        self.present(user, chat, session, &plan, placement).await?;
        fetched.commit(session);
        Ok(Outcome::Displayed(plan))
    }

    fn plan(&self, source: &SourceId, listings: &[Listing], cursor: usize) -> Option<RenderPlan> {
        RenderPlan::build(
            source,
            listings,
            cursor,
            self.display.max_fragment_size,
            self.display.timezone,
        )
    }

    /// Replace whatever is on screen with `plan`.
    ///
    /// Stale overflow messages are deleted first. Failing to send or edit
    /// the primary message is an error; failing to send an overflow
    /// fragment is logged and the remaining fragments are skipped.
    async fn present(
        &self,
        user: UserId,
        chat: ChatId,
        session: &mut Session,
        plan: &RenderPlan,
        placement: Placement,
    ) -> Result<(), NavigationError> {
        self.clear_overflow(user, chat, session).await;

        let transport = &self.deps.transport;
        let keyboard = plan.keyboard();

        let primary = match (placement, session.primary) {
            (Placement::InPlace, Some(primary)) => {
                if let Err(e) = transport
                    .edit_text(chat, primary, &plan.primary_fragment, Some(&keyboard))
                    .await
                {
                    // The message may be gone; send a new one next time.
                    session.primary = None;
                    tracing::warn!(%user, message = %primary, error = %e, "Failed to edit primary message");
                    return Err(e.into());
                }
                primary
            }
            _ => transport
                .send_html(chat, &plan.primary_fragment, Some(&keyboard))
                .await
                .inspect_err(|e| {
                    tracing::warn!(%user, error = %e, "Failed to send primary message");
                })?,
        };
        session.primary = Some(primary);

        for fragment in &plan.overflow_fragments {
            match transport.send_html(chat, fragment, None).await {
                Ok(message) => session.overflow.push(message),
                Err(e) => {
                    tracing::warn!(%user, error = %e, "Failed to send overflow fragment");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Delete the overflow messages of the current display. Failures are
    /// logged and the handles dropped regardless.
    async fn clear_overflow(&self, user: UserId, chat: ChatId, session: &mut Session) {
        for message in std::mem::take(&mut session.overflow) {
            if let Err(e) = self.deps.transport.delete_message(chat, message).await {
                tracing::warn!(%user, %message, error = %e, "Failed to delete overflow message");
                self.deps
                    .observer
                    .record_event(&ObserverEvent::OverflowCleanupFailed {
                        user,
                        message,
                        error_message: e.to_string(),
                    });
            }
        }
    }

    /// Strip the navigation keyboard from the primary message and forget it.
    async fn retire_primary(&self, user: UserId, chat: ChatId, session: &mut Session) {
        if let Some(primary) = session.primary.take()
            && let Err(e) = self
                .deps
                .transport
                .edit_keyboard(chat, primary, &InlineKeyboard::default())
                .await
        {
            tracing::debug!(%user, message = %primary, error = %e, "Failed to remove navigation keyboard");
        }
    }

    async fn fetch(
        &self,
        user: UserId,
        source: &SourceId,
        query: &str,
        page: u32,
    ) -> Result<SearchPage, NavigationError> {
        let observer = &self.deps.observer;
        observer.record_event(&ObserverEvent::FetchStarted {
            user,
            source: source.clone(),
            page,
        });

        let started = self.deps.clock.now();
        let result = self.deps.registry.fetch(source, query, page).await;
        let duration = (self.deps.clock.now() - started)
            .to_std()
            .unwrap_or_default();

        observer.record_metric(&ObserverMetric::FetchLatency(duration));
        observer.record_event(&ObserverEvent::FetchFinished {
            user,
            source: source.clone(),
            page,
            duration,
            listings: result.as_ref().map_or(0, |p| p.listings.len()),
            error_message: result.as_ref().err().map(|e| e.to_string()),
        });

        match &result {
            Ok(found) => tracing::debug!(
                %user,
                %source,
                page,
                listings = found.listings.len(),
                "Fetched page"
            ),
            Err(e) => tracing::warn!(%user, %source, page, error = %e, "Fetch failed"),
        }

        result.map_err(NavigationError::from)
    }
}

impl Fetched {
    /// Record the page as the session's current page.
    fn commit(self, session: &mut Session) {
        session.query = self.query;
        session.selected_source = Some(self.source);
        session.listings = self.result.listings;
        session.page = self.result.page;
        session.cursor = 0;
    }
}
