//! Search navigation state machine.
//!
//! - `engine` - [`NavigationEngine`]: applies intents to sessions, fetches
//!   pages and presents results through the chat transport
//! - `plan` - [`RenderPlan`]: what a single display of one listing looks like

mod engine;
mod plan;

pub use self::engine::{EngineDeps, NavigationEngine};
pub use self::plan::RenderPlan;

use crate::selector::SourcePage;
use crate::sources::SourceId;

/// A user action the engine knows how to carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Start a search for this text.
    SetQuery(String),
    /// Search the active query on this source.
    SelectSource(SourceId),
    /// Show the next listing, fetching the next page when the buffer runs out.
    Advance,
    /// Show the previous listing in the buffer.
    Retreat,
    /// Forget the session.
    Exit,
    /// Show page `n` of the source picker.
    PageSources(usize),
}

impl Intent {
    /// Short name used in logs and observer events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SetQuery(_) => "set_query",
            Self::SelectSource(_) => "select_source",
            Self::Advance => "advance",
            Self::Retreat => "retreat",
            Self::Exit => "exit",
            Self::PageSources(_) => "page_sources",
        }
    }
}

/// Successful result of an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A listing was put on screen.
    Displayed(RenderPlan),
    /// The query was stored; a source must be picked next.
    AwaitingSource,
    /// Already at the first listing. Nothing changed.
    Boundary,
    /// The session was cleared.
    Reset,
    /// A page of the source picker.
    SourcePicker(SourcePage),
}
