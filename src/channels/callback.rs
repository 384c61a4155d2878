//! Payloads carried by inline buttons.

use crate::sources::SourceId;

/// What an inline button does when pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackData {
    /// Pick a job source.
    Source(SourceId),
    /// Show another page of the source picker.
    SourcesPage(usize),
    /// The "Page x of y" indicator. Informational only.
    PageInfo,
    /// Show the next listing.
    Advance,
    /// Show the previous listing.
    Retreat,
}

impl CallbackData {
    /// Wire form placed in the button.
    pub fn encode(&self) -> String {
        match self {
            Self::Source(id) => format!("site:{id}"),
            Self::SourcesPage(page) => format!("page:{page}"),
            Self::PageInfo => "page_info".to_string(),
            Self::Advance => "nav:next".to_string(),
            Self::Retreat => "nav:prev".to_string(),
        }
    }

    /// Parse a button payload. Accepts the older `site: <id>` and
    /// `page: <n>` spellings with a space after the colon.
    pub fn parse(data: &str) -> Option<Self> {
        let data = data.trim();

        if data == "page_info" {
            return Some(Self::PageInfo);
        }

        if let Some(rest) = data.strip_prefix("site:") {
            let id = rest.trim();
            if id.is_empty() {
                return None;
            }
            return Some(Self::Source(SourceId::new(id)));
        }

        if let Some(rest) = data.strip_prefix("page:") {
            return rest.trim().parse().ok().map(Self::SourcesPage);
        }

        match data.strip_prefix("nav:")?.trim() {
            "next" => Some(Self::Advance),
            "prev" => Some(Self::Retreat),
            _ => None,
        }
    }
}
