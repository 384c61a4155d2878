use chrono_tz::Tz;

use crate::channels::InlineKeyboard;
use crate::format;
use crate::sources::{Listing, SourceId};

/// Everything needed to put one listing on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPlan {
    /// First fragment; carries the navigation keyboard.
    pub primary_fragment: String,
    /// Remaining fragments, sent as follow-up messages.
    pub overflow_fragments: Vec<String>,
    pub can_advance: bool,
    pub can_retreat: bool,
}

impl RenderPlan {
    /// Plan for `listings[cursor]`, or `None` when the cursor is out of range.
    pub fn build(
        source: &SourceId,
        listings: &[Listing],
        cursor: usize,
        max_fragment_size: usize,
        tz: Tz,
    ) -> Option<Self> {
        let listing = listings.get(cursor)?;
        let text = format::display_text(source, listing, tz);

        let mut fragments = format::split_to_fragments(&text, max_fragment_size).into_iter();
        let primary_fragment = fragments.next()?;

        Some(Self {
            primary_fragment,
            overflow_fragments: fragments.collect(),
            can_advance: cursor < listings.len(),
            can_retreat: cursor > 0,
        })
    }

    /// Previous/Next buttons for the primary message.
    pub fn keyboard(&self) -> InlineKeyboard {
        InlineKeyboard::navigation(self.can_retreat, self.can_advance)
    }
}
