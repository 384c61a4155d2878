//! Pagination over the list of available job sources.

use crate::channels::{Button, CallbackData, InlineKeyboard};
use crate::sources::SourceId;

/// Sources shown per picker page unless configured otherwise.
pub const DEFAULT_SOURCES_PER_PAGE: usize = 4;

/// Source buttons per keyboard row.
const BUTTONS_PER_ROW: usize = 2;

/// One page of the source picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePage {
    pub visible: Vec<SourceId>,
    /// 1-based page number after clamping.
    pub page: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub total_pages: usize,
}

/// Slice `sources` into page `page_number` of `per_page` entries.
///
/// Page numbers are 1-based; 0 is treated as 1. A `per_page` of 0 is
/// treated as 1. Pages past the end are empty.
pub fn page(sources: &[SourceId], page_number: usize, per_page: usize) -> SourcePage {
    let per_page = per_page.max(1);
    let page = page_number.max(1);
    let total_pages = sources.len().div_ceil(per_page);

    let start = (page - 1).saturating_mul(per_page).min(sources.len());
    let end = start.saturating_add(per_page).min(sources.len());

    SourcePage {
        visible: sources[start..end].to_vec(),
        page,
        has_prev: page > 1,
        has_next: end < sources.len(),
        total_pages,
    }
}

/// Inline keyboard for a picker page: source buttons two per row, a
/// Previous/Next row when there is somewhere to go, and a page indicator.
pub fn sources_keyboard(page: &SourcePage) -> InlineKeyboard {
    let mut rows: Vec<Vec<Button>> = page
        .visible
        .chunks(BUTTONS_PER_ROW)
        .map(|chunk| {
            chunk
                .iter()
                .map(|id| Button::new(id.display_name(), CallbackData::Source(id.clone())))
                .collect()
        })
        .collect();

    let mut nav = Vec::new();
    if page.has_prev {
        nav.push(Button::new(
            "Previous",
            CallbackData::SourcesPage(page.page - 1),
        ));
    }
    if page.has_next {
        nav.push(Button::new("Next", CallbackData::SourcesPage(page.page + 1)));
    }
    if !nav.is_empty() {
        rows.push(nav);
    }

    rows.push(vec![Button::new(
        format!("Page {} of {}", page.page, page.total_pages),
        CallbackData::PageInfo,
    )]);

    InlineKeyboard { rows }
}
