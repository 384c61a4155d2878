//! Rendering listings into chat text and splitting long text into fragments.
//!
//! Output is Telegram-flavoured HTML. Missing fields are rendered as explicit
//! placeholders so every listing has the same shape on screen.

use chrono_tz::Tz;

use crate::sources::{Listing, SourceId};

/// Default fragment size: Telegram's maximum message length.
pub const DEFAULT_MAX_FRAGMENT_SIZE: usize = 4096;

pub const NO_TITLE: &str = "No Title";
pub const NO_DESCRIPTION: &str = "No Description";
pub const UNKNOWN_DATE: &str = "Unknown Date";
pub const NO_SKILLS: &str = "None";
pub const NO_LINK: &str = "No Link";

/// Date format for posting timestamps, e.g. `Apr 05, 2025`.
const POSTED_DATE_FORMAT: &str = "%b %d, %Y";

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Render one listing as a multi-line HTML block.
///
/// Dates are shown in `tz`.
pub fn render(listing: &Listing, tz: Tz) -> String {
    let title = listing
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(escape_html)
        .unwrap_or_else(|| NO_TITLE.to_string());

    let posted = listing
        .posted_at
        .map(|ts| ts.with_timezone(&tz).format(POSTED_DATE_FORMAT).to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string());

    let description = listing
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(escape_html)
        .unwrap_or_else(|| NO_DESCRIPTION.to_string());

    let skills = if listing.skills.is_empty() {
        NO_SKILLS.to_string()
    } else {
        escape_html(&listing.skills.join(", "))
    };

    let link = match listing.url.as_deref().filter(|u| !u.trim().is_empty()) {
        Some(url) => format!("<a href='{}'>Click here</a>", escape_html(url)),
        None => NO_LINK.to_string(),
    };

    format!(
        "<b>Job Title:</b> {title}\n\
         <b>Posted:</b> {posted}\n\n\
         <b>Description:</b>\n{description}\n\n\
         <b>Skills:</b> {skills}\n\n\
         <b>Job Link:</b> {link}"
    )
}

/// Header line naming the source the results come from.
pub fn results_header(source: &SourceId) -> String {
    format!(
        "<b>Results from {}:</b>",
        escape_html(&source.display_name())
    )
}

/// Full display text for the listing currently under the cursor.
pub fn display_text(source: &SourceId, listing: &Listing, tz: Tz) -> String {
    format!("{}\n{}", results_header(source), render(listing, tz))
}

/// Split `text` into consecutive fragments of at most `max_fragment_size`
/// characters.
///
/// Concatenating the fragments in order yields `text` again. Splits happen
/// on character boundaries, never inside a multi-byte character. A cut is
/// moved back so that no fragment ends inside a tag, an entity or an open
/// element; when a fragment has no such place the cut stays at the size
/// limit. A size of zero is treated as one. Empty input yields no fragments.
pub fn split_to_fragments(text: &str, max_fragment_size: usize) -> Vec<String> {
    let max = max_fragment_size.max(1);
    let chars: Vec<usize> = text.char_indices().map(|(idx, _)| idx).collect();
    let safe = markup_boundaries(text);
    let byte_at = |i: usize| chars.get(i).copied().unwrap_or(text.len());

    let mut fragments = Vec::with_capacity(chars.len() / max + 1);
    let mut start = 0;
    while start < chars.len() {
        let limit = (start + max).min(chars.len());
        let end = if limit == chars.len() {
            limit
        } else {
            (start + 1..=limit).rev().find(|&i| safe[i]).unwrap_or(limit)
        };
        fragments.push(text[byte_at(start)..byte_at(end)].to_string());
        start = end;
    }

    fragments
}

/// For every char index of `text` (plus the end), whether cutting before
/// it leaves all markup whole.
fn markup_boundaries(text: &str) -> Vec<bool> {
    let mut safe = Vec::with_capacity(text.len() + 1);
    let mut tag_start = None;
    let mut in_entity = false;
    let mut depth = 0usize;

    for (idx, c) in text.char_indices() {
        safe.push(tag_start.is_none() && !in_entity && depth == 0);
        match c {
            '<' if tag_start.is_none() => {
                tag_start = Some(idx);
                in_entity = false;
            }
            '>' => {
                if let Some(open) = tag_start.take() {
                    let tag = &text[open + 1..idx];
                    if tag.starts_with('/') {
                        depth = depth.saturating_sub(1);
                    } else if !tag.ends_with('/') {
                        depth += 1;
                    }
                }
            }
            '&' if tag_start.is_none() => in_entity = true,
            ';' => in_entity = false,
            c if in_entity && !(c.is_ascii_alphanumeric() || c == '#') => in_entity = false,
            _ => {}
        }
    }
    safe.push(true);
    safe
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    fn sample_listing() -> Listing {
        Listing {
            posted_at: Some(Utc.with_ymd_and_hms(2025, 4, 5, 10, 30, 0).unwrap()),
            title: Some("Go developer".to_string()),
            url: Some("https://www.upwork.com/jobs/~01".to_string()),
            description: Some("Maintain <critical> services & APIs".to_string()),
            skills: vec!["Go".to_string(), "gRPC".to_string()],
        }
    }

    #[test]
    fn render_empty_listing_uses_placeholders() {
        let text = render(&Listing::default(), Tz::UTC);
        assert!(text.contains(NO_TITLE));
        assert!(text.contains(NO_DESCRIPTION));
        assert!(text.contains(UNKNOWN_DATE));
        assert!(text.contains("<b>Skills:</b> None"));
        assert!(text.contains(NO_LINK));
    }

    #[test]
    fn render_blank_strings_count_as_missing() {
        let listing = Listing {
            title: Some("   ".to_string()),
            description: Some(String::new()),
            url: Some(String::new()),
            ..Listing::default()
        };
        let text = render(&listing, Tz::UTC);
        assert!(text.contains(NO_TITLE));
        assert!(text.contains(NO_DESCRIPTION));
        assert!(text.contains(NO_LINK));
    }

    #[test]
    fn render_full_listing() {
        let text = render(&sample_listing(), Tz::UTC);
        assert_eq!(
            text,
            "<b>Job Title:</b> Go developer\n\
             <b>Posted:</b> Apr 05, 2025\n\n\
             <b>Description:</b>\nMaintain &lt;critical&gt; services &amp; APIs\n\n\
             <b>Skills:</b> Go, gRPC\n\n\
             <b>Job Link:</b> <a href='https://www.upwork.com/jobs/~01'>Click here</a>"
        );
    }

    #[test]
    fn render_uses_display_timezone() {
        let listing = Listing {
            posted_at: Some(Utc.with_ymd_and_hms(2025, 4, 5, 23, 30, 0).unwrap()),
            ..Listing::default()
        };
        assert!(render(&listing, Tz::UTC).contains("Apr 05, 2025"));
        assert!(render(&listing, chrono_tz::Asia::Tokyo).contains("Apr 06, 2025"));
    }

    #[test]
    fn render_is_deterministic() {
        let listing = sample_listing();
        assert_eq!(render(&listing, Tz::UTC), render(&listing, Tz::UTC));
    }

    #[test]
    fn display_text_starts_with_header() {
        let text = display_text(&SourceId::new("upwork"), &sample_listing(), Tz::UTC);
        assert!(text.starts_with("<b>Results from Upwork:</b>\n<b>Job Title:</b>"));
    }

    #[test]
    fn split_short_text_is_single_fragment() {
        assert_eq!(split_to_fragments("hello", 4096), vec!["hello".to_string()]);
    }

    #[test]
    fn split_exact_multiple() {
        assert_eq!(
            split_to_fragments("abcdef", 3),
            vec!["abc".to_string(), "def".to_string()]
        );
    }

    #[test]
    fn split_with_remainder() {
        assert_eq!(
            split_to_fragments("abcdefg", 3),
            vec!["abc".to_string(), "def".to_string(), "g".to_string()]
        );
    }

    #[test]
    fn split_empty_text() {
        assert!(split_to_fragments("", 10).is_empty());
    }

    #[test]
    fn split_zero_size_is_one() {
        assert_eq!(
            split_to_fragments("ab", 0),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn split_never_cuts_multibyte_chars() {
        let fragments = split_to_fragments("héllo wörld", 2);
        assert_eq!(fragments.concat(), "héllo wörld");
        assert!(fragments.iter().all(|f| f.chars().count() <= 2));
    }

    #[test]
    fn split_moves_cut_out_of_elements_and_entities() {
        assert_eq!(
            split_to_fragments("xy<b>ab</b>", 9),
            vec!["xy".to_string(), "<b>ab</b>".to_string()]
        );
        assert_eq!(
            split_to_fragments("ab R&amp;D", 6),
            vec!["ab R".to_string(), "&amp;D".to_string()]
        );
    }

    #[test]
    fn split_falls_back_to_hard_cut_for_oversized_markup() {
        let fragments = split_to_fragments("<b>abcdef</b>", 4);
        assert_eq!(fragments.concat(), "<b>abcdef</b>");
        assert!(fragments.iter().all(|f| f.chars().count() <= 4));
    }

    fn assert_markup_whole(fragment: &str) {
        let opens = fragment.matches("<b>").count() + fragment.matches("<a ").count();
        let closes = fragment.matches("</b>").count() + fragment.matches("</a>").count();
        assert_eq!(opens, closes, "unbalanced elements in {fragment:?}");
        if let Some(lt) = fragment.rfind('<') {
            assert!(fragment[lt..].contains('>'), "cut inside a tag: {fragment:?}");
        }
        if let Some(amp) = fragment.rfind('&') {
            assert!(fragment[amp..].contains(';'), "cut inside an entity: {fragment:?}");
        }
    }

    #[test]
    fn long_listings_split_into_well_formed_fragments() {
        let source = SourceId::new("upwork");
        for len in 3800..4100 {
            let listing = Listing {
                description: Some(format!("{}R&D", "x".repeat(len - 3))),
                ..sample_listing()
            };
            let text = display_text(&source, &listing, Tz::UTC);
            let fragments = split_to_fragments(&text, DEFAULT_MAX_FRAGMENT_SIZE);

            assert_eq!(fragments.concat(), text);
            for fragment in &fragments {
                assert!(fragment.chars().count() <= DEFAULT_MAX_FRAGMENT_SIZE);
                assert_markup_whole(fragment);
            }
        }
    }

    proptest! {
        #[test]
        fn fragments_reassemble_losslessly(text in ".{0,300}", max in 1usize..64) {
            let fragments = split_to_fragments(&text, max);
            prop_assert_eq!(fragments.concat(), text);
            for fragment in &fragments {
                prop_assert!(fragment.chars().count() <= max);
                prop_assert!(!fragment.is_empty());
            }
        }
    }
}
