//! crates/insighthub_core/src/summarizer.rs
//!
//! Deterministic bullet summaries built from extracted text, used for the
//! chat summary view and whenever a model call fails.

/// Window size used when splitting on terminators leaves no sentences.
pub const WINDOW_CHARS: usize = 140;
/// Bullet marker prepended to every item.
pub const BULLET: &str = "• ";
/// The single bullet returned when there is nothing to summarize.
pub const NO_CONTENT_BULLET: &str = "• no content available";

const TERMINATORS: [char; 3] = ['.', '?', '!'];

/// Splits `text` into at most `max_items` short bullets (at least one).
/// Never returns an empty list.
pub fn to_bullets(text: &str, max_items: usize) -> Vec<String> {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut units: Vec<String> = flat
        .split(TERMINATORS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if units.is_empty() {
        units = char_windows(&flat, WINDOW_CHARS);
    }

    let bullets: Vec<String> = units
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .take(max_items.max(1))
        .map(|u| format!("{BULLET}{u}"))
        .collect();

    if bullets.is_empty() {
        vec![NO_CONTENT_BULLET.to_string()]
    } else {
        bullets
    }
}

/// A citation line followed by the bullets of `text`. The citation is kept
/// verbatim, so dots in filenames or scores never split it.
pub fn cited_bullets(citation: &str, text: &str, max_items: usize) -> String {
    let mut lines = vec![citation.to_string()];
    lines.extend(to_bullets(text, max_items));
    lines.join("\n")
}

fn char_windows(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size.max(1))
        .map(|w| w.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_placeholder() {
        assert_eq!(to_bullets("", 6), vec![NO_CONTENT_BULLET.to_string()]);
        assert_eq!(to_bullets("  \n\t ", 6), vec![NO_CONTENT_BULLET.to_string()]);
    }

    #[test]
    fn terminator_only_text_is_kept_as_a_window() {
        assert_eq!(to_bullets("...", 6), vec!["• ..."]);
        assert_eq!(to_bullets(". ! ?", 6), vec!["• . ! ?"]);
    }

    #[test]
    fn splits_on_all_terminators() {
        assert_eq!(
            to_bullets("First point. Is this second? Yes!  Trailing", 10),
            vec!["• First point", "• Is this second", "• Yes", "• Trailing"]
        );
    }

    #[test]
    fn respects_max_items() {
        let bullets = to_bullets("a. b. c. d. e.", 2);
        assert_eq!(bullets, vec!["• a", "• b"]);
    }

    #[test]
    fn zero_max_items_still_returns_one_bullet_of_content() {
        assert_eq!(to_bullets("Real content here. More.", 0), vec!["• Real content here"]);
    }

    #[test]
    fn unpunctuated_text_falls_back_to_windows() {
        let text = "x".repeat(300);
        assert!(!text.contains(TERMINATORS));
        let bullets = to_bullets(&text, 6);
        assert_eq!(bullets.len(), 3);
        assert_eq!(bullets[0], format!("{BULLET}{}", "x".repeat(WINDOW_CHARS)));
        assert_eq!(bullets[2], format!("{BULLET}{}", "x".repeat(20)));
    }

    #[test]
    fn citation_is_kept_whole_above_its_bullets() {
        assert_eq!(
            cited_bullets("[notes.v2.docx p3]", "Dogs bark. Cats purr.", 6),
            "[notes.v2.docx p3]\n• Dogs bark\n• Cats purr"
        );
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(to_bullets("one\n\n   two.", 3), vec!["• one two"]);
    }
}
