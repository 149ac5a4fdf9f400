//! Booking action detection.
//!
//! Replies may ask for a booking affordance in two ways: the reserved
//! marker embedded in the text, or a trigger phrase mentioned in passing.
//! Both are heuristics over free-form text. False positives only show an
//! extra button, false negatives only hide one.

use std::sync::Arc;

use crate::persona::PersonaConfig;

/// Decides whether a reply should show the booking affordance.
///
/// Closures of type `Fn(&str) -> bool` implement this trait, so a host can
/// swap the heuristic for a stricter signal without touching the widget.
pub trait ActionDetector: Send + Sync + 'static {
    /// Inspects the raw reply, marker included.
    fn detects_action(&self, raw_reply: &str) -> bool;
}

impl<F> ActionDetector for F
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    #[inline]
    fn detects_action(&self, raw_reply: &str) -> bool {
        self(raw_reply)
    }
}

/// The default detector: the exact marker (case-sensitive) or any trigger
/// phrase in the lowercased reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkerOrPhraseDetector {
    marker: String,
    phrases: Vec<String>,
}

impl MarkerOrPhraseDetector {
    /// Creates the detector for a persona.
    #[inline]
    pub fn for_persona(persona: &PersonaConfig) -> Self {
        Self {
            marker: persona.marker().to_owned(),
            phrases: persona.trigger_phrases().to_vec(),
        }
    }
}

impl ActionDetector for MarkerOrPhraseDetector {
    fn detects_action(&self, raw_reply: &str) -> bool {
        if !self.marker.is_empty() && raw_reply.contains(&self.marker) {
            return true;
        }
        let lowered = raw_reply.to_lowercase();
        self.phrases.iter().any(|phrase| lowered.contains(phrase.as_str()))
    }
}

/// A reply after action handling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ProcessedReply {
    pub text: String,
    pub show_booking: bool,
}

/// Strips every occurrence of `marker` and runs the detector on the raw
/// text. Everything else in the reply is kept as it came.
pub(crate) fn process_reply(
    raw_reply: &str,
    marker: &str,
    detector: &Arc<dyn ActionDetector>,
) -> ProcessedReply {
    let show_booking = detector.detects_action(raw_reply);
    let text = strip_marker(raw_reply, marker);
    ProcessedReply { text, show_booking }
}

/// Removes the marker until none is left, collapsing the whitespace around
/// each removed occurrence into a single gap.
///
/// Removal repeats because joining the text around one occurrence can form
/// a new one. Every pass makes the text shorter, so this terminates.
fn strip_marker(raw_reply: &str, marker: &str) -> String {
    if marker.is_empty() {
        return raw_reply.to_owned();
    }

    let mut text = raw_reply.to_owned();
    while let Some(start) = text.find(marker) {
        let left = &text[..start];
        let right = &text[start + marker.len()..];
        let left_kept = left.trim_end();
        let right_kept = right.trim_start();
        let right_gap = &right[..right.len() - right_kept.len()];

        // Punctuation that followed the marker directly closes the sentence
        // before it.
        let gap = if left_kept.is_empty()
            || right_kept.is_empty()
            || (right_gap.is_empty() && starts_with_punctuation(right_kept))
        {
            ""
        } else {
            pick_gap(&left[left_kept.len()..], right_gap)
        };
        text = format!("{left_kept}{gap}{right_kept}");
    }
    text
}

/// Keeps the more significant of the two whitespace runs around a removed
/// marker: the one with more line breaks, or the left one on a tie.
fn pick_gap<'a>(left: &'a str, right: &'a str) -> &'a str {
    let breaks = |ws: &str| ws.matches('\n').count();
    if left.is_empty() || breaks(right) > breaks(left) {
        right
    } else {
        left
    }
}

fn starts_with_punctuation(text: &str) -> bool {
    text.starts_with(|c: char| c.is_ascii_punctuation())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_detector() -> Arc<dyn ActionDetector> {
        Arc::new(MarkerOrPhraseDetector::for_persona(
            &PersonaConfig::trade_partner(),
        ))
    }

    #[test]
    fn test_marker_is_stripped_and_flagged() {
        let reply = process_reply(
            "Packages start from $1,900... [BOOK_ACTION]",
            "[BOOK_ACTION]",
            &default_detector(),
        );
        assert_eq!(reply.text, "Packages start from $1,900...");
        assert!(reply.show_booking);
    }

    #[test]
    fn test_marker_in_the_middle() {
        let reply = process_reply(
            "Book now.[BOOK_ACTION]\nNo lock-in. [BOOK_ACTION]",
            "[BOOK_ACTION]",
            &default_detector(),
        );
        assert_eq!(reply.text, "Book now.\nNo lock-in.");
        assert!(!reply.text.contains("[BOOK_ACTION]"));
    }

    #[test]
    fn test_marker_with_a_space_does_not_reform() {
        let reply = process_reply(
            "[BOOK [BOOK ACTION]ACTION] Call us.",
            "[BOOK ACTION]",
            &default_detector(),
        );
        assert_eq!(reply.text, "Call us.");

        let reply = process_reply(
            "Yes [BOOK [BOOK ACTION] ACTION] please",
            "[BOOK ACTION]",
            &default_detector(),
        );
        assert!(!reply.text.contains("[BOOK ACTION]"));
        assert_eq!(reply.text, "Yes please");
    }

    #[test]
    fn test_text_around_marker_is_kept() {
        let strip = |raw: &str| {
            process_reply(raw, "[BOOK_ACTION]", &default_detector()).text
        };

        assert_eq!(strip("Book a review [BOOK_ACTION]."), "Book a review.");
        assert_eq!(
            strip("Line one\n\n[BOOK_ACTION]\n\nLine two"),
            "Line one\n\nLine two"
        );
        assert_eq!(strip("Call [BOOK_ACTION] (mornings)"), "Call (mornings)");
        assert_eq!(strip("[BOOK_ACTION]"), "");
        // Replies without the marker are left alone.
        assert_eq!(strip("  Hello there.\n"), "  Hello there.\n");
    }

    #[test]
    fn test_marker_is_case_sensitive() {
        let detector = MarkerOrPhraseDetector {
            marker: "[BOOK_ACTION]".to_owned(),
            phrases: vec![],
        };
        assert!(!detector.detects_action("[book_action]"));
        assert!(detector.detects_action("ok [BOOK_ACTION]"));
    }

    #[test]
    fn test_trigger_phrase() {
        let reply = process_reply(
            "A Missed Job Review finds your leaks.",
            "[BOOK_ACTION]",
            &default_detector(),
        );
        assert_eq!(reply.text, "A Missed Job Review finds your leaks.");
        assert!(reply.show_booking);

        let reply =
            process_reply("We build websites.", "[BOOK_ACTION]", &default_detector());
        assert!(!reply.show_booking);
    }

    #[test]
    fn test_custom_detector_still_strips() {
        let never: Arc<dyn ActionDetector> = Arc::new(|_: &str| false);
        let reply = process_reply("Sure [BOOK_ACTION]", "[BOOK_ACTION]", &never);
        assert_eq!(reply.text, "Sure");
        assert!(!reply.show_booking);
    }
}
