//! Snapshots of the host page.

use std::sync::Arc;

/// The default cap on a page snapshot, in characters.
pub const DEFAULT_MAX_PAGE_CHARS: usize = 3000;

/// A source of the text currently visible on the host page.
///
/// The widget captures a fresh snapshot for every outgoing request and
/// never caches it across turns. Capturing must be cheap and synchronous,
/// it runs on the widget's actor.
pub trait PageContext: Send + Sync + 'static {
    /// Returns the visible text, or `None` if nothing is rendered.
    fn capture(&self) -> Option<String>;
}

impl<F> PageContext for F
where
    F: Fn() -> Option<String> + Send + Sync + 'static,
{
    #[inline]
    fn capture(&self) -> Option<String> {
        self()
    }
}

/// A page whose content never changes.
#[derive(Clone, Debug)]
pub struct StaticPage(Arc<str>);

impl StaticPage {
    /// Creates a page with the given text.
    #[inline]
    pub fn new<S: AsRef<str>>(text: S) -> Self {
        Self(Arc::from(text.as_ref()))
    }
}

impl PageContext for StaticPage {
    #[inline]
    fn capture(&self) -> Option<String> {
        Some(self.0.to_string())
    }
}

/// Collapses whitespace runs and truncates to `max_chars` characters.
///
/// Returns `None` when nothing but whitespace is left.
pub(crate) fn normalize_snapshot(raw: &str, max_chars: usize) -> Option<String> {
    let mut snapshot = String::new();
    let mut chars = 0;
    for word in raw.split_whitespace() {
        let separator = usize::from(!snapshot.is_empty());
        let word_chars = word.chars().count();
        if chars + separator + word_chars > max_chars {
            // Fill the remaining room with the head of this word.
            let room = max_chars.saturating_sub(chars + separator);
            if room > 0 {
                if separator == 1 {
                    snapshot.push(' ');
                }
                snapshot.extend(word.chars().take(room));
            }
            break;
        }
        if separator == 1 {
            snapshot.push(' ');
        }
        snapshot.push_str(word);
        chars += separator + word_chars;
    }
    if snapshot.is_empty() {
        None
    } else {
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        let raw = "  Local Jobs Engine\n\n\t$3,600  + $399/qtr  ";
        assert_eq!(
            normalize_snapshot(raw, 100).unwrap(),
            "Local Jobs Engine $3,600 + $399/qtr"
        );
        assert_eq!(normalize_snapshot(" \n\t ", 100), None);
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        let snapshot = normalize_snapshot("héllo wörld 👷 hard hats", 13).unwrap();
        assert_eq!(snapshot, "héllo wörld 👷");
        assert_eq!(snapshot.chars().count(), 13);

        let snapshot = normalize_snapshot("ab cdef", 5).unwrap();
        assert_eq!(snapshot, "ab cd");
        assert_eq!(normalize_snapshot("abcdef", 0), None);
    }

    #[test]
    fn test_closure_source() {
        let source = || Some("Guide page".to_owned());
        assert_eq!(source.capture().as_deref(), Some("Guide page"));
        assert_eq!(StaticPage::new("Home").capture().as_deref(), Some("Home"));
    }
}
