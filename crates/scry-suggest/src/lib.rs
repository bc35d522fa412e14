// scry-suggest -- completions and overload hints.
//
// Reruns the lexer, builder, and binder leniently on cursor-truncated
// input. Structural errors are suppressed; whatever partial tree survives
// anchors either identifier completion or overload hints at the nearest
// unmatched open group.

mod engine;
mod worker;

pub use engine::{suggest, SuggestContext};
pub use worker::{Delivered, SuggestWorker};

/// What kind of thing a candidate names, for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    Namespace,
    Type,
    Member,
    Method,
    Variable,
    Keyword,
    Overload,
}

/// One completion or overload-hint entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub display: String,
    pub kind: CandidateKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestMode {
    /// Nothing to offer at this cursor position.
    None,
    /// Identifier completion relative to an anchor.
    Completions,
    /// Signatures of the callable enclosing the cursor.
    OverloadHints,
}

/// A ranked candidate list, deduplicated by display name and sorted
/// lexicographically. Pagination happens on top via [`Suggestions::page`].
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestions {
    pub mode: SuggestMode,
    pub candidates: Vec<Candidate>,
    /// Byte length of the matched prefix, for rendering emphasis.
    pub match_len: usize,
    /// In overload-hint mode, the parameter index the cursor occupies.
    pub active_param: Option<usize>,
}

impl Suggestions {
    pub fn none() -> Self {
        Self {
            mode: SuggestMode::None,
            candidates: Vec::new(),
            match_len: 0,
            active_param: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// A window of `size` entries starting at `offset`, with overflow
    /// counts for the "N more results" markers on both ends.
    pub fn page(&self, offset: usize, size: usize) -> PageView<'_> {
        let total = self.candidates.len();
        let start = offset.min(total);
        let end = (start + size).min(total);
        PageView {
            items: &self.candidates[start..end],
            hidden_before: start,
            hidden_after: total - end,
        }
    }
}

/// One visible page of candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView<'a> {
    pub items: &'a [Candidate],
    pub hidden_before: usize,
    pub hidden_after: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(n: usize) -> Suggestions {
        Suggestions {
            mode: SuggestMode::Completions,
            candidates: (0..n)
                .map(|i| Candidate { display: format!("c{i:02}"), kind: CandidateKind::Member })
                .collect(),
            match_len: 0,
            active_param: None,
        }
    }

    #[test]
    fn window_math() {
        let s = list(25);
        let page = s.page(0, 10);
        assert_eq!(page.items.len(), 10);
        assert_eq!((page.hidden_before, page.hidden_after), (0, 15));

        let page = s.page(10, 10);
        assert_eq!((page.hidden_before, page.hidden_after), (10, 5));

        let page = s.page(20, 10);
        assert_eq!(page.items.len(), 5);
        assert_eq!((page.hidden_before, page.hidden_after), (20, 0));

        // Past the end the window is empty but never panics.
        let page = s.page(100, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.hidden_before, 25);
    }

    #[test]
    fn short_lists_fit_one_window() {
        let s = list(3);
        let page = s.page(0, 10);
        assert_eq!(page.items.len(), 3);
        assert_eq!((page.hidden_before, page.hidden_after), (0, 0));
    }
}
