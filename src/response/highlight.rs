//! Highlight wrapping of matched substrings.
//!
//! Matching is case-insensitive and preserves the original casing of the
//! matched text. Spans already sitting inside markers are left alone, so
//! applying the same terms twice never double-wraps.

/// Opening marker placed before a matched substring.
pub const HIGHLIGHT_OPEN: &str = "<b>";
/// Closing marker placed after a matched substring.
pub const HIGHLIGHT_CLOSE: &str = "</b>";

/// Wrap every occurrence of every term, in the order the terms were
/// supplied. Empty terms are skipped.
pub fn highlight_terms(text: &str, terms: &[String]) -> String {
    terms
        .iter()
        .filter(|term| !term.is_empty())
        .fold(text.to_string(), |acc, term| highlight_term(&acc, term))
}

fn highlight_term(text: &str, term: &str) -> String {
    let lower_text = text.to_lowercase();
    // Lowercasing can change byte lengths for some scripts; offsets would no
    // longer line up, so fall back to exact matching there.
    let (haystack, needle) = if lower_text.len() == text.len() {
        (lower_text, term.to_lowercase())
    } else {
        (text.to_string(), term.to_string())
    };

    let protected = marker_spans(text);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut search = 0;
    while let Some(found) = haystack[search..].find(&needle) {
        let start = search + found;
        let end = start + needle.len();
        search = end;
        if protected.iter().any(|(s, e)| start < *e && end > *s) {
            continue;
        }
        out.push_str(&text[cursor..start]);
        out.push_str(HIGHLIGHT_OPEN);
        out.push_str(&text[start..end]);
        out.push_str(HIGHLIGHT_CLOSE);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Byte ranges covered by existing `<b>...</b>` spans, markers included.
fn marker_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut search = 0;
    while let Some(open) = text[search..].find(HIGHLIGHT_OPEN) {
        let open = search + open;
        let after_open = open + HIGHLIGHT_OPEN.len();
        let Some(close) = text[after_open..].find(HIGHLIGHT_CLOSE) else { break };
        let end = after_open + close + HIGHLIGHT_CLOSE.len();
        spans.push((open, end));
        search = end;
    }
    spans
}
