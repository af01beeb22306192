/// Shared utility functions

/// Truncate a string to at most `max_chars` characters (never splits a char)
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Collapse runs of whitespace (Atom feeds hard-wrap titles and abstracts)
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
