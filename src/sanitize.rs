//! Sanitization for Telegram's Markdown dialect.
//!
//! Two deliberately separate functions with overlapping purpose:
//! [`escape_markdown`] keeps every original character (lossless, for places
//! where fidelity matters), while [`safe_preview`] trades fidelity for a
//! short preview that Telegram's parser will never reject.

/// Characters Telegram's MarkdownV2 parser treats as reserved.
const RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Maximum preview length before the `...` truncation marker.
const PREVIEW_MAX: usize = 150;

/// Escape every reserved character with a backslash.
///
/// Lossless: stripping each backslash that precedes a reserved character
/// restores the input exactly.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if RESERVED.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Replace reserved characters with visually similar safe ones and bound
/// the result to a short preview.
///
/// Lossy by design: `*` becomes `•`, `_` becomes `-`, backticks become
/// quotes, brackets become parentheses, `#` becomes `No.`. Anything longer
/// than 150 characters is cut at a char boundary with `...` appended.
pub fn safe_preview(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '*' => out.push('•'),
            '_' => out.push('-'),
            '`' => out.push('\''),
            '[' => out.push('('),
            ']' => out.push(')'),
            '#' => out.push_str("No."),
            other => out.push(other),
        }
    }

    if out.chars().count() > PREVIEW_MAX {
        let mut truncated: String = out.chars().take(PREVIEW_MAX).collect();
        truncated.push_str("...");
        return truncated;
    }
    out
}
