//! Character-window helpers shared by the extractors and domain plugins.
//!
//! Concept positions are byte offsets into the analysed text (what `regex`
//! reports), while context and evidence windows are measured in characters so
//! multi-byte text never gets sliced inside a code point.

/// Byte offset of the `n`-th character of `text`, clamped to `text.len()`.
pub fn char_to_byte(text: &str, n: usize) -> usize {
    text.char_indices()
        .nth(n)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

/// Number of characters in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Slice of `text` covering `[start, end)` (byte offsets) widened by `window`
/// characters on each side.
///
/// Offsets that fall outside the text or inside a code point are clamped to the
/// nearest valid boundary, so this never panics.
pub fn window(text: &str, start: usize, end: usize, window: usize) -> &str {
    let start = floor_boundary(text, start.min(text.len()));
    let end = ceil_boundary(text, end.min(text.len()).max(start));

    let from = text[..start]
        .char_indices()
        .rev()
        .nth(window.saturating_sub(1))
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    let from = if window == 0 { start } else { from };

    let to = text[end..]
        .char_indices()
        .nth(window)
        .map(|(idx, _)| end + idx)
        .unwrap_or(text.len());

    &text[from..to]
}

fn floor_boundary(text: &str, mut idx: usize) -> usize {
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_boundary(text: &str, mut idx: usize) -> usize {
    while idx < text.len() && !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_clamps_at_edges() {
        let text = "Patient has fever";
        assert_eq!(window(text, 12, 17, 50), text);
        assert_eq!(window(text, 12, 17, 4), "has fever");
        assert_eq!(window(text, 0, 7, 2), "Patient h");
    }

    #[test]
    fn test_window_zero_is_exact_span() {
        assert_eq!(window("abc def ghi", 4, 7, 0), "def");
    }

    #[test]
    fn test_window_counts_characters_not_bytes() {
        let text = "ééé fever ééé";
        let start = text.find("fever").unwrap();
        assert_eq!(window(text, start, start + 5, 2), "é fever é");
    }

    #[test]
    fn test_window_out_of_range_offsets() {
        assert_eq!(window("short", 40, 90, 3), "ort");
    }

    #[test]
    fn test_char_to_byte() {
        assert_eq!(char_to_byte("héllo", 2), 3);
        assert_eq!(char_to_byte("abc", 10), 3);
        assert_eq!(char_len("héllo"), 5);
    }
}
