//! Width accounting for lines that carry ANSI colour sequences.

use unicode_width::UnicodeWidthChar;

const ESC: char = '\u{1b}';
const ELLIPSIS: &str = "...";
const RESET: &str = "\u{1b}[0m";

/// Number of terminal columns `text` occupies, ignoring CSI escape sequences.
/// Wide (CJK, emoji) characters take two columns.
pub fn visible_width(text: &str) -> usize {
    let mut width = 0;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ESC {
            skip_escape(&mut chars);
        } else {
            width += column_width(c);
        }
    }
    width
}

fn column_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// Cut `text` to at most `width` visible columns, ending in `...` when cut.
/// Escape sequences before the cut are kept; a reset is appended so a cut
/// colour does not bleed into the next line.
pub fn truncate_visible(text: &str, width: usize) -> String {
    if visible_width(text) <= width {
        return text.to_string();
    }
    if width <= ELLIPSIS.len() {
        return ELLIPSIS[..width].to_string();
    }
    let keep = width - ELLIPSIS.len();
    let mut out = String::with_capacity(text.len());
    let mut seen_escape = false;
    let mut visible = 0;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ESC {
            seen_escape = true;
            out.push(c);
            out.push_str(&skip_escape(&mut chars));
            continue;
        }
        let w = column_width(c);
        if visible + w > keep {
            break;
        }
        out.push(c);
        visible += w;
    }
    if seen_escape {
        out.push_str(RESET);
    }
    out.push_str(ELLIPSIS);
    out
}

/// Consume one escape sequence after ESC; returns the consumed text.
fn skip_escape<I: Iterator<Item = char>>(chars: &mut std::iter::Peekable<I>) -> String {
    let mut seq = String::new();
    if chars.peek() != Some(&'[') {
        if let Some(c) = chars.next() {
            seq.push(c);
        }
        return seq;
    }
    if let Some(c) = chars.next() {
        seq.push(c);
    }
    for c in chars.by_ref() {
        seq.push(c);
        if ('@'..='~').contains(&c) {
            break;
        }
    }
    seq
}
