use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Ellipsis appended to cut text
const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Display width of a string in terminal columns (CJK and emoji count 2).
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Longest prefix of `s` that fits in `max_width` columns.
fn prefix_within(s: &str, max_width: usize) -> &str {
    let mut width = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w > max_width {
            break;
        }
        width += w;
        end = idx + c.len_utf8();
    }
    &s[..end]
}

/// Cuts `s` to `max_width` columns, ending in "..." when anything was removed.
///
/// Widths of 3 or less have no room for the ellipsis and return the bare
/// prefix instead.
///
/// ```
/// use changefeed::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
/// assert_eq!(truncate_to_width("Test", 2), "Te");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }
    if max_width <= ELLIPSIS_WIDTH {
        return Cow::Borrowed(prefix_within(s, max_width));
    }
    let kept = prefix_within(s, max_width - ELLIPSIS_WIDTH);
    Cow::Owned(format!("{kept}{ELLIPSIS}"))
}

/// Removes terminal control characters and ANSI escape sequences.
///
/// Strips ASCII controls other than tab, newline and carriage return, DEL,
/// CSI sequences (`\x1b[` up to a final byte in 0x40-0x7E), OSC sequences
/// (`\x1b]` up to BEL or `\x1b\\`) and bare ESC. Clean input is borrowed.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    let len = bytes.len();

    if !bytes.iter().any(|&b| is_stripped(b)) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(len);
    let mut i = 0;
    while i < len {
        let b = bytes[i];
        if b == 0x1b {
            match bytes.get(i + 1) {
                Some(b'[') => {
                    i += 2;
                    while i < len {
                        let c = bytes[i];
                        i += 1;
                        if (0x40..=0x7e).contains(&c) {
                            break;
                        }
                    }
                }
                Some(b']') => {
                    i += 2;
                    while i < len {
                        if bytes[i] == 0x07 {
                            i += 1;
                            break;
                        }
                        if bytes[i] == 0x1b && bytes.get(i + 1) == Some(&b'\\') {
                            i += 2;
                            break;
                        }
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        } else if is_stripped(b) {
            i += 1;
        } else {
            let start = i;
            while i < len && !is_stripped(bytes[i]) {
                i += 1;
            }
            // Only ASCII bytes end a run, so the slice is on char boundaries.
            out.push_str(&s[start..i]);
        }
    }
    Cow::Owned(out)
}

fn is_stripped(b: u8) -> bool {
    b == 0x1b || b == 0x7f || (b < 0x20 && b != b'\t' && b != b'\n' && b != b'\r')
}

/// Greedy word wrap limited to `max_lines`, like a text view's line limit.
///
/// Feed text is untrusted: escape sequences and control characters are
/// dropped and whitespace runs (including newlines) collapse to single spaces. Overlong words are
/// truncated. If text remains after `max_lines`, the last line ends in "...".
pub fn wrap_lines(s: &str, width: usize, max_lines: usize) -> Vec<String> {
    if width == 0 || max_lines == 0 {
        return Vec::new();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for raw_word in strip_control_chars(s).split_whitespace() {
        let word: String = raw_word.chars().filter(|c| !c.is_control()).collect();
        if word.is_empty() {
            continue;
        }
        let word = truncate_to_width(&word, width).into_owned();

        let needed = if current.is_empty() {
            display_width(&word)
        } else {
            display_width(&current) + 1 + display_width(&word)
        };

        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            *last = truncate_to_width(&format!("{last}{ELLIPSIS}"), width).into_owned();
        }
    }
    lines
}
