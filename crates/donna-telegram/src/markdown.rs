// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MarkdownV2 escaping for the Telegram Bot API.
//!
//! MarkdownV2 requires escaping a large set of characters outside code
//! spans, while fenced blocks and inline code must pass through untouched.

/// Characters Telegram requires escaped outside code spans.
const SPECIAL_CHARS: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escapes text for MarkdownV2, preserving code spans verbatim.
///
/// Unclosed code spans run to the end of the input unescaped, which is how
/// Telegram renders them anyway.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    let mut rest = text;
    while !rest.is_empty() {
        if let Some(inner) = rest.strip_prefix("```") {
            match inner.find("```") {
                Some(end) => {
                    out.push_str(&rest[..end + 6]);
                    rest = &rest[end + 6..];
                }
                None => {
                    out.push_str(rest);
                    break;
                }
            }
        } else if let Some(inner) = rest.strip_prefix('`') {
            match inner.find('`') {
                Some(end) => {
                    out.push_str(&rest[..end + 2]);
                    rest = &rest[end + 2..];
                }
                None => {
                    out.push_str(rest);
                    break;
                }
            }
        } else {
            // Safe: rest is non-empty.
            let Some(ch) = rest.chars().next() else { break };
            if SPECIAL_CHARS.contains(&ch) {
                out.push('\\');
            }
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(escape_markdown_v2(""), "");
        assert_eq!(escape_markdown_v2("Hello world"), "Hello world");
    }

    #[test]
    fn punctuation_is_escaped() {
        assert_eq!(escape_markdown_v2("Done."), "Done\\.");
        assert_eq!(
            escape_markdown_v2("9:00 - 9:15 (Room 1)"),
            "9:00 \\- 9:15 \\(Room 1\\)"
        );
    }

    #[test]
    fn every_special_char_is_escaped() {
        let input = "_*[]()~>#+-=|{}.!";
        let expected = "\\_\\*\\[\\]\\(\\)\\~\\>\\#\\+\\-\\=\\|\\{\\}\\.\\!";
        assert_eq!(escape_markdown_v2(input), expected);
    }

    #[test]
    fn inline_code_is_preserved() {
        let result = escape_markdown_v2("Run `donna serve` now.");
        assert!(result.contains("`donna serve`"));
        assert!(result.ends_with("now\\."));
    }

    #[test]
    fn fenced_block_is_preserved() {
        let input = "Config:\n```toml\nmax_tool_rounds = 4\n```\nThat's it.";
        let result = escape_markdown_v2(input);
        assert!(result.contains("max_tool_rounds = 4"));
        assert!(result.ends_with("That's it\\."));
    }

    #[test]
    fn unclosed_spans_run_to_the_end() {
        assert_eq!(escape_markdown_v2("see `code.here"), "see `code.here");
        assert_eq!(
            escape_markdown_v2("```\nunclosed = true"),
            "```\nunclosed = true"
        );
    }

    #[test]
    fn multibyte_text_survives() {
        assert_eq!(escape_markdown_v2("Café at 9."), "Café at 9\\.");
    }
}
