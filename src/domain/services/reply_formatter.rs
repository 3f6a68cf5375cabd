use std::sync::LazyLock;

use regex::Regex;

static CARRIAGE_RETURNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r+\n").expect("Invalid carriage return regex"));
static NEWLINE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("Invalid newline run regex"));
static SPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]{2,}").expect("Invalid space run regex"));

/// Normalize a raw model reply for display.
///
/// Literal `\n` escapes become real newlines, CRLF becomes LF, newline runs
/// collapse to one blank line, other whitespace runs collapse to one space and
/// the ends are trimmed. The passes are ordered so that the output is a fixed
/// point: `format_reply(&format_reply(x)) == format_reply(x)`.
pub fn format_reply(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let unescaped = raw.replace("\\n", "\n");
    let unix = CARRIAGE_RETURNS.replace_all(&unescaped, "\n");
    let paragraphs = NEWLINE_RUNS.replace_all(&unix, "\n\n");
    let spaced = SPACE_RUNS.replace_all(&paragraphs, " ");

    spaced.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_collapses_blank_lines() {
        assert_eq!(
            format_reply("  Hi there!\n\n\nHow are you?  "),
            "Hi there!\n\nHow are you?"
        );
    }

    #[test]
    fn collapses_inline_whitespace() {
        assert_eq!(format_reply("a   b\t\tc d"), "a b c d");
    }

    #[test]
    fn single_tab_is_kept() {
        assert_eq!(format_reply("a\tb"), "a\tb");
    }

    #[test]
    fn unescapes_literal_newlines() {
        assert_eq!(format_reply(r"line one\nline two"), "line one\nline two");
        assert_eq!(format_reply(r"a\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn normalizes_crlf() {
        assert_eq!(format_reply("a\r\n\r\n\r\nb"), "a\n\nb");
    }

    #[test]
    fn empty_and_blank_inputs_map_to_empty() {
        assert_eq!(format_reply(""), "");
        assert_eq!(format_reply("   \n\t  "), "");
    }

    #[test]
    fn formatting_is_idempotent() {
        let samples = [
            "",
            " ",
            "plain",
            "  Hi there!\n\n\nHow are you?  ",
            "a \n  \n\n b",
            "\r\\n",
            "\r\r\n\r\nx",
            "x\\\\ny",
            "tab\t \tseparated\n\n\n\n\nend\\n",
            "  \\n  leading escape",
            "unicode\u{00a0}\u{00a0}space",
        ];

        for sample in samples {
            let once = format_reply(sample);
            let twice = format_reply(&once);
            assert_eq!(once, twice, "not idempotent for {sample:?}");
        }
    }
}
