/// Characters that carry meaning somewhere in CommonMark/GFM syntax.
const SPECIAL: &[char] = &[
    '\\', '`', '*', '_', '{', '}', '[', ']', '(', ')', '<', '>', '#', '+', '-', '.', '!', '|',
    '~', '&',
];

/// Escape `text` so it renders literally when dropped into Markdown.
///
/// Whitespace runs (including newlines) collapse to a single space, which
/// keeps a substituted value from starting a new block.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut pending_space = false;

    for ch in text.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        if SPECIAL.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markdown_punctuation() {
        assert_eq!(escape_markdown("A. Author"), r"A\. Author");
        assert_eq!(escape_markdown("*bold* [x](y)"), r"\*bold\* \[x\]\(y\)");
        assert_eq!(escape_markdown("<b>R&D</b>"), r"\<b\>R\&D\</b\>");
    }

    #[test]
    fn collapses_line_breaks() {
        assert_eq!(escape_markdown("  one\n\n# two  "), r"one \# two");
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(escape_markdown("Jordan Rivera, 2020"), "Jordan Rivera, 2020");
    }
}
