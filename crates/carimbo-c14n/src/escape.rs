#![forbid(unsafe_code)]

//! Character escaping for canonical XML output.
//!
//! The canonical form fixes the replacement set exactly: `&`, `<` and `>`
//! in character data; `&`, `<`, `"`, tab and newline in attribute values;
//! carriage return becomes `&#xD;` in every context, including PI data.
//! Nothing else is touched.

use std::borrow::Cow;

/// Escape character data.
pub fn escape_text(s: &str) -> Cow<'_, str> {
    escape_with(s, text_replacement)
}

/// Escape an attribute value.
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    escape_with(s, attr_replacement)
}

/// Escape processing instruction data.
pub fn escape_pi(s: &str) -> Cow<'_, str> {
    escape_with(s, |c| (c == '\r').then_some("&#xD;"))
}

fn text_replacement(c: char) -> Option<&'static str> {
    match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '\r' => Some("&#xD;"),
        _ => None,
    }
}

fn attr_replacement(c: char) -> Option<&'static str> {
    match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '"' => Some("&quot;"),
        '\t' => Some("&#x9;"),
        '\n' => Some("&#xA;"),
        '\r' => Some("&#xD;"),
        _ => None,
    }
}

/// Borrow the input unchanged when no character needs replacing, which is
/// the common case for element content.
fn escape_with(s: &str, repl: impl Fn(char) -> Option<&'static str>) -> Cow<'_, str> {
    let Some(first) = s.find(|c| repl(c).is_some()) else {
        return Cow::Borrowed(s);
    };
    let mut out = String::with_capacity(s.len() + 8);
    out.push_str(&s[..first]);
    for c in s[first..].chars() {
        match repl(c) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_input_is_borrowed() {
        assert!(matches!(escape_text("nothing special"), Cow::Borrowed(_)));
        assert!(matches!(escape_attr("nothing special"), Cow::Borrowed(_)));
    }

    #[test]
    fn markup_characters_in_text() {
        assert_eq!(escape_text("1 < 2 && 4 > 3"), "1 &lt; 2 &amp;&amp; 4 &gt; 3");
    }

    #[test]
    fn quotes_survive_in_text_but_not_in_attributes() {
        assert_eq!(escape_text(r#"say "hi""#), r#"say "hi""#);
        assert_eq!(escape_attr(r#"say "hi""#), "say &quot;hi&quot;");
    }

    #[test]
    fn attribute_whitespace_is_character_referenced() {
        assert_eq!(escape_attr("a\tb\nc"), "a&#x9;b&#xA;c");
    }

    #[test]
    fn carriage_return_escaped_everywhere() {
        assert_eq!(escape_text("x\r"), "x&#xD;");
        assert_eq!(escape_attr("x\r"), "x&#xD;");
        assert_eq!(escape_pi("x\r"), "x&#xD;");
    }
}
