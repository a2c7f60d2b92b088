//! Escaping for values embedded in JavaScript string literals.

/// Escapes `text` for use inside a double- or single-quoted JavaScript
/// string that may itself sit inside an HTML `<script>` element.
///
/// Quotes and backslashes are backslash-escaped. Characters that could close
/// the script element or start an HTML entity (`<`, `>`, `&`, `=`) become
/// `\uXXXX` escapes, as do control characters and the two Unicode line
/// terminators JavaScript treats as newlines.
///
/// ```rust
/// use turbo_bridge::escape_js;
///
/// assert_eq!(escape_js("/"), "/");
/// assert_eq!(escape_js(r#"a"b"#), r#"a\"b"#);
/// assert_eq!(escape_js("</script>"), r"\u003C/script\u003E");
/// ```
pub fn escape_js(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '\'' => result.push_str("\\'"),
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '<' => result.push_str("\\u003C"),
            '>' => result.push_str("\\u003E"),
            '&' => result.push_str("\\u0026"),
            '=' => result.push_str("\\u003D"),
            '\u{2028}' | '\u{2029}' => result.push_str(&format!("\\u{:04X}", ch as u32)),
            _ if ch.is_control() => result.push_str(&format!("\\u{:04X}", ch as u32)),
            _ => result.push(ch),
        }
    }
    result
}
