//! Text, number and summary transforms

use std::sync::LazyLock;

use regex::Regex;

use crate::model::Value;

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);")
        .expect("Invalid entity pattern")
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("Invalid tag pattern"));

/// Escapes HTML special characters, leaving existing entities intact.
///
/// # Example
///
/// ```
/// use gridlist_lib::eval::escape_html;
///
/// assert_eq!(escape_html("Tom & Jerry"), "Tom &amp; Jerry");
/// assert_eq!(escape_html("Tom &amp; Jerry"), "Tom &amp; Jerry");
/// assert_eq!(escape_html("<b>\"it's\"</b>"), "&lt;b&gt;&quot;it&#039;s&quot;&lt;/b&gt;");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for (index, ch) in text.char_indices() {
        match ch {
            '&' if ENTITY.is_match(&text[index..]) => escaped.push('&'),
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Decodes the entities [`escape_html`] produces, plus `&nbsp;`.
pub fn decode_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Removes HTML tags.
pub fn strip_tags(html: &str) -> String {
    TAG.replace_all(html, "").into_owned()
}

/// Substitutes `value` into a printf-style `format`.
///
/// Supports `%s`, `%d`, `%f` with an optional precision (`%.2f`) and `%%`.
/// Unknown conversions are copied through.
pub fn sprintf(format: &str, value: &Value) -> String {
    let mut output = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            output.push(ch);
            continue;
        }

        let mut precision: Option<usize> = None;
        let mut spec = String::from('%');
        if chars.peek() == Some(&'.') {
            spec.push('.');
            chars.next();
            let mut digits = String::new();
            while let Some(digit) = chars.peek().copied().filter(char::is_ascii_digit) {
                digits.push(digit);
                chars.next();
            }
            spec.push_str(&digits);
            precision = digits.parse().ok();
        }

        match chars.next() {
            Some('%') => output.push('%'),
            Some('s') => output.push_str(&value.to_text()),
            Some('d') => {
                let number = value.as_f64().unwrap_or(0.0).trunc() as i64;
                output.push_str(&number.to_string());
            }
            Some('f') | Some('F') => {
                let number = value.as_f64().unwrap_or(0.0);
                output.push_str(&format!("{:.*}", precision.unwrap_or(6), number));
            }
            Some(other) => {
                output.push_str(&spec);
                output.push(other);
            }
            None => output.push_str(&spec),
        }
    }

    output
}

/// Renders a text (or number) cell: flat lists joined with `", "`, an
/// optional printf-style format, then HTML escaping.
pub fn format_text(value: &Value, format: Option<&str>) -> String {
    let text = match format.filter(|format| !format.is_empty()) {
        Some(format) => sprintf(format, value),
        None => value.to_text(),
    };
    escape_html(&text)
}

/// Limits for a summary cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLimits {
    pub limit_chars: usize,
    pub limit_words: Option<usize>,
    pub end_chars: String,
}

impl Default for SummaryLimits {
    fn default() -> Self {
        Self {
            limit_chars: 40,
            limit_words: None,
            end_chars: "...".to_string(),
        }
    }
}

/// Shortens HTML to a plain text excerpt.
///
/// Tags are stripped with a space between adjacent nodes. Without a word
/// limit, the word count is estimated from the first `limit_chars`
/// characters. The end marker is appended when the excerpt is shorter than
/// the stripped text.
///
/// # Example
///
/// ```
/// use gridlist_lib::eval::{summarize, SummaryLimits};
///
/// let limits = SummaryLimits { limit_chars: 10, ..SummaryLimits::default() };
/// let summary = summarize("<p>The quick brown fox</p><p>jumps</p>", &limits);
/// assert_eq!(summary, "The quick...");
/// ```
pub fn summarize(html: &str, limits: &SummaryLimits) -> String {
    let spaced = html.replace("><", "> <");
    let original = decode_html(&strip_tags(&spaced)).trim().to_string();
    if original.is_empty() {
        return original;
    }

    let limit_words = limits.limit_words.unwrap_or_else(|| {
        let head: String = original.chars().take(limits.limit_chars).collect();
        head.trim_end().matches(' ').count() + 1
    });

    let mut result = leading_words(&original, limit_words);
    if result.chars().count() != original.chars().count() {
        result.push_str(&limits.end_chars);
    }
    result
}

fn leading_words(text: &str, count: usize) -> String {
    let mut words = 0;
    let mut end = text.len();
    let mut in_word = false;

    for (index, ch) in text.char_indices() {
        if ch.is_whitespace() {
            in_word = false;
        } else if !in_word {
            if words == count {
                end = index;
                break;
            }
            in_word = true;
            words += 1;
        }
    }

    text[..end].trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_keeps_entities() {
        assert_eq!(escape_html("a &lt; b && c"), "a &lt; b &amp;&amp; c");
        assert_eq!(escape_html("&#x27;"), "&#x27;");
    }

    #[test]
    fn test_sprintf_conversions() {
        assert_eq!(sprintf("$%.2f", &Value::Float(12.3456)), "$12.35");
        assert_eq!(sprintf("%d%%", &Value::from("42.9")), "42%");
        assert_eq!(sprintf("[%s]", &Value::from("x")), "[x]");
        assert_eq!(sprintf("%q", &Value::Null), "%q");
    }

    #[test]
    fn test_format_text_joins_lists() {
        let value = Value::List(vec![Value::from("A"), Value::from("B")]);
        assert_eq!(format_text(&value, None), "A, B");
        assert_eq!(format_text(&Value::from("<i>"), Some("%s!")), "&lt;i&gt;!");
    }

    #[test]
    fn test_summary_limits_chars() {
        let html = "<p>Lorem ipsum dolor sit amet, consectetur adipiscing elit</p>";
        let limits = SummaryLimits {
            limit_chars: 10,
            ..SummaryLimits::default()
        };
        let summary = summarize(html, &limits);
        assert!(summary.ends_with("..."));
        assert!(summary.len() < strip_tags(html).len());
        assert_eq!(summary, "Lorem ipsum...");
    }

    #[test]
    fn test_summary_short_text_unchanged() {
        assert_eq!(summarize("<b>Short</b>", &SummaryLimits::default()), "Short");
        assert_eq!(summarize("<br/>", &SummaryLimits::default()), "");
    }

    #[test]
    fn test_summary_word_limit() {
        let limits = SummaryLimits {
            limit_words: Some(2),
            end_chars: " [more]".to_string(),
            ..SummaryLimits::default()
        };
        assert_eq!(summarize("one two three", &limits), "one two [more]");
    }
}
