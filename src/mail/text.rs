//! Message text extraction — MIME parts to plain, speakable text.

use mail_parser::MimeHeaders;

/// Snippet length in characters.
const SNIPPET_CHARS: usize = 120;

/// Strip HTML tags from content (basic). `<style>`/`<script>` bodies are
/// dropped with their tags.
pub fn strip_html(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;
    let mut tag = String::new();
    let mut skip_until: Option<&str> = None;

    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                let name = tag
                    .trim_start_matches('/')
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_lowercase();
                match (skip_until, tag.starts_with('/')) {
                    (Some(end), true) if name == end => skip_until = None,
                    (None, false) if name == "style" => skip_until = Some("style"),
                    (None, false) if name == "script" => skip_until = Some("script"),
                    _ => {}
                }
                if matches!(name.as_str(), "br" | "p" | "div" | "li" | "tr") {
                    result.push(' ');
                }
            }
            _ if in_tag => tag.push(ch),
            _ if skip_until.is_none() => result.push(ch),
            _ => {}
        }
    }

    let decoded = result
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", " ")
        .replace("&gt;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip quoted text from an email body.
///
/// Removes lines starting with `>` and everything after an
/// "On ... wrote:" attribution or an "Original Message" separator.
pub fn strip_quoted_text(body: &str) -> String {
    let mut result = Vec::new();

    for line in body.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with('>') {
            continue;
        }
        if trimmed.starts_with("On ") && trimmed.ends_with("wrote:") {
            break;
        }
        if trimmed.starts_with("---") && trimmed.contains("Original Message") {
            break;
        }

        result.push(line);
    }

    while result.last().is_some_and(|l| l.trim().is_empty()) {
        result.pop();
    }

    result.join("\n")
}

/// Display sender: `"Name <addr>"`, the bare address, or `"Unknown"`.
pub fn extract_sender(parsed: &mail_parser::Message) -> String {
    let Some(addr) = parsed.from().and_then(|a| a.first()) else {
        return "Unknown".to_string();
    };
    match (addr.name(), addr.address()) {
        (Some(name), Some(address)) => format!("{name} <{address}>"),
        (Some(name), None) => name.to_string(),
        (None, Some(address)) => address.to_string(),
        (None, None) => "Unknown".to_string(),
    }
}

/// Readable body: the text part, else the HTML part converted to text, else
/// the first textual attachment. Quotes are stripped.
pub fn extract_text(parsed: &mail_parser::Message) -> String {
    if let Some(text) = parsed.body_text(0)
        && !text.trim().is_empty()
    {
        return strip_quoted_text(&text);
    }
    if let Some(html) = parsed.body_html(0) {
        return strip_html(html.as_ref());
    }
    for part in parsed.attachments() {
        let part: &mail_parser::MessagePart = part;
        if let Some(ct) = MimeHeaders::content_type(part)
            && ct.ctype() == "text"
            && let Ok(text) = std::str::from_utf8(part.contents())
        {
            return strip_quoted_text(text);
        }
    }
    String::new()
}

/// First `SNIPPET_CHARS` characters of the body, whitespace collapsed.
pub fn snippet(body: &str) -> String {
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= SNIPPET_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(SNIPPET_CHARS).collect();
    format!("{}...", cut.trim_end())
}
