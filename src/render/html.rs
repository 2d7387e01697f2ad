//! Assemble one message into a single static HTML page.
//!
//! The page carries a header table (From, To, Subject, Date) followed by
//! the message body. Body selection prefers the `text/html` part, then an
//! escaped `text/plain` part, then the raw source in a `<pre>` block, so
//! assembly always succeeds.

use crate::model::message::{HeaderBlock, MailBody};

/// Build the full HTML document for one message.
///
/// `body` is the decoded MIME body when parsing succeeded; `raw` is the
/// untouched message source used as the last-resort rendering.
pub fn assemble_document(headers: &HeaderBlock, body: Option<&MailBody>, raw: &[u8]) -> String {
    let body_html = render_body(body, raw);

    format!(
        "<!DOCTYPE html>\n\
<html>\n\
<head>\n\
<meta charset=\"utf-8\">\n\
<title>{title}</title>\n\
<style>\n\
body {{ font-family: sans-serif; margin: 0; }}\n\
table.headers {{ border-collapse: collapse; width: 100%; background: #f4f4f4; }}\n\
table.headers td {{ padding: 4px 10px; vertical-align: top; }}\n\
table.headers td.h {{ font-weight: bold; white-space: nowrap; width: 1%; }}\n\
div.body {{ padding: 12px 10px; }}\n\
pre {{ white-space: pre-wrap; word-wrap: break-word; font-family: monospace; }}\n\
</style>\n\
</head>\n\
<body>\n\
<table class=\"headers\">\n\
<tr><td class=\"h\">From:</td><td>{from}</td></tr>\n\
<tr><td class=\"h\">To:</td><td>{to}</td></tr>\n\
<tr><td class=\"h\">Subject:</td><td>{subject}</td></tr>\n\
<tr><td class=\"h\">Date:</td><td>{date}</td></tr>\n\
</table>\n\
<hr>\n\
<div class=\"body\">\n{body}\n</div>\n\
</body>\n\
</html>\n",
        title = escape_html(&headers.subject),
        from = escape_html(&headers.from),
        to = escape_html(&headers.to),
        subject = escape_html(&headers.subject),
        date = escape_html(&headers.date),
        body = body_html,
    )
}

/// Pick the best available body rendering.
fn render_body(body: Option<&MailBody>, raw: &[u8]) -> String {
    if let Some(b) = body {
        if let Some(html) = &b.html {
            return html.clone();
        }
        if let Some(text) = &b.text {
            return format!("<pre>{}</pre>", escape_html(text));
        }
    }

    // Unparseable input: show the raw source rather than stalling
    format!(
        "<pre>{}</pre>",
        escape_html(&String::from_utf8_lossy(raw))
    )
}

/// Escape the five HTML-significant characters.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_headers() -> HeaderBlock {
        HeaderBlock {
            from: "Alice <alice@example.com>".to_string(),
            to: "bob@example.com".to_string(),
            subject: "Quarterly report".to_string(),
            date: "Thu, 04 Jan 2024 10:00:00 +0000".to_string(),
        }
    }

    #[test]
    fn test_document_contains_all_four_header_values() {
        let doc = assemble_document(&sample_headers(), None, b"body");
        assert!(doc.contains("Alice &lt;alice@example.com&gt;"));
        assert!(doc.contains("bob@example.com"));
        assert!(doc.contains("Quarterly report"));
        assert!(doc.contains("Thu, 04 Jan 2024 10:00:00 +0000"));
    }

    #[test]
    fn test_placeholder_subject_rendered() {
        let doc = assemble_document(&HeaderBlock::default(), None, b"");
        assert!(doc.contains("(no subject)"));
    }

    #[test]
    fn test_html_part_used_verbatim() {
        let body = MailBody {
            text: Some("plain".to_string()),
            html: Some("<p>rich</p>".to_string()),
        };
        let doc = assemble_document(&sample_headers(), Some(&body), b"");
        assert!(doc.contains("<p>rich</p>"));
    }

    #[test]
    fn test_text_part_is_escaped_in_pre() {
        let body = MailBody {
            text: Some("1 < 2 & 3".to_string()),
            html: None,
        };
        let doc = assemble_document(&sample_headers(), Some(&body), b"");
        assert!(doc.contains("<pre>1 &lt; 2 &amp; 3</pre>"));
    }

    #[test]
    fn test_raw_fallback_when_unparsed() {
        let doc = assemble_document(&sample_headers(), None, b"<garbage>");
        assert!(doc.contains("&lt;garbage&gt;"));
        assert!(doc.contains("<pre>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a&b<c>\"d'"), "a&amp;b&lt;c&gt;&quot;d&#39;");
    }
}
