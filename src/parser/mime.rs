//! MIME message parsing: body part extraction and attachment decoding.

use mail_parser::MessageParser;

use crate::model::attachment::{Attachment, AttachmentMeta};
use crate::model::message::MailBody;

/// A successfully parsed MIME message: decoded body parts plus attachments.
#[derive(Debug, Clone)]
pub struct ParsedMessage {
    pub body: MailBody,
    pub attachments: Vec<Attachment>,
}

/// Parse a complete raw message with `mail-parser`.
///
/// Returns `None` when the bytes cannot be made sense of at all; callers
/// fall back to raw-text handling in that case.
pub fn parse_message(raw: &[u8]) -> Option<ParsedMessage> {
    let parser = MessageParser::default();
    let msg = parser.parse(raw)?;

    let text = msg.body_text(0).map(|s| s.into_owned());
    let html = msg.body_html(0).map(|s| s.into_owned());
    let attachments = decode_attachments(&msg);

    Some(ParsedMessage {
        body: MailBody { text, html },
        attachments,
    })
}

/// Decode every attachment part of a parsed message.
///
/// Inline parts without a filename (images embedded in HTML markup) are
/// skipped; everything else gets a generated `attachment_N` name when the
/// headers carry none.
fn decode_attachments(msg: &mail_parser::Message<'_>) -> Vec<Attachment> {
    use mail_parser::MimeHeaders;

    let mut result = Vec::new();

    for (idx, part) in msg.attachments().enumerate() {
        let name = part.attachment_name().map(String::from);

        let is_inline = part
            .content_disposition()
            .map(|d: &mail_parser::ContentType| d.ctype() == "inline")
            .unwrap_or(false);

        if is_inline && name.is_none() {
            continue;
        }

        let filename = name.unwrap_or_else(|| format!("attachment_{idx}"));

        let content_type = part
            .content_type()
            .map(|ct: &mail_parser::ContentType| {
                let main = ct.ctype();
                match ct.subtype() {
                    Some(sub) => format!("{main}/{sub}"),
                    None => main.to_string(),
                }
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let data = part.contents().to_vec();

        result.push(Attachment {
            meta: AttachmentMeta {
                filename,
                content_type,
                size: data.len() as u64,
                is_inline,
            },
            data,
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &[u8] = b"From: a@example.com\r\n\
To: b@example.com\r\n\
Subject: Hi\r\n\
Content-Type: text/plain\r\n\
\r\n\
Just text.\r\n";

    const MULTIPART: &[u8] = b"From: a@example.com\r\n\
Subject: With attachment\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"xyz\"\r\n\
\r\n\
--xyz\r\n\
Content-Type: text/plain\r\n\
\r\n\
See attached.\r\n\
--xyz\r\n\
Content-Type: application/octet-stream\r\n\
Content-Disposition: attachment; filename=\"data.bin\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
aGVsbG8gd29ybGQ=\r\n\
--xyz--\r\n";

    #[test]
    fn test_parse_plain_text_body() {
        let parsed = parse_message(PLAIN).expect("parse");
        assert!(parsed.body.text.as_deref().unwrap().contains("Just text."));
        assert!(parsed.attachments.is_empty());
    }

    #[test]
    fn test_parse_multipart_attachment() {
        let parsed = parse_message(MULTIPART).expect("parse");
        assert!(parsed
            .body
            .text
            .as_deref()
            .unwrap()
            .contains("See attached."));
        assert_eq!(parsed.attachments.len(), 1);
        let att = &parsed.attachments[0];
        assert_eq!(att.meta.filename, "data.bin");
        assert_eq!(att.data, b"hello world");
        assert!(!att.meta.is_inline);
    }
}
