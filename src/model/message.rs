//! Header block and body types for a single message.

/// Placeholder shown when the From header is missing.
pub const UNKNOWN_SENDER: &str = "(unknown sender)";
/// Placeholder shown when the To header is missing.
pub const UNKNOWN_RECIPIENT: &str = "(unknown recipient)";
/// Placeholder shown when the Subject header is missing.
pub const NO_SUBJECT: &str = "(no subject)";
/// Placeholder shown when the Date header is missing.
pub const UNKNOWN_DATE: &str = "(unknown date)";

/// The four header fields shown at the top of every rendered document.
///
/// Values are display-ready strings: RFC 2047 encoded-words are already
/// decoded, and missing fields carry their fixed placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderBlock {
    /// Sender, as `Name <addr>` or the bare address.
    pub from: String,
    /// Recipient list, comma-separated.
    pub to: String,
    /// Decoded subject line.
    pub subject: String,
    /// Date, re-formatted when parseable, raw otherwise.
    pub date: String,
}

impl Default for HeaderBlock {
    fn default() -> Self {
        Self {
            from: UNKNOWN_SENDER.to_string(),
            to: UNKNOWN_RECIPIENT.to_string(),
            subject: NO_SUBJECT.to_string(),
            date: UNKNOWN_DATE.to_string(),
        }
    }
}

/// Decoded body of a message.
///
/// Either part may be absent; a message with neither falls back to the
/// raw source at render time.
#[derive(Debug, Clone, Default)]
pub struct MailBody {
    /// Plain-text body (from the first `text/plain` part).
    pub text: Option<String>,

    /// HTML body (from the first `text/html` part, if present).
    pub html: Option<String>,
}
